// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 进度状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Started,
    StrategySelected,
    Running,
    ResultAvailable,
    Escalating,
    Completed,
    Failed,
}

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: Uuid,
    /// 0..=100
    pub percent: u8,
    pub status: ProgressStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
}

impl ProgressEvent {
    pub fn new(job_id: Uuid, percent: u8, status: ProgressStatus, message: impl Into<String>) -> Self {
        Self {
            job_id,
            percent: percent.min(100),
            status,
            message: message.into(),
            item_count: None,
        }
    }

    pub fn with_item_count(mut self, count: usize) -> Self {
        self.item_count = Some(count);
        self
    }
}

/// 进度上报接口
///
/// 由调用方注入，传输方式（广播、按任务的主题）不在引擎职责内。
/// 实现不能阻塞，也不能让抓取失败。
pub trait ProgressReporter: Send + Sync {
    fn report_progress(&self, event: ProgressEvent);
}
