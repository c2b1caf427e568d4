// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::services::progress::{ProgressEvent, ProgressReporter, ProgressStatus};

/// 将进度写入日志
#[derive(Debug, Default, Clone)]
pub struct TracingProgressReporter;

impl ProgressReporter for TracingProgressReporter {
    fn report_progress(&self, event: ProgressEvent) {
        match event.status {
            ProgressStatus::Failed => warn!(
                job_id = %event.job_id,
                percent = event.percent,
                "{}",
                event.message
            ),
            ProgressStatus::Completed | ProgressStatus::Escalating => info!(
                job_id = %event.job_id,
                percent = event.percent,
                item_count = ?event.item_count,
                "{}",
                event.message
            ),
            _ => debug!(
                job_id = %event.job_id,
                percent = event.percent,
                "{}",
                event.message
            ),
        }
    }
}

/// 通过 tokio broadcast 通道分发进度
///
/// WebSocket/SSE 等传输层自行订阅；没有订阅者时事件被丢弃。
#[derive(Debug, Clone)]
pub struct BroadcastProgressReporter {
    sender: broadcast::Sender<ProgressEvent>,
}

impl BroadcastProgressReporter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl ProgressReporter for BroadcastProgressReporter {
    fn report_progress(&self, event: ProgressEvent) {
        // 无订阅者时 send 返回错误，忽略即可
        let _ = self.sender.send(event);
    }
}

/// 丢弃所有进度
#[derive(Debug, Default, Clone)]
pub struct NoopProgressReporter;

impl ProgressReporter for NoopProgressReporter {
    fn report_progress(&self, _event: ProgressEvent) {}
}
