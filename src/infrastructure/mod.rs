// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 领域接口的进程内实现：
/// - 指标（metrics）：Prometheus 导出与抓取指标记录
/// - 进度（progress）：日志、广播与空实现的进度上报
/// - 服务实现（services）：滑动窗口限流器
pub mod metrics;
pub mod progress;
pub mod services;
