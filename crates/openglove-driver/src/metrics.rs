//! 会话指标
//!
//! 原子计数器，IO 线程写入，任何线程都可以无锁读取快照。

use std::sync::atomic::{AtomicU64, Ordering};

/// 会话实时指标
///
/// ```rust
/// use openglove_driver::SessionMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = SessionMetrics::new();
/// metrics.lines_received.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().lines_received, 1);
/// ```
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// 收到的入站文本行数
    pub lines_received: AtomicU64,
    /// 成功分发的事件数（每个事件计一次，与订阅者数量无关）
    pub events_dispatched: AtomicU64,
    /// 已知标签但格式错误的行数
    pub decode_errors: AtomicU64,
    /// 诊断文本行数
    pub diagnostics: AtomicU64,
    /// 成功写入传输层的命令数（含启动序列）
    pub commands_sent: AtomicU64,
    /// 写入传输层失败的命令数
    pub commands_failed: AtomicU64,
    /// 接收超时次数（空闲时的正常现象）
    pub receive_timeouts: AtomicU64,
    /// 订阅者回调 panic 次数
    pub subscriber_panics: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_received: self.lines_received.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            diagnostics: self.diagnostics.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            receive_timeouts: self.receive_timeouts.load(Ordering::Relaxed),
            subscriber_panics: self.subscriber_panics.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub lines_received: u64,
    pub events_dispatched: u64,
    pub decode_errors: u64,
    pub diagnostics: u64,
    pub commands_sent: u64,
    pub commands_failed: u64,
    pub receive_timeouts: u64,
    pub subscriber_panics: u64,
}

impl MetricsSnapshot {
    /// 格式错误行占比（百分比）
    ///
    /// `lines_received` 为 0 时返回 0.0。
    pub fn decode_error_rate(&self) -> f64 {
        if self.lines_received == 0 {
            return 0.0;
        }
        (self.decode_errors as f64 / self.lines_received as f64) * 100.0
    }
}
