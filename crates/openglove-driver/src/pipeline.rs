//! Pipeline IO 循环模块
//!
//! 后台 IO 线程独占传输对象：发送启动序列，之后循环执行
//! "清空命令队列 → 带超时接收 → 解码并分发"。

use crate::event::SessionEvent;
use crate::hooks::EventRegistry;
use crate::metrics::SessionMetrics;
use crate::state::{AtomicConnectionState, ConnectionState};
use crossbeam_channel::{Receiver, TryRecvError};
use openglove_protocol::{Command, GloveEvent, decode_line};
use openglove_transport::{CloseReason, Transport, TransportError};
use parking_lot::RwLock;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Pipeline 配置
///
/// # Example
///
/// ```
/// use openglove_driver::PipelineConfig;
///
/// let config = PipelineConfig {
///     receive_timeout_ms: 20,
///     ..Default::default()
/// };
/// assert_eq!(config.command_channel_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 接收超时（毫秒），决定空闲时命令队列的响应延迟
    pub receive_timeout_ms: u64,
    /// 命令队列容量
    pub command_channel_capacity: usize,
    /// 单次清空命令队列的最大条数（0 按 1 处理）
    pub max_drain_per_cycle: usize,
    /// 单次清空命令队列的时间预算（微秒）
    pub drain_budget_us: u64,
    /// Drop 时等待 IO 线程退出的时间（毫秒）
    pub join_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: 20,
            command_channel_capacity: 64,
            max_drain_per_cycle: 32,
            drain_budget_us: 2_000,
            join_timeout_ms: 2_000,
        }
    }
}

/// 发往 IO 线程的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// 发送一行已编码的文本
    Send(String),
    /// 主动关闭连接
    Close,
}

/// 会话共享上下文
pub struct SessionContext {
    pub device: String,
    pub state: AtomicConnectionState,
    /// 最近一次 `b` 消息报告的外设连接状态
    pub device_connected: AtomicBool,
    pub registry: RwLock<EventRegistry>,
    pub metrics: Arc<SessionMetrics>,
}

impl SessionContext {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            state: AtomicConnectionState::new(ConnectionState::Connecting),
            device_connected: AtomicBool::new(false),
            registry: RwLock::new(EventRegistry::new()),
            metrics: Arc::new(SessionMetrics::new()),
        }
    }

    /// 分发一个事件
    ///
    /// 回调列表先快照再释放锁，回调内部可以再订阅或取消订阅。
    /// 回调 panic 被捕获并计数，不影响后续回调。
    pub fn emit(&self, event: &SessionEvent) {
        let callbacks = self.registry.read().callbacks_for(event.kind());
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback.on_event(event))).is_err() {
                self.metrics.subscriber_panics.fetch_add(1, Ordering::Relaxed);
                error!("Subscriber panicked while handling {:?}", event.kind());
            }
        }
        self.metrics.events_dispatched.fetch_add(1, Ordering::Relaxed);
    }
}

/// 解码一行入站文本并分发
///
/// 已知标签的格式错误只记录日志和计数，不产生事件。
pub fn dispatch_line(ctx: &SessionContext, line: &str) {
    ctx.metrics.lines_received.fetch_add(1, Ordering::Relaxed);
    debug!("Received: {}", line);

    let event = match decode_line(line) {
        Ok(event) => event,
        Err(e) => {
            ctx.metrics.decode_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Dropping malformed line {:?}: {}", line, e);
            return;
        },
    };

    match &event {
        GloveEvent::ConnectionState(connected) => {
            ctx.device_connected.store(*connected, Ordering::Release);
            info!(
                "Device {} {}",
                ctx.device,
                if *connected { "connected" } else { "disconnected" }
            );
        },
        GloveEvent::Diagnostic(_) => {
            ctx.metrics.diagnostics.fetch_add(1, Ordering::Relaxed);
        },
        _ => {},
    }

    ctx.emit(&SessionEvent::Glove(event));
}

/// 启动序列：注册设备，然后开始采集
pub fn startup_sequence(device: &str) -> [String; 2] {
    [
        Command::AddDevice {
            device: device.to_string(),
        }
        .encode(),
        Command::StartCapture {
            device: device.to_string(),
        }
        .encode(),
    ]
}

/// 循环结束原因
enum Exit {
    Closed(CloseReason),
    Failed(String),
}

/// IO 线程循环
///
/// # 参数
/// - `transport`: 传输对象（移动到 IO 线程内独占）
/// - `cmd_rx`: 命令接收通道
/// - `ctx`: 共享上下文
/// - `config`: Pipeline 配置
pub fn io_loop(
    mut transport: impl Transport,
    cmd_rx: Receiver<SessionCommand>,
    ctx: Arc<SessionContext>,
    config: PipelineConfig,
) {
    let receive_timeout = Duration::from_millis(config.receive_timeout_ms);

    // 启动序列必须先于任何排队命令写出
    for line in startup_sequence(&ctx.device) {
        if let Err(e) = transport.send(&line) {
            ctx.metrics.commands_failed.fetch_add(1, Ordering::Relaxed);
            error!("Failed to send startup command {:?}: {}", line, e);
            finish(&mut transport, &ctx, Exit::Failed(e.to_string()));
            return;
        }
        ctx.metrics.commands_sent.fetch_add(1, Ordering::Relaxed);
        trace!("Sent: {}", line);
    }

    ctx.state.set(ConnectionState::Connected);
    info!("Session opened for device {}", ctx.device);
    ctx.emit(&SessionEvent::Opened);

    let exit = loop {
        if let Some(exit) = drain_command_queue(&mut transport, &cmd_rx, &ctx, &config) {
            break exit;
        }

        match transport.receive_timeout(receive_timeout) {
            Ok(line) => dispatch_line(&ctx, &line),
            Err(TransportError::Timeout) => {
                ctx.metrics.receive_timeouts.fetch_add(1, Ordering::Relaxed);
            },
            Err(TransportError::Closed(reason)) => break Exit::Closed(reason),
            Err(e) => {
                error!("Transport receive error: {}", e);
                break Exit::Failed(e.to_string());
            },
        }
    };

    finish(&mut transport, &ctx, exit);
}

/// 清空命令队列（受条数和时间预算限制）
///
/// 返回 `Some` 表示循环应当结束。
fn drain_command_queue(
    transport: &mut impl Transport,
    cmd_rx: &Receiver<SessionCommand>,
    ctx: &SessionContext,
    config: &PipelineConfig,
) -> Option<Exit> {
    let budget = Duration::from_micros(config.drain_budget_us);
    let start = Instant::now();

    // 至少取一条，否则 Close 与发送端释放永远不会被观察到
    for _ in 0..config.max_drain_per_cycle.max(1) {
        if start.elapsed() > budget {
            trace!("Drain time budget exhausted, deferred {} commands", cmd_rx.len());
            break;
        }

        match cmd_rx.try_recv() {
            Ok(SessionCommand::Send(line)) => match transport.send(&line) {
                Ok(()) => {
                    ctx.metrics.commands_sent.fetch_add(1, Ordering::Relaxed);
                    trace!("Sent: {}", line);
                },
                Err(e) => {
                    ctx.metrics.commands_failed.fetch_add(1, Ordering::Relaxed);
                    error!("Failed to send {:?}: {}", line, e);
                    if e.is_fatal() {
                        return Some(Exit::Failed(e.to_string()));
                    }
                },
            },
            Ok(SessionCommand::Close) => {
                info!("Closing session for device {}", ctx.device);
                if let Err(e) = transport.close() {
                    warn!("Error while closing transport: {}", e);
                }
                return Some(Exit::Closed(CloseReason::normal()));
            },
            Err(TryRecvError::Empty) => break,
            // 所有发送端都已释放（会话被 drop）
            Err(TryRecvError::Disconnected) => {
                let _ = transport.close();
                return Some(Exit::Closed(CloseReason::normal()));
            },
        }
    }

    None
}

fn finish(transport: &mut impl Transport, ctx: &SessionContext, exit: Exit) {
    ctx.state.set(ConnectionState::Disconnected);
    match exit {
        Exit::Closed(reason) => {
            info!("Session for device {} closed: {}", ctx.device, reason);
            ctx.emit(&SessionEvent::Closed(reason));
        },
        Exit::Failed(message) => {
            let _ = transport.close();
            ctx.emit(&SessionEvent::Error(message));
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use openglove_protocol::FlexorSample;
    use parking_lot::Mutex;

    fn recording_context() -> (Arc<SessionContext>, Arc<Mutex<Vec<SessionEvent>>>) {
        let ctx = Arc::new(SessionContext::new("left"));
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        ctx.registry
            .write()
            .subscribe_all(move |e: &SessionEvent| sink.lock().push(e.clone()));
        (ctx, events)
    }

    #[test]
    fn test_startup_sequence() {
        assert_eq!(
            startup_sequence("OpenGlove-Left"),
            ["ad;OpenGlove-Left".to_string(), "sc;OpenGlove-Left".to_string()]
        );
    }

    #[test]
    fn test_dispatch_flexor() {
        let (ctx, events) = recording_context();
        dispatch_line(&ctx, "f,2,300");
        assert_eq!(
            *events.lock(),
            vec![SessionEvent::Glove(GloveEvent::Flexor(FlexorSample {
                region: 2,
                value: 300
            }))]
        );
        assert_eq!(ctx.metrics.snapshot().events_dispatched, 1);
    }

    #[test]
    fn test_dispatch_malformed_line_is_dropped() {
        let (ctx, events) = recording_context();
        dispatch_line(&ctx, "f,abc");
        dispatch_line(&ctx, "b,maybe");
        assert!(events.lock().is_empty());

        let snapshot = ctx.metrics.snapshot();
        assert_eq!(snapshot.lines_received, 2);
        assert_eq!(snapshot.decode_errors, 2);
        assert_eq!(snapshot.events_dispatched, 0);
    }

    #[test]
    fn test_dispatch_diagnostic() {
        let (ctx, events) = recording_context();
        dispatch_line(&ctx, "x,hello");
        assert_eq!(
            *events.lock(),
            vec![SessionEvent::Glove(GloveEvent::Diagnostic(
                "x,hello".to_string()
            ))]
        );
        assert_eq!(ctx.metrics.snapshot().diagnostics, 1);
    }

    #[test]
    fn test_dispatch_tracks_device_connection() {
        let (ctx, _events) = recording_context();
        assert!(!ctx.device_connected.load(Ordering::Acquire));
        dispatch_line(&ctx, "b,true");
        assert!(ctx.device_connected.load(Ordering::Acquire));
        dispatch_line(&ctx, "b,false");
        assert!(!ctx.device_connected.load(Ordering::Acquire));
    }

    #[test]
    fn test_subscriber_panic_is_contained() {
        let (ctx, events) = recording_context();
        // 通配订阅者在种类订阅者之后执行，panic 不影响它
        ctx.registry
            .write()
            .subscribe(EventKind::Flexor, |_: &SessionEvent| panic!("boom"));

        dispatch_line(&ctx, "f,1,1");
        dispatch_line(&ctx, "f,1,2");
        assert_eq!(events.lock().len(), 2);
        assert_eq!(ctx.metrics.snapshot().subscriber_panics, 2);
    }
}
