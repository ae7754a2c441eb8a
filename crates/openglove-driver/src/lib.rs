//! 驱动层模块
//!
//! OpenGlove 会话适配器：
//! - IO 线程管理（独占传输对象，单线程收发）
//! - 启动序列（`AddDevice` → `StartCapture`）
//! - 入站消息解码与事件分发
//! - 连接状态与会话指标
//! - 每个命令助记符对应的类型化发送方法

mod builder;
mod error;
pub mod event;
pub mod hooks;
pub mod metrics;
pub mod pipeline;
mod session;
pub mod state;

pub use builder::SessionBuilder;
pub use error::DriverError;
pub use event::{EventKind, SessionEvent};
pub use hooks::{EventCallback, EventRegistry, SubscriptionId};
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use pipeline::{PipelineConfig, SessionCommand, SessionContext, dispatch_line, io_loop};
pub use session::Session;
pub use state::{AtomicConnectionState, ConnectionState};
