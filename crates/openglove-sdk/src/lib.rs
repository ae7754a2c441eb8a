//! OpenGlove SDK - OpenGlove 远程服务 Rust 客户端
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 出站命令编码、入站消息解码（纯函数，无 IO）
//! - **传输层** (`transport`): `Transport` trait 与 WebSocket 实现
//! - **驱动层** (`driver`): 会话、IO 线程、事件分发
//!
//! # 快速开始
//!
//! ```no_run
//! use openglove_sdk::prelude::*;
//!
//! openglove_sdk::init_logger();
//!
//! let session = SessionBuilder::new("ws://localhost:7070/glove", "OpenGlove-Left")
//!     .on_open(|| println!("connected"))
//!     .connect()?;
//! session.on_imu(|imu| println!("{:?}", imu.accelerometer));
//! session.add_flexor("OpenGlove-Left", 0, 17)?;
//! # Ok::<(), DriverError>(())
//! ```

pub use openglove_driver as driver;
pub use openglove_protocol as protocol;
pub use openglove_transport as transport;

pub mod prelude;

pub use driver::{
    ConnectionState, DriverError, EventKind, PipelineConfig, Session, SessionBuilder,
    SessionEvent,
};
pub use protocol::{Command, GloveEvent, ProtocolError};
pub use transport::{Transport, TransportError};

use tracing_subscriber::EnvFilter;

/// 初始化日志（`RUST_LOG` 未设置时默认 `info`）
///
/// 同时把 `log` crate 的记录转发到 `tracing`。重复调用是安全的，只有第一次生效。
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = tracing_log::LogTracer::init();
    }
}
