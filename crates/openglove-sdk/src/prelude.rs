//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use openglove_sdk::prelude::*;
//! ```

// 会话（推荐入口）
pub use crate::driver::{
    ConnectionState, EventKind, MetricsSnapshot, PipelineConfig, Session, SessionBuilder,
    SessionEvent, SubscriptionId,
};

// 协议类型
pub use crate::protocol::{Command, FlexorSample, GloveEvent, ImuBundle, Vector3};

// 传输层
pub use crate::transport::{CloseReason, Transport, WebSocketTransport};

// 错误类型
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::transport::TransportError;
