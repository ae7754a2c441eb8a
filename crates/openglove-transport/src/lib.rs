//! # OpenGlove Transport Layer
//!
//! 文本传输抽象层：会话只依赖 [`Transport`] trait，具体实现为 WebSocket
//! （`ws://` / `wss://`）或测试用的 mock。
//!
//! 一条消息就是一行完整的协议文本，传输层不做任何拆分或拼接。

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod websocket;

pub use websocket::WebSocketTransport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockTransport};

/// 连接关闭原因
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseReason {
    /// WebSocket 关闭码（对端未提供时为 1005）
    pub code: u16,
    pub reason: String,
}

impl CloseReason {
    /// 正常关闭（1000）
    pub const NORMAL: u16 = 1000;
    /// 对端未提供关闭码（1005）
    pub const NO_STATUS: u16 = 1005;
    /// 连接异常断开（1006）
    pub const ABNORMAL: u16 = 1006;

    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    pub fn normal() -> Self {
        Self::new(Self::NORMAL, "")
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason.is_empty() {
            write!(f, "code {}", self.code)
        } else {
            write!(f, "code {}: {}", self.code, self.reason)
        }
    }
}

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(String),
    #[error("Read timeout")]
    Timeout,
    #[error("Connection closed ({0})")]
    Closed(CloseReason),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Not connected")]
    NotConnected,
}

impl TransportError {
    /// 是否为致命错误（连接已不可用）
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Timeout)
    }
}

/// 双向文本传输
///
/// IO 线程独占传输对象，因此所有方法都接收 `&mut self`。
pub trait Transport {
    /// 发送一行文本
    fn send(&mut self, line: &str) -> Result<(), TransportError>;

    /// 接收一行文本（阻塞，受接收超时约束）
    ///
    /// 超时返回 [`TransportError::Timeout`]，对端关闭返回 [`TransportError::Closed`]。
    fn receive(&mut self) -> Result<String, TransportError>;

    /// 设置后续 `receive()` 的超时（不支持超时的实现可以忽略）
    fn set_receive_timeout(&mut self, _timeout: Duration) {}

    /// 以指定超时接收一行
    fn receive_timeout(&mut self, timeout: Duration) -> Result<String, TransportError> {
        self.set_receive_timeout(timeout);
        self.receive()
    }

    /// 主动关闭连接（可重复调用）
    fn close(&mut self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).send(line)
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        (**self).receive()
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        (**self).set_receive_timeout(timeout)
    }

    fn receive_timeout(&mut self, timeout: Duration) -> Result<String, TransportError> {
        (**self).receive_timeout(timeout)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }
}
