//! 驱动层错误类型定义

use openglove_protocol::ProtocolError;
use openglove_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（连接失败等）
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 命令参数校验失败
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 命令通道已关闭（IO 线程退出）
    #[error("Command channel closed")]
    ChannelClosed,

    /// 命令通道已满
    #[error("Command channel full")]
    ChannelFull,

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,

    /// IO 线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use openglove_protocol::ProtocolError;
    use openglove_transport::TransportError;

    #[test]
    fn test_driver_error_display() {
        let msg = DriverError::Transport(TransportError::NotConnected).to_string();
        assert!(msg.contains("Not connected"), "message: {}", msg);

        let msg = DriverError::Protocol(ProtocolError::EmptyLine).to_string();
        assert!(msg.contains("Empty line"), "message: {}", msg);

        assert_eq!(
            DriverError::ChannelClosed.to_string(),
            "Command channel closed"
        );
        assert_eq!(DriverError::ChannelFull.to_string(), "Command channel full");
        assert_eq!(DriverError::Timeout.to_string(), "Operation timeout");

        let msg = DriverError::IoThread("spawn failed".to_string()).to_string();
        assert!(msg.contains("IO thread") && msg.contains("spawn failed"));
    }

    #[test]
    fn test_from_conversions() {
        let err: DriverError = TransportError::Timeout.into();
        assert!(matches!(err, DriverError::Transport(TransportError::Timeout)));

        let err: DriverError = ProtocolError::UnknownMnemonic("zz".into()).into();
        match err {
            DriverError::Protocol(ProtocolError::UnknownMnemonic(m)) => assert_eq!(m, "zz"),
            other => panic!("Expected Protocol variant, got {:?}", other),
        }
    }
}
