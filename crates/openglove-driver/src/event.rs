//! 会话事件

use openglove_protocol::GloveEvent;
use openglove_transport::CloseReason;

/// 分发给订阅者的事件
///
/// 设备遥测来自入站文本，其余三种来自传输层生命周期。
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// 连接建立且启动序列已发送
    Opened,
    Glove(GloveEvent),
    /// 连接关闭（对端关闭或本地 `close()`）
    Closed(CloseReason),
    /// 传输错误，之后会话不再可用
    Error(String),
}

/// 事件种类（订阅键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Opened,
    Flexor,
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Imu,
    ConnectionState,
    Diagnostic,
    Closed,
    Error,
}

impl SessionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SessionEvent::Opened => EventKind::Opened,
            SessionEvent::Glove(event) => match event {
                GloveEvent::Flexor(_) => EventKind::Flexor,
                GloveEvent::Accelerometer(_) => EventKind::Accelerometer,
                GloveEvent::Gyroscope(_) => EventKind::Gyroscope,
                GloveEvent::Magnetometer(_) => EventKind::Magnetometer,
                GloveEvent::Imu(_) => EventKind::Imu,
                GloveEvent::ConnectionState(_) => EventKind::ConnectionState,
                GloveEvent::Diagnostic(_) => EventKind::Diagnostic,
            },
            SessionEvent::Closed(_) => EventKind::Closed,
            SessionEvent::Error(_) => EventKind::Error,
        }
    }

    pub fn as_glove(&self) -> Option<&GloveEvent> {
        match self {
            SessionEvent::Glove(event) => Some(event),
            _ => None,
        }
    }
}

impl From<GloveEvent> for SessionEvent {
    fn from(event: GloveEvent) -> Self {
        SessionEvent::Glove(event)
    }
}
