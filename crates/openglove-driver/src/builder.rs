//! Builder 模式实现
//!
//! 链式构造 `Session`：连接 WebSocket 服务端并启动 IO 线程。

use crate::error::DriverError;
use crate::event::{EventKind, SessionEvent};
use crate::hooks::{EventCallback, EventRegistry};
use crate::pipeline::PipelineConfig;
use crate::session::Session;
use openglove_transport::{Transport, WebSocketTransport};
use std::time::Duration;
use tracing::info;

/// Session Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use openglove_driver::{EventKind, PipelineConfig, SessionBuilder, SessionEvent};
///
/// let session = SessionBuilder::new("ws://localhost:7070/glove", "OpenGlove-Right")
///     .pipeline_config(PipelineConfig {
///         receive_timeout_ms: 10,
///         ..Default::default()
///     })
///     .subscribe(EventKind::Opened, |_: &SessionEvent| println!("session opened"))
///     .connect()
///     .unwrap();
/// ```
pub struct SessionBuilder {
    url: String,
    device: String,
    pipeline_config: Option<PipelineConfig>,
    registry: EventRegistry,
}

impl SessionBuilder {
    /// `url`: 服务端地址（`ws://` 或 `wss://`），`device`: 设备名（原样透传）
    pub fn new(url: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            device: device.into(),
            pipeline_config: None,
            registry: EventRegistry::new(),
        }
    }

    /// 设置 Pipeline 配置（可选）
    pub fn pipeline_config(mut self, config: PipelineConfig) -> Self {
        self.pipeline_config = Some(config);
        self
    }

    /// 设置接收超时（毫秒）
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        let mut config = self.pipeline_config.unwrap_or_default();
        config.receive_timeout_ms = timeout.as_millis() as u64;
        self.pipeline_config = Some(config);
        self
    }

    /// 连接前订阅（可以收到 `Opened` 事件）
    pub fn subscribe(mut self, kind: EventKind, callback: impl EventCallback + 'static) -> Self {
        self.registry.subscribe(kind, callback);
        self
    }

    /// 连接前订阅全部事件
    pub fn subscribe_all(mut self, callback: impl EventCallback + 'static) -> Self {
        self.registry.subscribe_all(callback);
        self
    }

    /// 连接前订阅 `Opened`
    pub fn on_open(self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.subscribe(EventKind::Opened, move |_: &SessionEvent| f())
    }

    /// 连接服务端并启动会话
    ///
    /// # 错误
    /// - `DriverError::Transport`: 地址无效或连接失败
    /// - `DriverError::IoThread`: IO 线程启动失败
    pub fn connect(self) -> Result<Session, DriverError> {
        info!("Connecting to {} as {}", self.url, self.device);
        let transport = WebSocketTransport::connect(&self.url)?;
        self.start(transport)
    }

    /// 在自定义传输上启动会话（跳过 WebSocket 连接）
    pub fn start(
        self,
        transport: impl Transport + Send + 'static,
    ) -> Result<Session, DriverError> {
        Session::with_registry(
            transport,
            self.device,
            self.registry,
            self.pipeline_config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openglove_transport::{MockTransport, TransportError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[test]
    fn test_builder_invalid_url() {
        let result = SessionBuilder::new("tcp://localhost", "left").connect();
        assert!(matches!(
            result,
            Err(DriverError::Transport(TransportError::InvalidUrl(_)))
        ));
    }

    #[test]
    fn test_builder_receive_timeout() {
        let builder =
            SessionBuilder::new("ws://localhost", "left").receive_timeout(Duration::from_millis(7));
        assert_eq!(builder.pipeline_config.unwrap().receive_timeout_ms, 7);
    }

    #[test]
    fn test_presubscribed_open_event() {
        let opened = Arc::new(AtomicUsize::new(0));
        let o = opened.clone();
        let (transport, _handle) = MockTransport::new();
        let session = SessionBuilder::new("ws://unused", "left")
            .on_open(move || {
                o.fetch_add(1, Ordering::SeqCst);
            })
            .start(transport)
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while opened.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(session.device(), "left");
    }
}
