//! WebSocket 传输（同步 `tungstenite`）
//!
//! 底层 `TcpStream` 设置读超时，`receive()` 超时返回 [`TransportError::Timeout`]，
//! IO 线程借此在等待入站消息的同时处理出站命令队列。

use crate::{CloseReason, Transport, TransportError};
use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info, trace, warn};
use tungstenite::protocol::CloseFrame;
use tungstenite::protocol::frame::coding::CloseCode;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type WsStream = WebSocket<MaybeTlsStream<TcpStream>>;

/// 默认接收超时
const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(50);

/// 基于 WebSocket 的文本传输
pub struct WebSocketTransport {
    socket: Option<WsStream>,
    url: String,
    receive_timeout: Duration,
}

impl WebSocketTransport {
    /// 连接到服务端
    ///
    /// 支持 `ws://` 与 `wss://`（rustls + webpki 根证书）。
    ///
    /// # Example
    ///
    /// ```no_run
    /// use openglove_transport::{Transport, WebSocketTransport};
    ///
    /// let mut transport = WebSocketTransport::connect("ws://localhost:7070/glove").unwrap();
    /// transport.send("v;OpenGlove-Left").unwrap();
    /// ```
    pub fn connect(url: &str) -> Result<Self, TransportError> {
        let url = url.trim();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }
        if url.starts_with("wss://") {
            // 进程内只需安装一次，重复安装返回 Err
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        let (socket, response) = tungstenite::connect(url).map_err(map_ws_error)?;
        info!(
            "WebSocket connected to {} (HTTP {})",
            url,
            response.status()
        );

        let mut transport = Self {
            socket: Some(socket),
            url: url.to_string(),
            receive_timeout: DEFAULT_RECEIVE_TIMEOUT,
        };
        transport.apply_read_timeout()?;
        Ok(transport)
    }

    /// 服务端地址
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 连接是否仍然可用
    pub fn is_open(&self) -> bool {
        self.socket.as_ref().is_some_and(|s| s.can_write())
    }

    fn apply_read_timeout(&mut self) -> Result<(), TransportError> {
        let Some(socket) = self.socket.as_ref() else {
            return Ok(());
        };
        // 零时长对 set_read_timeout 无效，至少等待 1ms
        let timeout = self.receive_timeout.max(Duration::from_millis(1));
        match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => stream.set_read_timeout(Some(timeout))?,
            MaybeTlsStream::Rustls(stream) => stream.get_ref().set_read_timeout(Some(timeout))?,
            _ => warn!("Unknown stream type, receive timeout not applied"),
        }
        Ok(())
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, line: &str) -> Result<(), TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        trace!("WS send: {}", line);
        socket
            .send(Message::Text(line.to_string()))
            .map_err(map_ws_error)
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        let socket = self.socket.as_mut().ok_or(TransportError::NotConnected)?;
        loop {
            match socket.read() {
                Ok(Message::Text(text)) => return Ok(text),
                Ok(Message::Binary(data)) => {
                    return Ok(String::from_utf8_lossy(&data).into_owned());
                },
                Ok(Message::Close(frame)) => {
                    let reason = close_reason(frame);
                    info!("WebSocket closed by peer: {}", reason);
                    // 发出自动排队的关闭应答
                    let _ = socket.flush();
                    self.socket = None;
                    return Err(TransportError::Closed(reason));
                },
                // Ping/Pong 由 tungstenite 自动应答
                Ok(_) => continue,
                Err(tungstenite::Error::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    // 借超时把排队的 Pong 发出去
                    match socket.flush() {
                        Ok(()) => {},
                        Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
                        },
                        Err(e) => return Err(map_ws_error(e)),
                    }
                    return Err(TransportError::Timeout);
                },
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    self.socket = None;
                    return Err(TransportError::Closed(CloseReason::new(
                        CloseReason::NO_STATUS,
                        "",
                    )));
                },
                Err(tungstenite::Error::Protocol(e)) => {
                    // 未握手关闭（如对端进程退出）
                    self.socket = None;
                    return Err(TransportError::Closed(CloseReason::new(
                        CloseReason::ABNORMAL,
                        e.to_string(),
                    )));
                },
                Err(e) => return Err(map_ws_error(e)),
            }
        }
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        if self.receive_timeout == timeout {
            return;
        }
        self.receive_timeout = timeout;
        if let Err(e) = self.apply_read_timeout() {
            warn!("Failed to set receive timeout: {}", e);
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let Some(mut socket) = self.socket.take() else {
            return Ok(());
        };
        debug!("Closing WebSocket connection to {}", self.url);
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        match socket.close(Some(frame)) {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => {},
            Err(e) => return Err(map_ws_error(e)),
        }
        // 尽量等待对端确认关闭，超时即放弃
        for _ in 0..10 {
            match socket.read() {
                Ok(_) => continue,
                Err(tungstenite::Error::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    continue;
                },
                Err(_) => break,
            }
        }
        Ok(())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.flush();
        }
    }
}

fn close_reason(frame: Option<CloseFrame<'_>>) -> CloseReason {
    match frame {
        Some(frame) => CloseReason::new(u16::from(frame.code), frame.reason.into_owned()),
        None => CloseReason::new(CloseReason::NO_STATUS, ""),
    }
}

fn map_ws_error(error: tungstenite::Error) -> TransportError {
    match error {
        tungstenite::Error::Io(e) => TransportError::Io(e),
        tungstenite::Error::Url(e) => TransportError::InvalidUrl(e.to_string()),
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed(CloseReason::new(CloseReason::NO_STATUS, ""))
        },
        other => TransportError::WebSocket(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_invalid_scheme_rejected() {
        let err = WebSocketTransport::connect("http://localhost:1").err().unwrap();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[test]
    fn test_connection_refused() {
        // 绑定后立即释放，得到一个大概率无人监听的端口
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let url = format!("ws://127.0.0.1:{}/", port);
        assert!(WebSocketTransport::connect(&url).is_err());
    }

    #[test]
    fn test_close_reason_mapping() {
        let reason = close_reason(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "bye".into(),
        }));
        assert_eq!(reason, CloseReason::new(1001, "bye"));
        assert_eq!(close_reason(None).code, CloseReason::NO_STATUS);
    }

    #[test]
    fn test_echo_and_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            let msg = ws.read().unwrap();
            ws.send(Message::Text(format!("echo:{}", msg.to_text().unwrap())))
                .unwrap();
            // 等待客户端关闭
            loop {
                match ws.read() {
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {},
                }
            }
        });

        let mut transport = WebSocketTransport::connect(&format!("ws://{}", addr)).unwrap();
        assert!(transport.is_open());
        transport.set_receive_timeout(Duration::from_millis(20));

        transport.send("v;left").unwrap();
        let mut reply = None;
        for _ in 0..200 {
            match transport.receive() {
                Ok(line) => {
                    reply = Some(line);
                    break;
                },
                Err(TransportError::Timeout) => continue,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(reply.as_deref(), Some("echo:v;left"));

        // 没有新消息时返回超时
        assert!(matches!(transport.receive(), Err(TransportError::Timeout)));

        transport.close().unwrap();
        assert!(!transport.is_open());
        assert!(matches!(
            transport.send("v;left"),
            Err(TransportError::NotConnected)
        ));
        server.join().unwrap();
    }
}
