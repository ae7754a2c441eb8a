//! Mock 传输（无网络依赖）
//!
//! [`MockTransport`] 交给会话使用，测试代码通过配对的 [`MockHandle`]
//! 注入入站消息、模拟断开，并检查已发送的文本。

use crate::{CloseReason, Transport, TransportError};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Inbound {
    Line(String),
    Close(CloseReason),
    Error(String),
}

#[derive(Default)]
struct MockState {
    inbound: VecDeque<Inbound>,
    sent: Vec<String>,
    closed: bool,
    fail_sends: bool,
}

struct Shared {
    state: Mutex<MockState>,
    ready: Condvar,
}

/// 测试端句柄（可克隆，跨线程使用）
#[derive(Clone)]
pub struct MockHandle {
    shared: Arc<Shared>,
}

/// Mock 传输
pub struct MockTransport {
    shared: Arc<Shared>,
    receive_timeout: Duration,
}

impl MockTransport {
    /// 创建传输及其测试句柄
    pub fn new() -> (Self, MockHandle) {
        let shared = Arc::new(Shared {
            state: Mutex::new(MockState::default()),
            ready: Condvar::new(),
        });
        (
            Self {
                shared: shared.clone(),
                receive_timeout: Duration::from_millis(10),
            },
            MockHandle { shared },
        )
    }
}

impl MockHandle {
    fn enqueue(&self, item: Inbound) {
        self.shared.state.lock().inbound.push_back(item);
        self.shared.ready.notify_all();
    }

    /// 注入一行入站文本
    pub fn push_line(&self, line: impl Into<String>) {
        self.enqueue(Inbound::Line(line.into()));
    }

    /// 模拟对端关闭
    pub fn push_close(&self, code: u16, reason: impl Into<String>) {
        self.enqueue(Inbound::Close(CloseReason::new(code, reason)));
    }

    /// 模拟传输错误
    pub fn push_error(&self, message: impl Into<String>) {
        self.enqueue(Inbound::Error(message.into()));
    }

    /// 之后的发送全部失败
    pub fn fail_sends(&self, fail: bool) {
        self.shared.state.lock().fail_sends = fail;
    }

    /// 已发送的文本（按发送顺序）
    pub fn sent(&self) -> Vec<String> {
        self.shared.state.lock().sent.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// 等待已发送数量达到 `count`
    pub fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        while state.sent.len() < count {
            if self.shared.ready.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.sent.clone()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, line: &str) -> Result<(), TransportError> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(TransportError::NotConnected);
        }
        if state.fail_sends {
            return Err(TransportError::WebSocket("mock send failure".to_string()));
        }
        state.sent.push(line.to_string());
        drop(state);
        self.shared.ready.notify_all();
        Ok(())
    }

    fn receive(&mut self) -> Result<String, TransportError> {
        let deadline = Instant::now() + self.receive_timeout;
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.inbound.pop_front() {
                return match item {
                    Inbound::Line(line) => Ok(line),
                    Inbound::Close(reason) => {
                        state.closed = true;
                        Err(TransportError::Closed(reason))
                    },
                    Inbound::Error(message) => Err(TransportError::WebSocket(message)),
                };
            }
            if state.closed {
                return Err(TransportError::NotConnected);
            }
            if self.shared.ready.wait_until(&mut state, deadline).timed_out() {
                return Err(TransportError::Timeout);
            }
        }
    }

    fn set_receive_timeout(&mut self, timeout: Duration) {
        self.receive_timeout = timeout;
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.shared.state.lock().closed = true;
        self.shared.ready.notify_all();
        Ok(())
    }
}
