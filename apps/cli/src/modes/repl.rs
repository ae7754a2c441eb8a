//! REPL 模式
//!
//! 交互式 Shell：保持一个会话，逐行输入线格式命令。
//! rustyline 运行在专用输入线程，主线程同时等待用户输入和会话事件。

use anyhow::{Result, bail};
use crossbeam_channel::{Receiver, bounded, never, select};
use openglove_sdk::{ConnectionState, Session, SessionEvent};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::thread;

use crate::commands::codec::parse_command;
use crate::commands::monitor::describe_event;
use crate::commands::{ConnectArgs, Endpoint};

/// 历史记录文件
const HISTORY_FILE: &str = ".openglove_history";

/// Ctrl+C 在输入线程中转成的特殊行
const INTERRUPT: &str = "\u{3}";

/// 单行处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// REPL 会话状态
pub struct ReplSession {
    endpoint: Endpoint,
    connection: Option<(Session, Receiver<SessionEvent>)>,
    watch: bool,
}

impl ReplSession {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connection: None,
            watch: true,
        }
    }

    /// 接管一个已建立的会话（替换当前会话）
    pub fn attach(&mut self, session: Session, events: Receiver<SessionEvent>) {
        self.connection = Some((session, events));
    }

    fn session(&self) -> Result<&Session> {
        match &self.connection {
            Some((session, _)) => Ok(session),
            None => bail!("未连接，请先执行 'connect'"),
        }
    }

    /// 当前会话的事件接收端（未连接时永不就绪）
    fn events(&self) -> Receiver<SessionEvent> {
        match &self.connection {
            Some((_, events)) => events.clone(),
            None => never(),
        }
    }

    fn status(&self) -> String {
        match &self.connection {
            Some((session, _)) => {
                let state = session.connection_state();
                let device = if session.is_device_connected() {
                    "online"
                } else {
                    "offline"
                };
                format!(
                    "{:?} to {} (device {} {})",
                    state,
                    self.endpoint.url,
                    session.device(),
                    device
                )
            },
            None => format!("Disconnected (target {})", self.endpoint.url),
        }
    }

    fn connect(&mut self, url: Option<&str>, device: Option<&str>) -> Result<()> {
        if let Some(url) = url {
            self.endpoint.url = url.to_string();
        }
        if let Some(device) = device {
            self.endpoint.device = device.to_string();
        }
        self.disconnect();

        println!("🔌 连接到 {} ({})...", self.endpoint.url, self.endpoint.device);
        let (session, events) = self.endpoint.connect()?;
        self.attach(session, events);
        println!("✅ 已连接");
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some((session, _)) = self.connection.take() {
            if let Err(e) = session.close() {
                tracing::debug!("close failed: {}", e);
            }
            // drop 时等待 IO 线程退出
        }
    }

    /// 处理一个会话事件
    pub fn on_event(&mut self, event: &SessionEvent) {
        if self.watch || !matches!(event, SessionEvent::Glove(_)) {
            println!("{}", describe_event(event));
        }
        if matches!(event, SessionEvent::Closed(_) | SessionEvent::Error(_)) {
            self.connection = None;
        }
    }

    /// 处理一行输入
    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&head) = parts.first() else {
            return Ok(Flow::Continue);
        };

        match head {
            "exit" | "quit" => {
                self.disconnect();
                return Ok(Flow::Exit);
            },
            "help" => print_help(),
            "status" => println!("📊 状态: {}", self.status()),
            "connect" => self.connect(parts.get(1).copied(), parts.get(2).copied())?,
            "disconnect" => {
                self.disconnect();
                println!("✅ 已断开");
            },
            "watch" => match parts.get(1).copied() {
                Some("on") => self.watch = true,
                Some("off") => self.watch = false,
                _ => println!("watch: {}", if self.watch { "on" } else { "off" }),
            },
            "metrics" => {
                let metrics = self.session()?.metrics();
                println!("{:#?}", metrics);
            },
            _ => {
                let command = parse_command(line)?;
                let session = self.session()?;
                if session.connection_state() != ConnectionState::Connected {
                    bail!("会话未就绪");
                }
                session.send_command(command)?;
            },
        }
        Ok(Flow::Continue)
    }
}

/// REPL 输入（专用输入线程）
pub struct ReplInput {
    lines: Receiver<String>,
    _input_thread: thread::JoinHandle<()>,
}

impl ReplInput {
    /// 创建专用输入线程（保留历史记录）
    pub fn new() -> Result<Self> {
        let (line_tx, lines) = bounded::<String>(10);

        let input_thread = thread::Builder::new()
            .name("openglove-repl-input".into())
            .spawn(move || {
                // Editor 在输入线程内创建，生命周期与 REPL 相同
                let mut rl = match DefaultEditor::new() {
                    Ok(rl) => rl,
                    Err(e) => {
                        eprintln!("Failed to initialize readline: {}", e);
                        return;
                    },
                };
                rl.load_history(HISTORY_FILE).ok(); // 首次运行没有历史

                loop {
                    match rl.readline("glove> ") {
                        Ok(line) => {
                            let line = line.trim().to_string();
                            if line.is_empty() {
                                continue;
                            }
                            let _ = rl.add_history_entry(line.as_str());
                            let done = line == "exit" || line == "quit";
                            if line_tx.send(line).is_err() || done {
                                break;
                            }
                        },
                        Err(ReadlineError::Interrupted) => {
                            println!("^C");
                            let _ = line_tx.send(INTERRUPT.to_string());
                        },
                        Err(ReadlineError::Eof) => break,
                        Err(err) => {
                            eprintln!("Error: {:?}", err);
                            break;
                        },
                    }
                }
                rl.save_history(HISTORY_FILE).ok();
            })?;

        Ok(Self {
            lines,
            _input_thread: input_thread,
        })
    }
}

/// 运行 REPL 模式
pub fn run_repl(connect: ConnectArgs) -> Result<()> {
    let mut session = ReplSession::new(connect.resolve()?);
    let input = ReplInput::new()?;

    println!("OpenGlove CLI v{} - 交互式 Shell", env!("CARGO_PKG_VERSION"));
    println!("输入 'help' 查看帮助，'exit' 退出");
    println!("💡 提示: 使用 'connect' 连接到 {}", session.endpoint.url);
    println!();

    loop {
        let events = session.events();
        select! {
            recv(input.lines) -> line => {
                let Ok(line) = line else {
                    // 输入线程退出（Ctrl+D）
                    session.disconnect();
                    break;
                };
                if line == INTERRUPT {
                    println!("输入 'exit' 退出");
                    continue;
                }
                match session.handle_line(&line) {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {},
                    Err(err) => eprintln!("❌ Error: {:#}", err),
                }
            },
            recv(events) -> event => {
                if let Ok(event) = event {
                    session.on_event(&event);
                }
            },
        }
    }

    println!("👋 再见！");
    Ok(())
}

fn print_help() {
    println!("命令:");
    println!("  connect [url] [device]  连接服务端（默认使用配置）");
    println!("  disconnect              断开连接");
    println!("  status                  显示连接状态");
    println!("  metrics                 显示会话统计");
    println!("  watch on|off            是否打印手套事件");
    println!("  help                    显示帮助");
    println!("  exit | quit             退出");
    println!();
    println!("其他输入按线格式命令发送，例如:");
    println!("  af;OpenGlove-Left;0;17");
    println!("  aca;OpenGlove-Left;0,1;0.5,1.0");
}
