//! 发送命令
//!
//! 连接服务端，按顺序发送命令行，然后正常关闭连接。

use anyhow::{Context, Result, bail};
use clap::Args;
use crossbeam_channel::Receiver;
use openglove_sdk::{Command, Session, SessionEvent};
use std::time::{Duration, Instant};

use super::ConnectArgs;
use super::codec::parse_command;

/// 等待关闭确认的最长时间
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// 发送命令参数
#[derive(Args, Debug)]
pub struct SendCommand {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// 命令行，按给出的顺序发送（如 "st;OpenGlove-Left;40"）
    #[arg(required = true)]
    pub lines: Vec<String>,
}

impl SendCommand {
    pub fn execute(&self) -> Result<()> {
        // 连接前先校验全部命令
        let commands = self
            .lines
            .iter()
            .map(|line| parse_command(line))
            .collect::<Result<Vec<_>>>()?;

        let endpoint = self.connect.resolve()?;
        println!("🔌 连接到 {} ({})...", endpoint.url, endpoint.device);
        let (session, events) = endpoint.connect()?;

        let sent = send_all(&session, &events, commands)?;
        println!("✅ 已发送 {} 条命令", sent);
        Ok(())
    }
}

/// 发送全部命令并等待会话关闭
///
/// 关闭请求排在命令之后，收到 `Closed` 即表示命令已全部写出。
pub fn send_all(
    session: &Session,
    events: &Receiver<SessionEvent>,
    commands: Vec<Command>,
) -> Result<usize> {
    let count = commands.len();
    for command in commands {
        let line = command.encode();
        session
            .send_command_blocking(command, CLOSE_TIMEOUT)
            .with_context(|| format!("发送失败: {}", line))?;
        tracing::debug!("queued {}", line);
    }
    session.close().context("关闭会话失败")?;

    let deadline = Instant::now() + CLOSE_TIMEOUT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(SessionEvent::Closed(_)) => return Ok(count),
            Ok(SessionEvent::Error(message)) => bail!("会话错误: {}", message),
            Ok(_) => continue,
            Err(_) => bail!("等待会话关闭超时"),
        }
    }
}
