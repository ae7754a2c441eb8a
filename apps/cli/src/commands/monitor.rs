//! 监控命令
//!
//! 连接服务端并持续打印收到的事件，直到 Ctrl+C、超过时长或会话结束。

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use openglove_sdk::{GloveEvent, Session, SessionEvent};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::ConnectArgs;

/// 主循环轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 监控命令参数
#[derive(Args, Debug)]
pub struct MonitorCommand {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// 监控时长（秒），省略时直到 Ctrl+C
    #[arg(long)]
    pub duration: Option<u64>,

    /// 连接后启动 IMU 并开启上报
    #[arg(long)]
    pub imu: bool,

    /// 以 JSON 输出手套事件
    #[arg(long)]
    pub json: bool,
}

/// 监控结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorExit {
    Interrupted,
    Elapsed,
    SessionEnded(String),
}

impl MonitorCommand {
    pub fn execute(&self) -> Result<()> {
        let endpoint = self.connect.resolve()?;
        println!("🔌 连接到 {} ({})...", endpoint.url, endpoint.device);
        let (session, events) = endpoint.connect()?;

        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("安装 Ctrl+C 处理器失败")?;

        if self.imu {
            session.start_imu(&endpoint.device)?;
            session.set_imu_status(&endpoint.device, true)?;
        }

        let deadline = self
            .duration
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let exit = run_monitor(&events, &stop, deadline, self.json, &mut io::stdout().lock())?;

        let metrics = session.metrics();
        eprintln!(
            "📊 {} 行 / {} 事件 / {} 解码错误 ({:.1}%)",
            metrics.lines_received,
            metrics.events_dispatched,
            metrics.decode_errors,
            metrics.decode_error_rate()
        );
        if let MonitorExit::SessionEnded(reason) = exit {
            eprintln!("⚠️  会话结束: {}", reason);
        } else {
            close_quietly(&session);
        }
        Ok(())
    }
}

fn close_quietly(session: &Session) {
    if let Err(e) = session.close() {
        tracing::debug!("close after monitor: {}", e);
    }
}

/// 打印事件直到退出条件满足
pub fn run_monitor(
    events: &Receiver<SessionEvent>,
    stop: &AtomicBool,
    deadline: Option<Instant>,
    json: bool,
    out: &mut impl Write,
) -> Result<MonitorExit> {
    loop {
        if stop.load(Ordering::SeqCst) {
            return Ok(MonitorExit::Interrupted);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Ok(MonitorExit::Elapsed);
        }

        match events.recv_timeout(POLL_INTERVAL) {
            Ok(event) => {
                writeln!(out, "{}", render(&event, json)?)?;
                match event {
                    SessionEvent::Closed(reason) => {
                        return Ok(MonitorExit::SessionEnded(reason.to_string()));
                    },
                    SessionEvent::Error(message) => return Ok(MonitorExit::SessionEnded(message)),
                    _ => {},
                }
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Ok(MonitorExit::SessionEnded("event channel closed".to_string()));
            },
        }
    }
}

fn render(event: &SessionEvent, json: bool) -> Result<String> {
    match event {
        SessionEvent::Glove(glove) if json => {
            serde_json::to_string(glove).context("序列化事件失败")
        },
        _ => Ok(describe_event(event)),
    }
}

/// 人类可读的事件描述
pub fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Opened => "[open]".to_string(),
        SessionEvent::Closed(reason) => format!("[close] {}", reason),
        SessionEvent::Error(message) => format!("[error] {}", message),
        SessionEvent::Glove(glove) => match glove {
            GloveEvent::Flexor(sample) => {
                format!("[flexor] region={} value={}", sample.region, sample.value)
            },
            GloveEvent::Accelerometer(v) => format!("[accel] {:.3} {:.3} {:.3}", v.x, v.y, v.z),
            GloveEvent::Gyroscope(v) => format!("[gyro] {:.3} {:.3} {:.3}", v.x, v.y, v.z),
            GloveEvent::Magnetometer(v) => format!("[mag] {:.3} {:.3} {:.3}", v.x, v.y, v.z),
            GloveEvent::Imu(imu) => format!(
                "[imu] accel=({:.3}, {:.3}, {:.3}) gyro=({:.3}, {:.3}, {:.3}) mag=({:.3}, {:.3}, {:.3})",
                imu.accelerometer.x,
                imu.accelerometer.y,
                imu.accelerometer.z,
                imu.gyroscope.x,
                imu.gyroscope.y,
                imu.gyroscope.z,
                imu.magnetometer.x,
                imu.magnetometer.y,
                imu.magnetometer.z
            ),
            GloveEvent::ConnectionState(connected) => {
                format!("[device] {}", if *connected { "connected" } else { "disconnected" })
            },
            GloveEvent::Diagnostic(text) => format!("[diag] {}", text),
        },
    }
}
