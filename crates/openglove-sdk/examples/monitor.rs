//! 传感器监视示例
//!
//! 连接 OpenGlove 服务，订阅弯曲传感器与 IMU 数据并打印，
//! 到时后关闭会话并输出统计。
//!
//! ```bash
//! cargo run -p openglove-sdk --example monitor -- --url ws://localhost:9876 --device OpenGlove-Left
//! ```

use clap::Parser;
use openglove_sdk::prelude::*;
use std::time::{Duration, Instant};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "monitor")]
#[command(about = "监视手套的弯曲传感器与 IMU 数据")]
struct Args {
    /// 服务地址
    #[arg(long, default_value = "ws://localhost:9876")]
    url: String,

    /// 设备名
    #[arg(long, default_value = "OpenGlove-Left")]
    device: String,

    /// 监视时长（秒）
    #[arg(long, default_value = "10")]
    duration_sec: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    openglove_sdk::init_logger();
    let args = Args::parse();

    println!("🧤 OpenGlove SDK - 传感器监视");
    println!("=========================\n");

    println!("📡 连接 {} ...", args.url);
    let session = SessionBuilder::new(&args.url, &args.device)
        .on_open(|| println!("   ✅ 连接已建立"))
        .connect()?;
    session.wait_for_connection(Duration::from_secs(5))?;

    session.on_flexor(|sample| {
        println!("   ✋ flexor region={} value={}", sample.region, sample.value);
    });
    session.on_imu(|imu| {
        let a = imu.accelerometer;
        println!("   🧭 imu accel=({:.3}, {:.3}, {:.3})", a.x, a.y, a.z);
    });
    session.on_connection_state(|connected| println!("   🔌 外设连接: {}", connected));
    session.on_diagnostic(|text| println!("   📝 {}", text));
    session.on_close(|reason| println!("   ⛔ 会话关闭: {}", reason));

    session.turn_on_flexors(&args.device)?;
    session.start_imu(&args.device)?;
    session.set_imu_status(&args.device, true)?;

    let deadline = Instant::now() + Duration::from_secs(args.duration_sec);
    while Instant::now() < deadline && session.connection_state() != ConnectionState::Disconnected
    {
        std::thread::sleep(Duration::from_millis(100));
    }

    // 服务端已断开时不再下发停止命令
    if session.connection_state() == ConnectionState::Connected {
        session.set_imu_status(&args.device, false)?;
        session.turn_off_flexors(&args.device)?;
    }
    session.close()?;

    let metrics = session.metrics();
    println!(
        "\n📊 收到 {} 行，分发 {} 个事件，格式错误 {} 行 ({:.1}%)",
        metrics.lines_received,
        metrics.events_dispatched,
        metrics.decode_errors,
        metrics.decode_error_rate()
    );
    Ok(())
}
