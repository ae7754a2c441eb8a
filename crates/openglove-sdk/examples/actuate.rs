//! 执行器振动示例
//!
//! 注册两个执行器，按固定周期在两档强度之间切换，结束后关闭执行器。
//!
//! ```bash
//! cargo run -p openglove-sdk --example actuate -- --url ws://localhost:9876 --device OpenGlove-Left
//! ```

use clap::Parser;
use openglove_sdk::prelude::*;
use std::time::Duration;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "actuate")]
#[command(about = "在两个执行器上交替输出振动强度")]
struct Args {
    /// 服务地址
    #[arg(long, default_value = "ws://localhost:9876")]
    url: String,

    /// 设备名
    #[arg(long, default_value = "OpenGlove-Left")]
    device: String,

    /// 切换次数
    #[arg(long, default_value = "10")]
    cycles: u32,

    /// 切换周期（毫秒）
    #[arg(long, default_value = "500")]
    period_ms: u64,
}

// 区域 0/1 对应的正负极引脚
const REGIONS: [i32; 2] = [0, 1];
const POSITIVE_PINS: [i32; 2] = [11, 10];
const NEGATIVE_PINS: [i32; 2] = [15, 16];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    openglove_sdk::init_logger();
    let args = Args::parse();

    println!("🧤 OpenGlove SDK - 执行器振动");
    println!("=========================\n");

    let session = SessionBuilder::new(&args.url, &args.device).connect()?;
    session.wait_for_connection(Duration::from_secs(5))?;
    session.on_error(|message| eprintln!("   ❌ {}", message));
    println!("   ✅ 已连接 {}", args.url);

    session.add_actuators(&args.device, &REGIONS, &POSITIVE_PINS, &NEGATIVE_PINS)?;
    session.turn_on_actuators(&args.device)?;

    let period = Duration::from_millis(args.period_ms);
    for cycle in 0..args.cycles {
        let intensities = if cycle % 2 == 0 {
            ["1.0", "0.0"]
        } else {
            ["0.0", "1.0"]
        };
        println!("   📳 周期 {}: {:?}", cycle, intensities);
        session.activate_actuators(&args.device, &REGIONS, intensities)?;
        std::thread::sleep(period);
    }

    session.activate_actuators(&args.device, &REGIONS, ["0.0", "0.0"])?;
    session.turn_off_actuators(&args.device)?;
    session.close()?;
    println!("\n✅ 完成，共发送 {} 条命令", session.metrics().commands_sent);
    Ok(())
}
