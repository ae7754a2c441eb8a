//! # OpenGlove CLI
//!
//! OpenGlove 远程服务的命令行工具。
//!
//! ## 双模式架构
//!
//! ### One-shot 模式（推荐用于脚本）
//!
//! ```bash
//! # 配置默认服务地址和设备
//! openglove-cli config set --url ws://localhost:7070/glove --device OpenGlove-Left
//!
//! # 发送一条命令（内部：连接 -> 启动序列 -> 发送 -> 断开）
//! openglove-cli send "st;OpenGlove-Left;40"
//!
//! # 打印遥测
//! openglove-cli monitor --duration 10
//! ```
//!
//! ### REPL 模式（推荐用于调试）
//!
//! ```bash
//! $ openglove-cli shell
//! glove> connect
//! glove> af;OpenGlove-Left;0;17
//! glove> status
//! glove> exit
//! ```
//!
//! ### 离线工具
//!
//! ```bash
//! openglove-cli encode "aal;OpenGlove-Left;0,1;11,10;15,16"
//! openglove-cli decode "z,1.0,2.0,3.0,4.0,5.0,6.0,7.0,8.0,9.0" --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod modes;

use commands::{ConfigCommand, ConnectArgs, DecodeCommand, EncodeCommand, MonitorCommand, SendCommand};
use modes::repl::run_repl;

/// OpenGlove CLI - 数据手套远程服务命令行工具
#[derive(Parser, Debug)]
#[command(name = "openglove-cli")]
#[command(about = "Command-line interface for the OpenGlove remote service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 连接服务并打印收到的事件
    Monitor {
        #[command(flatten)]
        args: MonitorCommand,
    },

    /// 发送一条或多条命令
    Send {
        #[command(flatten)]
        args: SendCommand,
    },

    /// 启动交互式 Shell（REPL 模式）
    Shell {
        #[command(flatten)]
        connect: ConnectArgs,
    },

    /// 把命令行编码为线格式（离线）
    Encode {
        #[command(flatten)]
        args: EncodeCommand,
    },

    /// 解码一条入站消息（离线）
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openglove_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),
        Commands::Monitor { args } => args.execute(),
        Commands::Send { args } => args.execute(),
        Commands::Shell { connect } => run_repl(connect),
        Commands::Encode { args } => args.execute(),
        Commands::Decode { args } => args.execute(),
    }
}
