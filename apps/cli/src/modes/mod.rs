//! 运行模式
//!
//! - One-shot 模式：每个子命令独立连接（见 `commands`）
//! - REPL 模式：交互式 Shell

pub mod repl;
