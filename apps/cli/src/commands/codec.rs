//! 离线编解码命令
//!
//! 不连接服务端，只做线格式检查。

use anyhow::{Context, Result, bail};
use clap::Args;
use openglove_sdk::protocol::{Command, GloveEvent, decode_line};
use std::io::{self, BufRead};

/// 编码命令参数
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// 命令行（如 "aal;OpenGlove-Left;0,1;11,10;15,16"）
    #[arg(required = true)]
    pub lines: Vec<String>,
}

impl EncodeCommand {
    pub fn execute(&self) -> Result<()> {
        for line in &self.lines {
            println!("{}", encode_line(line)?);
        }
        Ok(())
    }
}

/// 解析、校验并重新编码
pub fn encode_line(line: &str) -> Result<String> {
    let command = parse_command(line)?;
    Ok(command.encode())
}

/// 解析并校验一条命令
pub fn parse_command(line: &str) -> Result<Command> {
    let command =
        Command::parse(line.trim()).with_context(|| format!("无效命令: {:?}", line))?;
    command
        .validate()
        .with_context(|| format!("命令参数校验失败: {:?}", line))?;
    Ok(command)
}

/// 解码命令参数
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 入站消息（省略时从标准输入逐行读取）
    pub lines: Vec<String>,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl DecodeCommand {
    pub fn execute(&self) -> Result<()> {
        let lines: Vec<String> = if self.lines.is_empty() {
            io::stdin()
                .lock()
                .lines()
                .collect::<io::Result<_>>()
                .context("读取标准输入失败")?
        } else {
            self.lines.clone()
        };

        let mut failures = 0usize;
        for line in &lines {
            match decode_line(line) {
                Ok(event) => println!("{}", render_event(&event, self.json)?),
                Err(e) => {
                    eprintln!("❌ {:?}: {}", line, e);
                    failures += 1;
                },
            }
        }

        if failures > 0 {
            bail!("{} 行解码失败", failures);
        }
        Ok(())
    }
}

fn render_event(event: &GloveEvent, json: bool) -> Result<String> {
    if json {
        serde_json::to_string(event).context("序列化事件失败")
    } else {
        Ok(format!("{:?}", event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_trims_line() {
        assert_eq!(
            encode_line("  st;OpenGlove-Left;40\n").unwrap(),
            "st;OpenGlove-Left;40"
        );
    }

    #[test]
    fn test_encode_rejects_unknown_mnemonic() {
        let err = encode_line("zz;OpenGlove-Left").unwrap_err();
        assert!(err.to_string().contains("无效命令"));
    }

    #[test]
    fn test_encode_rejects_misaligned_lists() {
        let err = encode_line("afl;OpenGlove-Left;0,1;17").unwrap_err();
        assert!(err.to_string().contains("校验失败"));
    }

    #[test]
    fn test_render_event_json() {
        let event = decode_line("b,true").unwrap();
        let json = render_event(&event, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.is_object());
        assert!(render_event(&event, false).unwrap().contains("ConnectionState"));
    }
}
