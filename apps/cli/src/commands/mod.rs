//! 命令定义和实现

pub mod codec;
pub mod config;
pub mod monitor;
pub mod send;

pub use codec::{DecodeCommand, EncodeCommand};
pub use config::ConfigCommand;
pub use monitor::MonitorCommand;
pub use send::SendCommand;

use anyhow::{Context, Result};
use clap::Args;
use config::{CliConfig, DEFAULT_DEVICE, DEFAULT_URL};
use crossbeam_channel::{Receiver, unbounded};
use openglove_sdk::{PipelineConfig, Session, SessionBuilder, SessionEvent};
use std::time::Duration;

/// 连接参数（覆盖配置文件）
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectArgs {
    /// 服务地址（ws:// 或 wss://）
    #[arg(short, long)]
    pub url: Option<String>,

    /// 设备名
    #[arg(short, long)]
    pub device: Option<String>,

    /// 接收超时（毫秒）
    #[arg(long)]
    pub receive_timeout_ms: Option<u64>,
}

/// 解析后的连接目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub device: String,
    pub receive_timeout_ms: u64,
}

impl ConnectArgs {
    /// 命令行参数优先，其次配置文件，最后默认值
    pub fn resolve(&self) -> Result<Endpoint> {
        Ok(self.resolve_with(&CliConfig::load()?))
    }

    pub fn resolve_with(&self, config: &CliConfig) -> Endpoint {
        let url = self
            .url
            .clone()
            .or_else(|| config.url.clone())
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let device = self
            .device
            .clone()
            .or_else(|| config.device.clone())
            .unwrap_or_else(|| DEFAULT_DEVICE.to_string());
        let receive_timeout_ms = self
            .receive_timeout_ms
            .or(config.receive_timeout_ms)
            .unwrap_or_else(|| PipelineConfig::default().receive_timeout_ms);

        Endpoint {
            url,
            device,
            receive_timeout_ms,
        }
    }
}

impl Endpoint {
    /// 所有事件转发到返回的 channel
    pub fn builder(&self) -> (SessionBuilder, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded();
        let builder = SessionBuilder::new(&self.url, &self.device)
            .receive_timeout(Duration::from_millis(self.receive_timeout_ms))
            .subscribe_all(move |event: &SessionEvent| {
                let _ = tx.send(event.clone());
            });
        (builder, rx)
    }

    /// 连接并等待启动序列完成
    pub fn connect(&self) -> Result<(Session, Receiver<SessionEvent>)> {
        let (builder, rx) = self.builder();
        let session = builder
            .connect()
            .with_context(|| format!("连接 {} 失败", self.url))?;
        session
            .wait_for_connection(Duration::from_secs(5))
            .context("等待会话建立超时")?;
        Ok((session, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let endpoint = ConnectArgs::default().resolve_with(&CliConfig::default());
        assert_eq!(endpoint.url, DEFAULT_URL);
        assert_eq!(endpoint.device, DEFAULT_DEVICE);
        assert_eq!(
            endpoint.receive_timeout_ms,
            PipelineConfig::default().receive_timeout_ms
        );
    }

    #[test]
    fn test_flags_override_config() {
        let config = CliConfig {
            url: Some("ws://config".to_string()),
            device: Some("OpenGlove-Right".to_string()),
            receive_timeout_ms: Some(40),
        };
        let args = ConnectArgs {
            url: Some("ws://flag".to_string()),
            ..Default::default()
        };
        let endpoint = args.resolve_with(&config);
        assert_eq!(endpoint.url, "ws://flag");
        assert_eq!(endpoint.device, "OpenGlove-Right");
        assert_eq!(endpoint.receive_timeout_ms, 40);
    }
}
