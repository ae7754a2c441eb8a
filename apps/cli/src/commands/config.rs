//! 配置管理命令
//!
//! 用于管理 CLI 配置（服务地址、设备名等）

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认服务地址
pub const DEFAULT_URL: &str = "ws://localhost:7070/glove";

/// 默认设备名
pub const DEFAULT_DEVICE: &str = "OpenGlove-Left";

/// 配置文件路径
fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("openglove");
    Ok(path)
}

pub fn config_file() -> Result<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Ok(path)
}

/// CLI 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 默认服务地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// 默认设备名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// 接收超时（毫秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_timeout_ms: Option<u64>,
}

impl CliConfig {
    /// 加载配置（文件不存在时返回默认配置）
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("读取配置文件失败")?;
        toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))
    }

    /// 保存配置
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# OpenGlove CLI Configuration\n\n{}", body);
        fs::write(path, content).context("写入配置文件失败")?;

        Ok(())
    }
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 服务地址（如 ws://localhost:7070/glove）
        #[arg(short, long)]
        url: Option<String>,

        /// 设备名（如 OpenGlove-Left）
        #[arg(short, long)]
        device: Option<String>,

        /// 接收超时（毫秒）
        #[arg(long)]
        receive_timeout_ms: Option<u64>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置
    Check,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        let path = config_file()?;
        match self {
            ConfigCommand::Set {
                url,
                device,
                receive_timeout_ms,
            } => set_(&path, url, device, receive_timeout_ms),
            ConfigCommand::Get { key } => {
                println!("{}", get_(&CliConfig::load_from(&path)?, &key));
                Ok(())
            },
            ConfigCommand::Check => check_(&path),
        }
    }
}

fn set_(
    path: &Path,
    url: Option<String>,
    device: Option<String>,
    receive_timeout_ms: Option<u64>,
) -> Result<()> {
    let mut config = CliConfig::load_from(path)?;

    if let Some(url) = url {
        println!("✅ 设置服务地址: {}", url);
        config.url = Some(url);
    }

    if let Some(device) = device {
        println!("✅ 设置设备名: {}", device);
        config.device = Some(device);
    }

    if let Some(ms) = receive_timeout_ms {
        println!("✅ 设置接收超时: {}ms", ms);
        config.receive_timeout_ms = Some(ms);
    }

    config.save_to(path)
}

fn get_(config: &CliConfig, key: &str) -> String {
    fn show<T: ToString>(value: &Option<T>) -> String {
        value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "(未设置)".to_string())
    }

    match key {
        "url" => show(&config.url),
        "device" => show(&config.device),
        "receive_timeout_ms" => show(&config.receive_timeout_ms),
        _ => format!(
            "OpenGlove CLI 配置:\n  服务地址: {}\n  设备名: {}\n  接收超时: {}",
            show(&config.url),
            show(&config.device),
            show(&config.receive_timeout_ms)
        ),
    }
}

fn check_(path: &Path) -> Result<()> {
    println!("配置文件: {}", path.display());
    if !path.exists() {
        println!("  (不存在，使用默认值)");
    }
    let config = CliConfig::load_from(path)?;
    println!("  服务地址: {}", config.url.as_deref().unwrap_or(DEFAULT_URL));
    println!("  设备名: {}", config.device.as_deref().unwrap_or(DEFAULT_DEVICE));

    Ok(())
}
