//! # OpenGlove Protocol
//!
//! OpenGlove 远程服务的文本线协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `constants`: 分隔符等协议常量
//! - `mnemonics`: 命令助记符与消息标签
//! - `line`: 通用出站行构建器
//! - `control`: 出站命令编码（以及反向解析）
//! - `feedback`: 入站消息解码
//!
//! ## 线格式
//!
//! ```text
//! 出站：<助记符>;<参数0>;<参数1>...      列表参数：<e0>,<e1>... 占一个字段
//! 入站：<标签>,<字段0>,<字段1>...
//! ```
//!
//! 出站使用 `;` 作为主分隔符，入站只使用 `,`。这种不对称来自服务端的历史格式，
//! 修改需要与服务端重新协商。

pub mod constants;
pub mod control;
pub mod feedback;
pub mod line;
pub mod mnemonics;

// 重新导出常用类型
pub use constants::*;
pub use control::Command;
pub use feedback::{FlexorSample, GloveEvent, ImuBundle, Vector3, decode_line};
pub use line::{Arg, LineBuilder, Scalar, encode, format_bool, format_float};
pub use mnemonics::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty line")]
    EmptyLine,

    #[error("Unknown command mnemonic: {0:?}")]
    UnknownMnemonic(String),

    #[error("Invalid field count for {tag:?}: expected {expected}, got {actual}")]
    FieldCount {
        tag: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid number for field {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid boolean for field {field}: {value:?}")]
    InvalidBool { field: &'static str, value: String },

    #[error("List length mismatch in {command}: expected {expected} elements, got {actual}")]
    ListLengthMismatch {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Empty element in list {field} of {command}")]
    EmptyListElement {
        command: &'static str,
        field: &'static str,
    },

    #[error("Reserved separator in field {field}: {value:?}")]
    ReservedCharacter { field: &'static str, value: String },
}
