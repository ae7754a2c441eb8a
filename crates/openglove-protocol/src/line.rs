//! 文本行构建
//!
//! 出站命令的通用编码器：`助记符;参数0;参数1;...`，列表参数内部用 `,` 连接后占用一个字段。
//! 数值一律使用与区域设置无关的格式（小数点固定为 `.`）。

use crate::constants::{BOOL_FALSE, BOOL_TRUE, FIELD_SEPARATOR, LIST_SEPARATOR};
use std::fmt;

/// 标量参数
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => f.write_str(&format_float(v)),
            Scalar::Bool(v) => f.write_str(format_bool(*v)),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<&String> for Scalar {
    fn from(value: &String) -> Self {
        Scalar::Str(value.clone())
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<&i32> for Scalar {
    fn from(value: &i32) -> Self {
        Scalar::Int(*value as i64)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// 命令参数：标量，或同类标量组成的列表
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arg {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl Arg {
    /// 创建标量参数
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Arg::Scalar(value.into())
    }

    /// 创建列表参数
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Arg::List(values.into_iter().map(Into::into).collect())
    }
}

/// 出站命令行构建器
///
/// # Example
///
/// ```
/// use openglove_protocol::LineBuilder;
///
/// let line = LineBuilder::new("aal")
///     .field("OpenGlove-Left")
///     .list([1, 2])
///     .list([3, 5])
///     .list([4, 6])
///     .finish();
/// assert_eq!(line, "aal;OpenGlove-Left;1,2;3,5;4,6");
/// ```
#[derive(Debug, Clone)]
pub struct LineBuilder {
    line: String,
}

impl LineBuilder {
    /// 以助记符开始一行
    pub fn new(mnemonic: &str) -> Self {
        Self {
            line: mnemonic.to_string(),
        }
    }

    /// 追加一个标量字段
    pub fn field(mut self, value: impl Into<Scalar>) -> Self {
        self.line.push(FIELD_SEPARATOR);
        self.line.push_str(&value.into().to_string());
        self
    }

    /// 追加一个列表字段（元素之间用列表分隔符连接）
    pub fn list<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        self.line.push(FIELD_SEPARATOR);
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.line.push(LIST_SEPARATOR);
            }
            self.line.push_str(&value.into().to_string());
        }
        self
    }

    /// 追加一个通用参数
    pub fn arg(self, arg: &Arg) -> Self {
        match arg {
            Arg::Scalar(value) => self.field(value.clone()),
            Arg::List(values) => self.list(values.iter().cloned()),
        }
    }

    /// 完成构建
    pub fn finish(self) -> String {
        self.line
    }
}

/// 通用编码：`mnemonic` 加任意参数序列
///
/// 不做任何校验；参数中的保留字符会原样写出。
pub fn encode(mnemonic: &str, args: &[Arg]) -> String {
    args.iter()
        .fold(LineBuilder::new(mnemonic), |builder, arg| builder.arg(arg))
        .finish()
}

/// 与区域设置无关的浮点数格式
///
/// 小数点固定为 `.`，不使用科学计数法，整数值补 `.0`（`1` → `1.0`）。
/// 非有限值（`NaN`/`inf`）原样输出。
pub fn format_float<T: fmt::Display>(value: T) -> String {
    let mut text = value.to_string();
    let integral = !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'-' || b == b'+');
    if integral {
        text.push_str(".0");
    }
    text
}

/// 布尔值的线上格式
pub fn format_bool(value: bool) -> &'static str {
    if value { BOOL_TRUE } else { BOOL_FALSE }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_integral() {
        assert_eq!(format_float(1.0f64), "1.0");
        assert_eq!(format_float(-3.0f32), "-3.0");
        assert_eq!(format_float(0.0f64), "0.0");
    }

    #[test]
    fn test_format_float_fractional() {
        assert_eq!(format_float(0.25f64), "0.25");
        assert_eq!(format_float(-12.5f32), "-12.5");
        // f32 直接格式化，不经过 f64 放大误差
        assert_eq!(format_float(0.1f32), "0.1");
    }

    #[test]
    fn test_format_float_never_uses_exponent() {
        let text = format_float(1e20f64);
        assert!(!text.contains('e'));
        assert!(text.ends_with(".0"));
    }

    #[test]
    fn test_format_bool() {
        assert_eq!(format_bool(true), "true");
        assert_eq!(format_bool(false), "false");
    }

    #[test]
    fn test_builder_scalars() {
        let line = LineBuilder::new("aa")
            .field("left")
            .field(1)
            .field(3)
            .field(4)
            .finish();
        assert_eq!(line, "aa;left;1;3;4");
    }

    #[test]
    fn test_builder_empty_list() {
        let line = LineBuilder::new("ral")
            .field("left")
            .list(Vec::<i32>::new())
            .finish();
        assert_eq!(line, "ral;left;");
    }

    #[test]
    fn test_builder_mixed_scalars() {
        let line = LineBuilder::new("x")
            .field(true)
            .field(2.5f64)
            .list(["a", "b"])
            .finish();
        assert_eq!(line, "x;true;2.5;a,b");
    }

    #[test]
    fn test_encode_generic() {
        let args = [
            Arg::scalar("left"),
            Arg::list([1, 2, 3]),
            Arg::list(["10", "20", "30"]),
        ];
        assert_eq!(encode("aca", &args), "aca;left;1,2,3;10,20,30");
    }

    #[test]
    fn test_encode_without_args() {
        assert_eq!(encode("v", &[]), "v");
    }
}
