//! 入站消息解码
//!
//! 每条入站文本按列表分隔符 `,` 切分，第一个字段是单字符标签：
//!
//! | 标签 | 字段 | 事件 |
//! |---|---|---|
//! | `f` | region, value (int) | [`GloveEvent::Flexor`] |
//! | `a` | x, y, z (float) | [`GloveEvent::Accelerometer`] |
//! | `g` | x, y, z (float) | [`GloveEvent::Gyroscope`] |
//! | `m` | x, y, z (float) | [`GloveEvent::Magnetometer`] |
//! | `z` | ax..mz (9 × float) | [`GloveEvent::Imu`] |
//! | `b` | connected (bool) | [`GloveEvent::ConnectionState`] |
//! | 其他 | - | [`GloveEvent::Diagnostic`]（原始文本） |
//!
//! 已知标签的字段缺失或格式错误时返回 `Err`，由调用方决定如何记录；
//! 未知标签不是错误，服务端可能发送可读的状态文本。

use crate::constants::{BOOL_FALSE, BOOL_TRUE, IMU_BUNDLE_FIELDS, LIST_SEPARATOR};
use crate::line::{format_bool, format_float};
use crate::mnemonics::*;
use crate::ProtocolError;
use std::fmt;

/// 弯曲传感器读数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlexorSample {
    /// 手部区域编号
    pub region: i32,
    /// 原始读数
    pub value: i32,
}

/// 三轴向量（加速度计/陀螺仪/磁力计）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// IMU 综合帧（一次采样的 9 个浮点数）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuBundle {
    pub accelerometer: Vector3,
    pub gyroscope: Vector3,
    pub magnetometer: Vector3,
}

impl ImuBundle {
    /// 按线上顺序展开：ax, ay, az, gx, gy, gz, mx, my, mz
    pub fn to_array(self) -> [f32; IMU_BUNDLE_FIELDS] {
        let [ax, ay, az] = self.accelerometer.to_array();
        let [gx, gy, gz] = self.gyroscope.to_array();
        let [mx, my, mz] = self.magnetometer.to_array();
        [ax, ay, az, gx, gy, gz, mx, my, mz]
    }

    pub fn from_array(values: [f32; IMU_BUNDLE_FIELDS]) -> Self {
        let [ax, ay, az, gx, gy, gz, mx, my, mz] = values;
        Self {
            accelerometer: Vector3::new(ax, ay, az),
            gyroscope: Vector3::new(gx, gy, gz),
            magnetometer: Vector3::new(mx, my, mz),
        }
    }
}

/// 入站事件
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GloveEvent {
    Flexor(FlexorSample),
    Accelerometer(Vector3),
    Gyroscope(Vector3),
    Magnetometer(Vector3),
    Imu(ImuBundle),
    /// 蓝牙外设连接状态
    ConnectionState(bool),
    /// 未识别的文本（原样保留）
    Diagnostic(String),
}

impl GloveEvent {
    /// 重新编码为入站线格式
    ///
    /// 主要用于测试与模拟服务端。`Diagnostic` 原样返回。
    pub fn to_line(&self) -> String {
        let vector = |tag: &str, v: &Vector3| {
            format!(
                "{tag},{},{},{}",
                format_float(v.x),
                format_float(v.y),
                format_float(v.z)
            )
        };
        match self {
            GloveEvent::Flexor(sample) => {
                format!("{TAG_FLEXOR},{},{}", sample.region, sample.value)
            },
            GloveEvent::Accelerometer(v) => vector(TAG_ACCELEROMETER, v),
            GloveEvent::Gyroscope(v) => vector(TAG_GYROSCOPE, v),
            GloveEvent::Magnetometer(v) => vector(TAG_MAGNETOMETER, v),
            GloveEvent::Imu(bundle) => {
                let mut line = TAG_IMU_BUNDLE.to_string();
                for value in bundle.to_array() {
                    line.push(LIST_SEPARATOR);
                    line.push_str(&format_float(value));
                }
                line
            },
            GloveEvent::ConnectionState(connected) => {
                format!("{TAG_CONNECTION_STATE},{}", format_bool(*connected))
            },
            GloveEvent::Diagnostic(text) => text.clone(),
        }
    }
}

impl fmt::Display for GloveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

impl TryFrom<&str> for GloveEvent {
    type Error = ProtocolError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        decode_line(line)
    }
}

/// 解码一行入站文本
///
/// # Example
///
/// ```
/// use openglove_protocol::{FlexorSample, GloveEvent, decode_line};
///
/// let event = decode_line("f,3,512").unwrap();
/// assert_eq!(event, GloveEvent::Flexor(FlexorSample { region: 3, value: 512 }));
///
/// // 未知标签作为诊断文本
/// let event = decode_line("Glove connected").unwrap();
/// assert_eq!(event, GloveEvent::Diagnostic("Glove connected".to_string()));
///
/// // 已知标签但字段错误
/// assert!(decode_line("f,abc").is_err());
/// ```
pub fn decode_line(line: &str) -> Result<GloveEvent, ProtocolError> {
    let mut tokens = line.split(LIST_SEPARATOR);
    let tag = tokens.next().unwrap_or_default();
    let fields: Vec<&str> = tokens.collect();

    let event = match tag {
        TAG_FLEXOR => {
            expect_fields(tag, &fields, 2)?;
            GloveEvent::Flexor(FlexorSample {
                region: parse_i32("region", fields[0])?,
                value: parse_i32("value", fields[1])?,
            })
        },
        TAG_ACCELEROMETER => GloveEvent::Accelerometer(parse_vector(tag, &fields)?),
        TAG_GYROSCOPE => GloveEvent::Gyroscope(parse_vector(tag, &fields)?),
        TAG_MAGNETOMETER => GloveEvent::Magnetometer(parse_vector(tag, &fields)?),
        TAG_IMU_BUNDLE => {
            expect_fields(tag, &fields, IMU_BUNDLE_FIELDS)?;
            let mut values = [0.0f32; IMU_BUNDLE_FIELDS];
            for (slot, token) in values.iter_mut().zip(&fields) {
                *slot = parse_f32("imu", token)?;
            }
            GloveEvent::Imu(ImuBundle::from_array(values))
        },
        TAG_CONNECTION_STATE => {
            expect_fields(tag, &fields, 1)?;
            GloveEvent::ConnectionState(parse_bool("connected", fields[0])?)
        },
        _ => GloveEvent::Diagnostic(line.to_string()),
    };

    Ok(event)
}

fn expect_fields(tag: &str, fields: &[&str], expected: usize) -> Result<(), ProtocolError> {
    if fields.len() != expected {
        return Err(ProtocolError::FieldCount {
            tag: tag.to_string(),
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

fn parse_vector(tag: &str, fields: &[&str]) -> Result<Vector3, ProtocolError> {
    expect_fields(tag, fields, 3)?;
    Ok(Vector3 {
        x: parse_f32("x", fields[0])?,
        y: parse_f32("y", fields[1])?,
        z: parse_f32("z", fields[2])?,
    })
}

fn parse_i32(field: &'static str, token: &str) -> Result<i32, ProtocolError> {
    token
        .trim()
        .parse::<i32>()
        .map_err(|_| ProtocolError::InvalidNumber {
            field,
            value: token.to_string(),
        })
}

/// 浮点数解析（与区域设置无关，`.` 为小数点）
fn parse_f32(field: &'static str, token: &str) -> Result<f32, ProtocolError> {
    token
        .trim()
        .parse::<f32>()
        .map_err(|_| ProtocolError::InvalidNumber {
            field,
            value: token.to_string(),
        })
}

/// 布尔值解析（大小写不敏感，忽略首尾空白）
pub(crate) fn parse_bool(field: &'static str, token: &str) -> Result<bool, ProtocolError> {
    let trimmed = token.trim();
    if trimmed.eq_ignore_ascii_case(BOOL_TRUE) {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case(BOOL_FALSE) {
        Ok(false)
    } else {
        Err(ProtocolError::InvalidBool {
            field,
            value: token.to_string(),
        })
    }
}
