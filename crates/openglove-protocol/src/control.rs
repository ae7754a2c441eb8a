//! 出站命令定义
//!
//! 每个命令对应一个助记符，第一个参数总是目标设备名（蓝牙外设标识，原样透传）。
//! `Command::encode()` 是纯函数，不做范围或对齐校验；`Command::validate()` 单独提供
//! 并行列表对齐与保留字符检查，由会话层在发送前调用。

use crate::constants::{FIELD_SEPARATOR, LIST_SEPARATOR, contains_reserved};
use crate::line::LineBuilder;
use crate::mnemonics::*;
use crate::{ProtocolError, feedback::parse_bool};
use std::fmt;
use std::str::FromStr;

/// 出站命令
///
/// # Example
///
/// ```
/// use openglove_protocol::Command;
///
/// let cmd = Command::AddActuator {
///     device: "OpenGlove-Left".to_string(),
///     region: 3,
///     positive_pin: 11,
///     negative_pin: 12,
/// };
/// assert_eq!(cmd.encode(), "aa;OpenGlove-Left;3;11;12");
/// assert_eq!(cmd.encode().parse::<Command>().unwrap(), cmd);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    // === 会话与设备管理 ===
    StartGlove {
        device: String,
        configuration: String,
    },
    StopGlove {
        device: String,
    },
    /// 在服务端注册设备（会话建立后第一条命令）
    AddDevice {
        device: String,
    },
    RemoveDevice {
        device: String,
    },
    SaveConfiguration {
        device: String,
        configuration: String,
    },
    ConnectDevice {
        device: String,
    },
    DisconnectDevice {
        device: String,
    },
    /// 开始采集遥测（必须在 `AddDevice` 之后发送）
    StartCapture {
        device: String,
    },
    StopCapture {
        device: String,
    },

    // === 振动执行器 ===
    AddActuator {
        device: String,
        region: i32,
        positive_pin: i32,
        negative_pin: i32,
    },
    /// 批量添加执行器，三个列表按下标对齐
    AddActuators {
        device: String,
        regions: Vec<i32>,
        positive_pins: Vec<i32>,
        negative_pins: Vec<i32>,
    },
    RemoveActuator {
        device: String,
        region: i32,
    },
    RemoveActuators {
        device: String,
        regions: Vec<i32>,
    },
    /// 按区域激活执行器，`intensities[i]` 对应 `regions[i]`
    ActivateActuators {
        device: String,
        regions: Vec<i32>,
        intensities: Vec<String>,
    },
    TurnOnActuators {
        device: String,
    },
    TurnOffActuators {
        device: String,
    },
    ResetActuators {
        device: String,
    },

    // === 弯曲传感器 ===
    AddFlexor {
        device: String,
        region: i32,
        pin: i32,
    },
    AddFlexors {
        device: String,
        regions: Vec<i32>,
        pins: Vec<i32>,
    },
    RemoveFlexor {
        device: String,
        region: i32,
    },
    RemoveFlexors {
        device: String,
        regions: Vec<i32>,
    },
    CalibrateFlexors {
        device: String,
    },
    ConfirmCalibration {
        device: String,
    },
    SetThreshold {
        device: String,
        value: i32,
    },
    TurnOnFlexors {
        device: String,
    },
    TurnOffFlexors {
        device: String,
    },
    ResetFlexors {
        device: String,
    },

    // === IMU 与固件 ===
    StartImu {
        device: String,
    },
    SetImuStatus {
        device: String,
        enabled: bool,
    },
    SetRawData {
        device: String,
        enabled: bool,
    },
    SetImuChoosingData {
        device: String,
        mode: i32,
    },
    CalibrateImu {
        device: String,
    },
    SetLoopDelay {
        device: String,
        delay: i32,
    },
    GetVersion {
        device: String,
    },
}

impl Command {
    /// 命令助记符（线上第一个字段）
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Command::StartGlove { .. } => MN_START_GLOVE,
            Command::StopGlove { .. } => MN_STOP_GLOVE,
            Command::AddDevice { .. } => MN_ADD_DEVICE,
            Command::RemoveDevice { .. } => MN_REMOVE_DEVICE,
            Command::SaveConfiguration { .. } => MN_SAVE_CONFIGURATION,
            Command::ConnectDevice { .. } => MN_CONNECT_DEVICE,
            Command::DisconnectDevice { .. } => MN_DISCONNECT_DEVICE,
            Command::StartCapture { .. } => MN_START_CAPTURE,
            Command::StopCapture { .. } => MN_STOP_CAPTURE,
            Command::AddActuator { .. } => MN_ADD_ACTUATOR,
            Command::AddActuators { .. } => MN_ADD_ACTUATORS,
            Command::RemoveActuator { .. } => MN_REMOVE_ACTUATOR,
            Command::RemoveActuators { .. } => MN_REMOVE_ACTUATORS,
            Command::ActivateActuators { .. } => MN_ACTIVATE_ACTUATORS,
            Command::TurnOnActuators { .. } => MN_TURN_ON_ACTUATORS,
            Command::TurnOffActuators { .. } => MN_TURN_OFF_ACTUATORS,
            Command::ResetActuators { .. } => MN_RESET_ACTUATORS,
            Command::AddFlexor { .. } => MN_ADD_FLEXOR,
            Command::AddFlexors { .. } => MN_ADD_FLEXORS,
            Command::RemoveFlexor { .. } => MN_REMOVE_FLEXOR,
            Command::RemoveFlexors { .. } => MN_REMOVE_FLEXORS,
            Command::CalibrateFlexors { .. } => MN_CALIBRATE_FLEXORS,
            Command::ConfirmCalibration { .. } => MN_CONFIRM_CALIBRATION,
            Command::SetThreshold { .. } => MN_SET_THRESHOLD,
            Command::TurnOnFlexors { .. } => MN_TURN_ON_FLEXORS,
            Command::TurnOffFlexors { .. } => MN_TURN_OFF_FLEXORS,
            Command::ResetFlexors { .. } => MN_RESET_FLEXORS,
            Command::StartImu { .. } => MN_START_IMU,
            Command::SetImuStatus { .. } => MN_SET_IMU_STATUS,
            Command::SetRawData { .. } => MN_SET_RAW_DATA,
            Command::SetImuChoosingData { .. } => MN_SET_IMU_CHOOSING_DATA,
            Command::CalibrateImu { .. } => MN_CALIBRATE_IMU,
            Command::SetLoopDelay { .. } => MN_SET_LOOP_DELAY,
            Command::GetVersion { .. } => MN_GET_VERSION,
        }
    }

    /// 目标设备名
    pub fn device(&self) -> &str {
        match self {
            Command::StartGlove { device, .. }
            | Command::StopGlove { device }
            | Command::AddDevice { device }
            | Command::RemoveDevice { device }
            | Command::SaveConfiguration { device, .. }
            | Command::ConnectDevice { device }
            | Command::DisconnectDevice { device }
            | Command::StartCapture { device }
            | Command::StopCapture { device }
            | Command::AddActuator { device, .. }
            | Command::AddActuators { device, .. }
            | Command::RemoveActuator { device, .. }
            | Command::RemoveActuators { device, .. }
            | Command::ActivateActuators { device, .. }
            | Command::TurnOnActuators { device }
            | Command::TurnOffActuators { device }
            | Command::ResetActuators { device }
            | Command::AddFlexor { device, .. }
            | Command::AddFlexors { device, .. }
            | Command::RemoveFlexor { device, .. }
            | Command::RemoveFlexors { device, .. }
            | Command::CalibrateFlexors { device }
            | Command::ConfirmCalibration { device }
            | Command::SetThreshold { device, .. }
            | Command::TurnOnFlexors { device }
            | Command::TurnOffFlexors { device }
            | Command::ResetFlexors { device }
            | Command::StartImu { device }
            | Command::SetImuStatus { device, .. }
            | Command::SetRawData { device, .. }
            | Command::SetImuChoosingData { device, .. }
            | Command::CalibrateImu { device }
            | Command::SetLoopDelay { device, .. }
            | Command::GetVersion { device } => device,
        }
    }

    /// 编码为一行线上文本
    ///
    /// 纯函数，从不失败。并行列表长度不一致时按原样输出（错位由调用方负责）。
    pub fn encode(&self) -> String {
        let builder = LineBuilder::new(self.mnemonic()).field(self.device());
        let builder = match self {
            Command::StartGlove { configuration, .. }
            | Command::SaveConfiguration { configuration, .. } => builder.field(configuration),
            Command::AddActuator {
                region,
                positive_pin,
                negative_pin,
                ..
            } => builder
                .field(*region)
                .field(*positive_pin)
                .field(*negative_pin),
            Command::AddActuators {
                regions,
                positive_pins,
                negative_pins,
                ..
            } => builder
                .list(regions)
                .list(positive_pins)
                .list(negative_pins),
            Command::RemoveActuator { region, .. } | Command::RemoveFlexor { region, .. } => {
                builder.field(*region)
            },
            Command::RemoveActuators { regions, .. } | Command::RemoveFlexors { regions, .. } => {
                builder.list(regions)
            },
            Command::ActivateActuators {
                regions,
                intensities,
                ..
            } => builder.list(regions).list(intensities),
            Command::AddFlexor { region, pin, .. } => builder.field(*region).field(*pin),
            Command::AddFlexors { regions, pins, .. } => builder.list(regions).list(pins),
            Command::SetThreshold { value, .. } => builder.field(*value),
            Command::SetImuStatus { enabled, .. } | Command::SetRawData { enabled, .. } => {
                builder.field(*enabled)
            },
            Command::SetImuChoosingData { mode, .. } => builder.field(*mode),
            Command::SetLoopDelay { delay, .. } => builder.field(*delay),
            _ => builder,
        };
        builder.finish()
    }

    /// 校验命令能否被无损编码
    ///
    /// - 并行列表长度必须一致（以第一个列表为准）
    /// - 字符串值中不能出现保留分隔符，字符串列表元素不能为空
    ///
    /// 设备名不在校验范围内，原样透传。
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Command::StartGlove { configuration, .. }
            | Command::SaveConfiguration { configuration, .. } => {
                check_reserved("configuration", configuration)
            },
            Command::AddActuators {
                regions,
                positive_pins,
                negative_pins,
                ..
            } => {
                check_aligned(self.mnemonic(), regions.len(), positive_pins.len())?;
                check_aligned(self.mnemonic(), regions.len(), negative_pins.len())
            },
            Command::ActivateActuators {
                regions,
                intensities,
                ..
            } => {
                check_aligned(self.mnemonic(), regions.len(), intensities.len())?;
                intensities.iter().try_for_each(|intensity| {
                    if intensity.is_empty() {
                        return Err(ProtocolError::EmptyListElement {
                            command: self.mnemonic(),
                            field: "intensities",
                        });
                    }
                    check_reserved("intensities", intensity)
                })
            },
            Command::AddFlexors { regions, pins, .. } => {
                check_aligned(self.mnemonic(), regions.len(), pins.len())
            },
            _ => Ok(()),
        }
    }

    /// 从线上文本解析命令（`encode` 的逆操作）
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        line.parse()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn check_reserved(field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if contains_reserved(value) {
        return Err(ProtocolError::ReservedCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_aligned(
    command: &'static str,
    expected: usize,
    actual: usize,
) -> Result<(), ProtocolError> {
    if expected != actual {
        return Err(ProtocolError::ListLengthMismatch {
            command,
            expected,
            actual,
        });
    }
    Ok(())
}

/// 助记符对应的参数个数（不含助记符，含设备名）
fn arity(mnemonic: &str) -> Option<usize> {
    let n = match mnemonic {
        MN_STOP_GLOVE | MN_ADD_DEVICE | MN_REMOVE_DEVICE | MN_CONNECT_DEVICE
        | MN_DISCONNECT_DEVICE | MN_START_CAPTURE | MN_STOP_CAPTURE | MN_TURN_ON_ACTUATORS
        | MN_TURN_OFF_ACTUATORS | MN_RESET_ACTUATORS | MN_CALIBRATE_FLEXORS
        | MN_CONFIRM_CALIBRATION | MN_TURN_ON_FLEXORS | MN_TURN_OFF_FLEXORS
        | MN_RESET_FLEXORS | MN_START_IMU | MN_CALIBRATE_IMU | MN_GET_VERSION => 1,
        MN_START_GLOVE | MN_SAVE_CONFIGURATION | MN_REMOVE_ACTUATOR | MN_REMOVE_ACTUATORS
        | MN_REMOVE_FLEXOR | MN_REMOVE_FLEXORS | MN_SET_THRESHOLD | MN_SET_IMU_STATUS
        | MN_SET_RAW_DATA | MN_SET_IMU_CHOOSING_DATA | MN_SET_LOOP_DELAY => 2,
        MN_ACTIVATE_ACTUATORS | MN_ADD_FLEXOR | MN_ADD_FLEXORS => 3,
        MN_ADD_ACTUATOR | MN_ADD_ACTUATORS => 4,
        _ => return None,
    };
    Some(n)
}

/// 按顺序读取命令字段
struct Fields<'a> {
    tokens: std::vec::IntoIter<&'a str>,
}

impl<'a> Fields<'a> {
    fn next_str(&mut self) -> &'a str {
        // 字段数已在解析入口按 arity 校验
        self.tokens.next().unwrap_or_default()
    }

    fn next_string(&mut self) -> String {
        self.next_str().to_string()
    }

    fn next_int(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        parse_int(field, self.next_str())
    }

    fn next_bool(&mut self, field: &'static str) -> Result<bool, ProtocolError> {
        parse_bool(field, self.next_str())
    }

    fn next_int_list(&mut self, field: &'static str) -> Result<Vec<i32>, ProtocolError> {
        let token = self.next_str();
        if token.is_empty() {
            return Ok(Vec::new());
        }
        token
            .split(LIST_SEPARATOR)
            .map(|item| parse_int(field, item))
            .collect()
    }

    fn next_string_list(&mut self) -> Vec<String> {
        let token = self.next_str();
        if token.is_empty() {
            return Vec::new();
        }
        token.split(LIST_SEPARATOR).map(str::to_string).collect()
    }
}

fn parse_int(field: &'static str, token: &str) -> Result<i32, ProtocolError> {
    token
        .trim()
        .parse::<i32>()
        .map_err(|_| ProtocolError::InvalidNumber {
            field,
            value: token.to_string(),
        })
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        if line.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let tokens: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let mnemonic = tokens[0];
        let expected = arity(mnemonic)
            .ok_or_else(|| ProtocolError::UnknownMnemonic(mnemonic.to_string()))?;
        let actual = tokens.len() - 1;
        if actual != expected {
            return Err(ProtocolError::FieldCount {
                tag: mnemonic.to_string(),
                expected,
                actual,
            });
        }

        let mut fields = Fields {
            tokens: tokens[1..].to_vec().into_iter(),
        };
        let device = fields.next_string();

        let command = match mnemonic {
            MN_START_GLOVE => Command::StartGlove {
                device,
                configuration: fields.next_string(),
            },
            MN_STOP_GLOVE => Command::StopGlove { device },
            MN_ADD_DEVICE => Command::AddDevice { device },
            MN_REMOVE_DEVICE => Command::RemoveDevice { device },
            MN_SAVE_CONFIGURATION => Command::SaveConfiguration {
                device,
                configuration: fields.next_string(),
            },
            MN_CONNECT_DEVICE => Command::ConnectDevice { device },
            MN_DISCONNECT_DEVICE => Command::DisconnectDevice { device },
            MN_START_CAPTURE => Command::StartCapture { device },
            MN_STOP_CAPTURE => Command::StopCapture { device },
            MN_ADD_ACTUATOR => Command::AddActuator {
                device,
                region: fields.next_int("region")?,
                positive_pin: fields.next_int("positive_pin")?,
                negative_pin: fields.next_int("negative_pin")?,
            },
            MN_ADD_ACTUATORS => Command::AddActuators {
                device,
                regions: fields.next_int_list("regions")?,
                positive_pins: fields.next_int_list("positive_pins")?,
                negative_pins: fields.next_int_list("negative_pins")?,
            },
            MN_REMOVE_ACTUATOR => Command::RemoveActuator {
                device,
                region: fields.next_int("region")?,
            },
            MN_REMOVE_ACTUATORS => Command::RemoveActuators {
                device,
                regions: fields.next_int_list("regions")?,
            },
            MN_ACTIVATE_ACTUATORS => Command::ActivateActuators {
                device,
                regions: fields.next_int_list("regions")?,
                intensities: fields.next_string_list(),
            },
            MN_TURN_ON_ACTUATORS => Command::TurnOnActuators { device },
            MN_TURN_OFF_ACTUATORS => Command::TurnOffActuators { device },
            MN_RESET_ACTUATORS => Command::ResetActuators { device },
            MN_ADD_FLEXOR => Command::AddFlexor {
                device,
                region: fields.next_int("region")?,
                pin: fields.next_int("pin")?,
            },
            MN_ADD_FLEXORS => Command::AddFlexors {
                device,
                regions: fields.next_int_list("regions")?,
                pins: fields.next_int_list("pins")?,
            },
            MN_REMOVE_FLEXOR => Command::RemoveFlexor {
                device,
                region: fields.next_int("region")?,
            },
            MN_REMOVE_FLEXORS => Command::RemoveFlexors {
                device,
                regions: fields.next_int_list("regions")?,
            },
            MN_CALIBRATE_FLEXORS => Command::CalibrateFlexors { device },
            MN_CONFIRM_CALIBRATION => Command::ConfirmCalibration { device },
            MN_SET_THRESHOLD => Command::SetThreshold {
                device,
                value: fields.next_int("value")?,
            },
            MN_TURN_ON_FLEXORS => Command::TurnOnFlexors { device },
            MN_TURN_OFF_FLEXORS => Command::TurnOffFlexors { device },
            MN_RESET_FLEXORS => Command::ResetFlexors { device },
            MN_START_IMU => Command::StartImu { device },
            MN_SET_IMU_STATUS => Command::SetImuStatus {
                device,
                enabled: fields.next_bool("enabled")?,
            },
            MN_SET_RAW_DATA => Command::SetRawData {
                device,
                enabled: fields.next_bool("enabled")?,
            },
            MN_SET_IMU_CHOOSING_DATA => Command::SetImuChoosingData {
                device,
                mode: fields.next_int("mode")?,
            },
            MN_CALIBRATE_IMU => Command::CalibrateImu { device },
            MN_SET_LOOP_DELAY => Command::SetLoopDelay {
                device,
                delay: fields.next_int("delay")?,
            },
            MN_GET_VERSION => Command::GetVersion { device },
            other => return Err(ProtocolError::UnknownMnemonic(other.to_string())),
        };

        Ok(command)
    }
}
