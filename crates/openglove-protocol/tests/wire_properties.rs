//! 线协议的性质测试

use openglove_protocol::{Command, GloveEvent, ProtocolError, Vector3, decode_line, format_float};
use proptest::prelude::*;
use std::collections::HashSet;

fn device_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,16}"
}

fn configuration_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{0,16}"
}

/// 允许空串：空强度元素必须被校验拒绝
fn intensity() -> impl Strategy<Value = String> {
    "[A-Za-z0-9.]{0,6}"
}

/// 只带设备名的命令数量
const DEVICE_ONLY_COUNT: usize = 18;

fn device_only(device: String, index: usize) -> Command {
    match index {
        0 => Command::StopGlove { device },
        1 => Command::AddDevice { device },
        2 => Command::RemoveDevice { device },
        3 => Command::ConnectDevice { device },
        4 => Command::DisconnectDevice { device },
        5 => Command::StartCapture { device },
        6 => Command::StopCapture { device },
        7 => Command::TurnOnActuators { device },
        8 => Command::TurnOffActuators { device },
        9 => Command::ResetActuators { device },
        10 => Command::CalibrateFlexors { device },
        11 => Command::ConfirmCalibration { device },
        12 => Command::TurnOnFlexors { device },
        13 => Command::TurnOffFlexors { device },
        14 => Command::ResetFlexors { device },
        15 => Command::StartImu { device },
        16 => Command::CalibrateImu { device },
        _ => Command::GetVersion { device },
    }
}

fn with_name(device: String, index: usize, configuration: String) -> Command {
    match index {
        0 => Command::StartGlove {
            device,
            configuration,
        },
        _ => Command::SaveConfiguration {
            device,
            configuration,
        },
    }
}

fn with_int(device: String, index: usize, value: i32) -> Command {
    match index {
        0 => Command::RemoveActuator {
            device,
            region: value,
        },
        1 => Command::RemoveFlexor {
            device,
            region: value,
        },
        2 => Command::SetThreshold { device, value },
        3 => Command::SetImuChoosingData {
            device,
            mode: value,
        },
        _ => Command::SetLoopDelay {
            device,
            delay: value,
        },
    }
}

fn with_bool(device: String, index: usize, enabled: bool) -> Command {
    match index {
        0 => Command::SetImuStatus { device, enabled },
        _ => Command::SetRawData { device, enabled },
    }
}

fn with_regions(device: String, index: usize, regions: Vec<i32>) -> Command {
    match index {
        0 => Command::RemoveActuators { device, regions },
        _ => Command::RemoveFlexors { device, regions },
    }
}

fn int_list() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(any::<i32>(), 0..6)
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (device_name(), 0..DEVICE_ONLY_COUNT).prop_map(|(device, i)| device_only(device, i)),
        (device_name(), 0..2usize, configuration_name())
            .prop_map(|(device, i, name)| with_name(device, i, name)),
        (device_name(), 0..5usize, any::<i32>())
            .prop_map(|(device, i, value)| with_int(device, i, value)),
        (device_name(), 0..2usize, any::<bool>())
            .prop_map(|(device, i, enabled)| with_bool(device, i, enabled)),
        (device_name(), 0..2usize, int_list())
            .prop_map(|(device, i, regions)| with_regions(device, i, regions)),
        (device_name(), any::<i32>(), any::<i32>(), any::<i32>()).prop_map(
            |(device, region, positive_pin, negative_pin)| Command::AddActuator {
                device,
                region,
                positive_pin,
                negative_pin,
            }
        ),
        (
            device_name(),
            prop::collection::vec((any::<i32>(), any::<i32>(), any::<i32>()), 0..6)
        )
            .prop_map(|(device, triples)| {
                let mut regions = Vec::new();
                let mut positive_pins = Vec::new();
                let mut negative_pins = Vec::new();
                for (region, positive, negative) in triples {
                    regions.push(region);
                    positive_pins.push(positive);
                    negative_pins.push(negative);
                }
                Command::AddActuators {
                    device,
                    regions,
                    positive_pins,
                    negative_pins,
                }
            }),
        (
            device_name(),
            prop::collection::vec((any::<i32>(), intensity()), 0..6)
        )
            .prop_map(|(device, pairs)| {
                let (regions, intensities) = pairs.into_iter().unzip();
                Command::ActivateActuators {
                    device,
                    regions,
                    intensities,
                }
            }),
        (device_name(), any::<i32>(), any::<i32>())
            .prop_map(|(device, region, pin)| Command::AddFlexor { device, region, pin }),
        (
            device_name(),
            prop::collection::vec((any::<i32>(), any::<i32>()), 0..6)
        )
            .prop_map(|(device, pairs)| {
                let (regions, pins) = pairs.into_iter().unzip();
                Command::AddFlexors {
                    device,
                    regions,
                    pins,
                }
            }),
    ]
}

/// 每个助记符各一条样例
fn one_of_each() -> Vec<Command> {
    let device = || "OpenGlove-Left".to_string();
    let mut commands: Vec<Command> = (0..DEVICE_ONLY_COUNT)
        .map(|i| device_only(device(), i))
        .collect();
    commands.extend((0..2).map(|i| with_name(device(), i, "default".to_string())));
    commands.extend((0..5).map(|i| with_int(device(), i, -7)));
    commands.extend((0..2).map(|i| with_bool(device(), i, true)));
    commands.extend((0..2).map(|i| with_regions(device(), i, vec![0, 3])));
    commands.push(Command::AddActuator {
        device: device(),
        region: 1,
        positive_pin: 11,
        negative_pin: 12,
    });
    commands.push(Command::AddActuators {
        device: device(),
        regions: vec![0, 1],
        positive_pins: vec![11, 10],
        negative_pins: vec![15, 16],
    });
    commands.push(Command::ActivateActuators {
        device: device(),
        regions: vec![0, 1],
        intensities: vec!["0.5".to_string(), "255".to_string()],
    });
    commands.push(Command::AddFlexor {
        device: device(),
        region: 2,
        pin: 17,
    });
    commands.push(Command::AddFlexors {
        device: device(),
        regions: vec![0, 1],
        pins: vec![17, 18],
    });
    commands
}

#[test]
fn every_mnemonic_roundtrips() {
    let commands = one_of_each();
    let mnemonics: HashSet<&str> = commands.iter().map(Command::mnemonic).collect();
    assert_eq!(mnemonics.len(), 34);

    for cmd in commands {
        assert_eq!(cmd.validate(), Ok(()), "{}", cmd);
        assert_eq!(Command::parse(&cmd.encode()).unwrap(), cmd);
    }
}

#[test]
fn empty_intensity_is_rejected_not_lost() {
    let cmd = Command::ActivateActuators {
        device: "left".to_string(),
        regions: vec![0],
        intensities: vec![String::new()],
    };
    assert!(matches!(
        cmd.validate(),
        Err(ProtocolError::EmptyListElement { .. })
    ));
}

proptest! {
    #[test]
    fn float_text_is_plain_decimal(value in -1.0e12f32..1.0e12f32) {
        let text = format_float(value);
        let (int_part, frac_part) = text
            .split_once('.')
            .expect("formatted float must contain a decimal point");
        let digits = int_part.strip_prefix('-').unwrap_or(int_part);
        prop_assert!(!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()), "{}", text);
        prop_assert!(!frac_part.is_empty() && frac_part.bytes().all(|b| b.is_ascii_digit()), "{}", text);
    }

    #[test]
    fn float_text_parses_back(value in -1.0e6f32..1.0e6f32) {
        let parsed: f32 = format_float(value).parse().unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn command_roundtrip(cmd in command()) {
        match cmd.validate() {
            Ok(()) => {
                let line = cmd.encode();
                prop_assert_eq!(Command::parse(&line).unwrap(), cmd);
            },
            // 只有空强度元素会被拒绝
            Err(e) => prop_assert!(
                matches!(e, ProtocolError::EmptyListElement { field: "intensities", .. }),
                "{}",
                e
            ),
        }
    }

    #[test]
    fn decoder_never_panics(line in "\\PC{0,64}") {
        let _ = decode_line(&line);
    }

    #[test]
    fn decoder_never_panics_on_known_tags(
        tag in prop::sample::select(vec!["f", "a", "g", "m", "z", "b"]),
        fields in prop::collection::vec("[-0-9.a-z ]{0,8}", 0..12),
    ) {
        let mut line = tag.to_string();
        for field in &fields {
            line.push(',');
            line.push_str(field);
        }
        // 结果要么是对应事件，要么是错误；已知标签不会变成诊断文本
        if let Ok(event) = decode_line(&line) {
            prop_assert!(!matches!(event, GloveEvent::Diagnostic(_)));
        }
    }

    #[test]
    fn vector_event_roundtrip(x in -1000.0f32..1000.0, y in -1000.0f32..1000.0, z in -1000.0f32..1000.0) {
        let event = GloveEvent::Magnetometer(Vector3::new(x, y, z));
        prop_assert_eq!(decode_line(&event.to_line()).unwrap(), event);
    }
}
