//! 命令助记符与消息标签常量定义
//!
//! 出站命令的第一个字段是助记符（`MN_*`），入站消息的第一个字段是单字符标签（`TAG_*`）。

// ============================================================================
// 会话与设备管理命令
// ============================================================================

/// 启动手套（携带配置名）
pub const MN_START_GLOVE: &str = "sg";
/// 停止手套
pub const MN_STOP_GLOVE: &str = "pg";
/// 在服务端注册设备
pub const MN_ADD_DEVICE: &str = "ad";
/// 从服务端注销设备
pub const MN_REMOVE_DEVICE: &str = "rd";
/// 保存当前配置（携带配置名）
pub const MN_SAVE_CONFIGURATION: &str = "sv";
/// 连接蓝牙外设
pub const MN_CONNECT_DEVICE: &str = "cd";
/// 断开蓝牙外设
pub const MN_DISCONNECT_DEVICE: &str = "dd";
/// 开始采集遥测数据
pub const MN_START_CAPTURE: &str = "sc";
/// 停止采集遥测数据
pub const MN_STOP_CAPTURE: &str = "pc";

// ============================================================================
// 振动执行器命令
// ============================================================================

pub const MN_ADD_ACTUATOR: &str = "aa";
pub const MN_ADD_ACTUATORS: &str = "aal";
pub const MN_REMOVE_ACTUATOR: &str = "ra";
pub const MN_REMOVE_ACTUATORS: &str = "ral";
/// 按区域激活执行器（区域列表 + 强度列表，按下标对齐）
pub const MN_ACTIVATE_ACTUATORS: &str = "aca";
pub const MN_TURN_ON_ACTUATORS: &str = "ona";
pub const MN_TURN_OFF_ACTUATORS: &str = "ofa";
pub const MN_RESET_ACTUATORS: &str = "rsa";

// ============================================================================
// 弯曲传感器命令
// ============================================================================

pub const MN_ADD_FLEXOR: &str = "af";
pub const MN_ADD_FLEXORS: &str = "afl";
pub const MN_REMOVE_FLEXOR: &str = "rf";
pub const MN_REMOVE_FLEXORS: &str = "rfl";
pub const MN_CALIBRATE_FLEXORS: &str = "cf";
pub const MN_CONFIRM_CALIBRATION: &str = "cc";
/// 设置弯曲传感器阈值
pub const MN_SET_THRESHOLD: &str = "st";
pub const MN_TURN_ON_FLEXORS: &str = "onf";
pub const MN_TURN_OFF_FLEXORS: &str = "off";
pub const MN_RESET_FLEXORS: &str = "rsf";

// ============================================================================
// IMU 与固件命令
// ============================================================================

pub const MN_START_IMU: &str = "si";
/// 启用/禁用 IMU 数据流
pub const MN_SET_IMU_STATUS: &str = "is";
/// 启用/禁用原始数据模式
pub const MN_SET_RAW_DATA: &str = "rw";
/// 选择 IMU 数据模式
pub const MN_SET_IMU_CHOOSING_DATA: &str = "ic";
pub const MN_CALIBRATE_IMU: &str = "ci";
/// 设置主循环延迟（采样间隔）
pub const MN_SET_LOOP_DELAY: &str = "ld";
/// 查询固件版本
pub const MN_GET_VERSION: &str = "v";

// ============================================================================
// 入站消息标签
// ============================================================================

/// 弯曲传感器读数：`f,region,value`
pub const TAG_FLEXOR: &str = "f";
/// 加速度计：`a,x,y,z`
pub const TAG_ACCELEROMETER: &str = "a";
/// 陀螺仪：`g,x,y,z`
pub const TAG_GYROSCOPE: &str = "g";
/// 磁力计：`m,x,y,z`
pub const TAG_MAGNETOMETER: &str = "m";
/// IMU 综合帧：`z,ax,ay,az,gx,gy,gz,mx,my,mz`
pub const TAG_IMU_BUNDLE: &str = "z";
/// 蓝牙设备连接状态：`b,true|false`
pub const TAG_CONNECTION_STATE: &str = "b";
