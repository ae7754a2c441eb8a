//! Session API 模块
//!
//! 提供对外的 `Session` 结构体，封装 IO 线程、命令队列和事件订阅。

use crate::error::DriverError;
use crate::event::{EventKind, SessionEvent};
use crate::hooks::{EventCallback, EventRegistry, SubscriptionId};
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{PipelineConfig, SessionCommand, SessionContext, io_loop};
use crate::state::ConnectionState;
use crossbeam_channel::{SendTimeoutError, Sender, TrySendError};
use openglove_protocol::{Command, FlexorSample, GloveEvent, ImuBundle, Vector3};
use openglove_transport::{CloseReason, Transport};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Extension trait for timeout-capable thread joins
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(self.join());
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Thread panicked during join",
            ))),
        }
    }
}

/// OpenGlove 会话（对外 API）
///
/// 创建时启动 IO 线程，IO 线程先发送 `AddDevice` 与 `StartCapture`，
/// 再处理调用方排队的命令。所有回调都在 IO 线程上按接收顺序同步执行。
///
/// # Example
///
/// ```no_run
/// use openglove_driver::SessionBuilder;
///
/// let session = SessionBuilder::new("ws://localhost:7070/glove", "OpenGlove-Left")
///     .connect()
///     .unwrap();
/// session.on_flexor(|sample| println!("region {} = {}", sample.region, sample.value));
/// session.activate_actuators("OpenGlove-Left", &[0, 1], ["0.5", "1.0"]).unwrap();
/// ```
pub struct Session {
    /// 命令发送通道
    ///
    /// Drop 时先释放发送端，`io_loop` 收到 `Disconnected` 后退出。
    cmd_tx: Option<Sender<SessionCommand>>,
    ctx: Arc<SessionContext>,
    io_thread: Option<JoinHandle<()>>,
    join_timeout: Duration,
}

impl Session {
    /// 在已连接的传输上创建会话
    pub fn new(
        transport: impl Transport + Send + 'static,
        device: impl Into<String>,
        config: Option<PipelineConfig>,
    ) -> Result<Self, DriverError> {
        Self::with_registry(transport, device, EventRegistry::new(), config)
    }

    /// 创建会话，并预先装入订阅表
    ///
    /// 预先订阅的回调能收到 `Opened` 事件。
    pub fn with_registry(
        transport: impl Transport + Send + 'static,
        device: impl Into<String>,
        registry: EventRegistry,
        config: Option<PipelineConfig>,
    ) -> Result<Self, DriverError> {
        let config = config.unwrap_or_default();
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(config.command_channel_capacity);

        let ctx = Arc::new(SessionContext::new(device));
        *ctx.registry.write() = registry;

        let ctx_clone = ctx.clone();
        let join_timeout = Duration::from_millis(config.join_timeout_ms);
        let io_thread = std::thread::Builder::new()
            .name("openglove-io".to_string())
            .spawn(move || io_loop(transport, cmd_rx, ctx_clone, config))
            .map_err(|e| DriverError::IoThread(e.to_string()))?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            ctx,
            io_thread: Some(io_thread),
            join_timeout,
        })
    }

    /// 会话绑定的设备名
    pub fn device(&self) -> &str {
        &self.ctx.device
    }

    /// 传输连接状态
    pub fn connection_state(&self) -> ConnectionState {
        self.ctx.state.get()
    }

    /// 外设（蓝牙）连接状态，由最近一次 `b` 消息决定
    pub fn is_device_connected(&self) -> bool {
        self.ctx.device_connected.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 等待启动序列发送完成
    ///
    /// # 错误
    /// - `DriverError::Timeout`: 超时仍处于连接中
    /// - `DriverError::ChannelClosed`: 会话已断开
    pub fn wait_for_connection(&self, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.connection_state() {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Disconnected => return Err(DriverError::ChannelClosed),
                ConnectionState::Connecting => {},
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn sender(&self) -> Result<&Sender<SessionCommand>, DriverError> {
        self.cmd_tx.as_ref().ok_or(DriverError::ChannelClosed)
    }

    /// 发送命令（非阻塞）
    ///
    /// 命令先经过参数校验（并行列表长度、保留分隔符），再编码入队。
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 参数校验失败
    /// - `DriverError::ChannelClosed`: IO 线程已退出
    /// - `DriverError::ChannelFull`: 命令队列已满
    pub fn send_command(&self, command: Command) -> Result<(), DriverError> {
        command.validate()?;
        let line = command.encode();
        debug!("Queueing command: {}", line);
        self.sender()?
            .try_send(SessionCommand::Send(line))
            .map_err(|e| match e {
                TrySendError::Full(_) => DriverError::ChannelFull,
                TrySendError::Disconnected(_) => DriverError::ChannelClosed,
            })
    }

    /// 发送命令（阻塞，带超时）
    pub fn send_command_blocking(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        command.validate()?;
        self.sender()?
            .send_timeout(SessionCommand::Send(command.encode()), timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DriverError::Timeout,
                SendTimeoutError::Disconnected(_) => DriverError::ChannelClosed,
            })
    }

    /// 请求关闭连接
    ///
    /// 已排在前面的命令会先发出。会话已断开时直接返回 `Ok`。
    pub fn close(&self) -> Result<(), DriverError> {
        let Some(tx) = self.cmd_tx.as_ref() else {
            return Ok(());
        };
        match tx.send_timeout(SessionCommand::Close, self.join_timeout) {
            Ok(()) | Err(SendTimeoutError::Disconnected(_)) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(DriverError::Timeout),
        }
    }

    // ============================================================
    // 订阅
    // ============================================================

    /// 订阅某一种事件
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl EventCallback + 'static,
    ) -> SubscriptionId {
        self.ctx.registry.write().subscribe(kind, callback)
    }

    /// 订阅全部事件
    pub fn subscribe_all(&self, callback: impl EventCallback + 'static) -> SubscriptionId {
        self.ctx.registry.write().subscribe_all(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.ctx.registry.write().unsubscribe(id)
    }

    pub fn on_flexor(&self, f: impl Fn(FlexorSample) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(EventKind::Flexor, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::Flexor(sample)) = event {
                f(*sample);
            }
        })
    }

    pub fn on_accelerometer(
        &self,
        f: impl Fn(Vector3) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe(EventKind::Accelerometer, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::Accelerometer(v)) = event {
                f(*v);
            }
        })
    }

    pub fn on_gyroscope(&self, f: impl Fn(Vector3) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(EventKind::Gyroscope, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::Gyroscope(v)) = event {
                f(*v);
            }
        })
    }

    pub fn on_magnetometer(
        &self,
        f: impl Fn(Vector3) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe(EventKind::Magnetometer, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::Magnetometer(v)) = event {
                f(*v);
            }
        })
    }

    pub fn on_imu(&self, f: impl Fn(ImuBundle) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(EventKind::Imu, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::Imu(bundle)) = event {
                f(*bundle);
            }
        })
    }

    /// 外设连接状态变化
    pub fn on_connection_state(
        &self,
        f: impl Fn(bool) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe(EventKind::ConnectionState, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::ConnectionState(connected)) = event {
                f(*connected);
            }
        })
    }

    pub fn on_diagnostic(&self, f: impl Fn(&str) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(EventKind::Diagnostic, move |event: &SessionEvent| {
            if let SessionEvent::Glove(GloveEvent::Diagnostic(text)) = event {
                f(text.as_str());
            }
        })
    }

    /// 连接建立（通常需要在 [`SessionBuilder`](crate::SessionBuilder) 中预先订阅）
    pub fn on_open(&self, f: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(EventKind::Opened, move |_: &SessionEvent| f())
    }

    pub fn on_close(
        &self,
        f: impl Fn(&CloseReason) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribe(EventKind::Closed, move |event: &SessionEvent| {
            if let SessionEvent::Closed(reason) = event {
                f(reason);
            }
        })
    }

    pub fn on_error(&self, f: impl Fn(&str) + Send + Sync + 'static) -> SubscriptionId {
        self.subscribe(EventKind::Error, move |event: &SessionEvent| {
            if let SessionEvent::Error(message) = event {
                f(message.as_str());
            }
        })
    }

    // ============================================================
    // 设备生命周期
    // ============================================================

    pub fn start_glove(&self, device: &str, configuration: &str) -> Result<(), DriverError> {
        self.send_command(Command::StartGlove {
            device: device.to_string(),
            configuration: configuration.to_string(),
        })
    }

    pub fn stop_glove(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::StopGlove {
            device: device.to_string(),
        })
    }

    pub fn add_device(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::AddDevice {
            device: device.to_string(),
        })
    }

    pub fn remove_device(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::RemoveDevice {
            device: device.to_string(),
        })
    }

    pub fn save_configuration(
        &self,
        device: &str,
        configuration: &str,
    ) -> Result<(), DriverError> {
        self.send_command(Command::SaveConfiguration {
            device: device.to_string(),
            configuration: configuration.to_string(),
        })
    }

    pub fn connect_device(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::ConnectDevice {
            device: device.to_string(),
        })
    }

    pub fn disconnect_device(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::DisconnectDevice {
            device: device.to_string(),
        })
    }

    pub fn start_capture(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::StartCapture {
            device: device.to_string(),
        })
    }

    pub fn stop_capture(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::StopCapture {
            device: device.to_string(),
        })
    }

    // ============================================================
    // 振动执行器
    // ============================================================

    pub fn add_actuator(
        &self,
        device: &str,
        region: i32,
        positive_pin: i32,
        negative_pin: i32,
    ) -> Result<(), DriverError> {
        self.send_command(Command::AddActuator {
            device: device.to_string(),
            region,
            positive_pin,
            negative_pin,
        })
    }

    /// 批量添加执行器（三个列表按下标对齐）
    pub fn add_actuators(
        &self,
        device: &str,
        regions: &[i32],
        positive_pins: &[i32],
        negative_pins: &[i32],
    ) -> Result<(), DriverError> {
        self.send_command(Command::AddActuators {
            device: device.to_string(),
            regions: regions.to_vec(),
            positive_pins: positive_pins.to_vec(),
            negative_pins: negative_pins.to_vec(),
        })
    }

    pub fn remove_actuator(&self, device: &str, region: i32) -> Result<(), DriverError> {
        self.send_command(Command::RemoveActuator {
            device: device.to_string(),
            region,
        })
    }

    pub fn remove_actuators(&self, device: &str, regions: &[i32]) -> Result<(), DriverError> {
        self.send_command(Command::RemoveActuators {
            device: device.to_string(),
            regions: regions.to_vec(),
        })
    }

    /// 激活执行器，`intensities` 与 `regions` 按下标对齐
    pub fn activate_actuators<I, S>(
        &self,
        device: &str,
        regions: &[i32],
        intensities: I,
    ) -> Result<(), DriverError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send_command(Command::ActivateActuators {
            device: device.to_string(),
            regions: regions.to_vec(),
            intensities: intensities.into_iter().map(Into::into).collect(),
        })
    }

    pub fn turn_on_actuators(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::TurnOnActuators {
            device: device.to_string(),
        })
    }

    pub fn turn_off_actuators(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::TurnOffActuators {
            device: device.to_string(),
        })
    }

    pub fn reset_actuators(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::ResetActuators {
            device: device.to_string(),
        })
    }

    // ============================================================
    // 弯曲传感器
    // ============================================================

    pub fn add_flexor(&self, device: &str, region: i32, pin: i32) -> Result<(), DriverError> {
        self.send_command(Command::AddFlexor {
            device: device.to_string(),
            region,
            pin,
        })
    }

    pub fn add_flexors(
        &self,
        device: &str,
        regions: &[i32],
        pins: &[i32],
    ) -> Result<(), DriverError> {
        self.send_command(Command::AddFlexors {
            device: device.to_string(),
            regions: regions.to_vec(),
            pins: pins.to_vec(),
        })
    }

    pub fn remove_flexor(&self, device: &str, region: i32) -> Result<(), DriverError> {
        self.send_command(Command::RemoveFlexor {
            device: device.to_string(),
            region,
        })
    }

    pub fn remove_flexors(&self, device: &str, regions: &[i32]) -> Result<(), DriverError> {
        self.send_command(Command::RemoveFlexors {
            device: device.to_string(),
            regions: regions.to_vec(),
        })
    }

    pub fn calibrate_flexors(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::CalibrateFlexors {
            device: device.to_string(),
        })
    }

    pub fn confirm_calibration(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::ConfirmCalibration {
            device: device.to_string(),
        })
    }

    pub fn set_threshold(&self, device: &str, value: i32) -> Result<(), DriverError> {
        self.send_command(Command::SetThreshold {
            device: device.to_string(),
            value,
        })
    }

    pub fn turn_on_flexors(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::TurnOnFlexors {
            device: device.to_string(),
        })
    }

    pub fn turn_off_flexors(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::TurnOffFlexors {
            device: device.to_string(),
        })
    }

    pub fn reset_flexors(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::ResetFlexors {
            device: device.to_string(),
        })
    }

    // ============================================================
    // IMU 与固件
    // ============================================================

    pub fn start_imu(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::StartImu {
            device: device.to_string(),
        })
    }

    pub fn set_imu_status(&self, device: &str, enabled: bool) -> Result<(), DriverError> {
        self.send_command(Command::SetImuStatus {
            device: device.to_string(),
            enabled,
        })
    }

    pub fn set_raw_data(&self, device: &str, enabled: bool) -> Result<(), DriverError> {
        self.send_command(Command::SetRawData {
            device: device.to_string(),
            enabled,
        })
    }

    pub fn set_imu_choosing_data(&self, device: &str, mode: i32) -> Result<(), DriverError> {
        self.send_command(Command::SetImuChoosingData {
            device: device.to_string(),
            mode,
        })
    }

    pub fn calibrate_imu(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::CalibrateImu {
            device: device.to_string(),
        })
    }

    pub fn set_loop_delay(&self, device: &str, delay: i32) -> Result<(), DriverError> {
        self.send_command(Command::SetLoopDelay {
            device: device.to_string(),
            delay,
        })
    }

    /// 查询固件版本（结果以诊断文本返回）
    pub fn get_version(&self, device: &str) -> Result<(), DriverError> {
        self.send_command(Command::GetVersion {
            device: device.to_string(),
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // 释放发送端，IO 线程收到 Disconnected 后关闭传输并退出
        self.cmd_tx.take();

        if let Some(handle) = self.io_thread.take()
            && handle.join_timeout(self.join_timeout).is_err()
        {
            error!(
                "IO thread panicked or failed to shut down within {:?}",
                self.join_timeout
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openglove_protocol::ProtocolError;
    use openglove_transport::MockTransport;
    use parking_lot::Mutex;

    const WAIT: Duration = Duration::from_secs(2);

    fn fast_config() -> Option<PipelineConfig> {
        Some(PipelineConfig {
            receive_timeout_ms: 2,
            ..Default::default()
        })
    }

    #[test]
    fn test_session_startup_order() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, "left", fast_config()).unwrap();
        session.wait_for_connection(WAIT).unwrap();
        session.get_version("left").unwrap();

        let sent = handle.wait_for_sent(3, WAIT);
        assert_eq!(sent, vec!["ad;left", "sc;left", "v;left"]);
        assert_eq!(session.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn test_command_queued_before_open_goes_after_startup() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, "left", fast_config()).unwrap();
        // 不等待连接，立即排队
        session.turn_on_flexors("left").unwrap();

        let sent = handle.wait_for_sent(3, WAIT);
        assert_eq!(&sent[..2], &["ad;left".to_string(), "sc;left".to_string()]);
        assert_eq!(sent[2], "onf;left");
    }

    #[test]
    fn test_validation_rejects_misaligned_lists() {
        let (transport, _handle) = MockTransport::new();
        let session = Session::new(transport, "left", fast_config()).unwrap();
        let err = session
            .add_flexors("left", &[1, 2], &[3])
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Protocol(ProtocolError::ListLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_device_name_passes_through_unchanged() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, "Glove,Left", fast_config()).unwrap();
        session.stop_capture("Glove,Left").unwrap();

        let sent = handle.wait_for_sent(3, WAIT);
        assert_eq!(sent, vec!["ad;Glove,Left", "sc;Glove,Left", "pc;Glove,Left"]);
    }

    #[test]
    fn test_zero_drain_limit_still_makes_progress() {
        let (transport, handle) = MockTransport::new();
        let config = PipelineConfig {
            receive_timeout_ms: 2,
            max_drain_per_cycle: 0,
            ..Default::default()
        };
        let session = Session::new(transport, "left", Some(config)).unwrap();
        session.start_imu("left").unwrap();
        assert_eq!(handle.wait_for_sent(3, WAIT).len(), 3);

        let started = Instant::now();
        drop(session);
        assert!(handle.is_closed());
        assert!(started.elapsed() < WAIT);
    }

    #[test]
    fn test_typed_subscriptions() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, "left", fast_config()).unwrap();

        let samples = Arc::new(Mutex::new(Vec::new()));
        let s = samples.clone();
        session.on_flexor(move |sample| s.lock().push(sample.value));
        let connected = Arc::new(Mutex::new(None));
        let c = connected.clone();
        session.on_connection_state(move |state| *c.lock() = Some(state));

        handle.push_line("f,1,10");
        handle.push_line("f,abc");
        handle.push_line("b,true");
        handle.push_line("f,1,20");

        let deadline = Instant::now() + WAIT;
        while samples.lock().len() < 2 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(*samples.lock(), vec![10, 20]);
        assert_eq!(*connected.lock(), Some(true));
        assert!(session.is_device_connected());
        assert_eq!(session.metrics().decode_errors, 1);
    }

    #[test]
    fn test_remote_close() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, "left", fast_config()).unwrap();
        let reason = Arc::new(Mutex::new(None));
        let r = reason.clone();
        session.on_close(move |close| *r.lock() = Some(close.clone()));
        session.wait_for_connection(WAIT).unwrap();

        handle.push_close(1001, "server shutdown");
        let deadline = Instant::now() + WAIT;
        while reason.lock().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(
            reason.lock().clone(),
            Some(CloseReason::new(1001, "server shutdown"))
        );
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);

        // IO 线程退出后命令通道随之关闭
        let mut result = session.stop_capture("left");
        while result.is_ok() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
            result = session.stop_capture("left");
        }
        assert!(matches!(result, Err(DriverError::ChannelClosed)));
    }

    #[test]
    fn test_drop_closes_transport() {
        let (transport, handle) = MockTransport::new();
        let session = Session::new(transport, "left", fast_config()).unwrap();
        session.wait_for_connection(WAIT).unwrap();
        drop(session);
        assert!(handle.is_closed());
    }
}
