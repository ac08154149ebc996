//! Robot API 模块
//!
//! 对外的 [`RoboMaster`] 门面：初始化管线、编码高层控制意图
//! （驱动、瞄准、发射、灯效）并聚合遥测快照。
//!
//! 所有指令参数在这里静默截断到协议允许的范围——操作员宁要
//! 大致正确的运动，也不要拒绝执行的运动。

pub mod error;
pub mod handler;
pub mod queue;
pub mod state;

use crate::protocol::ids::*;
use crate::protocol::message::Message;
use crate::protocol::payload;
use crate::protocol::telemetry::*;
use arc_swap::ArcSwap;
use handler::{Handler, MessageCallback};
use state::RoboMasterState;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

pub use error::DriverError;

#[cfg(target_os = "linux")]
use crate::can::{CanAdapter, SocketCanAdapter};
use crate::can::{RxAdapter, TxAdapter};

/// RoboMaster 驱动门面
///
/// # Example
///
/// ```no_run
/// use robomaster_sdk::{ChassisMode, RoboMaster};
///
/// let mut robot = RoboMaster::new();
/// assert!(robot.init("can0"));
/// robot.set_chassis_mode(ChassisMode::Enable);
/// robot.set_chassis_rpm(100, 100, 100, 100);
/// ```
pub struct RoboMaster {
    handler: Option<Handler>,
    sequence: AtomicU16,
    state: Arc<ArcSwap<RoboMasterState>>,
}

impl RoboMaster {
    pub fn new() -> Self {
        Self {
            handler: None,
            sequence: AtomicU16::new(0),
            state: Arc::new(ArcSwap::from_pointee(RoboMasterState::default())),
        }
    }

    /// 打开 CAN 接口并启动管线
    ///
    /// 成功后立即发出五条启动配置帧（序号 0-4），订阅周期遥测。
    /// 打开失败、接口不存在或重复初始化返回 `false`，不启动任何线程。
    #[cfg(target_os = "linux")]
    pub fn init(&mut self, interface: &str) -> bool {
        match self.try_init(interface) {
            Ok(()) => true,
            Err(e) => {
                error!("initialisation failure: {e}");
                false
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn try_init(&mut self, interface: &str) -> Result<(), DriverError> {
        if self.handler.is_some() {
            return Err(DriverError::AlreadyInitialised);
        }
        let mut adapter = SocketCanAdapter::open(interface)?;
        adapter.set_receive_timeout(handler::RECEIVE_TIMEOUT)?;
        let (rx, tx) = adapter.split()?;
        self.try_init_with_transport(rx, tx)
    }

    /// 用现成的收发适配器启动管线（测试与非 SocketCAN 场景）
    pub fn init_with_transport<R, T>(&mut self, rx: R, tx: T) -> bool
    where
        R: RxAdapter + Send + 'static,
        T: TxAdapter + Send + 'static,
    {
        match self.try_init_with_transport(rx, tx) {
            Ok(()) => true,
            Err(e) => {
                error!("initialisation failure: {e}");
                false
            }
        }
    }

    fn try_init_with_transport<R, T>(&mut self, rx: R, tx: T) -> Result<(), DriverError>
    where
        R: RxAdapter + Send + 'static,
        T: TxAdapter + Send + 'static,
    {
        if self.handler.is_some() {
            return Err(DriverError::AlreadyInitialised);
        }
        self.handler = Some(Handler::spawn(rx, tx, self.state_callback()));
        self.boot_sequence();
        Ok(())
    }

    /// 管线是否就绪且未因连续失败停机
    pub fn is_running(&self) -> bool {
        self.handler.as_ref().is_some_and(Handler::is_running)
    }

    /// 读取最新遥测快照（无锁，值拷贝）
    pub fn get_state(&self) -> RoboMasterState {
        self.state.load_full().as_ref().clone()
    }

    // === 底盘 ===

    /// 设置底盘工作模式
    pub fn set_chassis_mode(&self, mode: ChassisMode) {
        self.push(chassis_mode_message(self.next_sequence(), mode));
    }

    /// 按轮控制转速，单位 RPM，截断到 ±1000
    pub fn set_chassis_rpm(&self, front_right: i16, front_left: i16, rear_left: i16, rear_right: i16) {
        self.push(chassis_rpm_message(
            self.next_sequence(),
            front_right,
            front_left,
            rear_left,
            rear_right,
        ));
    }

    /// 底盘速度：线速度 m/s（±3.5），角速度 °/s（±600）
    pub fn set_chassis_velocity(&self, linear_x: f32, linear_y: f32, angular_z: f32) {
        self.push(chassis_velocity_message(
            self.next_sequence(),
            linear_x,
            linear_y,
            angular_z,
        ));
    }

    /// 底盘位置：x/y ±500，z ±18000
    pub fn set_chassis_position(&self, linear_x: i16, linear_y: i16, angular_z: i16) {
        self.push(chassis_position_message(
            self.next_sequence(),
            linear_x,
            linear_y,
            angular_z,
        ));
    }

    // === 云台 ===

    /// 设置云台工作模式
    pub fn set_gimbal_mode(&self, mode: GimbalMode) {
        self.push(gimbal_mode_message(self.next_sequence(), mode));
    }

    /// 云台休眠/唤醒
    pub fn set_gimbal_hibernate(&self, hibernate: GimbalHibernate) {
        self.push(gimbal_hibernate_message(self.next_sequence(), hibernate));
    }

    /// 云台角度运动，pitch/yaw 截断到 ±1000
    pub fn set_gimbal_motion(&self, pitch: i16, yaw: i16) {
        self.push(gimbal_motion_message(self.next_sequence(), pitch, yaw));
    }

    /// 云台角速度，pitch/yaw 截断到 ±1000
    pub fn set_gimbal_velocity(&self, pitch: i16, yaw: i16) {
        self.push(gimbal_velocity_message(self.next_sequence(), pitch, yaw));
    }

    /// 云台绝对位置：pitch ±500、yaw ±2500（0.1 度），
    /// 加速度 10-500（常用 150）
    pub fn set_gimbal_position(
        &self,
        pitch: i16,
        yaw: i16,
        pitch_acceleration: u16,
        yaw_acceleration: u16,
    ) {
        self.push(gimbal_position_message(
            self.next_sequence(),
            pitch,
            yaw,
            pitch_acceleration,
            yaw_acceleration,
        ));
    }

    /// 云台回中，pitch/yaw 为回中速度，截断到 10-500（常用 150）
    pub fn set_gimbal_recenter(&self, pitch: i16, yaw: i16) {
        self.push(gimbal_recenter_message(self.next_sequence(), pitch, yaw));
    }

    // === 发射器 / LED ===

    /// 发射 count 发（1-8），连同伴随灯效共两条消息按序入队
    pub fn set_blaster_mode(&self, mode: BlasterMode, count: u8) {
        let fire_sequence = self.next_sequence();
        let led_sequence = self.next_sequence();
        for msg in blaster_messages(fire_sequence, led_sequence, mode, count) {
            self.push(msg);
        }
    }

    /// LED 效果；Static 模式强制 up/down 时间为 0，时间截断到 0-60000ms
    #[allow(clippy::too_many_arguments)]
    pub fn set_led_mode(
        &self,
        mode: LedMode,
        mask: u16,
        red: u8,
        green: u8,
        blue: u8,
        up_time: u16,
        down_time: u16,
    ) {
        self.push(led_message(
            self.next_sequence(),
            mode,
            mask,
            red,
            green,
            blue,
            up_time,
            down_time,
        ));
    }

    // === 内部 ===

    fn next_sequence(&self) -> u16 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn push(&self, msg: Message) {
        match &self.handler {
            Some(handler) => handler.push_message(msg),
            None => debug!("command dropped: driver not initialised"),
        }
    }

    /// 五条启动配置帧，序号与载荷逐字节固定：底盘×3、云台、LED 复位
    fn boot_sequence(&self) {
        let boot: [(u16, &[u8]); 5] = [
            (DEVICE_TYPE_CHASSIS, &payload::BOOT_CHASSIS_PRIMARY),
            (DEVICE_TYPE_CHASSIS, &payload::BOOT_CHASSIS_SECONDARY),
            (DEVICE_TYPE_CHASSIS, &payload::BOOT_CHASSIS_SUB),
            (DEVICE_TYPE_GIMBAL, &payload::BOOT_GIMBAL_SUB),
            (DEVICE_TYPE_LED, &payload::BOOT_LED_RESET),
        ];
        for (sequence, (msg_type, bytes)) in boot.into_iter().enumerate() {
            self.push(Message::new(
                DEVICE_ID_INTELLI_CONTROLLER,
                msg_type,
                sequence as u16,
                bytes.to_vec(),
            ));
        }
    }

    /// 遥测聚合回调：按来源设备解码，只覆盖该来源供给的子字段，
    /// 其余保持上一次快照的值，最后整体原子发布
    fn state_callback(&self) -> MessageCallback {
        let state = Arc::clone(&self.state);
        Box::new(move |msg: &Message| {
            let mut next = (**state.load()).clone();
            let len = msg.payload().len();

            match msg.device_id() {
                DEVICE_ID_MOTION_CONTROLLER => {
                    if len >= 27 + 24 {
                        next.velocity = decode_velocity(27, msg);
                    }
                    if len >= 51 + 10 {
                        next.battery = decode_battery(51, msg);
                    }
                    if len >= 61 + 36 {
                        next.esc = decode_esc(61, msg);
                    }
                    if len >= 97 + 24 {
                        next.imu = decode_imu(97, msg);
                    }
                    if len >= 121 + 12 {
                        next.attitude = decode_attitude(121, msg);
                    }
                    if len >= 133 + 12 {
                        next.position = decode_position(133, msg);
                    }
                }
                DEVICE_ID_GIMBAL => {
                    if len >= 5 + 4 {
                        next.gimbal = decode_gimbal(5, msg);
                    }
                }
                id @ DEVICE_ID_HIT_DETECTOR_1..=DEVICE_ID_HIT_DETECTOR_4 => {
                    if len >= 4 + 2 {
                        next.detectors[(id - DEVICE_ID_HIT_DETECTOR_1) as usize] =
                            decode_detector(4, msg);
                    }
                }
                _ => return,
            }

            next.active = true;
            state.store(Arc::new(next));
        })
    }
}

impl Default for RoboMaster {
    fn default() -> Self {
        Self::new()
    }
}

// === 指令编码 ===
//
// 每条指令从协议模板的副本出发，在固定偏移写入截断后的字段。

fn chassis_mode_message(sequence: u16, mode: ChassisMode) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_CHASSIS,
        sequence,
        payload::CHASSIS_MODE.to_vec(),
    );
    msg.set_u8(3, mode as u8);
    msg
}

fn chassis_rpm_message(
    sequence: u16,
    front_right: i16,
    front_left: i16,
    rear_left: i16,
    rear_right: i16,
) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_CHASSIS,
        sequence,
        payload::CHASSIS_RPM.to_vec(),
    );
    // 左侧两轮镜像安装，线上值取反
    msg.set_i16(3, front_right.clamp(-1000, 1000));
    msg.set_i16(5, -front_left.clamp(-1000, 1000));
    msg.set_i16(7, -rear_left.clamp(-1000, 1000));
    msg.set_i16(9, rear_right.clamp(-1000, 1000));
    msg
}

fn chassis_velocity_message(sequence: u16, linear_x: f32, linear_y: f32, angular_z: f32) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_CHASSIS,
        sequence,
        payload::CHASSIS_VELOCITY.to_vec(),
    );
    msg.set_f32(3, linear_x.clamp(-3.5, 3.5));
    msg.set_f32(7, linear_y.clamp(-3.5, 3.5));
    msg.set_f32(11, angular_z.clamp(-600.0, 600.0));
    msg
}

fn chassis_position_message(sequence: u16, linear_x: i16, linear_y: i16, angular_z: i16) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_CHASSIS,
        sequence,
        payload::CHASSIS_POSITION.to_vec(),
    );
    msg.set_i16(7, linear_x.clamp(-500, 500));
    msg.set_i16(9, linear_y.clamp(-500, 500));
    msg.set_i16(11, angular_z.clamp(-18000, 18000));
    msg.set_i16(14, 0x12c);
    msg
}

fn gimbal_mode_message(sequence: u16, mode: GimbalMode) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_GIMBAL,
        sequence,
        payload::GIMBAL_MODE.to_vec(),
    );
    msg.set_u8(3, mode as u8);
    msg
}

fn gimbal_hibernate_message(sequence: u16, hibernate: GimbalHibernate) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_GIMBAL,
        sequence,
        payload::GIMBAL_HIBERNATE.to_vec(),
    );
    msg.set_u16(3, hibernate as u16);
    msg
}

fn gimbal_motion_message(sequence: u16, pitch: i16, yaw: i16) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_GIMBAL,
        sequence,
        payload::GIMBAL_DEGREE.to_vec(),
    );
    msg.set_i16(5, pitch.clamp(-1000, 1000));
    msg.set_i16(7, yaw.clamp(-1000, 1000));
    msg
}

fn gimbal_velocity_message(sequence: u16, pitch: i16, yaw: i16) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_GIMBAL,
        sequence,
        payload::GIMBAL_VELOCITY.to_vec(),
    );
    msg.set_i16(3, yaw.clamp(-1000, 1000));
    msg.set_i16(7, pitch.clamp(-1000, 1000));
    msg
}

fn gimbal_position_message(
    sequence: u16,
    pitch: i16,
    yaw: i16,
    pitch_acceleration: u16,
    yaw_acceleration: u16,
) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_GIMBAL,
        sequence,
        payload::GIMBAL_POSITION.to_vec(),
    );
    msg.set_i16(6, yaw.clamp(-2500, 2500));
    msg.set_i16(10, pitch.clamp(-500, 500));
    msg.set_u16(14, yaw_acceleration.clamp(10, 500));
    msg.set_u16(18, pitch_acceleration.clamp(10, 500));
    msg
}

fn gimbal_recenter_message(sequence: u16, pitch: i16, yaw: i16) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_GIMBAL,
        sequence,
        payload::GIMBAL_RECENTER.to_vec(),
    );
    msg.set_i16(6, yaw.clamp(10, 500));
    msg.set_i16(10, pitch.clamp(10, 500));
    msg
}

fn blaster_messages(
    fire_sequence: u16,
    led_sequence: u16,
    mode: BlasterMode,
    count: u8,
) -> [Message; 2] {
    let count = count.clamp(1, 8);

    let mut fire = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_BLASTER,
        fire_sequence,
        payload::BLASTER_GEL.to_vec(),
    );
    fire.set_u8(3, ((mode as u8) << 4 & 0xf0) | (count & 0x0f));

    let mut led = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_BLASTER,
        led_sequence,
        payload::BLASTER_LED.to_vec(),
    );
    led.set_u16(8, count as u16 * 100);
    led.set_u16(10, count as u16 * 100);

    [fire, led]
}

#[allow(clippy::too_many_arguments)]
fn led_message(
    sequence: u16,
    mode: LedMode,
    mask: u16,
    red: u8,
    green: u8,
    blue: u8,
    up_time: u16,
    down_time: u16,
) -> Message {
    let mut msg = Message::new(
        DEVICE_ID_INTELLI_CONTROLLER,
        DEVICE_TYPE_LED,
        sequence,
        payload::LED_MODE.to_vec(),
    );
    let is_static = mode == LedMode::Static;
    msg.set_u8(3, mode as u8);
    msg.set_u8(6, red);
    msg.set_u8(7, green);
    msg.set_u8(8, blue);
    msg.set_u16(10, if is_static { 0 } else { up_time.clamp(0, 60000) });
    msg.set_u16(12, if is_static { 0 } else { down_time.clamp(0, 60000) });
    msg.set_u16(14, mask);
    msg
}
