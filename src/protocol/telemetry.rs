//! 遥测记录与解码
//!
//! 每个解码函数接收 `(载荷偏移, Message)`，返回对应的记录；
//! 载荷不足以覆盖固定宽度时返回零值记录，聚合侧保持原字段不变。
//! 偏移由协议固定（见 `robot` 模块的分发表）。

use crate::protocol::message::Message;
use std::sync::OnceLock;
use std::time::Instant;

/// 进程启动锚点，首次访问时固定
static APP_START: OnceLock<Instant> = OnceLock::new();

/// 进程单调微秒时钟
///
/// 用于打击事件的时间戳：单调递增、不受系统时钟调整影响。
pub fn monotonic_micros() -> u64 {
    let start = APP_START.get_or_init(Instant::now);
    start.elapsed().as_micros() as u64
}

/// 云台姿态（0.1 度）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GimbalState {
    pub pitch: i16,
    pub yaw: i16,
}

/// 四个电调，数组顺序：前右、前左、后左、后右
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscState {
    /// 转速 RPM，范围 -8192~8191
    pub speed: [i16; 4],
    /// 角度位置，0~32767 映射 0~360°
    pub angle: [i16; 4],
    /// 控制器时间戳
    pub timestamp: [u32; 4],
    /// 电调状态字节
    pub state: [u8; 4],
}

/// 惯性测量单元
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuState {
    /// 加速度，单位 g
    pub acc_x: f32,
    pub acc_y: f32,
    pub acc_z: f32,
    /// 角速度，单位 rad/s
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
}

/// 底盘姿态角（度）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttitudeState {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

/// 电池
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryState {
    /// ADC 电压，毫伏
    pub adc: u16,
    /// 温度，0.1 摄氏度
    pub temperature: u16,
    /// 电流，毫安
    pub current: i32,
    /// 电量百分比
    pub percent: u8,
    /// 未知字段，原样保留
    pub reserved: u8,
}

/// 速度（m/s）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityState {
    /// 世界坐标系（开机位置为原点）
    pub vg_x: f32,
    pub vg_y: f32,
    pub vg_z: f32,
    /// 机体坐标系
    pub vb_x: f32,
    pub vb_y: f32,
    pub vb_z: f32,
}

/// 位置（相对开机原点）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 打击检测
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorState {
    /// 命中时刻，进程单调微秒
    pub time_us: u64,
    /// 命中强度
    pub intensity: u16,
}

/// 载荷剩余长度不足 `width` 时返回 true
fn too_short(index: usize, width: usize, msg: &Message) -> bool {
    index + width > msg.payload().len()
}

pub fn decode_gimbal(index: usize, msg: &Message) -> GimbalState {
    if too_short(index, 4, msg) {
        return GimbalState::default();
    }
    GimbalState {
        pitch: msg.get_i16(index),
        yaw: msg.get_i16(index + 2),
    }
}

pub fn decode_esc(index: usize, msg: &Message) -> EscState {
    if too_short(index, 36, msg) {
        return EscState::default();
    }
    let mut data = EscState::default();
    for wheel in 0..4 {
        data.speed[wheel] = msg.get_i16(index + 2 * wheel);
        data.angle[wheel] = msg.get_i16(index + 8 + 2 * wheel);
        data.timestamp[wheel] = msg.get_u32(index + 16 + 4 * wheel);
        data.state[wheel] = msg.get_u8(index + 32 + wheel);
    }
    data
}

pub fn decode_imu(index: usize, msg: &Message) -> ImuState {
    if too_short(index, 24, msg) {
        return ImuState::default();
    }
    ImuState {
        acc_x: msg.get_f32(index),
        acc_y: msg.get_f32(index + 4),
        acc_z: msg.get_f32(index + 8),
        gyro_x: msg.get_f32(index + 12),
        gyro_y: msg.get_f32(index + 16),
        gyro_z: msg.get_f32(index + 20),
    }
}

/// 注意线序：yaw 在前，roll 在后
pub fn decode_attitude(index: usize, msg: &Message) -> AttitudeState {
    if too_short(index, 12, msg) {
        return AttitudeState::default();
    }
    AttitudeState {
        yaw: msg.get_f32(index),
        pitch: msg.get_f32(index + 4),
        roll: msg.get_f32(index + 8),
    }
}

pub fn decode_battery(index: usize, msg: &Message) -> BatteryState {
    if too_short(index, 10, msg) {
        return BatteryState::default();
    }
    BatteryState {
        adc: msg.get_u16(index),
        temperature: msg.get_u16(index + 2),
        current: msg.get_i32(index + 4),
        percent: msg.get_u8(index + 8),
        reserved: msg.get_u8(index + 9),
    }
}

pub fn decode_velocity(index: usize, msg: &Message) -> VelocityState {
    if too_short(index, 24, msg) {
        return VelocityState::default();
    }
    VelocityState {
        vg_x: msg.get_f32(index),
        vg_y: msg.get_f32(index + 4),
        vg_z: msg.get_f32(index + 8),
        vb_x: msg.get_f32(index + 12),
        vb_y: msg.get_f32(index + 16),
        vb_z: msg.get_f32(index + 20),
    }
}

pub fn decode_position(index: usize, msg: &Message) -> PositionState {
    if too_short(index, 12, msg) {
        return PositionState::default();
    }
    PositionState {
        x: msg.get_f32(index),
        y: msg.get_f32(index + 4),
        z: msg.get_f32(index + 8),
    }
}

/// 命中时刻取解码瞬间的单调时钟
pub fn decode_detector(index: usize, msg: &Message) -> DetectorState {
    if too_short(index, 2, msg) {
        return DetectorState::default();
    }
    DetectorState {
        time_us: monotonic_micros(),
        intensity: msg.get_u16(index),
    }
}
