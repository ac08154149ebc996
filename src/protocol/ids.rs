//! 设备标识与指令枚举
//!
//! 11-bit CAN ID 选择设备端点，16-bit 类型字段区分指令/遥测族。
//! 所有数值均为协议固定常量。

/// 智能控制器（指令与心跳的发送源）
pub const DEVICE_ID_INTELLI_CONTROLLER: u32 = 0x201;
/// 运动控制器（底盘遥测源）
pub const DEVICE_ID_MOTION_CONTROLLER: u32 = 0x202;
/// 云台
pub const DEVICE_ID_GIMBAL: u32 = 0x203;
/// 打击检测板 1-4
pub const DEVICE_ID_HIT_DETECTOR_1: u32 = 0x211;
pub const DEVICE_ID_HIT_DETECTOR_2: u32 = 0x212;
pub const DEVICE_ID_HIT_DETECTOR_3: u32 = 0x213;
pub const DEVICE_ID_HIT_DETECTOR_4: u32 = 0x214;

/// 指令帧类型字段
pub const DEVICE_TYPE_CHASSIS: u16 = 0xc3c9;
pub const DEVICE_TYPE_GIMBAL: u16 = 0x04c9;
pub const DEVICE_TYPE_BLASTER: u16 = 0x17c9;
pub const DEVICE_TYPE_LED: u16 = 0x18c9;

/// 遥测帧类型字段
pub const TELEMETRY_TYPE_MOTION: u16 = 0x0903;
pub const TELEMETRY_TYPE_GIMBAL: u16 = 0x0904;
pub const TELEMETRY_TYPE_HIT_DETECTOR_1: u16 = 0x0938;
pub const TELEMETRY_TYPE_HIT_DETECTOR_2: u16 = 0x0958;
pub const TELEMETRY_TYPE_HIT_DETECTOR_3: u16 = 0x0978;
pub const TELEMETRY_TYPE_HIT_DETECTOR_4: u16 = 0x0998;

/// 底盘工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChassisMode {
    Disable = 0x00,
    Enable = 0x01,
}

/// 云台工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GimbalMode {
    /// 自由模式：云台独立于底盘
    Free = 0x00,
    /// 跟随模式：云台跟随底盘朝向
    Follow = 0x02,
}

/// 云台休眠状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum GimbalHibernate {
    Suspend = 0x2ab5,
    Resume = 0x7ef2,
}

/// 发射器模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlasterMode {
    /// 水弹
    Gel = 0x00,
    /// 红外
    Ir = 0x01,
}

/// LED 效果模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LedMode {
    Static = 0x71,
    Breathe = 0x72,
    Flash = 0x73,
}

/// LED 选择掩码（可按位组合，如 `LED_MASK_TOP_LEFT | LED_MASK_TOP_RIGHT`）
pub const LED_MASK_ALL: u16 = 0x3f;
pub const LED_MASK_BOTTOM_ALL: u16 = 0x0f;
pub const LED_MASK_BOTTOM_BACK: u16 = 0x01;
pub const LED_MASK_BOTTOM_FRONT: u16 = 0x02;
pub const LED_MASK_BOTTOM_LEFT: u16 = 0x04;
pub const LED_MASK_BOTTOM_RIGHT: u16 = 0x08;
pub const LED_MASK_TOP_LEFT: u16 = 0x10;
pub const LED_MASK_TOP_RIGHT: u16 = 0x20;
pub const LED_MASK_TOP_ALL: u16 = 0x30;
