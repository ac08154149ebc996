//! 固定字节模板
//!
//! 由逆向抓包得到的载荷原文。指令在模板副本的固定偏移处写入字段后入队；
//! 模板本身逐字节固定，任何"整理"都会破坏与固件的兼容性。

/// 心跳载荷：每 10ms 由发送线程发出，授权控制器持续运行
pub const HEARTBEAT: [u8; 17] = [
    0x00, 0x3f, 0x60, 0x00, 0x04, 0x20, 0x00, 0x01, 0x00, 0x40, 0x00, 0x02, 0x10, 0x00, 0x03,
    0x00, 0x00,
];

// === 启动序列（init 成功后按序号 0-4 依次入队） ===

pub const BOOT_CHASSIS_PRIMARY: [u8; 6] = [0x40, 0x48, 0x04, 0x00, 0x09, 0x00];

pub const BOOT_CHASSIS_SECONDARY: [u8; 8] = [0x40, 0x48, 0x01, 0x09, 0x00, 0x00, 0x00, 0x03];

/// 订阅运动控制器周期遥测的配置块
pub const BOOT_CHASSIS_SUB: [u8; 66] = [
    0x40, 0x48, 0x03, 0x09, 0x01, 0x03, 0x00, 0x07, 0xa7, 0x02, 0x29, 0x88, 0x03, 0x00, 0x02,
    0x00, 0x66, 0x3e, 0x3e, 0x4c, 0x03, 0x00, 0x02, 0x00, 0xfb, 0xdc, 0xf5, 0xd7, 0x03, 0x00,
    0x02, 0x00, 0x09, 0xa3, 0x26, 0xe2, 0x03, 0x00, 0x02, 0x00, 0xf4, 0x1d, 0x1c, 0xdc, 0x03,
    0x00, 0x02, 0x00, 0x42, 0xee, 0x13, 0x1d, 0x03, 0x00, 0x02, 0x00, 0xb3, 0xf7, 0xe6, 0x47,
    0x03, 0x00, 0x02, 0x00, 0x32, 0x00,
];

pub const BOOT_GIMBAL_SUB: [u8; 5] = [0x40, 0x04, 0x1e, 0x05, 0xff];

pub const BOOT_LED_RESET: [u8; 16] = [
    0x00, 0x3f, 0x32, 0x01, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

// === 底盘指令 ===

/// 模式，偏移 3 写入模式字节
pub const CHASSIS_MODE: [u8; 4] = [0x40, 0x3f, 0x19, 0x00];

/// 轮速，偏移 3/5/7/9 写入四个 i16（fr, -fl, -rl, rr）
pub const CHASSIS_RPM: [u8; 11] = [
    0x40, 0x3f, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// 速度，偏移 3/7/11 写入三个 f32（vx, vy, wz）
pub const CHASSIS_VELOCITY: [u8; 15] = [
    0x00, 0x3f, 0x21, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// 位置，偏移 7/9/11 写入 i16，偏移 14 固定写 0x12c
pub const CHASSIS_POSITION: [u8; 16] = [
    0x00, 0x3f, 0x25, 0x02, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x32, 0x00,
    0x00,
];

// === 云台指令 ===

/// 模式，偏移 3 写入模式字节
pub const GIMBAL_MODE: [u8; 4] = [0x40, 0x04, 0x4c, 0x00];

/// 休眠，偏移 3 写入 u16 状态码
pub const GIMBAL_HIBERNATE: [u8; 5] = [0x20, 0x04, 0x0d, 0x00, 0x00];

/// 角度运动，偏移 5 pitch / 7 yaw
pub const GIMBAL_DEGREE: [u8; 9] = [0x00, 0x04, 0x69, 0x08, 0x05, 0x00, 0x00, 0x00, 0x00];

/// 角速度，偏移 3 yaw / 7 pitch
pub const GIMBAL_VELOCITY: [u8; 10] = [
    0x00, 0x04, 0x0c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xcd,
];

/// 绝对位置，偏移 6 yaw / 10 pitch / 14 yaw 加速度 / 18 pitch 加速度
pub const GIMBAL_POSITION: [u8; 20] = [
    0x00, 0x3f, 0xb0, 0x03, 0x08, 0x25, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

/// 回中，偏移 6 yaw / 10 pitch
pub const GIMBAL_RECENTER: [u8; 12] = [
    0x00, 0x3f, 0xb2, 0x01, 0x08, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

// === 发射器 / LED ===

/// 发射，偏移 3 写入 `(mode << 4) | count`
pub const BLASTER_GEL: [u8; 4] = [0x00, 0x3f, 0x51, 0x00];

/// 发射伴随灯效，偏移 8/10 写入 `count * 100`
pub const BLASTER_LED: [u8; 12] = [
    0x00, 0x3f, 0x55, 0x73, 0xff, 0xff, 0xff, 0x01, 0x00, 0x00, 0x00, 0x00,
];

/// LED 效果，偏移 3 模式 / 6-8 RGB / 10 上升沿 / 12 下降沿 / 14 掩码
pub const LED_MODE: [u8; 16] = [
    0x00, 0x3f, 0x32, 0x00, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];
