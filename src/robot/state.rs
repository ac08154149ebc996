//! 聚合遥测快照
//!
//! 不同来源设备的遥测到达在不同的帧里；每次只更新来源设备覆盖的
//! 子字段，其余保持上一次的值，避免无关字段来回闪动。
//! 快照整体通过 `ArcSwap` 原子发布，读端无锁。

use crate::protocol::telemetry::{
    AttitudeState, BatteryState, DetectorState, EscState, GimbalState, ImuState, PositionState,
    VelocityState,
};

/// 机器人最新遥测快照
///
/// `get_state` 返回的值拷贝；所有字段零值默认，
/// `active` 在收到第一帧有效遥测后置位。
#[derive(Debug, Clone, Default)]
pub struct RoboMasterState {
    /// 是否已收到过有效遥测
    pub active: bool,

    /// 云台姿态
    pub gimbal: GimbalState,

    /// 电池
    pub battery: BatteryState,

    /// 四轮电调
    pub esc: EscState,

    /// 惯性测量单元
    pub imu: ImuState,

    /// 速度
    pub velocity: VelocityState,

    /// 位置
    pub position: PositionState,

    /// 底盘姿态角
    pub attitude: AttitudeState,

    /// 四块打击检测板，下标即板号 0-3
    pub detectors: [DetectorState; 4],
}
