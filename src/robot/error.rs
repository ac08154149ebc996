//! 驱动层错误类型定义

use crate::can::CanError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 只在 crate 内部流转；对外协议表面（`RoboMaster::init` 等）
/// 按协议约定折叠为布尔值并记录日志。
#[derive(Error, Debug)]
pub enum DriverError {
    /// CAN 适配层错误
    #[error("CAN driver error: {0}")]
    Can(#[from] CanError),

    /// 重复初始化
    #[error("driver already initialised")]
    AlreadyInitialised,
}
