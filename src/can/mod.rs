//! CAN 适配层核心定义
//!
//! 提供统一的 CAN 帧抽象与收发 trait。生产环境使用 SocketCAN（Linux），
//! 测试环境可注入任意实现了 [`RxAdapter`] / [`TxAdapter`] 的 Mock。

use std::time::Duration;
use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod socketcan;

#[cfg(target_os = "linux")]
pub use socketcan::{SocketCanAdapter, SocketCanRx, SocketCanTx};

/// SDK 通用的 CAN 帧定义（只针对 CAN 2.0）
///
/// 设计要点：
/// - Copy trait：零成本复制，适合收发线程间传递
/// - 固定 8 字节数据：避免堆分配
/// - 无生命周期：简化 API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoboMasterFrame {
    /// CAN ID（标准帧或扩展帧，标志位已剥离）
    pub id: u32,

    /// 帧数据（固定 8 字节，未使用部分为 0）
    pub data: [u8; 8],

    /// 有效数据长度 (0-8)
    pub len: u8,

    /// 是否为扩展帧（29-bit ID）
    pub is_extended: bool,
}

impl RoboMasterFrame {
    /// 创建标准帧
    pub fn new_standard(id: u16, data: &[u8]) -> Self {
        Self::new(id as u32, data, false)
    }

    /// 创建扩展帧
    pub fn new_extended(id: u32, data: &[u8]) -> Self {
        Self::new(id, data, true)
    }

    fn new(id: u32, data: &[u8], is_extended: bool) -> Self {
        let mut fixed_data = [0u8; 8];
        let len = data.len().min(8);
        fixed_data[..len].copy_from_slice(&data[..len]);

        Self {
            id,
            data: fixed_data,
            len: len as u8,
            is_extended,
        }
    }

    /// 获取数据切片（只包含有效数据）
    pub fn data_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// CAN 适配层统一错误类型
#[derive(Error, Debug)]
pub enum CanError {
    /// IO 底层错误
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 设备相关错误（接口不存在、未 UP、配置失败等）
    #[error("Device Error: {0}")]
    Device(String),

    /// 读取超时（非致命，可以重试）
    #[error("Read timeout")]
    Timeout,
}

/// RX 适配器 Trait（接收线程持有）
///
/// 阻塞读取，直到收到有效数据帧或超时。错误帧在适配器内部过滤。
pub trait RxAdapter {
    /// 接收一帧
    ///
    /// # 错误处理
    /// - 超时 → `CanError::Timeout`（可重试）
    /// - 其他 → `CanError::Io` / `CanError::Device`
    fn receive(&mut self) -> Result<RoboMasterFrame, CanError>;
}

/// TX 适配器 Trait（发送线程持有）
///
/// Fire-and-Forget：写入发送缓冲区即返回，不等待总线确认。
pub trait TxAdapter {
    /// 发送一帧（`frame.len` 必须 ≤ 8，由构造保证）
    fn send(&mut self, frame: RoboMasterFrame) -> Result<(), CanError>;
}

/// 组合适配器 Trait
///
/// 单一所有者句柄，可拆分为独立的 RX/TX 两半供双线程并发访问。
/// 对于 SocketCAN，拆分通过 `dup()` 克隆 fd 实现；原始 CAN socket
/// 的 send/recv 互不阻塞，并发安全。
pub trait CanAdapter {
    /// RX 适配器类型
    type Rx: RxAdapter;

    /// TX 适配器类型
    type Tx: TxAdapter;

    /// 设置后续接收操作的阻塞超时
    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), CanError>;

    /// 拆分为独立的 RX 和 TX 适配器（消费 `self`）
    fn split(self) -> Result<(Self::Rx, Self::Tx), CanError>;
}
