//! SocketCAN CAN 适配器实现
//!
//! 基于 Linux 内核 SocketCAN 子系统的帧级收发。
//!
//! ## 依赖
//!
//! - `socketcan` crate (版本 3.5)
//! - CAN 接口必须已配置并处于 UP 状态（通过 `ip link` 命令）
//!
//! ## 拆分设计
//!
//! `split()` 通过 `try_clone()`（`dup()` 系统调用）把同一个打开的
//! socket 克隆为 RX / TX 两半，供接收线程与发送线程并发持有。
//! 原始 CAN socket 的读写路径在内核中相互独立，并发 send/recv 安全。
//! 超时严格依赖 `SO_RCVTIMEO`，拆分后严禁切换 `O_NONBLOCK`
//! （该标志保存在共享的打开文件描述中，会同时影响两半）。

use crate::can::{CanAdapter, CanError, RoboMasterFrame, RxAdapter, TxAdapter};
use socketcan::{BlockingCan, CanFrame, CanSocket, EmbeddedFrame, Frame, Socket, StandardId};
use std::os::fd::OwnedFd;
use std::time::Duration;
use tracing::{trace, warn};

const SFF_MASK: u32 = 0x7FF;
const EFF_MASK: u32 = 0x1FFF_FFFF;

/// SocketCAN 适配器
///
/// # 示例
///
/// ```no_run
/// use robomaster_sdk::can::{CanAdapter, SocketCanAdapter};
/// use std::time::Duration;
///
/// let mut adapter = SocketCanAdapter::open("can0").unwrap();
/// adapter.set_receive_timeout(Duration::from_millis(100)).unwrap();
/// let (rx, tx) = adapter.split().unwrap();
/// ```
#[derive(Debug)]
pub struct SocketCanAdapter {
    socket: CanSocket,
    interface: String,
    read_timeout: Duration,
}

impl SocketCanAdapter {
    /// 以 raw 模式绑定指定 CAN 接口
    ///
    /// # 错误
    /// - `CanError::Device`: 接口不存在、未 UP 或无法打开
    pub fn open(interface: impl Into<String>) -> Result<Self, CanError> {
        let interface = interface.into();
        let socket = CanSocket::open(&interface).map_err(|e| {
            CanError::Device(format!("failed to open CAN interface '{interface}': {e}"))
        })?;

        trace!("SocketCAN interface '{}' opened", interface);
        Ok(Self {
            socket,
            interface,
            read_timeout: Duration::from_millis(100),
        })
    }

    /// 获取接口名称
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// 获取当前读超时
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

impl CanAdapter for SocketCanAdapter {
    type Rx = SocketCanRx;
    type Tx = SocketCanTx;

    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), CanError> {
        self.socket.set_read_timeout(timeout).map_err(CanError::Io)?;
        self.read_timeout = timeout;
        Ok(())
    }

    fn split(self) -> Result<(Self::Rx, Self::Tx), CanError> {
        let rx = SocketCanRx::new(&self.socket, self.read_timeout)?;
        let tx = SocketCanTx::new(&self.socket)?;
        trace!(
            "SocketCanAdapter split into RX and TX halves (interface: {})",
            self.interface
        );
        Ok((rx, tx))
    }
}

/// 把收到的 socketcan 帧转为 SDK 帧，剥离 EFF/SFF 标志位
fn convert_frame(frame: &CanFrame) -> RoboMasterFrame {
    let id = if frame.is_extended() {
        frame.raw_id() & EFF_MASK
    } else {
        frame.raw_id() & SFF_MASK
    };

    let mut data = [0u8; 8];
    let payload = frame.data();
    let len = payload.len().min(8);
    data[..len].copy_from_slice(&payload[..len]);

    RoboMasterFrame {
        id,
        data,
        len: len as u8,
        is_extended: frame.is_extended(),
    }
}

fn try_clone_socket(socket: &CanSocket) -> std::io::Result<CanSocket> {
    let cloned = socket.as_raw_socket().try_clone()?;
    Ok(CanSocket::from(OwnedFd::from(cloned)))
}

fn build_frame(frame: &RoboMasterFrame) -> Result<CanFrame, CanError> {
    if frame.is_extended {
        socketcan::ExtendedId::new(frame.id)
            .and_then(|id| CanFrame::new(id, frame.data_slice()))
            .ok_or_else(|| CanError::Device(format!("invalid extended CAN id 0x{:x}", frame.id)))
    } else {
        StandardId::new(frame.id as u16)
            .and_then(|id| CanFrame::new(id, frame.data_slice()))
            .ok_or_else(|| CanError::Device(format!("invalid standard CAN id 0x{:x}", frame.id)))
    }
}

/// 只读适配器（接收线程持有）
pub struct SocketCanRx {
    socket: CanSocket,
}

impl SocketCanRx {
    fn new(socket: &CanSocket, read_timeout: Duration) -> Result<Self, CanError> {
        let rx_socket = try_clone_socket(socket)
            .map_err(|e| CanError::Device(format!("failed to clone socket for RX: {e}")))?;
        rx_socket.set_read_timeout(read_timeout).map_err(CanError::Io)?;
        Ok(Self { socket: rx_socket })
    }
}

impl RxAdapter for SocketCanRx {
    fn receive(&mut self) -> Result<RoboMasterFrame, CanError> {
        loop {
            let frame = self.socket.read_frame().map_err(|e| {
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) {
                    CanError::Timeout
                } else {
                    CanError::Io(e)
                }
            })?;

            // 错误帧不是数据，丢弃后继续等待
            if frame.is_error_frame() {
                warn!("CAN error frame received, ignoring");
                continue;
            }
            return Ok(convert_frame(&frame));
        }
    }
}

/// 只写适配器（发送线程持有）
pub struct SocketCanTx {
    socket: CanSocket,
}

impl SocketCanTx {
    fn new(socket: &CanSocket) -> Result<Self, CanError> {
        let tx_socket = try_clone_socket(socket)
            .map_err(|e| CanError::Device(format!("failed to clone socket for TX: {e}")))?;
        // 发送超时防止总线异常时发送线程无限阻塞，进而拖垮心跳节拍
        tx_socket
            .set_write_timeout(Duration::from_millis(5))
            .map_err(CanError::Io)?;
        Ok(Self { socket: tx_socket })
    }
}

impl TxAdapter for SocketCanTx {
    fn send(&mut self, frame: RoboMasterFrame) -> Result<(), CanError> {
        let can_frame = build_frame(&frame)?;
        self.socket.transmit(&can_frame).map_err(|e| match e {
            socketcan::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::TimedOut => {
                CanError::Timeout
            }
            socketcan::Error::Io(io_err) => CanError::Io(io_err),
            socketcan::Error::Can(can_err) => CanError::Device(can_err.to_string()),
        })
    }
}
