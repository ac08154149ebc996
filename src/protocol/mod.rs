//! 协议层
//!
//! 智能控制器私有协议的纯数据部分：校验和、帧编解码、
//! 设备常量与固定字节模板。不做任何 IO。

pub mod crc;
pub mod ids;
pub mod message;
pub mod payload;
pub mod telemetry;

pub use crc::{crc16, crc8, little_endian};
pub use message::Message;
