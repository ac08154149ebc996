//! RoboMaster SDK - 四轮麦轮底盘机器人 Rust 驱动
//!
//! 通过 CAN 总线与 RoboMaster 的智能控制器通讯，覆盖底盘、云台、
//! 发射器、LED 以及四块打击检测板。
//!
//! # 架构层次
//!
//! - **CAN 适配层** (`can`)：帧级收发，SocketCAN（Linux）后端，可注入 Mock
//! - **协议层** (`protocol`)：CRC 校验、Message 编解码、设备常量与字节模板
//! - **驱动层** (`robot`)：收发线程管线（10ms 心跳）、指令编码、遥测状态聚合
//!
//! # 关键约束
//!
//! 智能控制器要求每 10ms 收到一次心跳报文，否则停止响应；
//! 心跳由驱动内部的发送线程自动维持，用户只需调用指令接口。
//!
//! # Example
//!
//! ```no_run
//! use robomaster_sdk::RoboMaster;
//!
//! let mut robot = RoboMaster::new();
//! if robot.init("can0") {
//!     robot.set_chassis_velocity(0.5, 0.0, 0.0);
//!     let state = robot.get_state();
//!     println!("battery: {}%", state.battery.percent);
//! }
//! ```

pub mod can;
pub mod protocol;
pub mod robot;

// Re-export 核心类型（简化用户导入）
pub use can::{CanAdapter, CanError, RoboMasterFrame, RxAdapter, TxAdapter};
pub use protocol::ids::{BlasterMode, ChassisMode, GimbalHibernate, GimbalMode, LedMode};
pub use protocol::message::Message;
pub use robot::state::RoboMasterState;
pub use robot::{DriverError, RoboMaster};
