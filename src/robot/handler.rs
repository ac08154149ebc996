//! 消息管线
//!
//! 在 CAN 帧层之上提供双向消息通道，同时保证 10ms 心跳节拍：
//!
//! - **发送线程**：心跳到期优先发心跳，否则排空出站队列，
//!   否则在条件变量上等待（上限为下一次心跳期限）。
//! - **接收线程**：按来源设备维护重组缓冲，以起始字节 + 帧头 CRC-8
//!   重新同步，整帧 CRC-16 通过后经分发表过滤并回调。
//!
//! 任一线程连续失败超过 5 次即置停止位并退出；析构时置停止位、
//! 唤醒发送线程并 join 两个线程。队列里尚未发出的消息随停机丢弃。

use crate::can::{CanError, RoboMasterFrame, RxAdapter, TxAdapter};
use crate::protocol::crc::{crc16, crc8, little_endian};
use crate::protocol::ids::{
    DEVICE_ID_GIMBAL, DEVICE_ID_HIT_DETECTOR_1, DEVICE_ID_HIT_DETECTOR_2,
    DEVICE_ID_HIT_DETECTOR_3, DEVICE_ID_HIT_DETECTOR_4, DEVICE_ID_INTELLI_CONTROLLER,
    DEVICE_ID_MOTION_CONTROLLER, DEVICE_TYPE_CHASSIS, TELEMETRY_TYPE_GIMBAL,
    TELEMETRY_TYPE_HIT_DETECTOR_1, TELEMETRY_TYPE_HIT_DETECTOR_2, TELEMETRY_TYPE_HIT_DETECTOR_3,
    TELEMETRY_TYPE_HIT_DETECTOR_4, TELEMETRY_TYPE_MOTION,
};
use crate::protocol::message::{Message, MSG_OVERHEAD, MSG_START};
use crate::protocol::payload;
use crate::robot::queue::MessageQueue;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{spawn, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, trace, warn};

/// 心跳周期：超过约一个周期收不到心跳，控制器即停止响应
const HEARTBEAT_PERIOD: Duration = Duration::from_millis(10);

/// 连续失败预算，超过即停机
const MAX_ERROR_COUNT: usize = 5;

/// 接收阻塞超时
pub(crate) const RECEIVE_TIMEOUT: Duration = Duration::from_millis(100);

/// 有效遥测消息的回调
pub type MessageCallback = Box<dyn Fn(&Message) + Send>;

/// 分发过滤表的一行：只有 (来源, 类型, 载荷前缀) 全部匹配的消息
/// 才会进入回调，以此从总线杂音中甄别周期遥测帧
struct DispatchRule {
    device_id: u32,
    msg_type: u16,
    prefix: &'static [u8],
}

const DISPATCH_TABLE: [DispatchRule; 6] = [
    DispatchRule {
        device_id: DEVICE_ID_MOTION_CONTROLLER,
        msg_type: TELEMETRY_TYPE_MOTION,
        prefix: &[0x20, 0x48, 0x08, 0x00],
    },
    DispatchRule {
        device_id: DEVICE_ID_GIMBAL,
        msg_type: TELEMETRY_TYPE_GIMBAL,
        prefix: &[0x00, 0x3f, 0x76],
    },
    DispatchRule {
        device_id: DEVICE_ID_HIT_DETECTOR_1,
        msg_type: TELEMETRY_TYPE_HIT_DETECTOR_1,
        prefix: &[0x00, 0x3f, 0x02],
    },
    DispatchRule {
        device_id: DEVICE_ID_HIT_DETECTOR_2,
        msg_type: TELEMETRY_TYPE_HIT_DETECTOR_2,
        prefix: &[0x00, 0x3f, 0x02],
    },
    DispatchRule {
        device_id: DEVICE_ID_HIT_DETECTOR_3,
        msg_type: TELEMETRY_TYPE_HIT_DETECTOR_3,
        prefix: &[0x00, 0x3f, 0x02],
    },
    DispatchRule {
        device_id: DEVICE_ID_HIT_DETECTOR_4,
        msg_type: TELEMETRY_TYPE_HIT_DETECTOR_4,
        prefix: &[0x00, 0x3f, 0x02],
    },
];

fn passes_dispatch_filter(msg: &Message) -> bool {
    DISPATCH_TABLE.iter().any(|rule| {
        rule.device_id == msg.device_id()
            && rule.msg_type == msg.msg_type()
            && msg.payload().starts_with(rule.prefix)
    })
}

#[derive(Default)]
struct Shared {
    queue: MessageQueue,
    wake_lock: Mutex<()>,
    wake: Condvar,
    stopped: AtomicBool,
}

/// 双线程消息管线
pub struct Handler {
    shared: Arc<Shared>,
    sender: Option<JoinHandle<()>>,
    receiver: Option<JoinHandle<()>>,
}

impl Handler {
    /// 启动发送/接收线程并交出管线句柄
    ///
    /// `rx` / `tx` 分别移交给接收线程与发送线程；`callback`
    /// 在接收线程上对每条通过分发过滤的消息调用。
    pub fn spawn<R, T>(rx: R, tx: T, callback: MessageCallback) -> Self
    where
        R: RxAdapter + Send + 'static,
        T: TxAdapter + Send + 'static,
    {
        let shared = Arc::new(Shared::default());

        let sender = {
            let shared = Arc::clone(&shared);
            spawn(move || sender_loop(tx, shared))
        };
        let receiver = {
            let shared = Arc::clone(&shared);
            spawn(move || receiver_loop(rx, callback, shared))
        };

        Self {
            shared,
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }

    /// 消息入队并唤醒发送线程
    ///
    /// 管线停机后仍然接受入队，消息在析构时随队列丢弃。
    pub fn push_message(&self, msg: Message) {
        self.shared.queue.push(msg);
        let _guard = self.shared.wake_lock.lock();
        self.shared.wake.notify_one();
    }

    /// 管线是否仍在运行
    pub fn is_running(&self) -> bool {
        !self.shared.stopped.load(Ordering::Relaxed)
    }
}

impl Drop for Handler {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::Relaxed);
        {
            let _guard = self.shared.wake_lock.lock();
            self.shared.wake.notify_all();
        }
        if let Some(handle) = self.sender.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.receiver.take() {
            let _ = handle.join();
        }
        trace!("handler threads joined");
    }
}

/// 把消息的线格式拆成至多 8 字节的 CAN 帧依次发出
fn send_message<T: TxAdapter>(tx: &mut T, msg: &Message) -> Result<(), CanError> {
    let wire = msg.to_wire();
    for chunk in wire.chunks(8) {
        tx.send(RoboMasterFrame::new_standard(msg.device_id() as u16, chunk))?;
    }
    Ok(())
}

fn sender_loop<T: TxAdapter>(mut tx: T, shared: Arc<Shared>) {
    let mut heartbeat_sequence: u16 = 0;
    let mut error_count: usize = 0;
    let mut next_heartbeat = Instant::now() + HEARTBEAT_PERIOD;

    while error_count <= MAX_ERROR_COUNT && !shared.stopped.load(Ordering::Relaxed) {
        if Instant::now() >= next_heartbeat {
            // 心跳序号独立于用户指令序号，仅在此线程内递增
            let heartbeat = Message::new(
                DEVICE_ID_INTELLI_CONTROLLER,
                DEVICE_TYPE_CHASSIS,
                heartbeat_sequence,
                payload::HEARTBEAT.to_vec(),
            );
            match send_message(&mut tx, &heartbeat) {
                Ok(()) => {
                    heartbeat_sequence = heartbeat_sequence.wrapping_add(1);
                    next_heartbeat += HEARTBEAT_PERIOD;
                    error_count = 0;
                }
                Err(e) => {
                    error_count += 1;
                    warn!("heartbeat send failed: {e}");
                }
            }
        } else if let Some(msg) = shared.queue.pop() {
            match send_message(&mut tx, &msg) {
                Ok(()) => error_count = 0,
                Err(e) => {
                    error_count += 1;
                    warn!("message send failed: {e}");
                }
            }
        } else {
            // 入队方持有 wake_lock 时通知，这里持锁复查空队列，
            // 不会丢失 pop 与 wait 之间到达的唤醒
            let mut guard = shared.wake_lock.lock();
            if shared.queue.is_empty() && !shared.stopped.load(Ordering::Relaxed) {
                shared.wake.wait_until(&mut guard, next_heartbeat);
            }
        }
    }

    if error_count != 0 {
        shared.stopped.store(true, Ordering::Relaxed);
        error!("sender frame failure, pipeline stopped");
    }
}

fn receiver_loop<R: RxAdapter>(mut rx: R, callback: MessageCallback, shared: Arc<Shared>) {
    let mut assemblers: HashMap<u32, Assembler> = [
        DEVICE_ID_MOTION_CONTROLLER,
        DEVICE_ID_GIMBAL,
        DEVICE_ID_HIT_DETECTOR_1,
        DEVICE_ID_HIT_DETECTOR_2,
        DEVICE_ID_HIT_DETECTOR_3,
        DEVICE_ID_HIT_DETECTOR_4,
    ]
    .into_iter()
    .map(|id| (id, Assembler::new(id)))
    .collect();

    let mut error_count: usize = 0;

    while error_count <= MAX_ERROR_COUNT && !shared.stopped.load(Ordering::Relaxed) {
        let frame = match rx.receive() {
            Ok(frame) => {
                error_count = 0;
                frame
            }
            Err(e) => {
                error_count += 1;
                trace!("frame read failed: {e}");
                continue;
            }
        };

        // 未知来源的帧直接忽略
        let Some(assembler) = assemblers.get_mut(&frame.id) else {
            continue;
        };
        assembler.feed(frame.data_slice(), &mut |msg| {
            if passes_dispatch_filter(&msg) {
                callback(&msg);
            }
        });
    }

    if error_count != 0 {
        shared.stopped.store(true, Ordering::Relaxed);
        error!("receiver frame failure, pipeline stopped");
    }
}

/// 单一来源设备的重组缓冲
///
/// CAN 标识符只选择设备端点，不携带帧边界；逻辑帧靠起始字节与
/// 长度字段在字节流里重新定界。`expected == 0` 表示尚未锁定帧头。
struct Assembler {
    device_id: u32,
    buffer: Vec<u8>,
    expected: usize,
}

impl Assembler {
    fn new(device_id: u32) -> Self {
        Self {
            device_id,
            buffer: Vec::new(),
            expected: 0,
        }
    }

    /// 追加一个 CAN 帧的载荷并榨干缓冲里所有完整的逻辑帧
    fn feed(&mut self, chunk: &[u8], dispatch: &mut dyn FnMut(Message)) {
        self.buffer.extend_from_slice(chunk);

        loop {
            if self.expected == 0 && !self.lock_header() {
                return;
            }
            if self.buffer.len() < self.expected {
                return;
            }

            let frame = &self.buffer[..self.expected];
            let trailer = little_endian(frame[self.expected - 2], frame[self.expected - 1]);
            if trailer == crc16(&frame[..self.expected - 2]) {
                if let Some(msg) = Message::from_wire(self.device_id, frame) {
                    dispatch(msg);
                }
            } else {
                trace!(
                    "frame from 0x{:x} dropped: trailing checksum mismatch",
                    self.device_id
                );
            }
            // 无论校验结果如何都消费整帧，随后继续找下一个帧头
            self.buffer.drain(..self.expected);
            self.expected = 0;
        }
    }

    /// 向前扫描起始字节并验证帧头，锁定期望总长
    ///
    /// 帧头校验失败就前进一个字节重试，以此在垃圾数据后重新同步。
    /// 宣称总长不超过最短合法帧（10 字节开销 + 非空载荷）的帧头
    /// 视为伪命中。
    fn lock_header(&mut self) -> bool {
        loop {
            match self.buffer.iter().position(|&b| b == MSG_START) {
                Some(pos) => self.buffer.drain(..pos),
                None => {
                    self.buffer.clear();
                    return false;
                }
            };

            if self.buffer.len() < 4 {
                return false;
            }
            let announced = self.buffer[1] as usize;
            if self.buffer[3] == crc8(&self.buffer[..3]) && announced > MSG_OVERHEAD {
                self.expected = announced;
                return true;
            }
            self.buffer.drain(..1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry_message() -> Message {
        Message::new(
            DEVICE_ID_GIMBAL,
            TELEMETRY_TYPE_GIMBAL,
            7,
            vec![0x00, 0x3f, 0x76, 0x00, 0x00, 0x9C, 0xFF, 0xFA, 0x00],
        )
    }

    fn collect(assembler: &mut Assembler, chunk: &[u8]) -> Vec<Message> {
        let mut out = Vec::new();
        assembler.feed(chunk, &mut |msg| out.push(msg));
        out
    }

    #[test]
    fn test_assembler_whole_frame() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        let wire = telemetry_message().to_wire();

        let messages = collect(&mut assembler, &wire);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], telemetry_message());
        assert!(assembler.buffer.is_empty());
    }

    #[test]
    fn test_assembler_split_into_can_chunks() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        let wire = telemetry_message().to_wire();

        let mut messages = Vec::new();
        for chunk in wire.chunks(8) {
            messages.extend(collect(&mut assembler, chunk));
        }
        assert_eq!(messages.len(), 1);
        assert!(assembler.buffer.is_empty());
    }

    #[test]
    fn test_assembler_resync_after_junk() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        // 垃圾里混入起始字节与伪帧头，随后跟一条完整帧
        let mut stream = vec![0xDE, 0xAD, 0x55, 0x03, 0x04, 0xBE, 0xEF];
        stream.extend_from_slice(&telemetry_message().to_wire());

        let messages = collect(&mut assembler, &stream);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sequence(), 7);
        assert!(assembler.buffer.is_empty());
        assert_eq!(assembler.expected, 0);
    }

    #[test]
    fn test_assembler_drops_corrupted_frame() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        let mut wire = telemetry_message().to_wire();
        wire[10] ^= 0x01; // 载荷单比特翻转

        let messages = collect(&mut assembler, &wire);
        assert!(messages.is_empty());
        assert!(assembler.buffer.is_empty());
    }

    #[test]
    fn test_assembler_back_to_back_frames() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        let mut stream = telemetry_message().to_wire();
        stream.extend_from_slice(&telemetry_message().to_wire());

        let messages = collect(&mut assembler, &stream);
        assert_eq!(messages.len(), 2);
        assert!(assembler.buffer.is_empty());
    }

    #[test]
    fn test_assembler_keeps_partial_frame() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        let wire = telemetry_message().to_wire();

        assert!(collect(&mut assembler, &wire[..5]).is_empty());
        assert_eq!(assembler.expected, wire.len());

        let messages = collect(&mut assembler, &wire[5..]);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_assembler_pure_junk_clears_buffer() {
        let mut assembler = Assembler::new(DEVICE_ID_GIMBAL);
        let messages = collect(&mut assembler, &[0x00, 0x01, 0x02, 0xFF, 0xFE]);
        assert!(messages.is_empty());
        assert!(assembler.buffer.is_empty());
        assert_eq!(assembler.expected, 0);
    }

    #[test]
    fn test_dispatch_filter_accepts_each_source() {
        assert!(passes_dispatch_filter(&Message::new(
            DEVICE_ID_MOTION_CONTROLLER,
            TELEMETRY_TYPE_MOTION,
            0,
            vec![0x20, 0x48, 0x08, 0x00, 0xAA],
        )));
        assert!(passes_dispatch_filter(&telemetry_message()));
        assert!(passes_dispatch_filter(&Message::new(
            DEVICE_ID_HIT_DETECTOR_3,
            TELEMETRY_TYPE_HIT_DETECTOR_3,
            0,
            vec![0x00, 0x3f, 0x02, 0x00, 0xD2, 0x04],
        )));
    }

    #[test]
    fn test_dispatch_filter_rejects_mismatches() {
        // 类型对不上来源
        assert!(!passes_dispatch_filter(&Message::new(
            DEVICE_ID_MOTION_CONTROLLER,
            TELEMETRY_TYPE_GIMBAL,
            0,
            vec![0x20, 0x48, 0x08, 0x00],
        )));
        // 前缀不符
        assert!(!passes_dispatch_filter(&Message::new(
            DEVICE_ID_MOTION_CONTROLLER,
            TELEMETRY_TYPE_MOTION,
            0,
            vec![0x20, 0x48, 0x09, 0x00],
        )));
        // 载荷比前缀还短
        assert!(!passes_dispatch_filter(&Message::new(
            DEVICE_ID_GIMBAL,
            TELEMETRY_TYPE_GIMBAL,
            0,
            vec![0x00, 0x3f],
        )));
        // 指令回声不是遥测
        assert!(!passes_dispatch_filter(&Message::new(
            DEVICE_ID_INTELLI_CONTROLLER,
            DEVICE_TYPE_CHASSIS,
            0,
            payload::HEARTBEAT.to_vec(),
        )));
    }
}
