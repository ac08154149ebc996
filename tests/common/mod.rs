//! 测试用 Mock CAN 适配器与总线流解析辅助

#![allow(dead_code)]

use robomaster_sdk::can::{CanError, RoboMasterFrame, RxAdapter, TxAdapter};
use robomaster_sdk::Message;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Mock 接收适配器：从通道取帧，无帧时阻塞到超时，模拟安静的总线
pub struct MockRx {
    frames: Receiver<RoboMasterFrame>,
    timeout: Duration,
}

impl RxAdapter for MockRx {
    fn receive(&mut self) -> Result<RoboMasterFrame, CanError> {
        match self.frames.recv_timeout(self.timeout) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Err(CanError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                // 测试侧已放手：等满一个超时再报超时，与真实 socket 一致
                std::thread::sleep(self.timeout);
                Err(CanError::Timeout)
            }
        }
    }
}

/// 注入端 + Mock 接收适配器
pub fn mock_rx() -> (Sender<RoboMasterFrame>, MockRx) {
    let (sender, receiver) = channel();
    (
        sender,
        MockRx {
            frames: receiver,
            timeout: Duration::from_millis(100),
        },
    )
}

/// 记录下来的一个 CAN 帧
#[derive(Clone)]
pub struct SentFrame {
    pub at: Instant,
    pub id: u32,
    pub data: Vec<u8>,
}

/// Mock 发送适配器：记录每个发出的 CAN 帧及其时刻
#[derive(Clone, Default)]
pub struct MockTx {
    pub sent: Arc<Mutex<Vec<SentFrame>>>,
}

impl MockTx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<SentFrame> {
        self.sent.lock().unwrap().clone()
    }
}

impl TxAdapter for MockTx {
    fn send(&mut self, frame: RoboMasterFrame) -> Result<(), CanError> {
        self.sent.lock().unwrap().push(SentFrame {
            at: Instant::now(),
            id: frame.id,
            data: frame.data_slice().to_vec(),
        });
        Ok(())
    }
}

/// Mock 发送适配器：永远失败，用于触发发送侧的连续失败停机
pub struct FailingTx;

impl TxAdapter for FailingTx {
    fn send(&mut self, _frame: RoboMasterFrame) -> Result<(), CanError> {
        Err(CanError::Device("bus unavailable".into()))
    }
}

/// 把记录的帧流重组为按时间排列的逻辑消息
///
/// 发送线程只产生规整的帧序列，逐条按长度字段切分即可；
/// 每条消息取其第一个 CAN 帧的时刻。
pub fn parse_stream(frames: &[SentFrame]) -> Vec<(Instant, Message)> {
    let mut bytes: Vec<(u8, Instant)> = Vec::new();
    for frame in frames {
        for &byte in &frame.data {
            bytes.push((byte, frame.at));
        }
    }

    let mut messages = Vec::new();
    let mut index = 0;
    while index + 10 < bytes.len() {
        assert_eq!(bytes[index].0, 0x55, "sender must emit aligned frames");
        let length = bytes[index + 1].0 as usize;
        if index + length > bytes.len() {
            break; // 末尾残帧（停机瞬间），忽略
        }
        let wire: Vec<u8> = bytes[index..index + length].iter().map(|&(b, _)| b).collect();
        let msg = Message::from_wire(frames[0].id, &wire).expect("sender emitted invalid frame");
        messages.push((bytes[index].1, msg));
        index += length;
    }
    messages
}

/// 把一条消息按 8 字节切片注入接收通道
pub fn inject_message(sender: &Sender<RoboMasterFrame>, msg: &Message) {
    let wire = msg.to_wire();
    for chunk in wire.chunks(8) {
        sender
            .send(RoboMasterFrame::new_standard(msg.device_id() as u16, chunk))
            .expect("receiver thread gone");
    }
}

/// 轮询直到条件满足或超时
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
