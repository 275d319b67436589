use serde::{Deserialize, Serialize};

use crate::net::{DiscardReason, RetransmitCause, Side, Tamper};
use crate::proto::Protocol;
use crate::sim::ChannelSpec;

/// 可视化事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 连接/信道元信息（t=0 的第一条事件）
    Meta {
        protocol: Protocol,
        window_size: u64,
        ssthresh: u64,
        timeout_ns: u64,
        channel: ChannelSpec,
        messages: u64,
    },
    /// 发送端把数据包交给信道（含重传）
    SendData { seq: u64 },
    /// 接收端发出累计 ACK
    SendAck { ack: u64 },
    /// 发送端收到 ACK
    RecvAck { ack: u64, dup: bool },
    /// 即将重传某个包
    Retransmit { seq: u64, cause: VizCause },
    /// 重传定时器到期
    Timeout { base: u64 },
    /// TCP：窗口/阈值变化
    Window {
        base: u64,
        next_seq: u64,
        window: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<u64>,
    },
    /// 接收端交付给应用层（第 `index` 条）
    Deliver { index: u64, bytes: usize },
    /// TCP：超前包进入乱序缓存
    Buffer { seq: u64 },
    /// 接收端丢弃
    Discard { seq: u64, reason: VizDiscard },
    /// 信道丢包
    Drop { seq: u64 },
    /// 信道损坏
    Corrupt { seq: u64, how: VizTamper },
    /// 信道复制
    Duplicate { seq: u64 },
    /// 所有消息已被确认
    Done { delivered: u64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VizCause {
    Timeout,
    FastRetransmit,
}

impl From<RetransmitCause> for VizCause {
    fn from(c: RetransmitCause) -> Self {
        match c {
            RetransmitCause::Timeout => VizCause::Timeout,
            RetransmitCause::FastRetransmit => VizCause::FastRetransmit,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VizDiscard {
    Corrupt,
    Duplicate,
    OutOfOrder,
}

impl From<DiscardReason> for VizDiscard {
    fn from(r: DiscardReason) -> Self {
        match r {
            DiscardReason::Corrupt => VizDiscard::Corrupt,
            DiscardReason::Duplicate => VizDiscard::Duplicate,
            DiscardReason::OutOfOrder => VizDiscard::OutOfOrder,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VizTamper {
    Payload,
    Seq,
    Ack,
}

impl From<Tamper> for VizTamper {
    fn from(t: Tamper) -> Self {
        match t {
            Tamper::Payload { .. } => VizTamper::Payload,
            Tamper::SeqBump => VizTamper::Seq,
            Tamper::AckBump => VizTamper::Ack,
        }
    }
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }

    pub fn count(&self, pred: impl Fn(&VizEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }
}
