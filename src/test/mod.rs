use crate::net::{DiscardReason, Message, NetApi, Packet, RetransmitCause, Seq};
use crate::sim::SimTime;

mod sender;

/// 记录端点发出的所有副作用，并模拟一个单发定时器
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub sent: Vec<Packet>,
    pub delivered: Vec<Message>,
    pub arms: u32,
    pub cancels: u32,
    pub timer_running: bool,
    pub retransmits: Vec<(Seq, RetransmitCause)>,
    pub discards: Vec<(Seq, DiscardReason)>,
}

impl Recorder {
    pub fn seqs(&self) -> Vec<Seq> {
        self.sent.iter().map(|p| p.seq()).collect()
    }

    pub fn acks(&self) -> Vec<Seq> {
        self.sent.iter().map(|p| p.ack_num()).collect()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.sent.iter().map(|p| p.payload().to_string()).collect()
    }

    pub fn delivered_strings(&self) -> Vec<String> {
        self.delivered.iter().map(|m| m.to_string()).collect()
    }

    /// 模拟定时器到期：调用 `on_timeout` 之前先调用
    pub fn fire_timer(&mut self) {
        assert!(self.timer_running, "no timer to fire");
        self.timer_running = false;
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
        self.retransmits.clear();
    }
}

impl NetApi for Recorder {
    fn transmit(&mut self, pkt: Packet, _delay_hint: Option<SimTime>) {
        self.sent.push(pkt);
    }

    fn arm_timer(&mut self, _after: SimTime) {
        assert!(!self.timer_running, "timer armed while already running");
        self.arms += 1;
        self.timer_running = true;
    }

    fn cancel_timer(&mut self) {
        self.cancels += 1;
        self.timer_running = false;
    }

    fn deliver(&mut self, msg: Message) {
        self.delivered.push(msg);
    }

    fn viz_retransmit(&mut self, seq: Seq, cause: RetransmitCause) {
        self.retransmits.push((seq, cause));
    }

    fn viz_discard(&mut self, seq: Seq, reason: DiscardReason) {
        self.discards.push((seq, reason));
    }
}

pub(crate) fn data(seq: Seq, payload: &str) -> Packet {
    Packet::data(seq, Message::from(payload))
}
