//! 接收端状态机
//!
//! 每个到达的包按四种情况之一处理，每种情况之后都回一个累计 ACK：
//!
//! | 情况 | GBN | TCP |
//! |------|-----|-----|
//! | 校验失败 / 头部被篡改 | 丢弃 | 丢弃 |
//! | `seq > expected` | 丢弃 | 放入乱序缓存 |
//! | `seq < expected` | 丢弃（重复） | 丢弃（重复） |
//! | `seq == expected` | 交付 | 交付，并顺带交付缓存里接续的包 |
//!
//! ACK 的值是 `expected_seq`，即确认了所有 `< expected_seq` 的序号。

use tracing::{debug, trace};

use crate::net::{DiscardReason, NetApi, Packet, Seq};

use super::{Protocol, ReorderBuffer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub delivered: u64,
    pub acks_sent: u64,
    pub corrupt: u64,
    pub duplicates: u64,
    /// GBN 丢弃的超前包
    pub out_of_order_dropped: u64,
    /// TCP 新缓存的超前包
    pub buffered: u64,
}

#[derive(Debug, Clone)]
pub struct ReceiverEndpoint {
    protocol: Protocol,
    expected_seq: Seq,
    buffer: ReorderBuffer,
    stats: ReceiverStats,
}

impl ReceiverEndpoint {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            expected_seq: 0,
            buffer: ReorderBuffer::default(),
            stats: ReceiverStats::default(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn set_protocol(&mut self, protocol: Protocol) {
        self.protocol = protocol;
    }

    pub fn expected_seq(&self) -> Seq {
        self.expected_seq
    }

    /// 当前累计 ACK 的值；尚未交付任何消息时为 0
    pub fn cumulative_ack(&self) -> Seq {
        self.expected_seq
    }

    pub fn buffer(&self) -> &ReorderBuffer {
        &self.buffer
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    #[tracing::instrument(skip(self, pkt, api), fields(proto = %self.protocol, seq = pkt.seq(), expected = self.expected_seq))]
    pub fn on_packet(&mut self, pkt: Packet, api: &mut dyn NetApi) {
        if !pkt.is_intact() {
            debug!(
                corrupt = pkt.is_corrupt(),
                tampered = pkt.is_tampered(),
                "💥 包已损坏，重发累计 ACK"
            );
            self.stats.corrupt += 1;
            api.viz_discard(pkt.seq(), DiscardReason::Corrupt);
            self.send_ack(api);
            return;
        }

        let seq = pkt.seq();
        if seq > self.expected_seq {
            match self.protocol {
                Protocol::Gbn => {
                    trace!("乱序包，GBN 丢弃");
                    self.stats.out_of_order_dropped += 1;
                    api.viz_discard(seq, DiscardReason::OutOfOrder);
                }
                Protocol::Tcp => {
                    if self.buffer.insert(pkt) {
                        trace!(buffered = self.buffer.len(), "乱序包，放入缓存");
                        self.stats.buffered += 1;
                        api.viz_buffered(seq);
                    }
                }
            }
            self.send_ack(api);
        } else if seq < self.expected_seq {
            trace!("重复包");
            self.stats.duplicates += 1;
            api.viz_discard(seq, DiscardReason::Duplicate);
            self.send_ack(api);
        } else {
            self.deliver(pkt, api);
            if self.protocol == Protocol::Tcp {
                while let Some(next) = self.buffer.take(self.expected_seq) {
                    trace!(seq = next.seq(), "从缓存交付");
                    self.deliver(next, api);
                }
            }
        }
    }

    fn deliver(&mut self, pkt: Packet, api: &mut dyn NetApi) {
        debug!(seq = pkt.seq(), "✅ 按序交付");
        self.expected_seq += 1;
        self.stats.delivered += 1;
        api.deliver(pkt.into_payload());
        self.send_ack(api);
    }

    fn send_ack(&mut self, api: &mut dyn NetApi) {
        self.stats.acks_sent += 1;
        api.transmit(Packet::ack(self.expected_seq), None);
    }
}
