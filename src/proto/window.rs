//! 窗口与缓存
//!
//! [`SendWindow`] 把发送端分散的下标运算收拢到一处：准入、滑动、重传区间。
//! [`ReorderBuffer`] 是 TCP 模式接收端的乱序缓存。
//!
//! ```text
//!  base              next_seq
//!   │                   │
//! ──┼───────────────────┼──────────────▶ seq
//!   │<── 已发未确认 ──>│<── 可发 ──>
//! ```

use std::collections::{BTreeMap, VecDeque};

use crate::net::{Message, Packet, Seq};

/// 发送端窗口状态
#[derive(Debug, Clone, Default)]
pub struct SendWindow {
    /// 最早未确认的序号（窗口左沿）
    base: Seq,
    /// 下一个新包的序号
    next_seq: Seq,
    /// 窗口大小（包个数）；0 表示不做流控
    size: u64,
    /// 所有发出过的包，下标即序号；只追加，用于重传
    sent_log: Vec<Packet>,
    /// 尚未进入窗口的消息（FIFO）
    pending: VecDeque<Message>,
}

impl SendWindow {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn base(&self) -> Seq {
        self.base
    }

    pub fn next_seq(&self) -> Seq {
        self.next_seq
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// 立即生效；已在途的包不受影响，只改变后续准入
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    pub fn in_flight(&self) -> u64 {
        self.next_seq - self.base
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 没有在途未确认的包
    pub fn is_drained(&self) -> bool {
        self.base == self.next_seq
    }

    /// 在途与排队都为空
    pub fn is_idle(&self) -> bool {
        self.is_drained() && self.pending.is_empty()
    }

    /// 准入谓词：`next_seq - base < size`，或 `size == 0`
    pub fn can_admit(&self) -> bool {
        self.size == 0 || self.in_flight() < self.size
    }

    pub fn enqueue(&mut self, msg: Message) {
        self.pending.push_back(msg);
    }

    /// 若窗口有空位，把队首消息封装成下一个序号的包并记入 sent_log
    pub fn admit_next(&mut self) -> Option<Packet> {
        if !self.can_admit() {
            return None;
        }
        let msg = self.pending.pop_front()?;
        let pkt = Packet::data(self.next_seq, msg);
        self.sent_log.push(pkt.clone());
        self.next_seq += 1;
        Some(pkt)
    }

    /// 累计确认到 `ack`（不含）。返回新确认的包数；旧的、重复的或超出 `next_seq` 的确认返回 0。
    /// `base` 只前进不后退。
    pub fn slide_to(&mut self, ack: Seq) -> u64 {
        if ack <= self.base || ack > self.next_seq {
            return 0;
        }
        let newly = ack - self.base;
        self.base = ack;
        newly
    }

    /// 按序号查已发出的包
    pub fn packet(&self, seq: Seq) -> Option<&Packet> {
        usize::try_from(seq).ok().and_then(|i| self.sent_log.get(i))
    }

    /// 超时重传的区间：`base ..= base + size - 1`，且不超过实际发出的最大序号
    pub fn retransmit_range(&self) -> impl Iterator<Item = &Packet> + '_ {
        let end = if self.size == 0 {
            self.next_seq
        } else {
            self.base.saturating_add(self.size).min(self.next_seq)
        };
        (self.base..end).filter_map(move |seq| self.packet(seq))
    }
}

/// 乱序缓存：按序号保存已收到但还不能交付的包
#[derive(Debug, Clone, Default)]
pub struct ReorderBuffer {
    slots: BTreeMap<Seq, Packet>,
}

impl ReorderBuffer {
    /// 幂等：同一序号已存在时保留旧包，返回 false
    pub fn insert(&mut self, pkt: Packet) -> bool {
        use std::collections::btree_map::Entry;
        match self.slots.entry(pkt.seq()) {
            Entry::Vacant(slot) => {
                slot.insert(pkt);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn take(&mut self, seq: Seq) -> Option<Packet> {
        self.slots.remove(&seq)
    }

    pub fn contains(&self, seq: Seq) -> bool {
        self.slots.contains_key(&seq)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 已缓存的序号（升序）
    pub fn seqs(&self) -> impl Iterator<Item = Seq> + '_ {
        self.slots.keys().copied()
    }
}
