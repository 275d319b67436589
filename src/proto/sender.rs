//! 发送端状态机
//!
//! 三类事件驱动：应用层 `send`、ACK 到达 `on_ack`、重传定时器到期 `on_timeout`。
//! 两种协议共用同一个准入谓词（[`SendWindow::can_admit`]），区别只在于
//! `base` 如何前进以及窗口大小如何变化：
//! - GBN：新 ACK 滑窗，重复 ACK 忽略，只靠超时整窗重传
//! - TCP：新 ACK 滑窗并增长窗口（慢启动翻倍 / 之后线性 +1），
//!   第 3 个重复 ACK 触发快速重传并把窗口降到 1

use tracing::{debug, info, trace, warn};

use crate::net::{Message, NetApi, Packet, RetransmitCause, Seq};
use crate::sim::SimTime;

use super::{Protocol, RetransmitTimer, SendWindow};

/// 触发快速重传的重复 ACK 个数（即第 4 个相同 ACK）
pub const DUP_ACK_THRESHOLD: u32 = 3;

#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub protocol: Protocol,
    /// 初始窗口（包个数）；0 表示不做流控
    pub window_size: u64,
    /// TCP 模式慢启动阈值初值
    pub ssthresh: u64,
    pub timeout: SimTime,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Gbn,
            window_size: 4,
            ssthresh: 8,
            timeout: SimTime::from_millis(40),
        }
    }
}

/// 发送端计数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// 首次发送的数据包
    pub data_sent: u64,
    pub timeouts: u64,
    pub timeout_retransmits: u64,
    pub fast_retransmits: u64,
    pub acks_received: u64,
    pub dup_acks: u64,
    /// 校验失败或头部被篡改的 ACK
    pub bad_acks: u64,
    /// 比 `base` 更旧、或确认了尚未发送序号的 ACK
    pub stale_acks: u64,
}

#[derive(Debug, Clone)]
pub struct SenderEndpoint {
    protocol: Protocol,
    window: SendWindow,
    timer: RetransmitTimer,
    dup_acks: u32,
    /// 上一次见到的 ACK 值；只有与它相同的 ACK 才算重复
    last_ack: Option<Seq>,
    ssthresh: u64,
    stats: SenderStats,
}

impl SenderEndpoint {
    pub fn new(cfg: SenderConfig) -> Self {
        Self {
            protocol: cfg.protocol,
            window: SendWindow::new(cfg.window_size),
            timer: RetransmitTimer::new(cfg.timeout),
            dup_acks: 0,
            last_ack: None,
            ssthresh: cfg.ssthresh,
            stats: SenderStats::default(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// 连接建立时配置；连接中途切换协议没有定义
    pub fn set_protocol(&mut self, protocol: Protocol) {
        if !self.window.is_idle() {
            warn!(from = %self.protocol, to = %protocol, "连接进行中切换协议");
        }
        self.protocol = protocol;
    }

    pub fn set_window_size(&mut self, n: u64) {
        self.window.set_size(n);
    }

    pub fn window(&self) -> &SendWindow {
        &self.window
    }

    pub fn base(&self) -> Seq {
        self.window.base()
    }

    pub fn next_seq(&self) -> Seq {
        self.window.next_seq()
    }

    pub fn window_size(&self) -> u64 {
        self.window.size()
    }

    /// 慢启动阈值（仅 TCP 模式有意义）
    pub fn ssthresh(&self) -> Option<u64> {
        match self.protocol {
            Protocol::Tcp => Some(self.ssthresh),
            Protocol::Gbn => None,
        }
    }

    pub fn dup_acks(&self) -> u32 {
        self.dup_acks
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// 所有消息都已发出并被确认
    pub fn is_idle(&self) -> bool {
        self.window.is_idle()
    }

    /// 应用层提交一条消息。窗口满时排队，否则立即封包发送；排在队列里的消息总是先走。
    #[tracing::instrument(skip(self, msg, api), fields(proto = %self.protocol, base = self.window.base(), next_seq = self.window.next_seq()))]
    pub fn send(&mut self, msg: Message, api: &mut dyn NetApi) {
        self.window.enqueue(msg);
        if self.release_queued(api) == 0 {
            debug!(queued = self.window.pending_len(), "窗口已满，消息排队");
        }
    }

    /// 把排队的消息按 FIFO 放进窗口空位，返回本次发出的包数
    fn release_queued(&mut self, api: &mut dyn NetApi) -> u64 {
        let mut released = 0;
        while let Some(pkt) = self.window.admit_next() {
            trace!(seq = pkt.seq(), "📤 发送数据包");
            self.stats.data_sent += 1;
            api.transmit(pkt, None);
            self.timer.start(api);
            released += 1;
        }
        released
    }

    #[tracing::instrument(skip(self, pkt, api), fields(proto = %self.protocol, ack = pkt.ack_num(), base = self.window.base()))]
    pub fn on_ack(&mut self, pkt: Packet, api: &mut dyn NetApi) {
        if !pkt.is_intact() {
            debug!(
                corrupt = pkt.is_corrupt(),
                tampered = pkt.is_tampered(),
                "丢弃损坏的 ACK"
            );
            self.stats.bad_acks += 1;
            return;
        }
        self.stats.acks_received += 1;

        let ack = pkt.ack_num();
        if ack > self.window.next_seq() {
            warn!(next_seq = self.window.next_seq(), "ACK 确认了尚未发送的序号，忽略");
            self.stats.stale_acks += 1;
            return;
        }

        match self.protocol {
            Protocol::Gbn => self.on_ack_gbn(ack, api),
            Protocol::Tcp => self.on_ack_tcp(ack, api),
        }
    }

    fn on_ack_gbn(&mut self, ack: Seq, api: &mut dyn NetApi) {
        let newly = self.window.slide_to(ack);
        if newly == 0 {
            // 重复或过期的 ACK：窗口不动，等超时
            trace!("重复 ACK");
            self.stats.dup_acks += 1;
            api.viz_recv_ack(ack, true);
            return;
        }
        api.viz_recv_ack(ack, false);
        debug!(newly, new_base = self.window.base(), "➡️  窗口滑动");
        self.dup_acks = 0;
        self.after_slide(api);
    }

    fn on_ack_tcp(&mut self, ack: Seq, api: &mut dyn NetApi) {
        let base = self.window.base();
        if ack > base {
            let newly = self.window.slide_to(ack);
            api.viz_recv_ack(ack, false);
            self.dup_acks = 0;
            self.last_ack = Some(ack);
            self.grow_window();
            debug!(
                newly,
                new_base = self.window.base(),
                cwnd = self.window.size(),
                ssthresh = self.ssthresh,
                "➡️  窗口滑动"
            );
            self.after_slide(api);
            api.viz_window(
                self.window.base(),
                self.window.next_seq(),
                self.window.size(),
                Some(self.ssthresh),
            );
        } else if ack == base && self.last_ack != Some(ack) {
            // 第一次见到这个值（例如连接刚开始时的 ACK 0），还不是重复
            trace!("首个 ACK，记下");
            self.last_ack = Some(ack);
            api.viz_recv_ack(ack, false);
        } else if ack == base {
            self.dup_acks += 1;
            self.stats.dup_acks += 1;
            api.viz_recv_ack(ack, true);
            trace!(dup_acks = self.dup_acks, "重复 ACK");
            if self.dup_acks >= DUP_ACK_THRESHOLD {
                self.fast_retransmit(api);
            }
        } else {
            trace!("过期 ACK，忽略");
            self.stats.stale_acks += 1;
        }
    }

    /// 慢启动：窗口小于阈值时翻倍，否则 +1。窗口为 0（不流控）时不参与增长。
    fn grow_window(&mut self) {
        let size = self.window.size();
        if size == 0 {
            return;
        }
        let grown = if size < self.ssthresh {
            size.saturating_mul(2)
        } else {
            size.saturating_add(1)
        };
        self.window.set_size(grown);
    }

    fn fast_retransmit(&mut self, api: &mut dyn NetApi) {
        self.dup_acks = 0;
        let base = self.window.base();
        let Some(pkt) = self.window.packet(base).cloned() else {
            // 没有在途的包，重复 ACK 只是对重复数据的回应
            return;
        };
        info!(seq = base, "⚡ 快速重传");
        self.stats.fast_retransmits += 1;
        api.viz_retransmit(base, RetransmitCause::FastRetransmit);
        api.transmit(pkt, None);

        let size = self.window.size();
        if size != 0 {
            self.ssthresh = (size / 2).max(2);
            self.window.set_size(1);
        }
        api.viz_window(
            self.window.base(),
            self.window.next_seq(),
            self.window.size(),
            Some(self.ssthresh),
        );
    }

    fn after_slide(&mut self, api: &mut dyn NetApi) {
        self.release_queued(api);
        if self.window.is_drained() {
            self.timer.stop(api);
        } else {
            self.timer.restart(api);
        }
    }

    /// 定时器到期：重传 `base` 起一个窗口内所有已发出的包，然后重新计时
    #[tracing::instrument(skip(self, api), fields(proto = %self.protocol, base = self.window.base(), next_seq = self.window.next_seq()))]
    pub fn on_timeout(&mut self, api: &mut dyn NetApi) {
        self.timer.on_expired();
        if self.window.is_drained() {
            trace!("窗口为空，忽略超时");
            return;
        }
        self.stats.timeouts += 1;

        let resend: Vec<Packet> = self.window.retransmit_range().cloned().collect();
        info!(count = resend.len(), "⏰ 超时重传");
        for pkt in resend {
            self.stats.timeout_retransmits += 1;
            api.viz_retransmit(pkt.seq(), RetransmitCause::Timeout);
            api.transmit(pkt, None);
        }
        self.timer.start(api);
    }
}
