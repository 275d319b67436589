//! 一条连接的完整仿真
//!
//! `Network` 把发送端、接收端、信道、定时器和应用层接收端接在一起。
//! 两端之间没有共享状态，只通过信道调度的 `DeliverPacket` 事件交互；
//! 每个事件在单线程仿真器里执行完才轮到下一个，端点处理函数拿到的是 `&mut self`。

use tracing::{debug, info, trace};

use super::api::{DiscardReason, NetApi, RetransmitCause};
use super::channel::{Channel, ChannelConfig};
use super::deliver_packet::DeliverPacket;
use super::id::Side;
use super::packet::{Message, Packet, Seq};
use super::stats::Stats;
use super::timer_expiry::TimerSlot;
use crate::app::{AppSink, AppSource};
use crate::proto::{ReceiverEndpoint, SenderConfig, SenderEndpoint};
use crate::sim::{ScenarioSpec, SimTime, Simulator};
use crate::viz::{VizEvent, VizEventKind, VizLogger};

/// 端点之外的一切：信道、定时器、应用层接收端、统计与可视化
pub struct NetIo {
    pub channel: Channel,
    pub timer: TimerSlot,
    pub sink: AppSink,
    pub stats: Stats,
    pub viz: Option<VizLogger>,
}

impl NetIo {
    pub(crate) fn viz_push(&mut self, t: SimTime, side: Option<Side>, kind: VizEventKind) {
        if let Some(v) = &mut self.viz {
            v.push(VizEvent {
                t_ns: t.0,
                side,
                kind,
            });
        }
    }

    fn transmit(&mut self, from: Side, pkt: Packet, delay_hint: Option<SimTime>, sim: &mut Simulator) {
        let now = sim.now();
        let seq = pkt.seq();
        self.stats.transmitted_pkts += 1;
        let kind = match from {
            Side::Sender => VizEventKind::SendData { seq },
            Side::Receiver => VizEventKind::SendAck { ack: pkt.ack_num() },
        };
        self.viz_push(now, Some(from), kind);

        let carried = self.channel.carry(pkt, delay_hint);
        if carried.duplicated {
            self.stats.duplicated_pkts += 1;
            self.viz_push(now, Some(from), VizEventKind::Duplicate { seq });
        }
        for _ in 0..carried.dropped {
            debug!(seq, ?from, "🗑️  信道丢包");
            self.stats.dropped_pkts += 1;
            self.viz_push(now, Some(from), VizEventKind::Drop { seq });
        }
        for transit in carried.arrivals {
            if let Some(how) = transit.tamper {
                debug!(seq, ?from, ?how, "信道损坏数据包");
                self.stats.corrupted_pkts += 1;
                self.viz_push(now, Some(from), VizEventKind::Corrupt { seq, how: how.into() });
            }
            sim.schedule_in(
                transit.delay,
                DeliverPacket {
                    to: from.peer(),
                    pkt: transit.pkt,
                },
            );
        }
    }
}

/// 某一端看到的 `NetApi`
struct Port<'a> {
    side: Side,
    io: &'a mut NetIo,
    sim: &'a mut Simulator,
}

impl NetApi for Port<'_> {
    fn transmit(&mut self, pkt: Packet, delay_hint: Option<SimTime>) {
        self.io.transmit(self.side, pkt, delay_hint, self.sim);
    }

    fn arm_timer(&mut self, after: SimTime) {
        self.io.stats.timers_armed += 1;
        self.io.timer.arm(after, self.sim);
    }

    fn cancel_timer(&mut self) {
        self.io.stats.timers_cancelled += 1;
        self.io.timer.cancel();
    }

    fn deliver(&mut self, msg: Message) {
        let now = self.sim.now();
        let index = self.io.sink.len() as u64;
        let bytes = msg.len();
        self.io.sink.accept(now, msg);
        self.io
            .viz_push(now, Some(self.side), VizEventKind::Deliver { index, bytes });
    }

    fn viz_retransmit(&mut self, seq: Seq, cause: RetransmitCause) {
        let now = self.sim.now();
        self.io.viz_push(
            now,
            Some(self.side),
            VizEventKind::Retransmit {
                seq,
                cause: cause.into(),
            },
        );
    }

    fn viz_window(&mut self, base: Seq, next_seq: Seq, window: u64, threshold: Option<u64>) {
        let now = self.sim.now();
        self.io.viz_push(
            now,
            Some(self.side),
            VizEventKind::Window {
                base,
                next_seq,
                window,
                threshold,
            },
        );
    }

    fn viz_recv_ack(&mut self, ack: Seq, dup: bool) {
        let now = self.sim.now();
        self.io
            .viz_push(now, Some(self.side), VizEventKind::RecvAck { ack, dup });
    }

    fn viz_buffered(&mut self, seq: Seq) {
        let now = self.sim.now();
        self.io
            .viz_push(now, Some(self.side), VizEventKind::Buffer { seq });
    }

    fn viz_discard(&mut self, seq: Seq, reason: DiscardReason) {
        let now = self.sim.now();
        self.io.viz_push(
            now,
            Some(self.side),
            VizEventKind::Discard {
                seq,
                reason: reason.into(),
            },
        );
    }
}

/// 一条连接
pub struct Network {
    pub sender: SenderEndpoint,
    pub receiver: ReceiverEndpoint,
    pub io: NetIo,
    source_total: u64,
    source_sent: u64,
    done_at: Option<SimTime>,
}

impl Network {
    pub fn new(sender: SenderEndpoint, receiver: ReceiverEndpoint, channel: Channel) -> Self {
        Self {
            sender,
            receiver,
            io: NetIo {
                channel,
                timer: TimerSlot::default(),
                sink: AppSink::default(),
                stats: Stats::default(),
                viz: None,
            },
            source_total: 0,
            source_sent: 0,
            done_at: None,
        }
    }

    pub fn from_scenario(spec: &ScenarioSpec) -> Self {
        let sender = SenderEndpoint::new(SenderConfig {
            protocol: spec.protocol,
            window_size: spec.window_size,
            ssthresh: spec.ssthresh,
            timeout: spec.timeout(),
        });
        let receiver = ReceiverEndpoint::new(spec.protocol);
        let channel = Channel::new(ChannelConfig::from(&spec.channel), spec.seed);
        Self::new(sender, receiver, channel)
    }

    pub fn stats(&self) -> &Stats {
        &self.io.stats
    }

    pub fn sink(&self) -> &AppSink {
        &self.io.sink
    }

    pub fn enable_viz(&mut self) {
        self.io.viz = Some(VizLogger::default());
    }

    pub fn viz(&self) -> Option<&VizLogger> {
        self.io.viz.as_ref()
    }

    pub fn take_viz(&mut self) -> Option<VizLogger> {
        self.io.viz.take()
    }

    /// 写入 `meta` 事件；应在启用可视化之后、开始仿真之前调用
    pub fn emit_viz_meta(&mut self, spec: &ScenarioSpec) {
        let messages = spec.workload().len() as u64;
        self.io.viz_push(
            SimTime::ZERO,
            None,
            VizEventKind::Meta {
                protocol: spec.protocol,
                window_size: spec.window_size,
                ssthresh: spec.ssthresh,
                timeout_ns: spec.timeout().0,
                channel: spec.channel.clone(),
                messages,
            },
        );
    }

    /// 调度应用层的全部消息；接收端同时记下期望的交付顺序
    pub fn start_source(&mut self, source: AppSource, sim: &mut Simulator) {
        self.io.sink.set_expected(source.messages().to_vec());
        let n = source.schedule(sim);
        self.source_total = self.source_total.saturating_add(n);
        info!(messages = n, protocol = %self.sender.protocol(), "🚀 应用层开始发送");
    }

    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    pub fn done_time(&self) -> Option<SimTime> {
        self.done_at
    }

    pub fn timer_armed(&self) -> bool {
        self.io.timer.is_armed()
    }

    pub(crate) fn on_app_send(&mut self, msg: Message, sim: &mut Simulator) {
        self.source_sent += 1;
        let mut port = Port {
            side: Side::Sender,
            io: &mut self.io,
            sim,
        };
        self.sender.send(msg, &mut port);
    }

    #[tracing::instrument(skip(self, pkt, sim), fields(seq = pkt.seq()))]
    pub(crate) fn on_arrival(&mut self, to: Side, pkt: Packet, sim: &mut Simulator) {
        self.io.stats.arrived_pkts += 1;
        {
            let mut port = Port {
                side: to,
                io: &mut self.io,
                sim: &mut *sim,
            };
            match to {
                Side::Sender => self.sender.on_ack(pkt, &mut port),
                Side::Receiver => self.receiver.on_packet(pkt, &mut port),
            }
        }
        self.check_done(sim);
    }

    pub(crate) fn on_timer_expiry(&mut self, generation: u64, sim: &mut Simulator) {
        if !self.io.timer.fire(generation) {
            trace!(generation, "过期的定时器事件");
            self.io.stats.stale_timer_events += 1;
            return;
        }
        self.io.stats.timers_fired += 1;
        let now = sim.now();
        let base = self.sender.base();
        self.io
            .viz_push(now, Some(Side::Sender), VizEventKind::Timeout { base });
        let mut port = Port {
            side: Side::Sender,
            io: &mut self.io,
            sim,
        };
        self.sender.on_timeout(&mut port);
    }

    fn check_done(&mut self, sim: &mut Simulator) {
        if self.done_at.is_some() || self.source_total == 0 {
            return;
        }
        if self.source_sent == self.source_total && self.sender.is_idle() {
            let now = sim.now();
            self.done_at = Some(now);
            let delivered = self.io.sink.len() as u64;
            info!(
                at = %now,
                delivered,
                retransmits = self.sender.stats().timeout_retransmits + self.sender.stats().fast_retransmits,
                "🏁 所有消息均已确认"
            );
            self.io
                .viz_push(now, Some(Side::Sender), VizEventKind::Done { delivered });
        }
    }
}
