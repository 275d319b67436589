//! 不可靠信道
//!
//! 每次发送独立决定：丢失、损坏、复制，以及单程时延（基础时延 + 均匀抖动）。
//! 抖动使后发的包可能先到，从而产生乱序。随机数由种子决定，同一场景可复现。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sim::{ChannelSpec, SimTime};

use super::{Packet, Tamper};

/// 载荷被改写的概率；否则改序号（0.875）或确认号
const PAYLOAD_TAMPER_P: f64 = 0.75;
const SEQ_TAMPER_P: f64 = 0.875;

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub delay: SimTime,
    pub jitter: SimTime,
    pub loss: f64,
    pub corrupt: f64,
    pub duplicate: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            delay: SimTime::from_millis(5),
            jitter: SimTime::ZERO,
            loss: 0.0,
            corrupt: 0.0,
            duplicate: 0.0,
        }
    }
}

impl From<&ChannelSpec> for ChannelConfig {
    fn from(spec: &ChannelSpec) -> Self {
        Self {
            delay: SimTime::from_millis(spec.delay_ms),
            jitter: SimTime::from_millis(spec.jitter_ms),
            loss: spec.loss,
            corrupt: spec.corrupt,
            duplicate: spec.duplicate,
        }
    }
}

/// 一个即将到达对端的副本
#[derive(Debug, Clone)]
pub struct Transit {
    pub delay: SimTime,
    pub pkt: Packet,
    pub tamper: Option<Tamper>,
}

/// 一次发送的结果
#[derive(Debug, Clone, Default)]
pub struct Carried {
    pub arrivals: Vec<Transit>,
    pub dropped: u32,
    pub duplicated: bool,
}

#[derive(Debug, Clone)]
pub struct Channel {
    cfg: ChannelConfig,
    rng: StdRng,
}

fn clamp_p(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

impl Channel {
    pub fn new(mut cfg: ChannelConfig, seed: u64) -> Self {
        cfg.loss = clamp_p(cfg.loss);
        cfg.corrupt = clamp_p(cfg.corrupt);
        cfg.duplicate = clamp_p(cfg.duplicate);
        Self {
            cfg,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 无损、无抖动的信道
    pub fn perfect(delay: SimTime) -> Self {
        Self::new(
            ChannelConfig {
                delay,
                ..ChannelConfig::default()
            },
            0,
        )
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.cfg
    }

    /// 决定这个包的命运。`delay_hint` 给出时代替配置的基础时延。
    pub fn carry(&mut self, pkt: Packet, delay_hint: Option<SimTime>) -> Carried {
        let mut out = Carried::default();
        let copies = if self.rng.gen_bool(self.cfg.duplicate) {
            out.duplicated = true;
            2
        } else {
            1
        };

        for _ in 0..copies {
            if self.rng.gen_bool(self.cfg.loss) {
                out.dropped += 1;
                continue;
            }
            let mut copy = pkt.clone();
            let tamper = if self.rng.gen_bool(self.cfg.corrupt) {
                let how = self.pick_tamper(&copy);
                Some(copy.tamper(how))
            } else {
                None
            };
            let delay = self.sample_delay(delay_hint);
            out.arrivals.push(Transit {
                delay,
                pkt: copy,
                tamper,
            });
        }
        out
    }

    fn pick_tamper(&mut self, pkt: &Packet) -> Tamper {
        if self.rng.gen_bool(PAYLOAD_TAMPER_P) {
            let len = pkt.payload().len().max(1);
            Tamper::Payload {
                index: self.rng.gen_range(0..len),
            }
        } else if self.rng.gen_bool(SEQ_TAMPER_P) {
            Tamper::SeqBump
        } else {
            Tamper::AckBump
        }
    }

    fn sample_delay(&mut self, delay_hint: Option<SimTime>) -> SimTime {
        let base = delay_hint.unwrap_or(self.cfg.delay);
        if self.cfg.jitter.0 == 0 {
            return base;
        }
        base + SimTime(self.rng.gen_range(0..=self.cfg.jitter.0))
    }
}
