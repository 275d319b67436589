//! 统计信息
//!
//! 信道与定时器层面的计数；两端各自的计数在 `SenderStats` / `ReceiverStats` 里。

/// 网络统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    /// 交给信道的包（含 ACK 与重传）
    pub transmitted_pkts: u64,
    pub dropped_pkts: u64,
    pub corrupted_pkts: u64,
    pub duplicated_pkts: u64,
    /// 到达对端的包
    pub arrived_pkts: u64,
    pub timers_armed: u64,
    pub timers_cancelled: u64,
    pub timers_fired: u64,
    /// 已作废定时器的到期事件
    pub stale_timer_events: u64,
}
