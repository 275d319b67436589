//! Network-facing API used by the protocol endpoints.
//!
//! The endpoints never touch the simulator directly: every side effect they
//! produce (transmit, timer, delivery, trace) goes through [`NetApi`]. The
//! simulated network implements it per side; tests implement it with a
//! recorder.

use crate::sim::SimTime;

use super::{Message, Packet, Seq};

/// Why a data packet is being sent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetransmitCause {
    Timeout,
    FastRetransmit,
}

/// Minimal collaborator API for protocol endpoints.
pub trait NetApi {
    /// Hand a packet to the unreliable channel towards the peer.
    ///
    /// `delay_hint` is advisory; the channel may ignore it.
    fn transmit(&mut self, pkt: Packet, delay_hint: Option<SimTime>);

    /// Start the single-shot retransmission timer.
    fn arm_timer(&mut self, after: SimTime);

    /// Cancel the retransmission timer; its expiry must not be reported.
    fn cancel_timer(&mut self);

    /// Pass an in-order message up to the application.
    fn deliver(&mut self, msg: Message);

    fn viz_retransmit(&mut self, _seq: Seq, _cause: RetransmitCause) {}
    fn viz_window(&mut self, _base: Seq, _next_seq: Seq, _window: u64, _threshold: Option<u64>) {}
    fn viz_recv_ack(&mut self, _ack: Seq, _dup: bool) {}
    fn viz_buffered(&mut self, _seq: Seq) {}
    fn viz_discard(&mut self, _seq: Seq, _reason: DiscardReason) {}
}

/// Why a receiver dropped an arriving data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Corrupt,
    Duplicate,
    OutOfOrder,
}
