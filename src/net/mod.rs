//! 网络模拟模块
//!
//! 协议端点之外的一切：包与消息、不可靠信道、定时器设施、端点使用的 `NetApi`，
//! 以及把一条连接串起来的 `Network`。

mod api;
mod channel;
mod deliver_packet;
mod id;
mod net_world;
mod network;
mod packet;
mod stats;
mod timer_expiry;

pub use api::{DiscardReason, NetApi, RetransmitCause};
pub use channel::{Carried, Channel, ChannelConfig, Transit};
pub use deliver_packet::DeliverPacket;
pub use id::Side;
pub use net_world::NetWorld;
pub use network::{NetIo, Network};
pub use packet::{ACK_PAYLOAD, Message, Packet, Seq, Tamper, checksum_of};
pub use stats::Stats;
pub use timer_expiry::{TimerExpiry, TimerSlot};
