//! 数据包到达事件

use super::id::Side;
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::debug;

/// 事件：信道把一个包交给某一端
#[derive(Debug)]
pub struct DeliverPacket {
    pub to: Side,
    pub pkt: Packet,
}

impl Event for DeliverPacket {
    #[tracing::instrument(skip(self, sim, world), fields(to = ?self.to, seq = self.pkt.seq(), ack = self.pkt.ack_num()))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverPacket { to, pkt } = *self;
        debug!(now = %sim.now(), "📨 数据包到达");

        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.on_arrival(to, pkt, sim);
    }
}
