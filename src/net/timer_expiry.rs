//! 仿真定时器
//!
//! 单发倒计时：每次 arm 调度一个到期事件，并带上代号。cancel 只需让代号前进，
//! 旧的到期事件执行时发现代号不符就什么也不做，因此每次 arm 至多回调一次。

use super::net_world::NetWorld;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

#[derive(Debug, Default, Clone)]
pub struct TimerSlot {
    generation: u64,
    armed: bool,
}

impl TimerSlot {
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn arm(&mut self, after: SimTime, sim: &mut Simulator) {
        self.generation = self.generation.wrapping_add(1);
        self.armed = true;
        trace!(generation = self.generation, fires_at = %(sim.now() + after), "定时器启动");
        sim.schedule_in(
            after,
            TimerExpiry {
                generation: self.generation,
            },
        );
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.armed = false;
    }

    /// 到期事件是否仍然有效；有效时定时器随之失效
    pub fn fire(&mut self, generation: u64) -> bool {
        if !self.armed || generation != self.generation {
            return false;
        }
        self.armed = false;
        true
    }
}

/// 事件：重传定时器到期
#[derive(Debug)]
pub struct TimerExpiry {
    pub generation: u64,
}

impl Event for TimerExpiry {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TimerExpiry { generation } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.on_timer_expiry(generation, sim);
    }
}
