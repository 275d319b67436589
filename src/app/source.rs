//! 应用层消息源

use crate::net::{Message, NetWorld};
use crate::sim::{Event, ScenarioSpec, SimTime, Simulator, World};

/// 按固定间隔把消息交给发送端
#[derive(Debug, Clone)]
pub struct AppSource {
    messages: Vec<Message>,
    interval: SimTime,
}

impl AppSource {
    pub fn new(messages: Vec<Message>, interval: SimTime) -> Self {
        Self { messages, interval }
    }

    pub fn from_scenario(spec: &ScenarioSpec) -> Self {
        let messages = spec.workload().into_iter().map(Message::from).collect();
        Self::new(messages, spec.send_interval())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 从当前时间起，第 i 条消息在 `now + i * interval` 提交；返回调度的条数
    pub fn schedule(self, sim: &mut Simulator) -> u64 {
        let start = sim.now();
        let mut n = 0u64;
        for msg in self.messages {
            let at = start + SimTime(self.interval.0.saturating_mul(n));
            sim.schedule(at, AppSend { msg });
            n += 1;
        }
        n
    }
}

/// 事件：应用层提交一条消息
#[derive(Debug)]
pub struct AppSend {
    pub msg: Message,
}

impl Event for AppSend {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let AppSend { msg } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        w.net.on_app_send(msg, sim);
    }
}
