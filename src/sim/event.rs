//! 事件与世界
//!
//! 仿真器只认识这两个 trait：事件负责改变世界，世界由上层（网络）实现。

use super::simulator::Simulator;
use std::any::Any;

/// 事件：到点后执行一次。`self: Box<Self>` 让事件可以把自身携带的数据 move 出来。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}

/// 仿真世界：事件执行时拿到的可变上下文。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每执行完一个事件回调一次
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
