//! 仿真核心模块
//!
//! 事件驱动仿真的基础设施：仿真时间、事件、世界、仿真器，以及场景描述。

mod event;
mod scenario;
mod simulator;
mod time;

pub use event::{Event, World};
pub use scenario::{ChannelSpec, ConfigError, ScenarioSpec};
pub use simulator::Simulator;
pub use time::SimTime;
