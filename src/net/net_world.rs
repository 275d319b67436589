//! 网络世界实现

use super::network::Network;
use crate::sim::{ScenarioSpec, World};
use std::any::Any;

/// 持有一条连接（Network）的仿真世界
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    pub fn new(net: Network) -> Self {
        Self { net }
    }

    pub fn from_scenario(spec: &ScenarioSpec) -> Self {
        Self::new(Network::from_scenario(spec))
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
