//! 网络世界实现

use super::network::WifiNetwork;
use crate::sim::World;
use std::any::Any;

/// 持有共享信道的仿真世界
pub struct NetWorld {
    pub net: WifiNetwork,
}

impl NetWorld {
    pub fn new(seed: u64) -> Self {
        Self {
            net: WifiNetwork::new(seed),
        }
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
