//! 信道与应用事件
//!
//! 每个事件只携带标识符，执行时向下转型到 `NetWorld` 再交给 `WifiNetwork`。

use super::id::{NodeId, TxId};
use super::net_world::NetWorld;
use crate::sim::{Event, SimTime, Simulator, World};

fn net_world(world: &mut dyn World) -> &mut NetWorld {
    world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld")
}

/// 空口发送结束
#[derive(Debug)]
pub struct TxEnd {
    pub tx_id: TxId,
}

impl Event for TxEnd {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_world(world).net.on_tx_end(self.tx_id, sim);
    }
}

/// 退避倒计时结束，尝试占用信道
#[derive(Debug)]
pub struct TryAccess {
    pub node: NodeId,
    pub epoch: u64,
}

impl Event for TryAccess {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_world(world).net.on_try_access(self.node, self.epoch, sim);
    }
}

/// 等待 ACK 超时
#[derive(Debug)]
pub struct AckTimeout {
    pub node: NodeId,
    pub epoch: u64,
}

impl Event for AckTimeout {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_world(world).net.on_ack_timeout(self.node, self.epoch, sim);
    }
}

/// SIFS 之后回复 ACK
#[derive(Debug)]
pub struct SendAck {
    pub node: NodeId,
    pub to: NodeId,
    pub pkt_id: u64,
}

impl Event for SendAck {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let SendAck { node, to, pkt_id } = *self;
        net_world(world).net.on_send_ack(node, to, pkt_id, sim);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    BeginOn,
    Send,
    EndOn,
}

/// on/off 源的状态推进
#[derive(Debug)]
pub struct AppStep {
    pub app: usize,
    pub phase: AppPhase,
}

impl Event for AppStep {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_world(world).net.on_app_step(self.app, self.phase, sim);
    }
}

#[derive(Debug)]
pub struct SendProbe {
    pub node: NodeId,
    pub probe: usize,
}

impl Event for SendProbe {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        net_world(world).net.on_probe(self.node, self.probe, sim);
    }
}

/// 周期性统计快照，执行后按间隔重新调度自身
#[derive(Debug)]
pub struct SampleStats {
    pub every: SimTime,
}

impl Event for SampleStats {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let now = sim.now();
        net_world(world).net.sample_stats(now);
        sim.schedule(now.saturating_add(self.every), SampleStats { every: self.every });
    }
}
