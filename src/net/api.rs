//! Simulation-engine API used by the experiment harness.
//!
//! The harness only talks to an engine through `SimEngine`; `WifiEngine` is the
//! built-in shared-medium implementation driven by the discrete-event core.

use super::app::{OnOffConfig, ProbeConfig};
use super::events::SampleStats;
use super::id::NodeId;
use super::mac::MacConfig;
use super::net_world::NetWorld;
use super::phy::PhyConfig;
use super::stats::{InterfaceStats, SinkStats};
use crate::error::Result;
use crate::sim::{SimTime, Simulator};

/// Calls an experiment makes into a network simulation engine.
pub trait SimEngine {
    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>>;
    fn set_default_loss(&mut self, loss_db: f64);
    fn set_loss(&mut self, from: NodeId, to: NodeId, loss_db: f64);
    fn install_devices(&mut self, phy: &PhyConfig, mac: &MacConfig) -> Result<()>;
    fn install_sink(&mut self, node: NodeId, port: u16) -> Result<()>;
    fn install_on_off(&mut self, node: NodeId, app: &OnOffConfig) -> Result<()>;
    fn install_probe(&mut self, node: NodeId, probe: &ProbeConfig) -> Result<()>;
    /// Record per-interface counters every `every` of simulated time.
    fn enable_stats_sampling(&mut self, every: SimTime);
    fn run_until(&mut self, until: SimTime);
    fn now(&self) -> SimTime;
    fn interface_stats(&self) -> Vec<InterfaceStats>;
    fn sink_stats(&self, node: NodeId, port: u16) -> Option<SinkStats>;
}

/// Built-in engine: one simulator plus one shared wireless medium.
pub struct WifiEngine {
    sim: Simulator,
    world: NetWorld,
}

impl WifiEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            sim: Simulator::default(),
            world: NetWorld::new(seed),
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }
}

impl SimEngine for WifiEngine {
    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>> {
        self.world.net.create_nodes(count)
    }

    fn set_default_loss(&mut self, loss_db: f64) {
        self.world.net.set_default_loss(loss_db);
    }

    fn set_loss(&mut self, from: NodeId, to: NodeId, loss_db: f64) {
        self.world.net.set_loss(from, to, loss_db);
    }

    fn install_devices(&mut self, phy: &PhyConfig, mac: &MacConfig) -> Result<()> {
        self.world.net.install_devices(phy, mac)
    }

    fn install_sink(&mut self, node: NodeId, port: u16) -> Result<()> {
        self.world.net.install_sink(node, port)
    }

    fn install_on_off(&mut self, node: NodeId, app: &OnOffConfig) -> Result<()> {
        self.world.net.install_on_off(node, app, &mut self.sim)
    }

    fn install_probe(&mut self, node: NodeId, probe: &ProbeConfig) -> Result<()> {
        self.world.net.install_probe(node, probe, &mut self.sim)
    }

    fn enable_stats_sampling(&mut self, every: SimTime) {
        if every == SimTime::ZERO {
            return;
        }
        let first = self.sim.now().saturating_add(every);
        self.sim.schedule(first, SampleStats { every });
    }

    fn run_until(&mut self, until: SimTime) {
        self.sim.run_until(until, &mut self.world);
    }

    fn now(&self) -> SimTime {
        self.sim.now()
    }

    fn interface_stats(&self) -> Vec<InterfaceStats> {
        self.world.net.interface_stats()
    }

    fn sink_stats(&self, node: NodeId, port: u16) -> Option<SinkStats> {
        self.world.net.sink_stats(node, port)
    }
}
