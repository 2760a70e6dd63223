//! 传输对
//!
//! 第 i 对：源 = 节点 2i，宿 = 节点 2i+1，端口 = base_port + i。最后一对是
//! 施压对（stressor），其余为背景对，共享同一个负载。

use super::opts::ExperimentOpts;
use crate::error::{CdosError, Result};
use crate::net::{NodeId, OnOffConfig, ProbeConfig, TimeDist};
use crate::sim::SimTime;
use crate::topo::ChainTopology;
use crate::traffic::TrafficProfile;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairRole {
    Stressor,
    Background,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransmissionPair {
    pub index: usize,
    pub role: PairRole,
    pub source: NodeId,
    pub sink: NodeId,
    pub port: u16,
    pub load: f64,
    pub profile: TrafficProfile,
    pub start: SimTime,
    pub probe_at: SimTime,
}

/// 两类传输对各自的负载与画像
#[derive(Debug, Clone, Copy)]
pub struct RoleLoads {
    pub stressor_load: f64,
    pub stressor: TrafficProfile,
    pub background_load: f64,
    pub background: TrafficProfile,
}

impl TransmissionPair {
    /// on/off 源配置。画像的三种情况分别映射到 on/off 时长分布。
    pub fn on_off_config(&self, opts: &ExperimentOpts) -> OnOffConfig {
        let (on, off) = match self.profile {
            TrafficProfile::AlwaysOn => (
                TimeDist::Constant(SimTime::MAX),
                TimeDist::Constant(SimTime::ZERO),
            ),
            TrafficProfile::AlwaysOff => (
                TimeDist::Constant(SimTime::ZERO),
                TimeDist::Constant(SimTime::MAX),
            ),
            TrafficProfile::Modulated {
                on_secs,
                off_mean_secs,
            } => (
                TimeDist::Constant(SimTime::from_secs_f64(on_secs)),
                TimeDist::Exponential {
                    mean_secs: off_mean_secs,
                },
            ),
        };
        OnOffConfig {
            remote: self.sink,
            port: self.port,
            packet_size_bytes: opts.packet_size_bytes(),
            data_rate_bps: opts.bit_rate_bps,
            on,
            off,
            start: self.start,
        }
    }

    pub fn probe_config(&self, opts: &ExperimentOpts) -> ProbeConfig {
        ProbeConfig {
            remote: self.sink,
            port: opts.harness.probe_port,
            size_bytes: opts.harness.probe_size_bytes,
            at: self.probe_at,
        }
    }
}

/// 为拓扑中的每一对分配角色、端口、画像与错开的启动时间
pub fn plan_pairs(
    topo: &ChainTopology,
    opts: &ExperimentOpts,
    loads: &RoleLoads,
) -> Result<Vec<TransmissionPair>> {
    let count = topo.pair_count();
    if count == 0 {
        return Err(CdosError::config("topology has no transmission pairs"));
    }
    let stressor_index = count - 1;
    let h = &opts.harness;

    let mut pairs = Vec::with_capacity(count);
    for index in 0..count {
        let (source, sink) = topo
            .pair(index)
            .ok_or_else(|| CdosError::config(format!("pair {index} is outside the topology")))?;
        let port = u16::try_from(opts.base_port as usize + index).map_err(|_| {
            CdosError::config(format!(
                "port for pair {index} overflows (base port {})",
                opts.base_port
            ))
        })?;
        if port == h.probe_port {
            return Err(CdosError::ResourceConflict(format!(
                "probe port {port} collides with the data port of pair {index}"
            )));
        }
        let (role, load, profile) = if index == stressor_index {
            (PairRole::Stressor, loads.stressor_load, loads.stressor)
        } else {
            (PairRole::Background, loads.background_load, loads.background)
        };
        let k = index as f64;
        pairs.push(TransmissionPair {
            index,
            role,
            source,
            sink,
            port,
            load,
            profile,
            start: SimTime::from_secs_f64(h.traffic_start_seconds + k * h.traffic_stagger_seconds),
            probe_at: SimTime::from_secs_f64(h.probe_start_seconds + k * h.probe_stagger_seconds),
        });
    }
    Ok(pairs)
}
