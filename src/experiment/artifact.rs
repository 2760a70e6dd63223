//! 运行产物
//!
//! 每个扫描点一个目录，目录下的 `nodes` 文件是该次运行的接口统计与
//! 各传输对吞吐量（紧凑 JSON）。

use super::opts::ExperimentOpts;
use super::pair::{PairRole, TransmissionPair};
use crate::error::{CdosError, Result};
use crate::net::{InterfaceStats, NodeId, SinkStats};
use crate::sim::SimTime;
use crate::traffic::TrafficProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 统计文件名
pub const STATS_FILE_NAME: &str = "nodes";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairSummary {
    pub index: usize,
    pub role: PairRole,
    pub source: NodeId,
    pub sink: NodeId,
    pub port: u16,
    pub load: f64,
    pub profile: TrafficProfile,
    pub start_s: f64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub throughput_bps: f64,
}

impl PairSummary {
    pub fn new(pair: &TransmissionPair, sink: Option<SinkStats>, until: SimTime) -> Self {
        let (rx_packets, rx_bytes) = sink.map_or((0, 0), |s| (s.rx_packets, s.rx_bytes));
        let active_s = until.saturating_sub(pair.start).as_secs_f64();
        let throughput_bps = if active_s > 0.0 {
            rx_bytes as f64 * 8.0 / active_s
        } else {
            0.0
        };
        Self {
            index: pair.index,
            role: pair.role,
            source: pair.source,
            sink: pair.sink,
            port: pair.port,
            load: pair.load,
            profile: pair.profile,
            start_s: pair.start.as_secs_f64(),
            rx_packets,
            rx_bytes,
            throughput_bps,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunArtifact<'a> {
    pub node_count: usize,
    pub stressor_load: f64,
    pub background_load: f64,
    pub retry_limit: u32,
    pub packet_size_bits: u64,
    pub seed: u64,
    pub duration_seconds: f64,
    pub pairs: &'a [PairSummary],
    pub interfaces: &'a [InterfaceStats],
}

/// 创建目录并写入统计文件，返回文件路径。已有文件会被覆盖。
pub fn write_run(dir: &Path, artifact: &RunArtifact<'_>) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| CdosError::artifact(dir, e))?;
    let path = dir.join(STATS_FILE_NAME);
    let bytes = serde_json::to_vec(artifact)?;
    fs::write(&path, bytes).map_err(|e| CdosError::artifact(&path, e))?;
    Ok(path)
}

/// 已有统计文件中描述运行参数的部分
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunHeader {
    pub node_count: usize,
    pub stressor_load: f64,
    pub background_load: f64,
    pub retry_limit: u32,
    pub packet_size_bits: u64,
    pub seed: u64,
    pub duration_seconds: f64,
}

impl RunHeader {
    /// 读取统计文件的参数部分；文件缺失或格式不符时返回 None。
    pub fn read(path: &Path) -> Option<Self> {
        let raw = fs::read(path).ok()?;
        serde_json::from_slice(&raw).ok()
    }

    /// 该文件是否正是以这组参数运行得到的
    pub fn matches(&self, opts: &ExperimentOpts, stressor_load: f64, background_load: f64) -> bool {
        self.node_count == opts.node_count
            && self.retry_limit == opts.retry_limit
            && self.packet_size_bits == opts.packet_size_bits
            && self.seed == opts.seed
            && same_value(self.duration_seconds, opts.duration_seconds)
            && same_value(self.stressor_load, stressor_load)
            && same_value(self.background_load, background_load)
    }
}

// JSON 往返可能差最后一位
fn same_value(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}
