//! 单次实验的参数

use crate::error::{CdosError, Result};
use crate::sim::SimTime;
use crate::topo::ChainOpts;
use serde::{Deserialize, Serialize};

/// 实验装置本身的时序参数（与被研究的现象无关）。
///
/// 各对的流量启动时间逐对错开，避免所有源在同一时刻冷启动造成人为碰撞；
/// 流量开始前每对先发一个小探测包。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessTiming {
    pub traffic_start_seconds: f64,
    pub traffic_stagger_seconds: f64,
    pub probe_start_seconds: f64,
    pub probe_stagger_seconds: f64,
    pub probe_port: u16,
    pub probe_size_bytes: u32,
}

impl Default for HarnessTiming {
    fn default() -> Self {
        Self {
            traffic_start_seconds: 3.1,
            traffic_stagger_seconds: 0.01,
            probe_start_seconds: 0.001,
            probe_stagger_seconds: 0.001,
            probe_port: 9,
            probe_size_bytes: 10,
        }
    }
}

impl HarnessTiming {
    pub fn validate(&self) -> Result<()> {
        let times = [
            self.traffic_start_seconds,
            self.traffic_stagger_seconds,
            self.probe_start_seconds,
            self.probe_stagger_seconds,
        ];
        if times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(CdosError::config(format!(
                "harness timings must be finite and non-negative: {times:?}"
            )));
        }
        if self.probe_size_bytes == 0 {
            return Err(CdosError::config("probe size must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentOpts {
    pub node_count: usize,
    pub duration_seconds: f64,
    pub strong_loss_db: f64,
    pub weak_loss_db: f64,
    pub no_link_loss_db: f64,
    pub bit_rate_bps: u64,
    pub packet_size_bits: u64,
    pub retry_limit: u32,
    pub base_port: u16,
    pub seed: u64,
    pub stats_interval_seconds: Option<f64>,
    pub harness: HarnessTiming,
}

impl Default for ExperimentOpts {
    fn default() -> Self {
        Self {
            node_count: 82,
            duration_seconds: 1003.0,
            strong_loss_db: 80.0,
            weak_loss_db: 70.0,
            no_link_loss_db: 200.0,
            bit_rate_bps: 1_000_000,
            packet_size_bits: 1500 * 8,
            retry_limit: 7,
            base_port: 12345,
            seed: 1,
            stats_interval_seconds: Some(1.0),
            harness: HarnessTiming::default(),
        }
    }
}

impl ExperimentOpts {
    pub fn validate(&self) -> Result<()> {
        if self.node_count < 2 || self.node_count % 2 != 0 {
            return Err(CdosError::config(format!(
                "node count must be even and >= 2, got {}",
                self.node_count
            )));
        }
        if !(self.duration_seconds.is_finite() && self.duration_seconds > 0.0) {
            return Err(CdosError::config(format!(
                "duration must be positive, got {}",
                self.duration_seconds
            )));
        }
        if self.bit_rate_bps == 0 {
            return Err(CdosError::config("bit rate must be positive"));
        }
        if self.packet_size_bits == 0 || self.packet_size_bits % 8 != 0 {
            return Err(CdosError::config(format!(
                "packet size must be a positive whole number of bytes, got {} bits",
                self.packet_size_bits
            )));
        }
        if u32::try_from(self.packet_size_bits / 8).is_err() {
            return Err(CdosError::config(format!(
                "packet size {} bits is too large",
                self.packet_size_bits
            )));
        }
        if self.retry_limit == 0 {
            return Err(CdosError::config("retry limit must be at least 1"));
        }
        if let Some(every) = self.stats_interval_seconds {
            if !(every.is_finite() && every > 0.0) {
                return Err(CdosError::config(format!(
                    "stats interval must be positive, got {every}"
                )));
            }
        }
        let last_port = self.base_port as usize + self.node_count / 2 - 1;
        if last_port > u16::MAX as usize {
            return Err(CdosError::config(format!(
                "{} pairs starting at port {} overflow the port range",
                self.node_count / 2,
                self.base_port
            )));
        }
        self.harness.validate()
    }

    pub fn chain_opts(&self) -> ChainOpts {
        ChainOpts {
            node_count: self.node_count,
            strong_loss_db: self.strong_loss_db,
            weak_loss_db: self.weak_loss_db,
            no_link_loss_db: self.no_link_loss_db,
        }
    }

    pub fn duration(&self) -> SimTime {
        SimTime::from_secs_f64(self.duration_seconds)
    }

    pub fn packet_size_bytes(&self) -> u32 {
        u32::try_from(self.packet_size_bits / 8).unwrap_or(u32::MAX)
    }

    pub fn stats_interval(&self) -> Option<SimTime> {
        self.stats_interval_seconds.map(SimTime::from_secs_f64)
    }
}
