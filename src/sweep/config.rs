//! 扫描配置
//!
//! 可从 JSON 文件加载；缺省值即参考扫描：82 个节点、1003 秒、施压负载
//! 0.02..0.98、背景负载 0.13。

use crate::error::{CdosError, Result};
use crate::experiment::{ExperimentOpts, HarnessTiming};
use crate::sweep::SweepPoint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 负载轴：单值、列表或等差序列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoadAxis {
    One(f64),
    List(Vec<f64>),
    Range { start: f64, step: f64, count: usize },
}

impl LoadAxis {
    pub fn values(&self) -> Vec<f64> {
        match self {
            LoadAxis::One(v) => vec![*v],
            LoadAxis::List(vs) => vs.clone(),
            LoadAxis::Range { start, step, count } => {
                (0..*count).map(|k| start + step * k as f64).collect()
            }
        }
    }
}

/// 整数轴：单值或列表。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Axis<T> {
    One(T),
    List(Vec<T>),
}

impl<T: Copy> Axis<T> {
    pub fn values(&self) -> Vec<T> {
        match self {
            Axis::One(v) => vec![*v],
            Axis::List(vs) => vs.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub node_count: usize,
    pub duration_seconds: f64,
    pub strong_loss_db: f64,
    pub weak_loss_db: f64,
    pub no_link_loss_db: f64,
    pub bit_rate_bps: u64,
    pub packet_size_bits: Axis<u64>,
    pub seed: u64,
    pub stressor_load: LoadAxis,
    pub background_load: LoadAxis,
    pub retry_limit: Axis<u32>,
    pub base_port: u16,
    pub output_dir: PathBuf,
    /// 目录名中负载保留的小数位数
    pub path_precision: usize,
    pub stats_interval_seconds: Option<f64>,
    /// 跳过已有同参数统计文件的扫描点（用于续跑）
    pub skip_existing: bool,
    pub harness: HarnessTiming,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let exp = ExperimentOpts::default();
        Self {
            node_count: exp.node_count,
            duration_seconds: exp.duration_seconds,
            strong_loss_db: exp.strong_loss_db,
            weak_loss_db: exp.weak_loss_db,
            no_link_loss_db: exp.no_link_loss_db,
            bit_rate_bps: exp.bit_rate_bps,
            packet_size_bits: Axis::One(exp.packet_size_bits),
            seed: exp.seed,
            stressor_load: LoadAxis::Range {
                start: 0.02,
                step: 0.02,
                count: 49,
            },
            background_load: LoadAxis::One(0.13),
            retry_limit: Axis::One(exp.retry_limit),
            base_port: exp.base_port,
            output_dir: PathBuf::from("CDoS-1Mbps-adhoc-UDP-01"),
            path_precision: 2,
            stats_interval_seconds: exp.stats_interval_seconds,
            skip_existing: false,
            harness: exp.harness,
        }
    }
}

impl SweepConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| CdosError::config(format!("failed to parse sweep config: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            CdosError::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// 扫描点对应的实验参数
    pub fn experiment_opts(&self, point: &SweepPoint) -> ExperimentOpts {
        ExperimentOpts {
            node_count: self.node_count,
            duration_seconds: self.duration_seconds,
            strong_loss_db: self.strong_loss_db,
            weak_loss_db: self.weak_loss_db,
            no_link_loss_db: self.no_link_loss_db,
            bit_rate_bps: self.bit_rate_bps,
            packet_size_bits: point.packet_size_bits,
            retry_limit: point.retry_limit,
            base_port: self.base_port,
            seed: self.seed,
            stats_interval_seconds: self.stats_interval_seconds,
            harness: self.harness.clone(),
        }
    }

    /// 配置级校验：任何一项失败都终止整个扫描。负载取值不在此校验，
    /// 越界的负载只会让对应扫描点失败。
    pub fn validate(&self) -> Result<()> {
        let axes_empty = [
            ("stressor_load", self.stressor_load.values().is_empty()),
            ("background_load", self.background_load.values().is_empty()),
            ("retry_limit", self.retry_limit.values().is_empty()),
            ("packet_size_bits", self.packet_size_bits.values().is_empty()),
        ];
        if let Some((name, _)) = axes_empty.iter().find(|(_, empty)| *empty) {
            return Err(CdosError::config(format!("sweep axis {name} is empty")));
        }
        if self.path_precision > 12 {
            return Err(CdosError::config(format!(
                "path precision {} is larger than 12 decimals",
                self.path_precision
            )));
        }
        // 每个整数轴取值都要通过实验参数校验
        for bits in self.packet_size_bits.values() {
            for retry in self.retry_limit.values() {
                let point = SweepPoint {
                    stressor_load: 0.0,
                    background_load: 0.0,
                    retry_limit: retry,
                    packet_size_bits: bits,
                };
                let opts = self.experiment_opts(&point);
                opts.validate()?;
                crate::topo::AttenuationMatrix::chain(&opts.chain_opts())?;
            }
        }
        Ok(())
    }
}
