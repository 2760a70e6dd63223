//! 扫描计划与产物命名
//!
//! 目录名直接由参数取值构成（例如 `u_0=0.50rho=0.13`），只有在被扫描的
//! 轴上才追加重传上限与包长后缀。负载默认保留两位小数；同一轴上不同取值
//! 若写法相同则逐位加长。同参数重跑得到同一目录，覆盖旧结果。

use super::config::SweepConfig;
use crate::error::{CdosError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// 一个扫描点：所有可变参数的一组取值
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub stressor_load: f64,
    pub background_load: f64,
    pub retry_limit: u32,
    pub packet_size_bits: u64,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(stressor_load={}, background_load={}, retry_limit={}, packet_size_bits={})",
            self.stressor_load, self.background_load, self.retry_limit, self.packet_size_bits
        )
    }
}

/// 负载在目录名中的写法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFormat {
    /// 固定小数位数
    Fixed(usize),
    /// 最短可往返表示
    Shortest,
}

impl LoadFormat {
    /// 从 `base` 位小数起逐位加长，直到轴上不同取值的写法互不相同。
    pub fn for_axis(values: &[f64], base: usize) -> Self {
        let distinct = distinct_count(values.iter().map(|v| format!("{v}")));
        (base..=17)
            .find(|&p| distinct_count(values.iter().map(|v| format!("{v:.p$}"))) == distinct)
            .map_or(LoadFormat::Shortest, LoadFormat::Fixed)
    }

    pub fn format(self, v: f64) -> String {
        match self {
            LoadFormat::Fixed(p) => format!("{v:.p$}"),
            LoadFormat::Shortest => format!("{v}"),
        }
    }
}

fn distinct_count(names: impl Iterator<Item = String>) -> usize {
    names.collect::<HashSet<_>>().len()
}

/// 目录命名规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNaming {
    pub stressor: LoadFormat,
    pub background: LoadFormat,
    pub with_retry_limit: bool,
    pub with_packet_size: bool,
}

impl PathNaming {
    pub fn dir_name(&self, point: &SweepPoint) -> String {
        let mut name = format!(
            "u_0={}rho={}",
            self.stressor.format(point.stressor_load),
            self.background.format(point.background_load)
        );
        if self.with_retry_limit {
            name.push_str(&format!("_slrc={}", point.retry_limit));
        }
        if self.with_packet_size {
            name.push_str(&format!("_pkt={}", point.packet_size_bits / 8));
        }
        name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPoint {
    pub point: SweepPoint,
    pub dir: PathBuf,
}

/// 按确定顺序展开的全部扫描点
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub naming: PathNaming,
    pub points: Vec<PlannedPoint>,
}

impl SweepPlan {
    /// 展开笛卡尔积（外层为施压负载，其后依次为背景负载、重传上限、包长），
    /// 并检查目录名互不相同。
    pub fn build(cfg: &SweepConfig) -> Result<Self> {
        let stressor = cfg.stressor_load.values();
        let background = cfg.background_load.values();
        let retries = cfg.retry_limit.values();
        let sizes = cfg.packet_size_bits.values();
        let naming = PathNaming {
            stressor: LoadFormat::for_axis(&stressor, cfg.path_precision),
            background: LoadFormat::for_axis(&background, cfg.path_precision),
            with_retry_limit: retries.len() > 1,
            with_packet_size: sizes.len() > 1,
        };

        let mut points = Vec::with_capacity(stressor.len() * background.len() * retries.len() * sizes.len());
        let mut seen: HashMap<String, SweepPoint> = HashMap::new();
        for &stressor_load in &stressor {
            for &background_load in &background {
                for &retry_limit in &retries {
                    for &packet_size_bits in &sizes {
                        let point = SweepPoint {
                            stressor_load,
                            background_load,
                            retry_limit,
                            packet_size_bits,
                        };
                        let name = naming.dir_name(&point);
                        if let Some(prev) = seen.insert(name.clone(), point) {
                            return Err(CdosError::config(format!(
                                "sweep points {prev} and {point} both map to directory {name}"
                            )));
                        }
                        points.push(PlannedPoint {
                            point,
                            dir: cfg.output_dir.join(name),
                        });
                    }
                }
            }
        }
        Ok(Self { naming, points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
