//! 扫描驱动
//!
//! 逐个扫描点顺序运行实验。单点失败只记录并继续；配置级错误立即终止。

use super::config::SweepConfig;
use super::plan::{SweepPlan, SweepPoint};
use crate::error::{CdosError, Result};
use crate::experiment::{
    ExperimentOpts, RunHeader, STATS_FILE_NAME, init_global_seed, run_experiment,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// 某个扫描点失败，附带完整参数，便于单独重跑
#[derive(Debug, Error)]
#[error("sweep point {point} failed: {error}")]
pub struct PointFailure {
    pub point: SweepPoint,
    #[source]
    pub error: CdosError,
}

#[derive(Debug, Clone)]
pub struct CompletedPoint {
    pub point: SweepPoint,
    pub stats_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct SweepSummary {
    pub completed: Vec<CompletedPoint>,
    pub skipped: Vec<SweepPoint>,
    pub failed: Vec<PointFailure>,
}

impl SweepSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// 用内置引擎运行整个扫描
pub fn run_sweep(cfg: &SweepConfig) -> Result<SweepSummary> {
    run_sweep_with(cfg, |opts, point, dir| {
        run_experiment(opts, point.stressor_load, point.background_load, dir).map(|r| r.stats_path)
    })
}

/// 用给定的单点运行函数执行扫描
#[tracing::instrument(skip(cfg, run), fields(output_dir = %cfg.output_dir.display()))]
pub fn run_sweep_with<F>(cfg: &SweepConfig, mut run: F) -> Result<SweepSummary>
where
    F: FnMut(&ExperimentOpts, &SweepPoint, &Path) -> Result<PathBuf>,
{
    cfg.validate()?;
    init_global_seed(cfg.seed)?;
    let plan = SweepPlan::build(cfg)?;
    info!(points = plan.len(), seed = cfg.seed, "🧭 开始参数扫描");

    let mut summary = SweepSummary::default();
    for (i, planned) in plan.points.iter().enumerate() {
        let point = planned.point;
        info!(
            step = i + 1,
            total = plan.len(),
            first_node = point.stressor_load,
            rest_node = point.background_load,
            retry_limit = point.retry_limit,
            packet_size_bits = point.packet_size_bits,
            "开始扫描点"
        );
        let opts = cfg.experiment_opts(&point);
        if cfg.skip_existing {
            let stats_path = planned.dir.join(STATS_FILE_NAME);
            match RunHeader::read(&stats_path) {
                Some(header)
                    if header.matches(&opts, point.stressor_load, point.background_load) =>
                {
                    info!(dir = %planned.dir.display(), "已有结果，跳过");
                    summary.skipped.push(point);
                    continue;
                }
                Some(_) => info!(dir = %planned.dir.display(), "已有结果参数不同，重新运行"),
                None => {}
            }
        }

        match run(&opts, &point, &planned.dir) {
            Ok(stats_path) => summary.completed.push(CompletedPoint { point, stats_path }),
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                warn!(%point, %error, "扫描点失败，继续下一个");
                summary.failed.push(PointFailure { point, error });
            }
        }
    }

    info!(
        completed = summary.completed.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "🏁 参数扫描结束"
    );
    Ok(summary)
}
