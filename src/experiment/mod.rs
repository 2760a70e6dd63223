//! 实验编排
//!
//! 一次实验 = 一个扫描点：构建链式拓扑，给每个传输对安装源、宿和探测包，
//! 运行到指定时长，然后把接口统计写到该扫描点的产物目录。

mod artifact;
mod context;
mod opts;
mod pair;
mod seed;

pub use artifact::{PairSummary, RunArtifact, RunHeader, STATS_FILE_NAME, write_run};
pub use context::SimContext;
pub use opts::{ExperimentOpts, HarnessTiming};
pub use pair::{PairRole, RoleLoads, TransmissionPair, plan_pairs};
pub use seed::{global_seed, init_global_seed};

use crate::error::Result;
use crate::net::{MacConfig, PhyConfig, SimEngine};
use crate::topo::build_chain;
use crate::traffic::derive_profile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 一次实验的结果
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub stats_path: PathBuf,
    pub pairs: Vec<PairSummary>,
}

/// 在独占的仿真上下文中运行一次实验。上下文在所有返回路径上都会被拆除。
#[tracing::instrument(skip(opts, artifact_dir), fields(nodes = opts.node_count))]
pub fn run_experiment(
    opts: &ExperimentOpts,
    stressor_load: f64,
    background_load: f64,
    artifact_dir: &Path,
) -> Result<ExperimentReport> {
    let seed = init_global_seed(opts.seed)?;
    let mut ctx = SimContext::acquire(seed);
    run_experiment_with(ctx.engine(), opts, stressor_load, background_load, artifact_dir)
}

/// 在给定引擎上运行一次实验
pub fn run_experiment_with(
    engine: &mut dyn SimEngine,
    opts: &ExperimentOpts,
    stressor_load: f64,
    background_load: f64,
    artifact_dir: &Path,
) -> Result<ExperimentReport> {
    opts.validate()?;
    // 负载先于任何引擎调用校验
    let loads = RoleLoads {
        stressor_load,
        stressor: derive_profile(stressor_load, opts.packet_size_bits, opts.bit_rate_bps)?,
        background_load,
        background: derive_profile(background_load, opts.packet_size_bits, opts.bit_rate_bps)?,
    };

    let topo = build_chain(engine, &opts.chain_opts())?;
    let phy = PhyConfig {
        data_rate_bps: opts.bit_rate_bps,
        ..PhyConfig::default()
    };
    let mac = MacConfig {
        retry_limit: opts.retry_limit,
        ..MacConfig::default()
    };
    engine.install_devices(&phy, &mac)?;

    let pairs = plan_pairs(&topo, opts, &loads)?;
    for pair in &pairs {
        debug!(
            index = pair.index,
            role = ?pair.role,
            port = pair.port,
            profile = ?pair.profile,
            "安装传输对"
        );
        engine.install_sink(pair.sink, pair.port)?;
        engine.install_on_off(pair.source, &pair.on_off_config(opts))?;
        engine.install_probe(pair.source, &pair.probe_config(opts))?;
    }
    if let Some(every) = opts.stats_interval() {
        engine.enable_stats_sampling(every);
    }

    let until = opts.duration();
    engine.run_until(until);

    let summaries: Vec<PairSummary> = pairs
        .iter()
        .map(|p| PairSummary::new(p, engine.sink_stats(p.sink, p.port), until))
        .collect();
    let interfaces = engine.interface_stats();
    let artifact = RunArtifact {
        node_count: opts.node_count,
        stressor_load,
        background_load,
        retry_limit: opts.retry_limit,
        packet_size_bits: opts.packet_size_bits,
        seed: opts.seed,
        duration_seconds: opts.duration_seconds,
        pairs: &summaries,
        interfaces: &interfaces,
    };
    let stats_path = write_run(artifact_dir, &artifact)?;

    let background_bps: f64 = summaries
        .iter()
        .filter(|s| s.role == PairRole::Background)
        .map(|s| s.throughput_bps)
        .sum();
    let stressor_bps: f64 = summaries
        .iter()
        .filter(|s| s.role == PairRole::Stressor)
        .map(|s| s.throughput_bps)
        .sum();
    info!(
        stressor_load,
        background_load,
        stressor_bps,
        background_bps,
        path = %stats_path.display(),
        "📊 实验完成"
    );

    Ok(ExperimentReport {
        stats_path,
        pairs: summaries,
    })
}
