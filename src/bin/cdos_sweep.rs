use cdos_sim::sweep::{Axis, LoadAxis, SweepConfig, SweepPlan, run_sweep};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "cdos-sweep",
    about = "Sweep stressor/background loads over a wireless chain and record per-interface statistics"
)]
struct Args {
    /// Sweep config JSON; omitted fields take the reference defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory for per-point artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of nodes in the chain (even, >= 2)
    #[arg(long)]
    node_count: Option<usize>,

    /// Simulated duration of each point (seconds)
    #[arg(long)]
    duration_s: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Stressor loads, comma separated
    #[arg(long, value_delimiter = ',')]
    stressor_loads: Vec<f64>,

    /// Background loads, comma separated
    #[arg(long, value_delimiter = ',')]
    background_loads: Vec<f64>,

    /// Maximum transmission attempts per frame, comma separated
    #[arg(long, value_delimiter = ',')]
    retry_limits: Vec<u32>,

    /// Skip points whose statistics file already exists
    #[arg(long)]
    skip_existing: bool,

    /// Print the planned points and exit without running them
    #[arg(long)]
    dry_run: bool,

    /// Disable logging
    #[arg(long)]
    quiet: bool,
}

impl Args {
    fn into_config(self) -> cdos_sim::Result<(SweepConfig, bool)> {
        let mut cfg = match &self.config {
            Some(path) => SweepConfig::from_json_file(path)?,
            None => SweepConfig::default(),
        };
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }
        if let Some(n) = self.node_count {
            cfg.node_count = n;
        }
        if let Some(d) = self.duration_s {
            cfg.duration_seconds = d;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if !self.stressor_loads.is_empty() {
            cfg.stressor_load = LoadAxis::List(self.stressor_loads);
        }
        if !self.background_loads.is_empty() {
            cfg.background_load = LoadAxis::List(self.background_loads);
        }
        if !self.retry_limits.is_empty() {
            cfg.retry_limit = Axis::List(self.retry_limits);
        }
        cfg.skip_existing |= self.skip_existing;
        Ok((cfg, self.dry_run))
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.quiet {
            tracing_subscriber::EnvFilter::new("off")
        } else {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        })
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let (cfg, dry_run) = match args.into_config() {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "❌ 配置无效");
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    if dry_run {
        let plan = match cfg.validate().and_then(|_| SweepPlan::build(&cfg)) {
            Ok(plan) => plan,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(2);
            }
        };
        for planned in &plan.points {
            println!("{} {}", planned.point, planned.dir.display());
        }
        println!("points={}", plan.len());
        return ExitCode::SUCCESS;
    }

    match run_sweep(&cfg) {
        Ok(summary) => {
            println!(
                "completed={} skipped={} failed={}",
                summary.completed.len(),
                summary.skipped.len(),
                summary.failed_count()
            );
            if summary.failed.is_empty() {
                info!("全部扫描点完成");
                ExitCode::SUCCESS
            } else {
                for failure in &summary.failed {
                    warn!("{failure}");
                    eprintln!("{failure}");
                }
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!(error = %e, "❌ 扫描终止");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
