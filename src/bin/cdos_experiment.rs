use cdos_sim::experiment::{ExperimentOpts, run_experiment};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cdos-experiment",
    about = "Run one cascading-DoS experiment on a wireless chain"
)]
struct Args {
    /// Load of the last (stressor) pair, in [0, 1]
    #[arg(long)]
    stressor_load: f64,

    /// Load shared by all other pairs, in [0, 1]
    #[arg(long, default_value_t = 0.13)]
    background_load: f64,

    /// Directory to write the statistics file into
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 82)]
    node_count: usize,

    #[arg(long, default_value_t = 1003.0)]
    duration_s: f64,

    #[arg(long, default_value_t = 1_000_000)]
    bit_rate_bps: u64,

    #[arg(long, default_value_t = 1500)]
    packet_bytes: u64,

    #[arg(long, default_value_t = 7)]
    retry_limit: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Time the first pair starts sending (seconds)
    #[arg(long, default_value_t = 3.1)]
    traffic_start_s: f64,

    /// Disable logging
    #[arg(long)]
    quiet: bool,
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

    let mut opts = ExperimentOpts {
        node_count: args.node_count,
        duration_seconds: args.duration_s,
        bit_rate_bps: args.bit_rate_bps,
        packet_size_bits: args.packet_bytes.saturating_mul(8),
        retry_limit: args.retry_limit,
        seed: args.seed,
        ..ExperimentOpts::default()
    };
    opts.harness.traffic_start_seconds = args.traffic_start_s;

    match run_experiment(&opts, args.stressor_load, args.background_load, &args.out_dir) {
        Ok(report) => {
            for p in &report.pairs {
                println!(
                    "pair={} role={:?} port={} rx_packets={} throughput_bps={:.1}",
                    p.index, p.role, p.port, p.rx_packets, p.throughput_bps
                );
            }
            println!("stats={}", report.stats_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_fatal() {
                ExitCode::from(2)
            } else {
                ExitCode::from(1)
            }
        }
    }
}
