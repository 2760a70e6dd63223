use super::unique_temp_dir;
use crate::error::{CdosError, Result};
use crate::experiment::{
    ExperimentOpts, HarnessTiming, PairRole, STATS_FILE_NAME, SimContext, global_seed,
    init_global_seed, run_experiment, run_experiment_with,
};
use crate::net::{
    InterfaceStats, MacConfig, NodeId, OnOffConfig, PhyConfig, ProbeConfig, SimEngine, SinkStats,
    TimeDist,
};
use crate::sim::SimTime;
use serde_json::Value;
use std::fs;

/// 只记录调用的引擎
#[derive(Default)]
struct RecordingEngine {
    calls: usize,
    nodes: usize,
    default_loss: Option<f64>,
    losses: Vec<(NodeId, NodeId, f64)>,
    devices: Option<(PhyConfig, MacConfig)>,
    sinks: Vec<(NodeId, u16)>,
    on_offs: Vec<(NodeId, OnOffConfig)>,
    probes: Vec<(NodeId, ProbeConfig)>,
    sampling: Option<SimTime>,
    ran_until: Option<SimTime>,
}

impl SimEngine for RecordingEngine {
    fn create_nodes(&mut self, count: usize) -> Result<Vec<NodeId>> {
        self.calls += 1;
        let first = self.nodes;
        self.nodes += count;
        Ok((first..self.nodes).map(NodeId).collect())
    }

    fn set_default_loss(&mut self, loss_db: f64) {
        self.calls += 1;
        self.default_loss = Some(loss_db);
    }

    fn set_loss(&mut self, from: NodeId, to: NodeId, loss_db: f64) {
        self.calls += 1;
        self.losses.push((from, to, loss_db));
    }

    fn install_devices(&mut self, phy: &PhyConfig, mac: &MacConfig) -> Result<()> {
        self.calls += 1;
        self.devices = Some((phy.clone(), mac.clone()));
        Ok(())
    }

    fn install_sink(&mut self, node: NodeId, port: u16) -> Result<()> {
        self.calls += 1;
        self.sinks.push((node, port));
        Ok(())
    }

    fn install_on_off(&mut self, node: NodeId, app: &OnOffConfig) -> Result<()> {
        self.calls += 1;
        self.on_offs.push((node, app.clone()));
        Ok(())
    }

    fn install_probe(&mut self, node: NodeId, probe: &ProbeConfig) -> Result<()> {
        self.calls += 1;
        self.probes.push((node, probe.clone()));
        Ok(())
    }

    fn enable_stats_sampling(&mut self, every: SimTime) {
        self.calls += 1;
        self.sampling = Some(every);
    }

    fn run_until(&mut self, until: SimTime) {
        self.calls += 1;
        self.ran_until = Some(until);
    }

    fn now(&self) -> SimTime {
        self.ran_until.unwrap_or(SimTime::ZERO)
    }

    fn interface_stats(&self) -> Vec<InterfaceStats> {
        (0..self.nodes).map(|i| InterfaceStats::new(NodeId(i))).collect()
    }

    fn sink_stats(&self, node: NodeId, port: u16) -> Option<SinkStats> {
        Some(SinkStats::new(node, port))
    }
}

fn six_node_opts(duration_seconds: f64) -> ExperimentOpts {
    ExperimentOpts {
        node_count: 6,
        duration_seconds,
        harness: HarnessTiming {
            traffic_start_seconds: 0.2,
            ..HarnessTiming::default()
        },
        ..ExperimentOpts::default()
    }
}

fn mean_off(cfg: &OnOffConfig) -> f64 {
    match cfg.off {
        TimeDist::Exponential { mean_secs } => mean_secs,
        other => panic!("expected exponential off time, got {other:?}"),
    }
}

#[test]
fn six_node_chain_gets_three_pairs_with_stressor_last() {
    let dir = unique_temp_dir("exp-mock");
    let mut engine = RecordingEngine::default();
    let opts = ExperimentOpts {
        node_count: 6,
        duration_seconds: 2.0,
        ..ExperimentOpts::default()
    };

    let report = run_experiment_with(&mut engine, &opts, 0.5, 0.13, &dir).expect("run");

    assert_eq!(engine.nodes, 6);
    assert_eq!(engine.default_loss, Some(200.0));
    assert_eq!(engine.losses.len(), 5);
    assert_eq!(
        engine.sinks,
        vec![(NodeId(1), 12345), (NodeId(3), 12346), (NodeId(5), 12347)]
    );
    let sources: Vec<NodeId> = engine.on_offs.iter().map(|(n, _)| *n).collect();
    assert_eq!(sources, vec![NodeId(0), NodeId(2), NodeId(4)]);

    let (_, stressor) = &engine.on_offs[2];
    assert_eq!(stressor.on, TimeDist::Constant(SimTime::from_millis(12)));
    assert!((mean_off(stressor) - 0.012).abs() < 1e-12);
    for (_, bg) in &engine.on_offs[..2] {
        assert_eq!(bg.on, TimeDist::Constant(SimTime::from_millis(12)));
        assert!((mean_off(bg) - 0.0803).abs() < 1e-4);
        assert_eq!(bg.packet_size_bytes, 1500);
        assert_eq!(bg.data_rate_bps, 1_000_000);
    }

    let starts: Vec<SimTime> = engine.on_offs.iter().map(|(_, c)| c.start).collect();
    assert_eq!(
        starts,
        vec![
            SimTime::from_millis(3100),
            SimTime::from_millis(3110),
            SimTime::from_millis(3120)
        ]
    );
    let probes: Vec<(SimTime, u16)> = engine.probes.iter().map(|(_, p)| (p.at, p.port)).collect();
    assert_eq!(
        probes,
        vec![
            (SimTime::from_millis(1), 9),
            (SimTime::from_millis(2), 9),
            (SimTime::from_millis(3), 9)
        ]
    );

    let (phy, mac) = engine.devices.as_ref().expect("devices installed");
    assert_eq!(phy.data_rate_bps, 1_000_000);
    assert_eq!(mac.retry_limit, 7);
    assert_eq!(engine.sampling, Some(SimTime::from_secs(1)));
    assert_eq!(engine.ran_until, Some(SimTime::from_secs(2)));

    assert_eq!(report.pairs.len(), 3);
    assert_eq!(report.pairs[2].role, PairRole::Stressor);
    assert_eq!(report.stats_path, dir.join(STATS_FILE_NAME));
    let raw = fs::read_to_string(&report.stats_path).expect("read stats");
    let v: Value = serde_json::from_str(&raw).expect("parse stats");
    assert_eq!(v["pairs"][2]["role"], "stressor");
    assert_eq!(v["pairs"][0]["role"], "background");
    assert_eq!(v["interfaces"].as_array().map(Vec::len), Some(6));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn boundary_loads_install_always_on_and_always_off_sources() {
    let dir = unique_temp_dir("exp-boundary");
    let mut engine = RecordingEngine::default();
    let opts = ExperimentOpts {
        node_count: 4,
        duration_seconds: 1.0,
        ..ExperimentOpts::default()
    };
    run_experiment_with(&mut engine, &opts, 1.0, 0.0, &dir).expect("run");

    let (_, bg) = &engine.on_offs[0];
    assert_eq!(bg.on, TimeDist::Constant(SimTime::ZERO));
    assert_eq!(bg.off, TimeDist::Constant(SimTime::MAX));
    let (_, stressor) = &engine.on_offs[1];
    assert_eq!(stressor.on, TimeDist::Constant(SimTime::MAX));
    assert_eq!(stressor.off, TimeDist::Constant(SimTime::ZERO));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_load_fails_before_any_engine_call() {
    let dir = unique_temp_dir("exp-bad-load").join("point");
    let mut engine = RecordingEngine::default();
    let opts = six_node_opts(1.0);

    let err = run_experiment_with(&mut engine, &opts, 1.5, 0.13, &dir).expect_err("load > 1");
    assert!(matches!(err, CdosError::InvalidParameter { .. }));
    assert!(!err.is_fatal());
    assert_eq!(engine.calls, 0);
    assert!(!dir.exists());

    let err = run_experiment_with(&mut engine, &opts, 0.5, -0.1, &dir).expect_err("load < 0");
    assert!(!err.is_fatal());
    assert_eq!(engine.calls, 0);
}

#[test]
fn invalid_node_count_is_fatal() {
    let dir = unique_temp_dir("exp-bad-nodes");
    let mut engine = RecordingEngine::default();
    let opts = ExperimentOpts {
        node_count: 5,
        ..six_node_opts(1.0)
    };
    let err = run_experiment_with(&mut engine, &opts, 0.5, 0.13, &dir).expect_err("odd nodes");
    assert!(err.is_fatal());
    assert_eq!(engine.calls, 0);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn data_port_colliding_with_probe_port_is_a_point_error() {
    let dir = unique_temp_dir("exp-port");
    let mut engine = RecordingEngine::default();
    let opts = ExperimentOpts {
        base_port: 8,
        ..six_node_opts(1.0)
    };
    let err = run_experiment_with(&mut engine, &opts, 0.5, 0.13, &dir).expect_err("port 9 taken");
    assert!(matches!(err, CdosError::ResourceConflict(_)));
    assert!(!err.is_fatal());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn six_node_run_writes_statistics_for_every_interface() {
    let root = unique_temp_dir("exp-e2e");
    let dir = root.join("u_0=0.50rho=0.13");
    let report = run_experiment(&six_node_opts(1.5), 0.5, 0.13, &dir).expect("run");

    assert!(report.stats_path.is_file());
    let raw = fs::read_to_string(&report.stats_path).expect("read stats");
    let v: Value = serde_json::from_str(&raw).expect("parse stats");
    assert_eq!(v["stressor_load"], 0.5);
    assert_eq!(v["background_load"], 0.13);
    assert_eq!(v["node_count"], 6);
    let interfaces = v["interfaces"].as_array().expect("interfaces");
    assert_eq!(interfaces.len(), 6);
    let ports: Vec<u64> = v["pairs"]
        .as_array()
        .expect("pairs")
        .iter()
        .filter_map(|p| p["port"].as_u64())
        .collect();
    assert_eq!(ports, vec![12345, 12346, 12347]);

    let stressor = &report.pairs[2];
    assert_eq!(stressor.role, PairRole::Stressor);
    assert!(stressor.rx_packets > 0, "stressor delivered nothing");
    assert!(stressor.throughput_bps > 0.0);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn identical_parameters_give_byte_identical_artifacts() {
    let root = unique_temp_dir("exp-repeat");
    let opts = six_node_opts(1.0);
    let a = run_experiment(&opts, 0.5, 0.13, &root.join("a")).expect("first run");
    let b = run_experiment(&opts, 0.5, 0.13, &root.join("b")).expect("second run");

    let bytes_a = fs::read(&a.stats_path).expect("read a");
    let bytes_b = fs::read(&b.stats_path).expect("read b");
    assert_eq!(bytes_a, bytes_b);
    assert_eq!(a.pairs, b.pairs);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn earlier_runs_do_not_leak_into_later_ones() {
    let root = unique_temp_dir("exp-isolation");
    let opts = six_node_opts(1.0);
    let alone = run_experiment(&opts, 0.3, 0.13, &root.join("alone")).expect("B alone");
    run_experiment(&opts, 0.9, 0.5, &root.join("other")).expect("A");
    let after = run_experiment(&opts, 0.3, 0.13, &root.join("after")).expect("B after A");

    assert_eq!(
        fs::read(&alone.stats_path).expect("read alone"),
        fs::read(&after.stats_path).expect("read after")
    );

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn rerun_overwrites_existing_artifact() {
    let root = unique_temp_dir("exp-overwrite");
    let dir = root.join("point");
    fs::create_dir_all(&dir).expect("create dir");
    fs::write(dir.join(STATS_FILE_NAME), b"stale").expect("write stale");

    let report = run_experiment(&six_node_opts(0.5), 0.2, 0.13, &dir).expect("run");
    let raw = fs::read_to_string(&report.stats_path).expect("read stats");
    assert!(raw.starts_with('{'));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn context_is_released_after_a_failed_run() {
    let root = unique_temp_dir("exp-teardown");
    let opts = six_node_opts(0.5);
    assert!(run_experiment(&opts, 2.0, 0.13, &root.join("bad")).is_err());

    // 上下文已释放：这里不会阻塞
    {
        let mut ctx = SimContext::acquire(1);
        assert_eq!(ctx.engine().now(), SimTime::ZERO);
    }
    run_experiment(&opts, 0.2, 0.13, &root.join("good")).expect("run after failure");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn global_seed_cannot_be_changed_once_set() {
    assert_eq!(init_global_seed(1).expect("same seed"), 1);
    assert_eq!(global_seed(), Some(1));
    let err = init_global_seed(2).expect_err("reseed");
    assert!(err.is_fatal());
}
