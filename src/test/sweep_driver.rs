use super::unique_temp_dir;
use crate::error::CdosError;
use crate::experiment::{RunHeader, STATS_FILE_NAME};
use crate::sweep::{Axis, LoadAxis, SweepConfig, run_sweep, run_sweep_with};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

fn small_cfg(output_dir: PathBuf, stressor: Vec<f64>) -> SweepConfig {
    let mut cfg = SweepConfig {
        node_count: 4,
        duration_seconds: 0.5,
        stressor_load: LoadAxis::List(stressor),
        background_load: LoadAxis::One(0.13),
        output_dir,
        ..SweepConfig::default()
    };
    cfg.harness.traffic_start_seconds = 0.05;
    cfg
}

#[test]
fn point_failures_are_collected_and_the_sweep_continues() {
    let root = unique_temp_dir("sweep-continue");
    let cfg = small_cfg(root.clone(), vec![0.1, 0.5, 0.9]);
    let mut visited = Vec::new();

    let summary = run_sweep_with(&cfg, |_, point, dir| {
        visited.push(point.stressor_load);
        if point.stressor_load == 0.5 {
            return Err(CdosError::InvalidParameter {
                name: "load",
                value: point.stressor_load,
                reason: "rejected by test",
            });
        }
        Ok(dir.join(STATS_FILE_NAME))
    })
    .expect("sweep");

    assert_eq!(visited, vec![0.1, 0.5, 0.9]);
    assert_eq!(summary.completed.len(), 2);
    assert_eq!(summary.failed_count(), 1);
    let failure = &summary.failed[0];
    assert_eq!(failure.point.stressor_load, 0.5);
    let msg = failure.to_string();
    assert!(msg.contains("stressor_load=0.5"), "{msg}");
    assert!(msg.contains("background_load=0.13"), "{msg}");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn fatal_error_stops_the_sweep() {
    let root = unique_temp_dir("sweep-fatal");
    let cfg = small_cfg(root.clone(), vec![0.1, 0.5, 0.9]);
    let mut calls = 0;

    let err = run_sweep_with(&cfg, |_, point, dir| {
        calls += 1;
        if point.stressor_load == 0.5 {
            return Err(CdosError::InvalidConfiguration("broken engine".into()));
        }
        Ok(dir.join(STATS_FILE_NAME))
    })
    .expect_err("fatal");

    assert!(err.is_fatal());
    assert_eq!(calls, 2);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn invalid_configuration_runs_nothing() {
    let root = unique_temp_dir("sweep-invalid");
    let mut cfg = small_cfg(root.clone(), vec![0.1]);
    cfg.node_count = 3;
    let mut calls = 0;

    let err = run_sweep_with(&cfg, |_, _, dir| {
        calls += 1;
        Ok(dir.to_path_buf())
    })
    .expect_err("odd node count");
    assert!(err.is_fatal());
    assert_eq!(calls, 0);
    let _ = fs::remove_dir_all(&root);
}

fn write_existing(dir: &Path, retry_limit: u32) {
    fs::create_dir_all(dir).expect("create done dir");
    let header = json!({
        "node_count": 4,
        "stressor_load": 0.1,
        "background_load": 0.13,
        "retry_limit": retry_limit,
        "packet_size_bits": 12000,
        "seed": 1,
        "duration_seconds": 0.5,
        "pairs": [],
        "interfaces": []
    });
    fs::write(dir.join(STATS_FILE_NAME), header.to_string()).expect("write stats");
}

#[test]
fn skip_existing_leaves_finished_points_alone() {
    let root = unique_temp_dir("sweep-skip");
    let mut cfg = small_cfg(root.clone(), vec![0.1, 0.2]);
    cfg.skip_existing = true;
    write_existing(&root.join("u_0=0.10rho=0.13"), 7);

    let mut visited = Vec::new();
    let summary = run_sweep_with(&cfg, |_, point, dir| {
        visited.push(point.stressor_load);
        Ok(dir.join(STATS_FILE_NAME))
    })
    .expect("sweep");

    assert_eq!(visited, vec![0.2]);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.completed.len(), 1);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn skip_existing_reruns_points_recorded_with_other_settings() {
    let root = unique_temp_dir("sweep-skip-stale");
    let mut cfg = small_cfg(root.clone(), vec![0.1, 0.2]);
    cfg.skip_existing = true;
    cfg.retry_limit = Axis::One(2);
    write_existing(&root.join("u_0=0.10rho=0.13"), 7);
    let unreadable = root.join("u_0=0.20rho=0.13");
    fs::create_dir_all(&unreadable).expect("create dir");
    fs::write(unreadable.join(STATS_FILE_NAME), b"{}").expect("write stats");

    let mut visited = Vec::new();
    let summary = run_sweep_with(&cfg, |opts, point, dir| {
        visited.push((point.stressor_load, opts.retry_limit));
        Ok(dir.join(STATS_FILE_NAME))
    })
    .expect("sweep");

    assert_eq!(visited, vec![(0.1, 2), (0.2, 2)]);
    assert!(summary.skipped.is_empty());
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn resumed_sweep_with_new_retry_limit_overwrites_old_results() {
    let root = unique_temp_dir("sweep-resume");
    let mut cfg = small_cfg(root.clone(), vec![0.3]);
    run_sweep(&cfg).expect("first sweep");

    cfg.skip_existing = true;
    let again = run_sweep(&cfg).expect("same settings");
    assert_eq!(again.skipped.len(), 1);

    cfg.retry_limit = Axis::One(2);
    let summary = run_sweep(&cfg).expect("changed retry limit");
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.completed.len(), 1);

    let stats = root.join("u_0=0.30rho=0.13").join(STATS_FILE_NAME);
    let header = RunHeader::read(&stats).expect("read header");
    assert_eq!(header.retry_limit, 2);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn each_point_gets_its_own_options_and_directory() {
    let root = unique_temp_dir("sweep-opts");
    let cfg = small_cfg(root.clone(), vec![0.3]);
    let mut seen = Vec::new();
    run_sweep_with(&cfg, |opts, point, dir| {
        seen.push((opts.node_count, opts.retry_limit, point.background_load, dir.to_path_buf()));
        Ok(dir.join(STATS_FILE_NAME))
    })
    .expect("sweep");
    assert_eq!(seen, vec![(4, 7, 0.13, root.join("u_0=0.30rho=0.13"))]);
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn built_in_engine_sweep_writes_one_file_per_good_point() {
    let root = unique_temp_dir("sweep-e2e");
    let cfg = small_cfg(root.clone(), vec![0.4, 1.5]);

    let summary = run_sweep(&cfg).expect("sweep");

    assert_eq!(summary.completed.len(), 1);
    assert_eq!(summary.failed_count(), 1);
    assert!(matches!(
        summary.failed[0].error,
        CdosError::InvalidParameter { .. }
    ));
    assert!(root.join("u_0=0.40rho=0.13").join(STATS_FILE_NAME).is_file());
    assert!(!root.join("u_0=1.50rho=0.13").exists());
    let _ = fs::remove_dir_all(&root);
}
