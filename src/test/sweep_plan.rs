use crate::sweep::{Axis, LoadAxis, LoadFormat, SweepConfig, SweepPlan};
use std::collections::HashSet;
use std::path::PathBuf;

fn cfg(stressor: Vec<f64>, background: Vec<f64>) -> SweepConfig {
    SweepConfig {
        node_count: 6,
        stressor_load: LoadAxis::List(stressor),
        background_load: LoadAxis::List(background),
        output_dir: PathBuf::from("root"),
        ..SweepConfig::default()
    }
}

fn dir_names(plan: &SweepPlan) -> Vec<String> {
    plan.points
        .iter()
        .map(|p| {
            p.dir
                .file_name()
                .and_then(|n| n.to_str())
                .expect("utf-8 dir name")
                .to_string()
        })
        .collect()
}

#[test]
fn directory_name_encodes_both_loads() {
    let plan = SweepPlan::build(&cfg(vec![0.5], vec![0.13])).expect("plan");
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.points[0].dir, PathBuf::from("root").join("u_0=0.50rho=0.13"));
}

#[test]
fn reference_sweep_has_distinct_paths() {
    let plan = SweepPlan::build(&SweepConfig::default()).expect("plan");
    assert_eq!(plan.len(), 49);
    let names = dir_names(&plan);
    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
    assert_eq!(names[0], "u_0=0.02rho=0.13");
    assert_eq!(names[24], "u_0=0.50rho=0.13");
    assert_eq!(names[48], "u_0=0.98rho=0.13");
}

#[test]
fn points_are_ordered_stressor_major() {
    let plan = SweepPlan::build(&cfg(vec![0.1, 0.2], vec![0.3, 0.4])).expect("plan");
    let order: Vec<(f64, f64)> = plan
        .points
        .iter()
        .map(|p| (p.point.stressor_load, p.point.background_load))
        .collect();
    assert_eq!(order, vec![(0.1, 0.3), (0.1, 0.4), (0.2, 0.3), (0.2, 0.4)]);
}

#[test]
fn swept_integer_axes_get_their_own_suffix() {
    let mut c = cfg(vec![0.5], vec![0.13]);
    c.retry_limit = Axis::List(vec![4, 7]);
    c.packet_size_bits = Axis::List(vec![8000, 12000]);
    let plan = SweepPlan::build(&c).expect("plan");
    assert_eq!(
        dir_names(&plan),
        vec![
            "u_0=0.50rho=0.13_slrc=4_pkt=1000",
            "u_0=0.50rho=0.13_slrc=4_pkt=1500",
            "u_0=0.50rho=0.13_slrc=7_pkt=1000",
            "u_0=0.50rho=0.13_slrc=7_pkt=1500",
        ]
    );
    assert!(plan.naming.with_retry_limit);
    assert!(plan.naming.with_packet_size);
}

#[test]
fn loads_that_round_alike_get_extra_decimals() {
    let plan = SweepPlan::build(&cfg(vec![0.131, 0.134], vec![0.13])).expect("plan");
    assert_eq!(
        dir_names(&plan),
        vec!["u_0=0.131rho=0.13", "u_0=0.134rho=0.13"]
    );
    assert_eq!(plan.naming.stressor, LoadFormat::Fixed(3));
    assert_eq!(plan.naming.background, LoadFormat::Fixed(2));
}

#[test]
fn low_base_precision_is_raised_per_axis() {
    let mut c = cfg(vec![0.02, 0.04], vec![0.13]);
    c.path_precision = 1;
    let plan = SweepPlan::build(&c).expect("plan");
    assert_eq!(dir_names(&plan), vec!["u_0=0.02rho=0.1", "u_0=0.04rho=0.1"]);
}

#[test]
fn values_beyond_fixed_decimals_use_shortest_form() {
    let format = LoadFormat::for_axis(&[1e-20, 2e-20], 2);
    assert_eq!(format, LoadFormat::Shortest);
    assert_ne!(format.format(1e-20), format.format(2e-20));
}

#[test]
fn repeated_load_values_collide() {
    let err = SweepPlan::build(&cfg(vec![0.5, 0.5], vec![0.13])).expect_err("duplicate point");
    assert!(err.is_fatal());
}
