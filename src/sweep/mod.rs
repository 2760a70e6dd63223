//! 参数扫描

mod config;
mod driver;
mod plan;

pub use config::{Axis, LoadAxis, SweepConfig};
pub use driver::{CompletedPoint, PointFailure, SweepSummary, run_sweep, run_sweep_with};
pub use plan::{LoadFormat, PathNaming, PlannedPoint, SweepPlan, SweepPoint};
