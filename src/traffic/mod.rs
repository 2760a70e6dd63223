//! 流量模型
//!
//! 由目标负载推导 on/off 源的时序参数。

mod profile;

pub use profile::{TrafficProfile, derive_profile, packet_time};
