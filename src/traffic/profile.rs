//! On/off 流量画像
//!
//! 每个 on 周期恰好发送一个包（时长 = 包长 / 速率），off 周期服从指数分布，
//! 均值取 `on * (1/load - 1)`，使长期占空比 on/(on+off) 收敛到 `load`。
//! 该性质只在期望意义上成立，短窗口内不保证命中目标负载。

use crate::error::{CdosError, Result};
use serde::Serialize;

/// 由负载推导出的流量画像。
///
/// 两个边界值是独立的变体而不是特殊常数，调用方必须穷尽匹配。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrafficProfile {
    /// load == 0：永不发送。
    AlwaysOff,
    /// load == 1：持续发送，没有空闲间隙。
    AlwaysOn,
    /// 0 < load < 1：固定 on 时长，指数分布的 off 时长（给出均值）。
    Modulated { on_secs: f64, off_mean_secs: f64 },
}

impl TrafficProfile {
    /// 长期占空比
    pub fn duty_cycle(&self) -> f64 {
        match *self {
            TrafficProfile::AlwaysOff => 0.0,
            TrafficProfile::AlwaysOn => 1.0,
            TrafficProfile::Modulated {
                on_secs,
                off_mean_secs,
            } => on_secs / (on_secs + off_mean_secs),
        }
    }
}

/// 单个包的发送时长（秒）。
pub fn packet_time(packet_size_bits: u64, bit_rate_bps: u64) -> Result<f64> {
    if packet_size_bits == 0 {
        return Err(CdosError::config("packet size must be positive"));
    }
    if bit_rate_bps == 0 {
        return Err(CdosError::config("bit rate must be positive"));
    }
    Ok(packet_size_bits as f64 / bit_rate_bps as f64)
}

/// 根据目标负载推导流量画像。负载必须落在 [0, 1]。
pub fn derive_profile(load: f64, packet_size_bits: u64, bit_rate_bps: u64) -> Result<TrafficProfile> {
    if !(0.0..=1.0).contains(&load) {
        return Err(CdosError::InvalidParameter {
            name: "load",
            value: load,
            reason: "must lie in [0, 1]",
        });
    }
    let pkt = packet_time(packet_size_bits, bit_rate_bps)?;

    let profile = if load == 1.0 {
        TrafficProfile::AlwaysOn
    } else if load == 0.0 {
        TrafficProfile::AlwaysOff
    } else {
        TrafficProfile::Modulated {
            on_secs: pkt,
            off_mean_secs: pkt * (1.0 / load - 1.0),
        }
    };
    Ok(profile)
}
