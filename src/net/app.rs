//! 应用层：on/off 源、包接收端与单包探测
//!
//! on/off 源在 on 周期内按 `data_rate_bps` 发包，off 周期静默；两类周期的
//! 时长分别由各自的分布抽样。`SimTime::MAX` 表示 "永远"。

use super::id::NodeId;
use crate::error::{CdosError, Result};
use crate::sim::SimTime;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};

/// 时长分布
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeDist {
    Constant(SimTime),
    Exponential { mean_secs: f64 },
}

#[derive(Debug, Clone)]
pub struct OnOffConfig {
    pub remote: NodeId,
    pub port: u16,
    pub packet_size_bytes: u32,
    pub data_rate_bps: u64,
    pub on: TimeDist,
    pub off: TimeDist,
    pub start: SimTime,
}

/// 单包客户端：在 `at` 时刻向 `remote` 发送一个小包
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub remote: NodeId,
    pub port: u16,
    pub size_bytes: u32,
    pub at: SimTime,
}

#[derive(Debug, Clone)]
pub(crate) enum Sampler {
    Constant(SimTime),
    Exponential(Exp<f64>),
}

impl Sampler {
    pub fn new(dist: TimeDist) -> Result<Self> {
        match dist {
            TimeDist::Constant(t) => Ok(Sampler::Constant(t)),
            TimeDist::Exponential { mean_secs } => {
                if !(mean_secs.is_finite() && mean_secs > 0.0) {
                    return Err(CdosError::InvalidParameter {
                        name: "exponential mean",
                        value: mean_secs,
                        reason: "must be finite and positive",
                    });
                }
                let exp = Exp::new(1.0 / mean_secs).map_err(|_| CdosError::InvalidParameter {
                    name: "exponential mean",
                    value: mean_secs,
                    reason: "rejected by exponential distribution",
                })?;
                Ok(Sampler::Exponential(exp))
            }
        }
    }

    pub fn sample(&self, rng: &mut ChaCha8Rng) -> SimTime {
        match self {
            Sampler::Constant(t) => *t,
            Sampler::Exponential(exp) => SimTime::from_secs_f64(exp.sample(rng)),
        }
    }
}

pub(crate) struct OnOffApp {
    pub node: NodeId,
    pub cfg: OnOffConfig,
    pub on: Sampler,
    pub off: Sampler,
    pub interval: SimTime,
    pub on_until: SimTime,
    pub rng: ChaCha8Rng,
}

pub(crate) struct PacketSink {
    pub stats: super::stats::SinkStats,
}
