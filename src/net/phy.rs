//! 物理层参数
//!
//! 恒定速率的 DSSS 物理层：发送功率、接收灵敏度、载波侦听门限和
//! 最小信干噪比。帧时长 = 前导码 + 比特数 / 速率。

use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct PhyConfig {
    pub tx_power_dbm: f64,
    /// 低于该功率的帧不会被锁定接收
    pub rx_sensitivity_dbm: f64,
    /// 总接收功率不低于该值即认为信道忙
    pub cca_threshold_dbm: f64,
    pub noise_floor_dbm: f64,
    pub min_snr_db: f64,
    pub data_rate_bps: u64,
    pub preamble: SimTime,
}

impl Default for PhyConfig {
    fn default() -> Self {
        Self {
            tx_power_dbm: 16.0206,
            rx_sensitivity_dbm: -96.0,
            cca_threshold_dbm: -99.0,
            noise_floor_dbm: -93.97,
            min_snr_db: 4.0,
            data_rate_bps: 1_000_000,
            preamble: SimTime::from_micros(192),
        }
    }
}

impl PhyConfig {
    /// 发送指定字节数所需的空口时间
    pub fn airtime(&self, bytes: u32) -> SimTime {
        if self.data_rate_bps == 0 {
            return SimTime::MAX;
        }
        // ceil(bits * 1e9 / bps) 纳秒
        let bits = (bytes as u128).saturating_mul(8);
        let rate = self.data_rate_bps as u128;
        let nanos = (bits.saturating_mul(1_000_000_000) + (rate - 1)) / rate;
        self.preamble
            .saturating_add(SimTime(nanos.min(u64::MAX as u128) as u64))
    }
}

pub fn dbm_to_mw(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

pub fn db_to_ratio(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}
