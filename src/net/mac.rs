//! 分布式协调接入（DCF）
//!
//! 每个节点一个设备：发送队列、二进制指数退避、ACK 等待与重传计数。
//! 退避计数只在信道空闲满 DIFS 之后递减，信道变忙时冻结。

use super::id::{NodeId, TxId};
use super::packet::Packet;
use super::stats::InterfaceStats;
use crate::sim::SimTime;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// 链路层参数
#[derive(Debug, Clone)]
pub struct MacConfig {
    pub slot: SimTime,
    pub sifs: SimTime,
    pub cw_min: u32,
    pub cw_max: u32,
    /// 单个包的最大发送次数（含首次），达到后丢弃
    pub retry_limit: u32,
    pub queue_capacity: usize,
    /// MAC 头 + FCS + LLC + IP + UDP
    pub overhead_bytes: u32,
    pub ack_bytes: u32,
}

impl Default for MacConfig {
    fn default() -> Self {
        Self {
            slot: SimTime::from_micros(20),
            sifs: SimTime::from_micros(10),
            cw_min: 31,
            cw_max: 1023,
            retry_limit: 7,
            queue_capacity: 400,
            overhead_bytes: 64,
            ack_bytes: 14,
        }
    }
}

impl MacConfig {
    pub fn difs(&self) -> SimTime {
        self.sifs.saturating_add(self.slot.saturating_mul(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MacState {
    Idle,
    Contending,
    Transmitting,
    WaitAck,
}

/// 正在接收的帧
#[derive(Debug, Clone, Copy)]
pub(crate) struct RxLock {
    pub tx_id: TxId,
    pub signal_mw: f64,
    pub max_interference_mw: f64,
    pub corrupted: bool,
}

pub(crate) struct Device {
    pub queue: VecDeque<Packet>,
    pub state: MacState,
    pub cw: u32,
    pub backoff: Option<u32>,
    pub attempts: u32,
    pub access_gen: u64,
    pub ack_gen: u64,
    /// 当前退避倒计时的起点；冻结时为 None
    pub countdown_from: Option<SimTime>,
    pub tx: Option<TxId>,
    pub rx: Option<RxLock>,
    pub busy: bool,
    pub idle_since: SimTime,
    /// 每个源最近收到的包 id，用于丢弃重传造成的重复包
    pub last_rx: Vec<Option<u64>>,
    pub rng: ChaCha8Rng,
    pub stats: InterfaceStats,
}

impl Device {
    pub fn new(node: NodeId, node_count: usize, cw_min: u32, rng: ChaCha8Rng) -> Self {
        Self {
            queue: VecDeque::new(),
            state: MacState::Idle,
            cw: cw_min,
            backoff: None,
            attempts: 0,
            access_gen: 0,
            ack_gen: 0,
            countdown_from: None,
            tx: None,
            rx: None,
            busy: false,
            idle_since: SimTime::ZERO,
            last_rx: vec![None; node_count],
            rng,
            stats: InterfaceStats::new(node),
        }
    }

    /// 若尚无退避值则在 [0, cw] 中抽取一个
    pub fn ensure_backoff(&mut self) -> u32 {
        match self.backoff {
            Some(b) => b,
            None => {
                let b = self.rng.gen_range(0..=self.cw);
                self.backoff = Some(b);
                b
            }
        }
    }

    /// 信道变忙：按已经过的整 slot 数扣减退避并冻结
    pub fn freeze(&mut self, now: SimTime, slot: SimTime) {
        if self.state != MacState::Contending {
            return;
        }
        if let Some(from) = self.countdown_from.take() {
            if now > from && slot.0 > 0 {
                let consumed = (now.0 - from.0) / slot.0;
                let consumed = u32::try_from(consumed).unwrap_or(u32::MAX);
                self.backoff = self.backoff.map(|b| b.saturating_sub(consumed));
            }
            self.access_gen = self.access_gen.wrapping_add(1);
        }
    }

    /// 当前包发送成功或被放弃后复位竞争状态
    pub fn finish_head(&mut self, cw_min: u32) {
        self.queue.pop_front();
        self.attempts = 0;
        self.cw = cw_min;
        self.backoff = None;
        self.state = MacState::Idle;
    }
}
