//! 统计信息
//!
//! 每个网络接口的累计计数，以及按固定间隔采集的快照。

use super::id::NodeId;
use crate::sim::SimTime;
use serde::Serialize;

/// 某一时刻的累计计数快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalSample {
    pub t_s: f64,
    pub tx_frames: u64,
    pub tx_ok: u64,
    pub tx_failed: u64,
    pub rx_ok: u64,
    pub rx_errors: u64,
    pub rx_bytes: u64,
}

/// 网络接口统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceStats {
    pub node: NodeId,
    pub enqueued: u64,
    pub queue_drops: u64,
    /// 数据帧发送次数（含重传）
    pub tx_frames: u64,
    pub tx_retries: u64,
    pub tx_ok: u64,
    /// 达到重传上限后丢弃的包
    pub tx_failed: u64,
    pub acks_sent: u64,
    /// 成功解码且发给本节点的数据帧
    pub rx_ok: u64,
    pub rx_duplicates: u64,
    pub rx_overheard: u64,
    pub rx_errors: u64,
    pub rx_bytes: u64,
    /// 目的端口没有监听者
    pub rx_unbound: u64,
    pub samples: Vec<IntervalSample>,
}

impl InterfaceStats {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            enqueued: 0,
            queue_drops: 0,
            tx_frames: 0,
            tx_retries: 0,
            tx_ok: 0,
            tx_failed: 0,
            acks_sent: 0,
            rx_ok: 0,
            rx_duplicates: 0,
            rx_overheard: 0,
            rx_errors: 0,
            rx_bytes: 0,
            rx_unbound: 0,
            samples: Vec::new(),
        }
    }

    pub(crate) fn sample(&mut self, now: SimTime) {
        self.samples.push(IntervalSample {
            t_s: now.as_secs_f64(),
            tx_frames: self.tx_frames,
            tx_ok: self.tx_ok,
            tx_failed: self.tx_failed,
            rx_ok: self.rx_ok,
            rx_errors: self.rx_errors,
            rx_bytes: self.rx_bytes,
        });
    }
}

/// 包接收端统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkStats {
    pub node: NodeId,
    pub port: u16,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub first_rx: Option<SimTime>,
    pub last_rx: Option<SimTime>,
}

impl SinkStats {
    pub fn new(node: NodeId, port: u16) -> Self {
        Self {
            node,
            port,
            rx_packets: 0,
            rx_bytes: 0,
            first_rx: None,
            last_rx: None,
        }
    }

    pub(crate) fn record(&mut self, bytes: u32, now: SimTime) {
        self.rx_packets += 1;
        self.rx_bytes += bytes as u64;
        self.first_rx.get_or_insert(now);
        self.last_rx = Some(now);
    }
}
