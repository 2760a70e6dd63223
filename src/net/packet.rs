//! 数据包与帧
//!
//! `Packet` 是应用层的 UDP 负载；`Frame` 是空口上传输的 MAC 帧。

use super::id::NodeId;

/// 应用数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub port: u16,
    pub size_bytes: u32,
}

/// MAC 帧
#[derive(Debug, Clone)]
pub enum Frame {
    Data(Packet),
    Ack { to: NodeId, pkt_id: u64 },
}

impl Frame {
    /// 帧的接收方
    pub fn dst(&self) -> NodeId {
        match self {
            Frame::Data(pkt) => pkt.dst,
            Frame::Ack { to, .. } => *to,
        }
    }
}
