//! 无线网络模拟模块
//!
//! 共享信道上的节点、无线设备（DCF）、应用与统计。实验编排只通过
//! `SimEngine` 调用这里。

mod api;
mod app;
mod events;
mod id;
mod loss;
mod mac;
mod net_world;
mod network;
mod packet;
mod phy;
mod stats;

pub use api::{SimEngine, WifiEngine};
pub use app::{OnOffConfig, ProbeConfig, TimeDist};
pub use events::{AckTimeout, AppPhase, AppStep, SampleStats, SendAck, SendProbe, TryAccess, TxEnd};
pub use id::{NodeId, TxId};
pub use loss::MatrixLossModel;
pub use mac::MacConfig;
pub use net_world::NetWorld;
pub use network::WifiNetwork;
pub use packet::{Frame, Packet};
pub use phy::{PhyConfig, db_to_ratio, dbm_to_mw};
pub use stats::{InterfaceStats, IntervalSample, SinkStats};
