//! 拓扑构建

pub mod chain;

pub use chain::{AttenuationMatrix, ChainOpts, ChainTopology, LossEntry, build_chain};
