pub mod error;
pub mod experiment;
pub mod net;
pub mod sim;
pub mod sweep;
pub mod topo;
pub mod traffic;

pub use error::{CdosError, Result};

#[cfg(test)]
mod test;
