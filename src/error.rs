//! 错误类型
//!
//! 区分两类失败：配置级错误终止整个扫描；单个扫描点的错误只放弃该点。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdosError {
    /// 节点数、时长、包长、速率等不合法，或扫描点产物路径冲突。
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// 单次运行内的端口等资源冲突。
    #[error("resource conflict: {0}")]
    ResourceConflict(String),

    #[error("failed to write artifact {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode statistics: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CdosError {
    /// 配置级错误：必须终止整个扫描。
    pub fn is_fatal(&self) -> bool {
        matches!(self, CdosError::InvalidConfiguration(_))
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        CdosError::InvalidConfiguration(msg.into())
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CdosError::ArtifactWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = CdosError> = std::result::Result<T, E>;
