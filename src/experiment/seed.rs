//! 进程级随机种子
//!
//! 种子只在扫描开始前初始化一次，之后不再改动。每次运行都从这个种子
//! 重新派生随机流，所以不同参数的运行彼此可比，且与执行顺序无关。

use crate::error::{CdosError, Result};
use std::sync::OnceLock;

static GLOBAL_SEED: OnceLock<u64> = OnceLock::new();

/// 初始化全局种子。重复以相同值初始化是允许的；换成不同的值是配置错误。
pub fn init_global_seed(seed: u64) -> Result<u64> {
    let current = *GLOBAL_SEED.get_or_init(|| seed);
    if current != seed {
        return Err(CdosError::config(format!(
            "global seed already initialised to {current}, refusing to reseed with {seed}"
        )));
    }
    Ok(current)
}

pub fn global_seed() -> Option<u64> {
    GLOBAL_SEED.get().copied()
}
