//! 仿真上下文
//!
//! 同一进程内同时只能有一个活动的仿真。`SimContext` 在创建时取得全局锁，
//! 析构时先拆除引擎状态再释放锁，错误路径上同样成立。

use crate::net::WifiEngine;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

static CONTEXT_LOCK: Mutex<()> = Mutex::new(());

pub struct SimContext {
    // 字段按声明顺序析构：引擎先于锁释放
    engine: WifiEngine,
    _guard: MutexGuard<'static, ()>,
}

impl SimContext {
    /// 取得上下文；如有其他运行正在进行则阻塞等待。
    pub fn acquire(seed: u64) -> Self {
        let guard = CONTEXT_LOCK
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(seed, "🔒 取得仿真上下文");
        Self {
            engine: WifiEngine::new(seed),
            _guard: guard,
        }
    }

    pub fn engine(&mut self) -> &mut WifiEngine {
        &mut self.engine
    }
}

impl Drop for SimContext {
    fn drop(&mut self) {
        debug!(
            events = self.engine.simulator().executed(),
            pending = self.engine.simulator().pending(),
            "🧹 拆除仿真上下文"
        );
    }
}
