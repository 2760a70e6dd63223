//! 仿真器
//!
//! 维护当前时间与事件队列。

use super::event::{Event, ScheduledEvent};
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 已执行事件数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 调度事件在指定时间执行。早于当前时间的请求按当前时间处理。
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(now = ?self.now, ?at, seq, event_type = std::any::type_name::<E>(), "调度事件");
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 在当前时间之后 `delay` 调度事件。
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev);
    }

    /// 运行直到事件队列为空或到达 `until`（含 `until` 时刻的事件），
    /// 之后把当前时间推进到 `until`。
    #[tracing::instrument(skip(self, world), fields(until_s = until.as_secs_f64()))]
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        info!(queue_size = self.q.len(), "▶️  开始运行仿真");
        let events = self.drain(until, world);
        self.now = self.now.max(until);
        debug!(remaining_queue = self.q.len(), "队列剩余事件");
        info!(events, final_time = ?self.now, "✅ 仿真完成");
    }

    fn drain(&mut self, until: SimTime, world: &mut dyn World) -> u64 {
        let start_count = self.executed;
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else { break };
            self.now = item.at;
            self.executed += 1;
            item.ev.execute(self, world);
        }
        self.executed - start_count
    }
}
