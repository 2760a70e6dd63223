//! 仿真核心模块
//!
//! 离散事件仿真内核：仿真时间、事件、世界与调度器。单次实验只在一个
//! 线程上推进，事件按 (时间, 序号) 确定性排序。

mod event;
mod simulator;
mod time;
mod world;

pub use event::{Event, ScheduledEvent};
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;
