//! 世界 trait
//!
//! 事件通过 `World` 访问业务状态（这里是无线信道与节点）。

use std::any::Any;

/// 仿真世界：由业务层实现，事件执行时向下转型取得具体类型。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
