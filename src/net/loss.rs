//! 矩阵传播损耗模型
//!
//! 显式设置的节点对使用给定衰减，其余使用默认衰减。

use super::id::NodeId;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct MatrixLossModel {
    default_loss_db: f64,
    loss: HashMap<(NodeId, NodeId), f64>,
}

impl Default for MatrixLossModel {
    fn default() -> Self {
        Self {
            default_loss_db: f64::MAX,
            loss: HashMap::new(),
        }
    }
}

impl MatrixLossModel {
    pub fn set_default_loss(&mut self, loss_db: f64) {
        self.default_loss_db = loss_db;
    }

    pub fn set_loss(&mut self, from: NodeId, to: NodeId, loss_db: f64) {
        // 两个方向写入相同衰减
        self.loss.insert((from, to), loss_db);
        self.loss.insert((to, from), loss_db);
    }

    pub fn loss_db(&self, from: NodeId, to: NodeId) -> f64 {
        self.loss
            .get(&(from, to))
            .copied()
            .unwrap_or(self.default_loss_db)
    }
}
