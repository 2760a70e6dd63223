//! 链式拓扑构建
//!
//! ```text
//! [n0] <-80dB-> [n1] <-70dB-> [n2] <-80dB-> [n3] <-70dB-> ... [nN-2] <-80dB-> [nN-1]
//! ```
//!
//! 偶数号链路（n2i, n2i+1）是传输对本身，衰减取 `strong_loss_db`；奇数号链路
//! 把相邻两对耦合起来，衰减取 `weak_loss_db`。其余节点对保持 "无连接" 的默认
//! 衰减，因此干扰只能沿链逐跳传播。

use crate::error::{CdosError, Result};
use crate::net::{NodeId, SimEngine};
use serde::Serialize;
use tracing::debug;

/// 链式拓扑配置选项
#[derive(Debug, Clone)]
pub struct ChainOpts {
    pub node_count: usize,
    pub strong_loss_db: f64,
    pub weak_loss_db: f64,
    /// 非相邻节点对的衰减；必须大于 strong + weak，避免出现间接可达。
    pub no_link_loss_db: f64,
}

impl Default for ChainOpts {
    fn default() -> Self {
        Self {
            node_count: 82,
            strong_loss_db: 80.0,
            weak_loss_db: 70.0,
            no_link_loss_db: 200.0,
        }
    }
}

/// 显式设置的一条衰减，保留 (from, to) 方向。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LossEntry {
    pub from: usize,
    pub to: usize,
    pub loss_db: f64,
}

/// 节点对衰减矩阵：少量显式条目加一个默认值。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttenuationMatrix {
    default_loss_db: f64,
    entries: Vec<LossEntry>,
}

impl AttenuationMatrix {
    /// 按链式规则生成衰减矩阵。
    pub fn chain(opts: &ChainOpts) -> Result<Self> {
        validate(opts)?;
        let entries = (0..opts.node_count - 1)
            .map(|i| {
                if i % 2 == 0 {
                    LossEntry {
                        from: i,
                        to: i + 1,
                        loss_db: opts.strong_loss_db,
                    }
                } else {
                    // 奇数链路按 (i+1 -> i) 方向写入
                    LossEntry {
                        from: i + 1,
                        to: i,
                        loss_db: opts.weak_loss_db,
                    }
                }
            })
            .collect();
        Ok(Self {
            default_loss_db: opts.no_link_loss_db,
            entries,
        })
    }

    pub fn default_loss_db(&self) -> f64 {
        self.default_loss_db
    }

    pub fn entries(&self) -> &[LossEntry] {
        &self.entries
    }

    /// 无方向查询：任一方向有显式条目即返回它，否则返回默认值。
    pub fn loss_db(&self, a: usize, b: usize) -> f64 {
        self.entries
            .iter()
            .find(|e| (e.from == a && e.to == b) || (e.from == b && e.to == a))
            .map_or(self.default_loss_db, |e| e.loss_db)
    }
}

/// 已安装到引擎中的链式拓扑
#[derive(Debug, Clone)]
pub struct ChainTopology {
    pub nodes: Vec<NodeId>,
    pub matrix: AttenuationMatrix,
}

impl ChainTopology {
    /// 第 `pair` 个传输对的 (源, 宿)。
    pub fn pair(&self, pair: usize) -> Option<(NodeId, NodeId)> {
        let src = *self.nodes.get(2 * pair)?;
        let dst = *self.nodes.get(2 * pair + 1)?;
        Some((src, dst))
    }

    pub fn pair_count(&self) -> usize {
        self.nodes.len() / 2
    }
}

/// 在引擎中创建节点并写入衰减矩阵
pub fn build_chain(engine: &mut dyn SimEngine, opts: &ChainOpts) -> Result<ChainTopology> {
    let matrix = AttenuationMatrix::chain(opts)?;
    let nodes = engine.create_nodes(opts.node_count)?;
    if nodes.len() != opts.node_count {
        return Err(CdosError::config(format!(
            "engine created {} nodes, expected {}",
            nodes.len(),
            opts.node_count
        )));
    }

    engine.set_default_loss(matrix.default_loss_db());
    for e in matrix.entries() {
        debug!(from = e.from, to = e.to, loss_db = e.loss_db, "设置链路衰减");
        engine.set_loss(nodes[e.from], nodes[e.to], e.loss_db);
    }

    Ok(ChainTopology { nodes, matrix })
}

fn validate(opts: &ChainOpts) -> Result<()> {
    if opts.node_count < 2 || opts.node_count % 2 != 0 {
        return Err(CdosError::config(format!(
            "node count must be even and >= 2, got {}",
            opts.node_count
        )));
    }
    let losses = [opts.strong_loss_db, opts.weak_loss_db, opts.no_link_loss_db];
    if losses.iter().any(|l| !l.is_finite() || *l < 0.0) {
        return Err(CdosError::config(format!(
            "loss values must be finite and non-negative: {losses:?}"
        )));
    }
    if opts.no_link_loss_db <= opts.strong_loss_db + opts.weak_loss_db {
        return Err(CdosError::config(format!(
            "no-link loss {} dB must exceed strong + weak loss ({} dB)",
            opts.no_link_loss_db,
            opts.strong_loss_db + opts.weak_loss_db
        )));
    }
    Ok(())
}
