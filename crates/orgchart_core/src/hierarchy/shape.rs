//! Per-depth fan-out statistics used to size diagram canvases.

use crate::model::department::DepartmentTree;
use serde::Serialize;

/// Fan-out totals per depth of a materialized tree.
///
/// `level_fanout[d]` is the number of edges leaving depth `d`, i.e. the sum
/// of `children.len()` over every node at depth `d`. Every node registers
/// its depth, so the deepest level contributes a trailing `0` and the
/// sequence length equals the number of node levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeShape {
    level_fanout: Vec<usize>,
}

impl TreeShape {
    /// Aggregates fan-out over `tree` in pre-order.
    pub fn of(tree: &DepartmentTree) -> Self {
        let mut level_fanout = Vec::new();
        accumulate(tree, 0, &mut level_fanout);
        Self { level_fanout }
    }

    pub fn level_fanout(&self) -> &[usize] {
        &self.level_fanout
    }

    /// Number of depth levels, root included.
    pub fn number_of_levels(&self) -> usize {
        self.level_fanout.len()
    }

    /// Largest per-level fan-out; `0` for a lone leaf.
    pub fn max_fanout(&self) -> usize {
        self.level_fanout.iter().copied().max().unwrap_or(0)
    }
}

fn accumulate(node: &DepartmentTree, depth: usize, counts: &mut Vec<usize>) {
    if counts.len() <= depth {
        counts.resize(depth + 1, 0);
    }
    counts[depth] += node.children.len();
    for child in &node.children {
        accumulate(child, depth + 1, counts);
    }
}
