//! Level selection and parent/children association flattening.

use crate::hierarchy::shape::TreeShape;
use crate::hierarchy::HierarchyError;
use crate::model::department::{DepartmentId, DepartmentTree};
use serde::{Deserialize, Serialize};

/// Department reference returned by level queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMember {
    pub id: DepartmentId,
    pub name: String,
}

/// One internal node and the names of its direct children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub parent: String,
    pub children: Vec<String>,
}

/// Returns every department at 1-based `level` under `tree`.
///
/// Level 1 is the root itself. Members are ordered left-to-right.
///
/// # Errors
/// - `LevelOutOfRange` unless `1 <= level <= TreeShape::number_of_levels()`.
pub fn select_level(
    tree: &DepartmentTree,
    level: u32,
) -> Result<Vec<LevelMember>, HierarchyError> {
    let levels = TreeShape::of(tree).number_of_levels();
    if level == 0 || level as usize > levels {
        return Err(HierarchyError::LevelOutOfRange { level, levels });
    }

    let mut members = Vec::new();
    collect_level(tree, level, &mut members);
    Ok(members)
}

fn collect_level(node: &DepartmentTree, level: u32, out: &mut Vec<LevelMember>) {
    if level == 1 {
        out.push(LevelMember {
            id: node.id.clone(),
            name: node.name.clone(),
        });
        return;
    }
    for child in &node.children {
        collect_level(child, level - 1, out);
    }
}

/// Flattens `tree` into one association per internal node, parent before
/// children, depth-first.
pub fn flatten_associations(tree: &DepartmentTree) -> Vec<Association> {
    let mut associations = Vec::new();
    collect_associations(tree, &mut associations);
    associations
}

fn collect_associations(node: &DepartmentTree, out: &mut Vec<Association>) {
    if node.is_leaf() {
        return;
    }
    out.push(Association {
        parent: node.name.clone(),
        children: node.children.iter().map(|child| child.name.clone()).collect(),
    });
    for child in &node.children {
        collect_associations(child, out);
    }
}
