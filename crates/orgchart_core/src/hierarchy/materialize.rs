//! Tree materialization from flat child id lists.

use crate::hierarchy::HierarchyError;
use crate::model::department::{DepartmentId, DepartmentNode, DepartmentTree};
use crate::repo::department_repo::DepartmentRepository;
use std::collections::HashSet;

/// Materializes `root` and every active descendant reachable through
/// `child_refs`.
///
/// Children are fetched one at a time, depth-first, in stored order. Missing
/// or soft-deleted children are skipped silently; that is how deletions
/// become invisible to readers.
///
/// # Errors
/// - `CycleDetected` when a child id already sits on the current path.
/// - `Repo` when the store fails; the error is passed through unchanged.
pub fn materialize<R: DepartmentRepository + ?Sized>(
    repo: &R,
    root: &DepartmentNode,
) -> Result<DepartmentTree, HierarchyError> {
    let mut path = HashSet::new();
    materialize_node(repo, root, &mut path)
}

fn materialize_node<R: DepartmentRepository + ?Sized>(
    repo: &R,
    node: &DepartmentNode,
    path: &mut HashSet<DepartmentId>,
) -> Result<DepartmentTree, HierarchyError> {
    if !path.insert(node.id.clone()) {
        return Err(HierarchyError::CycleDetected {
            id: node.id.clone(),
        });
    }

    let mut children = Vec::with_capacity(node.child_refs.len());
    for child_id in &node.child_refs {
        let Some(child) = repo.get_department(child_id, false)? else {
            continue;
        };
        children.push(materialize_node(repo, &child, path)?);
    }

    path.remove(&node.id);
    Ok(DepartmentTree::from_node(node, children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::department::ParentRef;
    use crate::repo::memory_repo::MemoryDepartmentRepository;

    fn node(id: &str, children: &[&str]) -> DepartmentNode {
        let mut node = DepartmentNode::new(DepartmentId::parse(id).unwrap(), id, None).unwrap();
        node.child_refs = children
            .iter()
            .map(|child| DepartmentId::parse(child).unwrap())
            .collect();
        node
    }

    #[test]
    fn leaf_materializes_to_itself() {
        let repo = MemoryDepartmentRepository::new();
        let leaf = node("a", &[]);
        let tree = materialize(&repo, &leaf).unwrap();
        assert_eq!(tree.id, leaf.id);
        assert!(tree.is_leaf());
        assert_eq!(repo.fetch_count(), 0);
    }

    #[test]
    fn skips_missing_and_deleted_children_keeping_order() {
        let mut deleted = node("c", &[]);
        deleted.soft_delete();
        let repo = MemoryDepartmentRepository::with_nodes([
            node("b", &["d"]),
            deleted,
            node("d", &[]),
            node("e", &[]),
        ]);
        let root = node("a", &["b", "c", "ghost", "e"]);

        let tree = materialize(&repo, &root).unwrap();
        let ids: Vec<&str> = tree.children.iter().map(|child| child.id.as_str()).collect();
        assert_eq!(ids, ["B", "E"]);
        assert_eq!(tree.children[0].children[0].id.as_str(), "D");
    }

    #[test]
    fn cycle_fails_fast() {
        let mut b = node("b", &["a"]);
        b.parent_ref = ParentRef::parse("a").unwrap();
        let root = node("a", &["b"]);
        let repo = MemoryDepartmentRepository::with_nodes([root.clone(), b]);

        let err = materialize(&repo, &root).unwrap_err();
        assert!(matches!(err, HierarchyError::CycleDetected { id } if id.as_str() == "A"));
    }

    #[test]
    fn shared_child_is_not_a_cycle() {
        let repo = MemoryDepartmentRepository::with_nodes([
            node("b", &["d"]),
            node("c", &["d"]),
            node("d", &[]),
        ]);
        let tree = materialize(&repo, &node("a", &["b", "c"])).unwrap();
        assert_eq!(tree.children[0].children[0].id.as_str(), "D");
        assert_eq!(tree.children[1].children[0].id.as_str(), "D");
    }
}
