//! In-memory department repository.
//!
//! Mirrors the SQLite repository semantics without a database; used by
//! hierarchy tests and by embedders that keep departments elsewhere.

use crate::model::department::{DepartmentId, DepartmentNode};
use crate::repo::department_repo::{
    DepartmentListQuery, DepartmentRepository, RepoError, RepoResult,
};
use std::cell::{Cell, RefCell};

/// Department store backed by a `Vec` in creation order.
#[derive(Debug, Default)]
pub struct MemoryDepartmentRepository {
    nodes: RefCell<Vec<DepartmentNode>>,
    fetches: Cell<usize>,
}

impl MemoryDepartmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding `nodes` as-is, without validation.
    pub fn with_nodes(nodes: impl IntoIterator<Item = DepartmentNode>) -> Self {
        Self {
            nodes: RefCell::new(nodes.into_iter().collect()),
            fetches: Cell::new(0),
        }
    }

    /// Number of `get_department` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    /// Returns a copy of every stored record, deleted ones included.
    pub fn snapshot(&self) -> Vec<DepartmentNode> {
        self.nodes.borrow().clone()
    }

    fn upsert(nodes: &mut Vec<DepartmentNode>, node: &DepartmentNode) {
        match nodes.iter_mut().find(|existing| existing.id == node.id) {
            Some(existing) => *existing = node.clone(),
            None => nodes.push(node.clone()),
        }
    }
}

impl DepartmentRepository for MemoryDepartmentRepository {
    fn get_department(
        &self,
        id: &DepartmentId,
        include_deleted: bool,
    ) -> RepoResult<Option<DepartmentNode>> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(self
            .nodes
            .borrow()
            .iter()
            .find(|node| &node.id == id && (include_deleted || node.is_active()))
            .cloned())
    }

    fn list_departments(&self, query: &DepartmentListQuery) -> RepoResult<Vec<DepartmentNode>> {
        Ok(self
            .nodes
            .borrow()
            .iter()
            .filter(|node| query.matches(node))
            .cloned()
            .collect())
    }

    fn create_department(&self, node: &DepartmentNode) -> RepoResult<()> {
        node.validate()?;
        let mut nodes = self.nodes.borrow_mut();
        if nodes.iter().any(|existing| existing.id == node.id) {
            return Err(RepoError::InvalidData(format!(
                "department id already exists: {}",
                node.id
            )));
        }
        nodes.push(node.clone());
        Ok(())
    }

    fn persist(&self, node: &DepartmentNode) -> RepoResult<()> {
        node.validate()?;
        Self::upsert(&mut self.nodes.borrow_mut(), node);
        Ok(())
    }

    fn persist_all(&self, nodes: &[DepartmentNode]) -> RepoResult<()> {
        for node in nodes {
            node.validate()?;
        }
        let mut stored = self.nodes.borrow_mut();
        for node in nodes {
            Self::upsert(&mut stored, node);
        }
        Ok(())
    }
}
