//! Hierarchy materialization and read-only projections.
//!
//! # Responsibility
//! - Rebuild department trees from flat `child_refs` through the store.
//! - Compute per-depth fan-out statistics and level/association views.
//!
//! # Invariants
//! - Deleted departments never appear in a materialized tree.
//! - Output order always follows stored child order.
//! - A cycle in stored references fails fast instead of recursing forever.

pub mod materialize;
pub mod select;
pub mod shape;

use crate::model::department::DepartmentId;
use crate::repo::department_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from hierarchy traversal and projection.
#[derive(Debug)]
pub enum HierarchyError {
    /// A department was reached again on its own ancestor path.
    CycleDetected { id: DepartmentId },
    /// Requested level is outside `[1, levels]`.
    LevelOutOfRange { level: u32, levels: usize },
    /// Store failure while fetching children.
    Repo(RepoError),
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { id } => {
                write!(f, "department hierarchy contains a cycle through {id}")
            }
            Self::LevelOutOfRange { level, levels } => {
                write!(f, "level {level} is out of range; expected 1..={levels}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HierarchyError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
