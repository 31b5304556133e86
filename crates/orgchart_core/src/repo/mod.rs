//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the narrow store contract the hierarchy engine depends on.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `DepartmentNode::validate()` before persistence.
//! - Multi-record writes go through `persist_all` and apply atomically.

pub mod department_repo;
pub mod memory_repo;
