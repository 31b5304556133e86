//! Department domain model.
//!
//! # Responsibility
//! - Define canonical department records and their materialized tree shape.
//!
//! # Invariants
//! - Every department is identified by a stable, uppercase `DepartmentId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod department;
