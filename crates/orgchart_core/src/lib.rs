//! Core domain logic for the org chart store.
//! This crate is the single source of truth for hierarchy invariants.

pub mod db;
pub mod diagram;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use diagram::layout::{layout_tree, CanvasSize, DiagramLayout};
pub use diagram::style::DiagramStyle;
pub use diagram::{decode_document, encode_document, DiagramDecodeError};
pub use hierarchy::materialize::materialize;
pub use hierarchy::select::{flatten_associations, select_level, Association, LevelMember};
pub use hierarchy::shape::TreeShape;
pub use hierarchy::HierarchyError;
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::department::{
    DepartmentId, DepartmentNode, DepartmentTree, DepartmentValidationError, ParentRef,
    ROOT_SENTINEL,
};
pub use repo::department_repo::{
    DepartmentListQuery, DepartmentRepository, RepoError, RepoResult, SqliteDepartmentRepository,
};
pub use repo::memory_repo::MemoryDepartmentRepository;
pub use service::department_service::{
    AttachRequest, DepartmentDetail, DepartmentFilter, DepartmentPatch, DepartmentService,
    DepartmentServiceError, DepartmentSummary, ErrorKind, NewDepartment, RemovalReport,
    RenderedDiagram, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
