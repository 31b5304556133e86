//! Department use-case service.
//!
//! # Responsibility
//! - Expose caller-level department operations over any repository.
//! - Validate structural edits (attach/remove) above the repository layer.
//! - Drive materialization, projections and diagram rendering.
//!
//! # Invariants
//! - Attach never creates a self-loop or an ancestor cycle.
//! - After remove, no active department lists the removed id as a child.
//! - Multi-record edits are committed through one `persist_all` call.
//! - Render writes back only after a diagram was produced.

use crate::diagram::layout::layout_tree;
use crate::diagram::style::DiagramStyle;
use crate::diagram::svg::render_svg;
use crate::diagram::{decode_document, encode_document};
use crate::hierarchy::materialize::materialize;
use crate::hierarchy::select::{flatten_associations, select_level, Association, LevelMember};
use crate::hierarchy::shape::TreeShape;
use crate::hierarchy::HierarchyError;
use crate::model::department::{
    normalize_description, normalize_name, DepartmentId, DepartmentNode, DepartmentTree,
    DepartmentValidationError, ParentRef,
};
use crate::repo::department_repo::{DepartmentListQuery, DepartmentRepository, RepoError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Status classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

/// Errors from department service operations.
#[derive(Debug)]
pub enum DepartmentServiceError {
    /// Input failed normalization or record validation.
    Invalid(DepartmentValidationError),
    /// Target department does not exist or is soft-deleted.
    DepartmentNotFound(DepartmentId),
    /// One side of an attach request does not exist or is soft-deleted.
    EndpointNotFound(DepartmentId),
    /// Create requested an id that is already taken.
    DuplicateId(DepartmentId),
    /// Attach requested a department as its own child.
    SelfAttachment(DepartmentId),
    /// Attach would place a department under its own descendant.
    CycleDetected {
        parent_id: DepartmentId,
        child_id: DepartmentId,
    },
    /// Stored references already contain a cycle through this department.
    HierarchyCycle(DepartmentId),
    /// Render requested on a department with no active children.
    NothingToRender(DepartmentId),
    /// Level query outside `[1, levels]`.
    LevelOutOfRange { level: u32, levels: usize },
    /// Repository-level failure.
    Repo(RepoError),
}

impl DepartmentServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DepartmentNotFound(_) => ErrorKind::NotFound,
            Self::EndpointNotFound(_)
            | Self::DuplicateId(_)
            | Self::SelfAttachment(_)
            | Self::CycleDetected { .. }
            | Self::HierarchyCycle(_)
            | Self::NothingToRender(_) => ErrorKind::Conflict,
            Self::Invalid(_) | Self::LevelOutOfRange { .. } => ErrorKind::Validation,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for DepartmentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::DepartmentNotFound(id) => write!(f, "department not found: {id}"),
            Self::EndpointNotFound(id) => {
                write!(f, "parent or child department not found: {id}")
            }
            Self::DuplicateId(id) => write!(f, "department id already exists: {id}"),
            Self::SelfAttachment(id) => {
                write!(f, "department {id} cannot be attached to itself")
            }
            Self::CycleDetected {
                parent_id,
                child_id,
            } => write!(
                f,
                "attach would create cycle: {child_id} is an ancestor of {parent_id}"
            ),
            Self::HierarchyCycle(id) => {
                write!(f, "department hierarchy contains a cycle through {id}")
            }
            Self::NothingToRender(id) => {
                write!(f, "department {id} has no sub-departments to draw")
            }
            Self::LevelOutOfRange { level, levels } => {
                write!(f, "level {level} is out of range; expected 1..={levels}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DepartmentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DepartmentValidationError> for DepartmentServiceError {
    fn from(value: DepartmentValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<RepoError> for DepartmentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::DepartmentNotFound(id),
            RepoError::Validation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

impl From<HierarchyError> for DepartmentServiceError {
    fn from(value: HierarchyError) -> Self {
        match value {
            HierarchyError::CycleDetected { id } => Self::HierarchyCycle(id),
            HierarchyError::LevelOutOfRange { level, levels } => {
                Self::LevelOutOfRange { level, levels }
            }
            HierarchyError::Repo(err) => err.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, DepartmentServiceError>;

/// List filter; both fields are case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentFilter {
    pub name: Option<String>,
    /// Matched against the parent reference text (`father` for roots).
    pub parent: Option<String>,
}

/// Flat list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    /// Decoded SVG text of the cached diagram; `None` when absent or
    /// undecodable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_diagram: Option<String>,
}

/// Single department view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentDetail {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
}

/// Create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDepartment {
    /// Caller-chosen id; generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub owner_ref: Option<String>,
}

/// Partial update of mutable attributes. An empty description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_ref: Option<String>,
}

/// Attach request: make `child_id` a child of `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachRequest {
    pub parent_id: String,
    pub child_id: String,
}

/// Outcome of a remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    pub removed: DepartmentId,
    /// Former descendants turned into childless roots, in pre-order.
    pub detached: Vec<DepartmentId>,
}

/// Fresh render of a department subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDiagram {
    /// Root record after cache write-back.
    pub department: DepartmentNode,
    pub svg: String,
    /// Base64 form stored in `department.rendered_diagram`.
    pub encoded: String,
    pub width: f64,
    pub height: f64,
}

/// Department service facade.
pub struct DepartmentService<R: DepartmentRepository> {
    repo: R,
    style: DiagramStyle,
}

impl<R: DepartmentRepository> DepartmentService<R> {
    /// Creates service with the default diagram style.
    pub fn new(repo: R) -> Self {
        Self::with_style(repo, DiagramStyle::default())
    }

    pub fn with_style(repo: R, style: DiagramStyle) -> Self {
        Self { repo, style }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Lists active departments matching `filter`.
    pub fn list_departments(
        &self,
        filter: &DepartmentFilter,
    ) -> ServiceResult<Vec<DepartmentSummary>> {
        let query = DepartmentListQuery {
            name_contains: filter.name.clone(),
            parent_contains: filter.parent.clone(),
            include_deleted: false,
        };

        let summaries = self
            .repo
            .list_departments(&query)?
            .into_iter()
            .map(|node| {
                let rendered_diagram = node.rendered_diagram.as_deref().and_then(|encoded| {
                    decode_document(encoded)
                        .map_err(|err| {
                            warn!(
                                "event=diagram_decode module=service status=error id={} error={}",
                                node.id, err
                            );
                        })
                        .ok()
                });
                DepartmentSummary {
                    id: node.id,
                    name: node.name,
                    description: node.description,
                    rendered_diagram,
                }
            })
            .collect::<Vec<_>>();
        Ok(summaries)
    }

    /// Loads one active department.
    pub fn get_department(&self, id: &str) -> ServiceResult<DepartmentDetail> {
        let node = self.load_active(&parse_id(id)?)?;
        Ok(DepartmentDetail {
            id: node.id,
            name: node.name,
            description: node.description,
        })
    }

    /// Creates a root department.
    pub fn create_department(&self, request: NewDepartment) -> ServiceResult<DepartmentNode> {
        let id = match request.id.as_deref() {
            Some(raw) => parse_id(raw)?,
            None => DepartmentId::generate(),
        };
        if self.repo.get_department(&id, true)?.is_some() {
            return Err(DepartmentServiceError::DuplicateId(id));
        }

        let mut node = DepartmentNode::new(id, &request.name, request.description.as_deref())?;
        node.owner_ref = request.owner_ref.as_deref().and_then(normalize_description);
        self.repo.create_department(&node)?;

        info!(
            "event=department_create module=service status=ok id={}",
            node.id
        );
        Ok(node)
    }

    /// Applies a partial attribute update.
    pub fn update_department(
        &self,
        id: &str,
        patch: DepartmentPatch,
    ) -> ServiceResult<DepartmentNode> {
        let mut node = self.load_active(&parse_id(id)?)?;
        if let Some(name) = patch.name {
            node.name = normalize_name(name)?;
        }
        if let Some(description) = patch.description {
            node.description = normalize_description(&description);
        }
        if let Some(owner_ref) = patch.owner_ref {
            node.owner_ref = normalize_description(&owner_ref);
        }
        self.repo.persist(&node)?;

        info!(
            "event=department_update module=service status=ok id={}",
            node.id
        );
        Ok(node)
    }

    /// Soft-deletes a department and detaches its whole former subtree.
    ///
    /// Every active descendant becomes a childless root. The removed node
    /// ends up deleted, childless and pointing at the root sentinel, and is
    /// dropped from its former parent's `child_refs`.
    pub fn remove_department(&self, id: &str) -> ServiceResult<RemovalReport> {
        let id = parse_id(id)?;
        let mut node = self.load_active(&id)?;
        let mut batch = Vec::new();
        let mut detached = Vec::new();

        if let Some(parent) = self.former_parent_without(&node)? {
            batch.push(parent);
        }

        if node.child_refs.is_empty() {
            node.soft_delete();
        } else {
            let tree = materialize(&self.repo, &node)?;
            let mut seen = HashSet::new();
            tree.for_each_descendant(&mut |descendant| {
                if seen.insert(descendant.id.clone()) {
                    detached.push(descendant.id.clone());
                    batch.push(detached_record(descendant));
                }
            });
            node.detach_to_root();
            node.soft_delete();
        }
        batch.push(node);

        if let Err(err) = self.repo.persist_all(&batch) {
            warn!(
                "event=department_remove module=service status=error id={} error={}",
                id, err
            );
            return Err(err.into());
        }

        info!(
            "event=department_remove module=service status=ok id={} detached={}",
            id,
            detached.len()
        );
        Ok(RemovalReport {
            removed: id,
            detached,
        })
    }

    /// Makes `child_id` a child of `parent_id` and returns the parent subtree.
    ///
    /// A child that already had another parent is removed from that
    /// parent's `child_refs`, so it never appears twice in the forest.
    pub fn attach(&self, request: &AttachRequest) -> ServiceResult<DepartmentTree> {
        let parent_id = parse_id(&request.parent_id)?;
        let child_id = parse_id(&request.child_id)?;
        if parent_id == child_id {
            return Err(DepartmentServiceError::SelfAttachment(child_id));
        }

        let mut child = self
            .repo
            .get_department(&child_id, false)?
            .ok_or_else(|| DepartmentServiceError::EndpointNotFound(child_id.clone()))?;
        let mut parent = self
            .repo
            .get_department(&parent_id, false)?
            .ok_or_else(|| DepartmentServiceError::EndpointNotFound(parent_id.clone()))?;

        if self.is_ancestor(&child_id, &parent)? {
            return Err(DepartmentServiceError::CycleDetected {
                parent_id,
                child_id,
            });
        }

        let mut batch = Vec::with_capacity(3);
        if child.parent_ref.department_id() != Some(&parent_id) {
            if let Some(former) = self.former_parent_without(&child)? {
                batch.push(former);
            }
        }

        child.parent_ref = ParentRef::Department(parent_id.clone());
        if !parent.child_refs.contains(&child_id) {
            parent.child_refs.push(child_id.clone());
        }
        batch.push(child);
        batch.push(parent.clone());
        self.repo.persist_all(&batch)?;

        info!(
            "event=department_attach module=service status=ok parent_id={} child_id={}",
            parent_id, child_id
        );
        materialize(&self.repo, &parent).map_err(Into::into)
    }

    /// Materializes the active subtree rooted at `id`.
    pub fn subtree(&self, id: &str) -> ServiceResult<DepartmentTree> {
        let root = self.load_active(&parse_id(id)?)?;
        materialize(&self.repo, &root).map_err(Into::into)
    }

    /// Returns the departments at 1-based `level` under `id`.
    pub fn level_members(&self, id: &str, level: u32) -> ServiceResult<Vec<LevelMember>> {
        let tree = self.subtree(id)?;
        select_level(&tree, level).map_err(Into::into)
    }

    /// Returns one `{parent, children}` entry per internal node under `id`.
    pub fn associations(&self, id: &str) -> ServiceResult<Vec<Association>> {
        let tree = self.subtree(id)?;
        Ok(flatten_associations(&tree))
    }

    /// Renders the subtree under `id` and caches the result on the root.
    ///
    /// The root's `child_refs` are rewritten to the materialized child ids,
    /// which drops references to deleted or missing children.
    pub fn render_diagram(&self, id: &str) -> ServiceResult<RenderedDiagram> {
        let started_at = Instant::now();
        let mut root = self.load_active(&parse_id(id)?)?;
        if root.child_refs.is_empty() {
            return Err(DepartmentServiceError::NothingToRender(root.id));
        }

        let tree = materialize(&self.repo, &root)?;
        if tree.is_leaf() {
            return Err(DepartmentServiceError::NothingToRender(root.id));
        }

        let shape = TreeShape::of(&tree);
        let layout = layout_tree(&tree, &shape, &self.style);
        let svg = render_svg(&layout, &self.style);
        let encoded = encode_document(&svg);

        root.child_refs = tree.child_ids();
        root.rendered_diagram = Some(encoded.clone());
        self.repo.persist(&root)?;

        info!(
            "event=diagram_render module=service status=ok id={} levels={} max_fanout={} duration_ms={}",
            root.id,
            shape.number_of_levels(),
            shape.max_fanout(),
            started_at.elapsed().as_millis()
        );
        Ok(RenderedDiagram {
            department: root,
            svg,
            encoded,
            width: layout.canvas.width,
            height: layout.canvas.height,
        })
    }

    fn load_active(&self, id: &DepartmentId) -> ServiceResult<DepartmentNode> {
        self.repo
            .get_department(id, false)?
            .ok_or_else(|| DepartmentServiceError::DepartmentNotFound(id.clone()))
    }

    /// Returns `node`'s active parent with `node` removed from its children,
    /// or `None` for roots and dangling parents.
    fn former_parent_without(
        &self,
        node: &DepartmentNode,
    ) -> ServiceResult<Option<DepartmentNode>> {
        let Some(parent_id) = node.parent_ref.department_id() else {
            return Ok(None);
        };
        let Some(mut parent) = self.repo.get_department(parent_id, false)? else {
            return Ok(None);
        };
        parent.child_refs.retain(|child_id| child_id != &node.id);
        Ok(Some(parent))
    }

    /// Walks `start`'s ancestor chain looking for `candidate`.
    ///
    /// # Errors
    /// - `HierarchyCycle` when the stored chain loops back on itself.
    fn is_ancestor(
        &self,
        candidate: &DepartmentId,
        start: &DepartmentNode,
    ) -> ServiceResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = start.parent_ref.department_id().cloned();
        while let Some(current) = cursor {
            if &current == candidate {
                return Ok(true);
            }
            if !visited.insert(current.clone()) {
                return Err(DepartmentServiceError::HierarchyCycle(current));
            }
            cursor = match self.repo.get_department(&current, false)? {
                Some(node) => node.parent_ref.department_id().cloned(),
                None => None,
            };
        }
        Ok(false)
    }
}

fn parse_id(raw: &str) -> ServiceResult<DepartmentId> {
    DepartmentId::parse(raw).map_err(Into::into)
}

fn detached_record(tree: &DepartmentTree) -> DepartmentNode {
    DepartmentNode {
        id: tree.id.clone(),
        name: tree.name.clone(),
        description: tree.description.clone(),
        parent_ref: ParentRef::Root,
        child_refs: Vec::new(),
        is_deleted: tree.is_deleted,
        rendered_diagram: tree.rendered_diagram.clone(),
        owner_ref: tree.owner_ref.clone(),
    }
}
