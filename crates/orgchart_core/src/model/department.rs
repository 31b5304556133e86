//! Department domain model.
//!
//! # Responsibility
//! - Define the persisted department record and its materialized tree form.
//! - Own identifier/name normalization so every write path agrees on it.
//!
//! # Invariants
//! - `DepartmentId` values are trimmed and uppercase, and never equal the
//!   root sentinel.
//! - `name` is trimmed, uppercase and never blank.
//! - A department is never its own parent or its own direct child.
//! - `is_deleted` is the source of truth for tombstone state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Reserved `parent_ref` value marking a root department.
pub const ROOT_SENTINEL: &str = "father";

/// Stable department identifier, normalized to trimmed uppercase text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DepartmentId(String);

impl DepartmentId {
    /// Parses and normalizes a caller-provided id.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DepartmentValidationError> {
        let normalized = value.as_ref().trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DepartmentValidationError::BlankId);
        }
        if normalized.eq_ignore_ascii_case(ROOT_SENTINEL) {
            return Err(DepartmentValidationError::ReservedId);
        }
        Ok(Self(normalized))
    }

    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DepartmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DepartmentId {
    type Error = DepartmentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DepartmentId> for String {
    fn from(value: DepartmentId) -> Self {
        value.0
    }
}

/// Parent pointer of a department.
///
/// Serialized as the plain `"father"` sentinel for roots and as the parent
/// id otherwise, matching the stored text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParentRef {
    /// No parent; the department is a root.
    #[default]
    Root,
    /// Points at exactly one other department.
    Department(DepartmentId),
}

impl ParentRef {
    /// Parses stored/caller text into a parent reference.
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DepartmentValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.eq_ignore_ascii_case(ROOT_SENTINEL) {
            return Ok(Self::Root);
        }
        DepartmentId::parse(trimmed).map(Self::Department)
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// Returns the parent id when this is not a root reference.
    pub fn department_id(&self) -> Option<&DepartmentId> {
        match self {
            Self::Root => None,
            Self::Department(id) => Some(id),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => ROOT_SENTINEL,
            Self::Department(id) => id.as_str(),
        }
    }
}

impl Display for ParentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ParentRef {
    type Error = DepartmentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ParentRef> for String {
    fn from(value: ParentRef) -> Self {
        value.as_str().to_string()
    }
}

/// Validation errors for department records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentValidationError {
    /// Id is empty after trim.
    BlankId,
    /// Id collides with the root sentinel.
    ReservedId,
    /// Name is empty after trim.
    BlankName,
    /// Department points at itself as parent.
    SelfParent(DepartmentId),
    /// Department lists itself among its children.
    SelfChild(DepartmentId),
}

impl Display for DepartmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "department id must not be blank"),
            Self::ReservedId => {
                write!(f, "department id `{ROOT_SENTINEL}` is reserved for roots")
            }
            Self::BlankName => write!(f, "department name must not be blank"),
            Self::SelfParent(id) => write!(f, "department {id} cannot be its own parent"),
            Self::SelfChild(id) => write!(f, "department {id} cannot be its own child"),
        }
    }
}

impl Error for DepartmentValidationError {}

/// Persisted department record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentNode {
    pub id: DepartmentId,
    /// Display label, uppercase.
    pub name: String,
    pub description: Option<String>,
    pub parent_ref: ParentRef,
    /// Ordered child ids; order drives left-to-right layout.
    pub child_refs: Vec<DepartmentId>,
    /// Soft delete tombstone.
    pub is_deleted: bool,
    /// Base64-encoded SVG from the last render of this subtree.
    pub rendered_diagram: Option<String>,
    /// Opaque audit reference to the responsible actor.
    pub owner_ref: Option<String>,
}

impl DepartmentNode {
    /// Creates a normalized root department with no children.
    pub fn new(
        id: DepartmentId,
        name: impl AsRef<str>,
        description: Option<&str>,
    ) -> Result<Self, DepartmentValidationError> {
        Ok(Self {
            id,
            name: normalize_name(name)?,
            description: description.and_then(normalize_description),
            parent_ref: ParentRef::Root,
            child_refs: Vec::new(),
            is_deleted: false,
            rendered_diagram: None,
            owner_ref: None,
        })
    }

    /// Checks record-local invariants before persistence.
    pub fn validate(&self) -> Result<(), DepartmentValidationError> {
        if self.name.trim().is_empty() {
            return Err(DepartmentValidationError::BlankName);
        }
        if self.parent_ref.department_id() == Some(&self.id) {
            return Err(DepartmentValidationError::SelfParent(self.id.clone()));
        }
        if self.child_refs.contains(&self.id) {
            return Err(DepartmentValidationError::SelfChild(self.id.clone()));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Turns this department into a childless root.
    pub fn detach_to_root(&mut self) {
        self.parent_ref = ParentRef::Root;
        self.child_refs.clear();
    }
}

/// Materialized department with child records in place of child ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentTree {
    pub id: DepartmentId,
    pub name: String,
    pub description: Option<String>,
    pub parent_ref: ParentRef,
    pub is_deleted: bool,
    pub rendered_diagram: Option<String>,
    pub owner_ref: Option<String>,
    /// Active children in stored order.
    pub children: Vec<DepartmentTree>,
}

impl DepartmentTree {
    /// Builds a tree node from a record and already-materialized children.
    pub fn from_node(node: &DepartmentNode, children: Vec<DepartmentTree>) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            parent_ref: node.parent_ref.clone(),
            is_deleted: node.is_deleted,
            rendered_diagram: node.rendered_diagram.clone(),
            owner_ref: node.owner_ref.clone(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child ids in materialized order.
    pub fn child_ids(&self) -> Vec<DepartmentId> {
        self.children.iter().map(|child| child.id.clone()).collect()
    }

    /// Visits every descendant (excluding `self`) in pre-order.
    pub fn for_each_descendant<'a>(&'a self, visit: &mut impl FnMut(&'a DepartmentTree)) {
        for child in &self.children {
            visit(child);
            child.for_each_descendant(visit);
        }
    }
}

/// Trims and uppercases a display name.
pub fn normalize_name(value: impl AsRef<str>) -> Result<String, DepartmentValidationError> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        return Err(DepartmentValidationError::BlankName);
    }
    Ok(trimmed.to_uppercase())
}

/// Trims a description; blank descriptions become `None`.
pub fn normalize_description(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
