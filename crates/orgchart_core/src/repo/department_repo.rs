//! Department repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide fetch/filter/create/upsert APIs over `departments` storage.
//! - Keep SQL details and the `child_refs` encoding inside the repository.
//!
//! # Invariants
//! - Write paths call `DepartmentNode::validate()` before SQL mutations.
//! - `persist_all` is all-or-nothing.
//! - Listing order is creation order.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::department::{
    DepartmentId, DepartmentNode, DepartmentValidationError, ParentRef,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEPARTMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    parent_ref,
    child_refs,
    is_deleted,
    rendered_diagram,
    owner_ref
FROM departments";

const DEPARTMENT_UPSERT_SQL: &str = "INSERT INTO departments (
    id,
    name,
    description,
    parent_ref,
    child_refs,
    is_deleted,
    rendered_diagram,
    owner_ref
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(id) DO UPDATE SET
    name = excluded.name,
    description = excluded.description,
    parent_ref = excluded.parent_ref,
    child_refs = excluded.child_refs,
    is_deleted = excluded.is_deleted,
    rendered_diagram = excluded.rendered_diagram,
    owner_ref = excluded.owner_ref,
    updated_at = (strftime('%s', 'now') * 1000);";

/// Result type used by department repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for department persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed model validation before write.
    Validation(DepartmentValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target department does not exist.
    NotFound(DepartmentId),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "department not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted department data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DepartmentValidationError> for RepoError {
    fn from(value: DepartmentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filter options for listing departments.
///
/// Text filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default)]
pub struct DepartmentListQuery {
    pub name_contains: Option<String>,
    /// Matched against the textual parent reference (`father` for roots).
    pub parent_contains: Option<String>,
    pub include_deleted: bool,
}

impl DepartmentListQuery {
    /// Returns whether `node` passes this filter.
    pub fn matches(&self, node: &DepartmentNode) -> bool {
        if !self.include_deleted && node.is_deleted {
            return false;
        }
        contains_ignore_case(&node.name, self.name_contains.as_deref())
            && contains_ignore_case(node.parent_ref.as_str(), self.parent_contains.as_deref())
    }
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle.map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Store adapter consumed by the hierarchy engine and service layer.
pub trait DepartmentRepository {
    /// Loads one department by id.
    fn get_department(
        &self,
        id: &DepartmentId,
        include_deleted: bool,
    ) -> RepoResult<Option<DepartmentNode>>;
    /// Lists departments matching a filter, in creation order.
    fn list_departments(&self, query: &DepartmentListQuery) -> RepoResult<Vec<DepartmentNode>>;
    /// Inserts a new department; fails when the id already exists.
    fn create_department(&self, node: &DepartmentNode) -> RepoResult<()>;
    /// Upserts one department.
    fn persist(&self, node: &DepartmentNode) -> RepoResult<()>;
    /// Upserts a batch of departments atomically.
    fn persist_all(&self, nodes: &[DepartmentNode]) -> RepoResult<()>;
}

/// SQLite-backed department repository.
pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_department_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn get_department(
        &self,
        id: &DepartmentId,
        include_deleted: bool,
    ) -> RepoResult<Option<DepartmentNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEPARTMENT_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.as_str(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_department_row(row)?));
        }
        Ok(None)
    }

    fn list_departments(&self, query: &DepartmentListQuery) -> RepoResult<Vec<DepartmentNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DEPARTMENT_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(query.include_deleted)])?;

        // Text filters run in Rust: SQLite `LIKE`/`lower` only fold ASCII,
        // while names are uppercased with full Unicode rules.
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let node = parse_department_row(row)?;
            if query.matches(&node) {
                items.push(node);
            }
        }
        Ok(items)
    }

    fn create_department(&self, node: &DepartmentNode) -> RepoResult<()> {
        node.validate()?;
        let child_refs = encode_child_refs(&node.child_refs)?;
        self.conn.execute(
            "INSERT INTO departments (
                id,
                name,
                description,
                parent_ref,
                child_refs,
                is_deleted,
                rendered_diagram,
                owner_ref
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                node.id.as_str(),
                node.name.as_str(),
                node.description.as_deref(),
                node.parent_ref.as_str(),
                child_refs,
                bool_to_int(node.is_deleted),
                node.rendered_diagram.as_deref(),
                node.owner_ref.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn persist(&self, node: &DepartmentNode) -> RepoResult<()> {
        node.validate()?;
        upsert_department(self.conn, node)
    }

    fn persist_all(&self, nodes: &[DepartmentNode]) -> RepoResult<()> {
        for node in nodes {
            node.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for node in nodes {
            upsert_department(&tx, node)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn upsert_department(conn: &Connection, node: &DepartmentNode) -> RepoResult<()> {
    let child_refs = encode_child_refs(&node.child_refs)?;
    conn.execute(
        DEPARTMENT_UPSERT_SQL,
        params![
            node.id.as_str(),
            node.name.as_str(),
            node.description.as_deref(),
            node.parent_ref.as_str(),
            child_refs,
            bool_to_int(node.is_deleted),
            node.rendered_diagram.as_deref(),
            node.owner_ref.as_deref(),
        ],
    )?;
    Ok(())
}

fn encode_child_refs(child_refs: &[DepartmentId]) -> RepoResult<String> {
    serde_json::to_string(child_refs)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode child_refs: {err}")))
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<DepartmentNode> {
    let id_text: String = row.get("id")?;
    let id = DepartmentId::parse(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid id `{id_text}` in departments.id"))
    })?;

    let parent_text: String = row.get("parent_ref")?;
    let parent_ref = ParentRef::parse(&parent_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid parent reference `{parent_text}` in departments.parent_ref"
        ))
    })?;

    let child_refs_text: String = row.get("child_refs")?;
    let child_refs: Vec<DepartmentId> = serde_json::from_str(&child_refs_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid child list `{child_refs_text}` in departments.child_refs: {err}"
        ))
    })?;

    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in departments.is_deleted"
            )));
        }
    };

    Ok(DepartmentNode {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        parent_ref,
        child_refs,
        is_deleted,
        rendered_diagram: row.get("rendered_diagram")?,
        owner_ref: row.get("owner_ref")?,
    })
}

fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn ensure_department_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::InvalidData(format!(
            "department repository requires schema version {expected_version}, got {actual_version}"
        )));
    }

    let mut stmt = conn.prepare("PRAGMA table_info(departments);")?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }

    for required in [
        "id",
        "name",
        "description",
        "parent_ref",
        "child_refs",
        "is_deleted",
        "rendered_diagram",
        "owner_ref",
    ] {
        if !columns.iter().any(|column| column == required) {
            return Err(RepoError::InvalidData(format!(
                "department repository requires column `{required}` in table `departments`"
            )));
        }
    }
    Ok(())
}
