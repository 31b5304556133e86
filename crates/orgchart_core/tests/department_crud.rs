use orgchart_core::db::open_db_in_memory;
use orgchart_core::{
    encode_document, DepartmentFilter, DepartmentId, DepartmentListQuery, DepartmentNode,
    DepartmentPatch, DepartmentRepository, DepartmentService, DepartmentServiceError,
    DepartmentValidationError, ErrorKind, NewDepartment, ParentRef, RepoError,
    SqliteDepartmentRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn new_department(id: &str, name: &str) -> NewDepartment {
    NewDepartment {
        id: Some(id.to_string()),
        name: name.to_string(),
        description: None,
        owner_ref: None,
    }
}

#[test]
fn create_normalizes_and_roundtrips_through_sqlite() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());

    let created = service
        .create_department(NewDepartment {
            id: Some("  fin-01 ".to_string()),
            name: "  finance ".to_string(),
            description: Some("  money matters  ".to_string()),
            owner_ref: Some("user-7".to_string()),
        })
        .unwrap();

    assert_eq!(created.id.as_str(), "FIN-01");
    assert_eq!(created.name, "FINANCE");
    assert_eq!(created.description.as_deref(), Some("money matters"));
    assert_eq!(created.parent_ref, ParentRef::Root);
    assert!(created.child_refs.is_empty());
    assert_eq!(created.rendered_diagram, None);

    let loaded = service
        .repo()
        .get_department(&created.id, false)
        .unwrap()
        .unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.owner_ref.as_deref(), Some("user-7"));
}

#[test]
fn create_generates_uppercase_id_when_absent() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());

    let created = service
        .create_department(NewDepartment {
            name: "ops".to_string(),
            ..NewDepartment::default()
        })
        .unwrap();
    assert_eq!(created.id.as_str(), created.id.as_str().to_uppercase());
    assert_eq!(service.get_department(created.id.as_str()).unwrap().name, "OPS");
}

#[test]
fn create_rejects_blank_name_and_duplicate_id() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());

    let blank = service.create_department(new_department("a", "   ")).unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::Validation);

    service.create_department(new_department("a", "Alpha")).unwrap();
    let duplicate = service.create_department(new_department("A", "Again")).unwrap_err();
    assert!(matches!(duplicate, DepartmentServiceError::DuplicateId(ref id) if id.as_str() == "A"));
    assert_eq!(duplicate.kind(), ErrorKind::Conflict);
}

#[test]
fn get_department_returns_detail_or_not_found() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());
    service.create_department(new_department("hr", "People")).unwrap();

    let detail = service.get_department(" hr ").unwrap();
    assert_eq!(detail.id.as_str(), "HR");
    assert_eq!(detail.name, "PEOPLE");

    let err = service.get_department("missing").unwrap_err();
    assert!(matches!(err, DepartmentServiceError::DepartmentNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn update_applies_patch_and_hides_deleted() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());
    service.create_department(new_department("it", "IT")).unwrap();

    let updated = service
        .update_department(
            "it",
            DepartmentPatch {
                name: Some(" systems ".to_string()),
                description: Some("servers".to_string()),
                owner_ref: None,
            },
        )
        .unwrap();
    assert_eq!(updated.name, "SYSTEMS");
    assert_eq!(updated.description.as_deref(), Some("servers"));

    let cleared = service
        .update_department(
            "it",
            DepartmentPatch {
                description: Some("  ".to_string()),
                ..DepartmentPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.name, "SYSTEMS");

    service.remove_department("it").unwrap();
    let err = service
        .update_department("it", DepartmentPatch::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn list_filters_active_departments_and_decodes_diagrams() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());
    service.create_department(new_department("hq", "Headquarters")).unwrap();
    service.create_department(new_department("sales", "Sales")).unwrap();
    service.create_department(new_department("gone", "Gone Sales")).unwrap();
    service
        .attach(&orgchart_core::AttachRequest {
            parent_id: "hq".to_string(),
            child_id: "sales".to_string(),
        })
        .unwrap();
    service.remove_department("gone").unwrap();

    let all = service.list_departments(&DepartmentFilter::default()).unwrap();
    let names: Vec<&str> = all.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, ["HEADQUARTERS", "SALES"]);

    let by_name = service
        .list_departments(&DepartmentFilter {
            name: Some("sal".to_string()),
            parent: None,
        })
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id.as_str(), "SALES");

    let roots = service
        .list_departments(&DepartmentFilter {
            name: None,
            parent: Some("Father".to_string()),
        })
        .unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id.as_str(), "HQ");

    let rendered = service.render_diagram("hq").unwrap();
    let listed = service.list_departments(&DepartmentFilter::default()).unwrap();
    assert_eq!(listed[0].rendered_diagram.as_deref(), Some(rendered.svg.as_str()));
    assert_eq!(listed[1].rendered_diagram, None);
}

#[test]
fn list_skips_undecodable_cached_diagram() {
    let conn = setup();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let mut broken =
        DepartmentNode::new(DepartmentId::parse("x").unwrap(), "X", None).unwrap();
    broken.rendered_diagram = Some("%%%".to_string());
    repo.create_department(&broken).unwrap();
    let mut healthy =
        DepartmentNode::new(DepartmentId::parse("y").unwrap(), "Y", None).unwrap();
    healthy.rendered_diagram = Some(encode_document("<svg></svg>"));
    repo.create_department(&healthy).unwrap();

    let service = DepartmentService::new(repo);
    let listed = service
        .list_departments(&DepartmentFilter::default())
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id.as_str(), "X");
    assert_eq!(listed[0].rendered_diagram, None);
    assert_eq!(listed[1].rendered_diagram.as_deref(), Some("<svg></svg>"));
}

#[test]
fn create_rejects_root_sentinel_as_id() {
    let conn = setup();
    let service = DepartmentService::new(SqliteDepartmentRepository::try_new(&conn).unwrap());

    for raw in ["father", " Father "] {
        let err = service.create_department(new_department(raw, "Root")).unwrap_err();
        assert!(matches!(
            err,
            DepartmentServiceError::Invalid(DepartmentValidationError::ReservedId)
        ));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(service
        .list_departments(&DepartmentFilter::default())
        .unwrap()
        .is_empty());

    service.create_department(new_department("kid", "Kid")).unwrap();
    let err = service
        .attach(&orgchart_core::AttachRequest {
            parent_id: "father".to_string(),
            child_id: "kid".to_string(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(service
        .repo()
        .get_department(&DepartmentId::parse("kid").unwrap(), false)
        .unwrap()
        .unwrap()
        .parent_ref
        .is_root());
}

#[test]
fn repository_persist_all_is_atomic() {
    let conn = setup();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let a = DepartmentNode::new(DepartmentId::parse("a").unwrap(), "A", None).unwrap();
    repo.create_department(&a).unwrap();

    let mut renamed = a.clone();
    renamed.name = "RENAMED".to_string();
    let mut encoded = DepartmentNode::new(DepartmentId::parse("b").unwrap(), "B", None).unwrap();
    encoded.rendered_diagram = Some(encode_document("<svg></svg>"));
    repo.persist_all(&[renamed, encoded]).unwrap();

    let listed = repo
        .list_departments(&DepartmentListQuery::default())
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "RENAMED");

    // One invalid record rejects the whole batch.
    let mut first = listed[0].clone();
    first.name = "SHOULD NOT STICK".to_string();
    let mut broken = listed[1].clone();
    broken.name = "   ".to_string();
    let err = repo.persist_all(&[first, broken]).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let reloaded = repo
        .get_department(&DepartmentId::parse("a").unwrap(), false)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.name, "RENAMED");
}

#[test]
fn repository_preserves_child_order() {
    let conn = setup();
    let repo = SqliteDepartmentRepository::try_new(&conn).unwrap();
    let mut root = DepartmentNode::new(DepartmentId::parse("r").unwrap(), "R", None).unwrap();
    root.child_refs = ["z", "a", "m"]
        .iter()
        .map(|id| DepartmentId::parse(id).unwrap())
        .collect();
    repo.persist(&root).unwrap();

    let loaded = repo.get_department(&root.id, false).unwrap().unwrap();
    let ids: Vec<&str> = loaded.child_refs.iter().map(DepartmentId::as_str).collect();
    assert_eq!(ids, ["Z", "A", "M"]);
}
