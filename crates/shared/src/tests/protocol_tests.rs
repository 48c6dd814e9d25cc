use super::*;
use crate::domain::{DimensionKey, RecordId};

const PROJECTS: &str = r#"[
  {
    "id": 1,
    "title": "Smart irrigation",
    "customers": {"id": 10, "title": "Acme"},
    "years": {"id": 2020, "title": "2020"},
    "topics": [{"id": 1, "title": "Water"}, {"id": 2, "title": "IoT"}],
    "services": [{"id": "design", "title": "Design"}]
  },
  {
    "id": "2",
    "title": "Transit map",
    "years": {"id": "2021", "title": "2021"},
    "topics": {"id": 3, "title": "Mobility"}
  }
]"#;

#[test]
fn decodes_project_collection_with_mixed_attribute_shapes() {
    let projects = decode_projects(PROJECTS.as_bytes()).expect("projects");
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[1].id, RecordId::Int(2));

    let topics = DimensionKey::from("topics");
    assert_eq!(projects[0].categories(&topics).len(), 2);
    assert_eq!(projects[1].categories(&topics).len(), 1);
    assert_eq!(
        projects[1].categories(&DimensionKey::from("years"))[0].id,
        RecordId::Int(2021)
    );
    assert!(projects[1]
        .categories(&DimensionKey::from("services"))
        .is_empty());
}

#[test]
fn decodes_category_list() {
    let categories = decode_categories(
        br#"[{"id": 2019, "title": "2019"}, {"id": 2021, "title": "2021"}]"#,
    )
    .expect("categories");
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[1].title, "2021");
}

#[test]
fn reports_which_document_failed() {
    let err = decode_categories(b"{\"id\": 1}").expect_err("object is not a list");
    assert_eq!(err.kind, DocumentKind::Categories);
    assert!(err.to_string().starts_with("malformed category list"));

    let err = decode_projects(b"not json").expect_err("garbage");
    assert_eq!(err.kind, DocumentKind::Projects);
}
