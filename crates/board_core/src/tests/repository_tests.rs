use super::*;
use crate::config::BoardSettings;
use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use shared::domain::RecordId;
use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;

fn bypass_proxy() {
    env::set_var("NO_PROXY", "127.0.0.1,localhost");
}

async fn spawn_data_server(app: Router) -> String {
    bypass_proxy();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/data/")
}

fn board_routes() -> Router {
    Router::new()
        .route(
            "/data/projects.json",
            get(|| async {
                Json(json!([
                    {
                        "id": 1,
                        "title": "Irrigation",
                        "years": {"id": 2020, "title": "2020"},
                        "topics": [{"id": 1, "title": "Water"}, {"id": 2, "title": "IoT"}]
                    }
                ]))
            }),
        )
        .route(
            "/data/years.json",
            get(|| async {
                Json(json!([
                    {"id": 2019, "title": "2019"},
                    {"id": 2021, "title": "2021"},
                    {"id": 2020, "title": "2020"}
                ]))
            }),
        )
        .route(
            "/data/topics.json",
            get(|| async { Json(json!([{"id": 1, "title": "Water"}, {"id": 2, "title": "IoT"}])) }),
        )
        .route(
            "/data/services.json",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route(
            "/data/customers.json",
            get(|| async { "<html>not json</html>" }),
        )
}

async fn repository(base_url: String) -> HttpDimensionRepository {
    let settings = BoardSettings {
        base_url,
        ..BoardSettings::default()
    };
    let catalog = Arc::new(settings.validate().expect("catalog"));
    HttpDimensionRepository::new(catalog, settings.request_timeout()).expect("client")
}

#[tokio::test]
async fn http_repository_fetches_projects_and_dimensions() {
    let repo = repository(spawn_data_server(board_routes()).await).await;

    let projects = repo.fetch_projects().await.expect("projects");
    assert_eq!(projects.len(), 1);
    assert_eq!(
        projects[0].categories(&DimensionKey::from("topics")).len(),
        2
    );

    let years = repo
        .fetch_dimension(&DimensionKey::from("years"))
        .await
        .expect("years");
    let ids: Vec<RecordId> = years.into_iter().map(|year| year.id).collect();
    assert_eq!(
        ids,
        vec![RecordId::Int(2019), RecordId::Int(2021), RecordId::Int(2020)]
    );
}

#[tokio::test]
async fn http_repository_classifies_failures() {
    let repo = repository(spawn_data_server(board_routes()).await).await;

    let err = repo
        .fetch_dimension(&DimensionKey::from("services"))
        .await
        .expect_err("server error");
    assert!(matches!(
        err,
        FetchError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
    ));

    let err = repo
        .fetch_dimension(&DimensionKey::from("customers"))
        .await
        .expect_err("html body");
    assert!(matches!(err, FetchError::Decode { .. }), "unexpected: {err}");

    let err = repo
        .fetch_dimension(&DimensionKey::from("regions"))
        .await
        .expect_err("not in catalog");
    assert!(matches!(err, FetchError::UnknownDimension(_)));
}

#[tokio::test]
async fn http_repository_reports_unreachable_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    bypass_proxy();

    let repo = repository(format!("http://{addr}/data/")).await;
    let err = repo.fetch_projects().await.expect_err("nothing listening");
    assert!(matches!(err, FetchError::Transport { .. }));
}

#[tokio::test]
async fn static_repository_serves_registered_dimensions() {
    let repo = StaticDimensionRepository::new(vec![Project::new(1, "A")])
        .with_dimension("topics", vec![CategoryRef::new(1, "Water")]);

    assert_eq!(repo.fetch_projects().await.expect("projects").len(), 1);
    assert_eq!(
        repo.fetch_dimension(&DimensionKey::from("topics"))
            .await
            .expect("topics"),
        vec![CategoryRef::new(1, "Water")]
    );
    assert!(matches!(
        repo.fetch_dimension(&DimensionKey::from("years")).await,
        Err(FetchError::UnknownDimension(_))
    ));
}

#[tokio::test]
async fn static_repository_loads_catalog_documents_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("board_static_repo_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");

    let catalog = BoardSettings::default().validate().expect("catalog");
    fs::write(
        dir.join("projects.json"),
        r#"[{"id": 1, "title": "A", "services": [{"id": "ux", "title": "UX"}]}]"#,
    )
    .expect("projects");
    for entry in catalog.entries() {
        fs::write(
            dir.join(&entry.resource),
            format!(r#"[{{"id": 1, "title": "{} one"}}]"#, entry.key),
        )
        .expect("dimension");
    }

    let repo = StaticDimensionRepository::load_dir(&dir, &catalog).expect("load");
    let services = repo
        .fetch_dimension(&DimensionKey::from("services"))
        .await
        .expect("services");
    assert_eq!(services[0].title, "services one");

    fs::remove_file(dir.join("years.json")).expect("remove years");
    let err = StaticDimensionRepository::load_dir(&dir, &catalog).expect_err("missing file");
    assert!(err.to_string().contains("years.json"));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[tokio::test]
async fn missing_repository_is_unavailable() {
    let repo = MissingDimensionRepository;
    assert!(matches!(
        repo.fetch_projects().await,
        Err(FetchError::Unavailable(_))
    ));
    assert!(matches!(
        repo.fetch_dimension(&DimensionKey::from("years")).await,
        Err(FetchError::Unavailable(_))
    ));
}
