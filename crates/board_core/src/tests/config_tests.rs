use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_dir(prefix: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("{prefix}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn default_settings_validate_into_catalog() {
    let catalog = BoardSettings::default().validate().expect("defaults are valid");

    assert_eq!(
        catalog.keys(),
        vec![
            DimensionKey::from("years"),
            DimensionKey::from("topics"),
            DimensionKey::from("services"),
            DimensionKey::from("customers"),
        ]
    );
    assert_eq!(
        catalog.order(&"years".into()),
        CategoryOrder::DescendingNumericTitle
    );
    assert_eq!(catalog.order(&"topics".into()), CategoryOrder::Source);
    assert_eq!(
        catalog.entry(&"topics".into()).expect("topics").url.as_str(),
        "http://127.0.0.1:8080/data/topics.json"
    );
    assert_eq!(
        catalog.projects_url().as_str(),
        "http://127.0.0.1:8080/data/projects.json"
    );
}

#[test]
fn labels_fall_back_to_attribute_names() {
    let catalog = BoardSettings::default().validate().expect("catalog");

    assert_eq!(catalog.label(&"topics".into()), "temas");
    assert_eq!(catalog.label(&"years".into()), "years");
    assert_eq!(catalog.attribute_label("services"), "SERVICIOS");
    assert_eq!(catalog.attribute_label("title"), "TITULO");
    assert_eq!(catalog.attribute_label("budget"), "BUDGET");
}

#[test]
fn base_url_without_trailing_slash_is_treated_as_directory() {
    let settings = BoardSettings {
        base_url: "https://example.org/board/data".into(),
        ..BoardSettings::default()
    };
    let catalog = settings.validate().expect("catalog");
    assert_eq!(
        catalog.entry(&"years".into()).expect("years").url.as_str(),
        "https://example.org/board/data/years.json"
    );
}

#[test]
fn rejects_invalid_catalogs() {
    let mut settings = BoardSettings::default();
    settings.dimensions.truncate(1);
    settings.default_columns = "years".into();
    assert_eq!(settings.validate(), Err(ConfigError::TooFewDimensions(1)));

    let mut settings = BoardSettings::default();
    settings.dimensions[1].key = "years".into();
    assert_eq!(
        settings.validate(),
        Err(ConfigError::DuplicateDimension("years".into()))
    );

    let mut settings = BoardSettings::default();
    settings.dimensions[2].resource = "../secrets.json".into();
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidResource { .. })
    ));

    let mut settings = BoardSettings::default();
    settings.projects_resource = "/etc/projects.json".into();
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidResource { .. })
    ));

    let settings = BoardSettings {
        default_columns: "regions".into(),
        ..BoardSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::UnknownDefault { axis: "column", .. })
    ));

    let settings = BoardSettings {
        default_columns: "years".into(),
        ..BoardSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(ConfigError::SameDefaultAxes("years".into()))
    );

    let settings = BoardSettings {
        base_url: "not a url".into(),
        ..BoardSettings::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(ConfigError::InvalidBaseUrl { .. })
    ));
}

#[test]
fn missing_settings_file_yields_defaults() {
    let dir = temp_dir("board_settings_missing");
    let settings = load_settings_from(&dir.join("board.toml"), no_env).expect("settings");
    assert_eq!(settings, BoardSettings::default());
    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn settings_file_then_env_overrides() {
    let dir = temp_dir("board_settings_file");
    let path = dir.join("board.toml");
    fs::write(
        &path,
        r#"
base_url = "http://data.local/"
default_rows = "regions"
default_columns = "topics"
trigger = "confirm"
multi_match = "first_match"

[[dimensions]]
key = "regions"
resource = "regions.json"
label = "regiones"

[[dimensions]]
key = "topics"
resource = "topics.json"

[[dimensions]]
key = "years"
resource = "timeline/years.json"
order = "descending_numeric_title"
"#,
    )
    .expect("write settings");

    let env_vars = HashMap::from([
        ("APP__MIN_LOADING_MS", "500"),
        ("APP__EXCLUSION", "Passive"),
    ]);
    let settings = load_settings_from(&path, |name| env_vars.get(name).map(|v| v.to_string()))
        .expect("settings");

    assert_eq!(settings.base_url, "http://data.local/");
    assert_eq!(settings.trigger, UpdateTrigger::Confirm);
    assert_eq!(settings.multi_match, MultiMatchDisplay::FirstMatch);
    assert_eq!(settings.exclusion, ExclusionPolicy::Passive);
    assert_eq!(settings.min_loading(), Duration::from_millis(500));
    assert_eq!(settings.projects_resource, "projects.json");

    let catalog = settings.validate().expect("catalog");
    assert_eq!(catalog.label(&"regions".into()), "regiones");
    assert_eq!(
        catalog.entry(&"years".into()).expect("years").url.as_str(),
        "http://data.local/timeline/years.json"
    );

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn malformed_overrides_are_reported() {
    let dir = temp_dir("board_settings_env");
    let path = dir.join("board.toml");

    let err = load_settings_from(&path, |name| {
        (name == "APP__TRIGGER").then(|| "sometimes".to_string())
    })
    .expect_err("unknown trigger");
    assert!(err.to_string().contains("APP__TRIGGER"));

    fs::write(&path, "min_loading_ms = \"slow\"").expect("write settings");
    let err = load_settings_from(&path, no_env).expect_err("bad toml");
    assert!(err.to_string().contains("failed to parse settings file"));

    fs::remove_dir_all(dir).expect("cleanup");
}
