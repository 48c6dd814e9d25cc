use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
    time::Duration,
};

use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::domain::DimensionKey;
use thiserror::Error;
use url::Url;

use crate::{
    builder::CategoryOrder,
    presenter::MultiMatchDisplay,
    selector::{ExclusionPolicy, UpdateTrigger},
};

pub const SETTINGS_FILE: &str = "board.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionDescriptor {
    pub key: DimensionKey,
    pub resource: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub order: CategoryOrder,
}

impl DimensionDescriptor {
    fn new(key: &str, resource: &str, label: Option<&str>, order: CategoryOrder) -> Self {
        Self {
            key: DimensionKey::from(key),
            resource: resource.into(),
            label: label.map(str::to_string),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub base_url: String,
    pub projects_resource: String,
    pub dimensions: Vec<DimensionDescriptor>,
    pub labels: BTreeMap<String, String>,
    pub default_rows: DimensionKey,
    pub default_columns: DimensionKey,
    pub exclusion: ExclusionPolicy,
    pub trigger: UpdateTrigger,
    pub multi_match: MultiMatchDisplay,
    pub min_loading_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/data/".into(),
            projects_resource: "projects.json".into(),
            dimensions: vec![
                DimensionDescriptor::new(
                    "years",
                    "years.json",
                    None,
                    CategoryOrder::DescendingNumericTitle,
                ),
                DimensionDescriptor::new("topics", "topics.json", Some("temas"), CategoryOrder::Source),
                DimensionDescriptor::new(
                    "services",
                    "services.json",
                    Some("servicios"),
                    CategoryOrder::Source,
                ),
                DimensionDescriptor::new(
                    "customers",
                    "customers.json",
                    Some("clientes"),
                    CategoryOrder::Source,
                ),
            ],
            labels: BTreeMap::from([
                ("title".to_string(), "titulo".to_string()),
                ("decalogue".to_string(), "decalogo".to_string()),
            ]),
            default_rows: DimensionKey::from("years"),
            default_columns: DimensionKey::from("topics"),
            exclusion: ExclusionPolicy::default(),
            trigger: UpdateTrigger::default(),
            multi_match: MultiMatchDisplay::default(),
            min_loading_ms: 0,
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base url `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("at least two dimensions must be configured, found {0}")]
    TooFewDimensions(usize),
    #[error("dimension key must not be empty")]
    EmptyKey,
    #[error("dimension `{0}` is configured more than once")]
    DuplicateDimension(DimensionKey),
    #[error("resource `{resource}` is invalid: {reason}")]
    InvalidResource {
        resource: String,
        reason: &'static str,
    },
    #[error("default {axis} dimension `{key}` is not configured")]
    UnknownDefault { axis: &'static str, key: DimensionKey },
    #[error("default rows and columns both use dimension `{0}`")]
    SameDefaultAxes(DimensionKey),
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// One validated dimension: where its categories live and how they are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionEntry {
    pub key: DimensionKey,
    pub resource: String,
    pub url: Url,
    pub label: String,
    pub order: CategoryOrder,
}

/// Validated dimension key → resource map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionCatalog {
    base_url: Url,
    projects_resource: String,
    projects_url: Url,
    dimensions: Vec<DimensionEntry>,
    labels: BTreeMap<String, String>,
}

impl DimensionCatalog {
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn projects_resource(&self) -> &str {
        &self.projects_resource
    }

    pub fn projects_url(&self) -> &Url {
        &self.projects_url
    }

    pub fn entries(&self) -> &[DimensionEntry] {
        &self.dimensions
    }

    pub fn keys(&self) -> Vec<DimensionKey> {
        self.dimensions.iter().map(|entry| entry.key.clone()).collect()
    }

    pub fn entry(&self, key: &DimensionKey) -> Option<&DimensionEntry> {
        self.dimensions.iter().find(|entry| &entry.key == key)
    }

    pub fn order(&self, key: &DimensionKey) -> CategoryOrder {
        self.entry(key).map(|entry| entry.order).unwrap_or_default()
    }

    pub fn label<'a>(&'a self, key: &'a DimensionKey) -> &'a str {
        self.entry(key)
            .map(|entry| entry.label.as_str())
            .unwrap_or_else(|| key.as_str())
    }

    /// Display label for a project attribute name, uppercased the way the
    /// project list shows it.
    pub fn attribute_label(&self, name: &str) -> String {
        let label = match self.entry(&DimensionKey::from(name)) {
            Some(entry) => entry.label.as_str(),
            None => self.labels.get(name).map(String::as_str).unwrap_or(name),
        };
        label.to_uppercase()
    }
}

impl BoardSettings {
    pub fn min_loading(&self) -> Duration {
        Duration::from_millis(self.min_loading_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<DimensionCatalog, ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let base_url = normalize_base_url(&self.base_url)?;

        if self.dimensions.len() < 2 {
            return Err(ConfigError::TooFewDimensions(self.dimensions.len()));
        }

        validate_resource(&self.projects_resource)?;
        let projects_url = join_resource(&base_url, &self.projects_resource)?;

        let mut seen = HashSet::new();
        let mut dimensions = Vec::with_capacity(self.dimensions.len());
        for descriptor in &self.dimensions {
            if descriptor.key.as_str().trim().is_empty() {
                return Err(ConfigError::EmptyKey);
            }
            if !seen.insert(descriptor.key.clone()) {
                return Err(ConfigError::DuplicateDimension(descriptor.key.clone()));
            }
            validate_resource(&descriptor.resource)?;

            dimensions.push(DimensionEntry {
                key: descriptor.key.clone(),
                resource: descriptor.resource.clone(),
                url: join_resource(&base_url, &descriptor.resource)?,
                label: descriptor
                    .label
                    .clone()
                    .unwrap_or_else(|| descriptor.key.to_string()),
                order: descriptor.order,
            });
        }

        for (axis, key) in [("row", &self.default_rows), ("column", &self.default_columns)] {
            if !seen.contains(key) {
                return Err(ConfigError::UnknownDefault {
                    axis,
                    key: key.clone(),
                });
            }
        }
        if self.default_rows == self.default_columns {
            return Err(ConfigError::SameDefaultAxes(self.default_rows.clone()));
        }

        Ok(DimensionCatalog {
            base_url,
            projects_resource: self.projects_resource.clone(),
            projects_url,
            dimensions,
            labels: self.labels.clone(),
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn validate_resource(resource: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidResource {
        resource: resource.to_string(),
        reason,
    };

    if resource.trim().is_empty() {
        return Err(invalid("empty"));
    }
    if resource.starts_with('/') || resource.contains("://") {
        return Err(invalid("must be relative to the base url"));
    }
    if resource.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(invalid("must not leave the base url"));
    }
    Ok(())
}

fn join_resource(base_url: &Url, resource: &str) -> Result<Url, ConfigError> {
    base_url
        .join(resource)
        .map_err(|_| ConfigError::InvalidResource {
            resource: resource.to_string(),
            reason: "cannot be joined onto the base url",
        })
}

pub fn load_settings() -> anyhow::Result<BoardSettings> {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then the settings file if it exists, then `APP__*` overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<BoardSettings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str::<BoardSettings>(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BoardSettings::default(),
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("failed to read settings file '{}'", path.display())))
        }
    };

    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__PROJECTS_RESOURCE") {
        settings.projects_resource = v;
    }
    if let Some(v) = env("APP__DEFAULT_ROWS") {
        settings.default_rows = DimensionKey::new(v);
    }
    if let Some(v) = env("APP__DEFAULT_COLUMNS") {
        settings.default_columns = DimensionKey::new(v);
    }
    if let Some(v) = env("APP__MIN_LOADING_MS") {
        settings.min_loading_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__MIN_LOADING_MS must be an integer, got '{v}'"))?;
    }
    if let Some(v) = env("APP__TRIGGER") {
        settings.trigger = parse_mode("APP__TRIGGER", &v)?;
    }
    if let Some(v) = env("APP__EXCLUSION") {
        settings.exclusion = parse_mode("APP__EXCLUSION", &v)?;
    }
    if let Some(v) = env("APP__MULTI_MATCH") {
        settings.multi_match = parse_mode("APP__MULTI_MATCH", &v)?;
    }

    Ok(settings)
}

fn parse_mode<T: DeserializeOwned>(name: &str, raw: &str) -> anyhow::Result<T> {
    let value = serde_json::Value::String(raw.trim().to_ascii_lowercase());
    serde_json::from_value(value).with_context(|| format!("unsupported value '{raw}' for {name}"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
