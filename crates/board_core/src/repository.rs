use std::{collections::HashMap, fs, path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{CategoryRef, DimensionKey, Project},
    protocol::{decode_categories, decode_projects},
};
use tracing::debug;
use url::Url;

use crate::{config::DimensionCatalog, error::FetchError};

/// Read-only source of the project collection and of each dimension's
/// category list.
#[async_trait]
pub trait DimensionRepository: Send + Sync {
    async fn fetch_projects(&self) -> Result<Vec<Project>, FetchError>;
    async fn fetch_dimension(&self, key: &DimensionKey) -> Result<Vec<CategoryRef>, FetchError>;
}

pub struct MissingDimensionRepository;

#[async_trait]
impl DimensionRepository for MissingDimensionRepository {
    async fn fetch_projects(&self) -> Result<Vec<Project>, FetchError> {
        Err(FetchError::Unavailable("no project source configured".into()))
    }

    async fn fetch_dimension(&self, key: &DimensionKey) -> Result<Vec<CategoryRef>, FetchError> {
        Err(FetchError::Unavailable(format!(
            "no source configured for dimension `{key}`"
        )))
    }
}

/// Fetches JSON documents over HTTP, one resource per dimension as named by
/// the catalog.
pub struct HttpDimensionRepository {
    http: Client,
    catalog: Arc<DimensionCatalog>,
}

impl HttpDimensionRepository {
    pub fn new(catalog: Arc<DimensionCatalog>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                resource: catalog.base_url().to_string(),
                source,
            })?;
        Ok(Self { http, catalog })
    }

    pub fn catalog(&self) -> &Arc<DimensionCatalog> {
        &self.catalog
    }

    async fn get_document(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let resource = url.to_string();
        debug!(%resource, "fetching board document");

        let transport = |source: reqwest::Error| FetchError::Transport {
            resource: resource.clone(),
            source,
        };
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: resource.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl DimensionRepository for HttpDimensionRepository {
    async fn fetch_projects(&self) -> Result<Vec<Project>, FetchError> {
        let url = self.catalog.projects_url();
        let body = self.get_document(url).await?;
        decode_projects(&body).map_err(|source| FetchError::Decode {
            resource: url.to_string(),
            source,
        })
    }

    async fn fetch_dimension(&self, key: &DimensionKey) -> Result<Vec<CategoryRef>, FetchError> {
        let entry = self
            .catalog
            .entry(key)
            .ok_or_else(|| FetchError::UnknownDimension(key.clone()))?;
        let body = self.get_document(&entry.url).await?;
        decode_categories(&body).map_err(|source| FetchError::Decode {
            resource: entry.url.to_string(),
            source,
        })
    }
}

/// In-memory dataset. Every fetch hands out a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct StaticDimensionRepository {
    projects: Vec<Project>,
    dimensions: HashMap<DimensionKey, Vec<CategoryRef>>,
}

impl StaticDimensionRepository {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            dimensions: HashMap::new(),
        }
    }

    pub fn with_dimension(
        mut self,
        key: impl Into<DimensionKey>,
        categories: Vec<CategoryRef>,
    ) -> Self {
        self.dimensions.insert(key.into(), categories);
        self
    }

    /// Loads every document the catalog names from `dir`, using each resource
    /// name as a path relative to it.
    pub fn load_dir(dir: &Path, catalog: &DimensionCatalog) -> anyhow::Result<Self> {
        let read = |resource: &str| {
            let path = dir.join(resource);
            fs::read(&path).with_context(|| format!("failed to read '{}'", path.display()))
        };

        let projects = decode_projects(&read(catalog.projects_resource())?)
            .with_context(|| format!("failed to decode '{}'", catalog.projects_resource()))?;

        let mut repository = Self::new(projects);
        for entry in catalog.entries() {
            let categories = decode_categories(&read(&entry.resource)?)
                .with_context(|| format!("failed to decode '{}'", entry.resource))?;
            repository.dimensions.insert(entry.key.clone(), categories);
        }
        Ok(repository)
    }
}

#[async_trait]
impl DimensionRepository for StaticDimensionRepository {
    async fn fetch_projects(&self) -> Result<Vec<Project>, FetchError> {
        Ok(self.projects.clone())
    }

    async fn fetch_dimension(&self, key: &DimensionKey) -> Result<Vec<CategoryRef>, FetchError> {
        self.dimensions
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::UnknownDimension(key.clone()))
    }
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
