use blindstore_core::{Catalog, CatalogError, CatalogLoader, StaticCatalogLoader, StorefrontEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileCatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Loads a catalog document from disk.
#[derive(Debug, Clone)]
pub struct FileCatalogLoader {
    path: PathBuf,
}

impl FileCatalogLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogLoader for FileCatalogLoader {
    type Error = FileCatalogError;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| FileCatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Catalog::from_json(&json)?)
    }
}

/// Load the embedded catalog, or a replacement document when a path is given.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<Arc<Catalog>> {
    match path {
        Some(path) => StorefrontEngine::new(FileCatalogLoader::new(path)).load_catalog(),
        None => StorefrontEngine::new(StaticCatalogLoader).load_catalog(),
    }
}
