//! File system and remote artifact loader

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::schema::{parse_assembly, parse_library};
use crate::domain::entities::{Artifact, ComponentLibrary, PromptAssembly};
use crate::domain::ports::ArtifactLoader;
use crate::domain::value_objects::{ArtifactKind, Locator};
use crate::error::{PalError, PalResult};

/// Why a document's bytes could not be obtained.
#[derive(Debug, thiserror::Error)]
pub enum LoadFailure {
    #[error("file not found")]
    NotFound,

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("HTTP {status} fetching {url}")]
    Http { url: String, status: u16 },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("remote locators can only be loaded asynchronously")]
    RemoteBlocking,
}

impl LoadFailure {
    fn from_io(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            LoadFailure::NotFound
        } else {
            LoadFailure::Io(err)
        }
    }

    fn at(self, locator: &Locator) -> PalError {
        PalError::Load {
            path: locator.display_path(),
            message: self.to_string(),
        }
    }
}

/// Loads `*.pal` / `*.pal.lib` documents from disk, or over HTTP(S) in the
/// async form.
#[derive(Debug, Clone)]
pub struct FsLoader {
    http: reqwest::Client,
}

impl Default for FsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FsLoader {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pal/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn load_assembly(&self, path: impl AsRef<Path>) -> PalResult<PromptAssembly> {
        let locator = Locator::from(path.as_ref());
        let content = read_blocking(&locator).map_err(|e| e.at(&locator))?;
        assembly_from(&locator, &content)
    }

    pub fn load_library(&self, path: impl AsRef<Path>) -> PalResult<ComponentLibrary> {
        let locator = Locator::from(path.as_ref());
        let content = read_blocking(&locator).map_err(|e| e.at(&locator))?;
        library_from(&locator, &content)
    }

    pub async fn load_assembly_async(&self, path: impl AsRef<Path>) -> PalResult<PromptAssembly> {
        let locator = Locator::from(path.as_ref());
        let content = self.read(&locator).await.map_err(|e| e.at(&locator))?;
        assembly_from(&locator, &content)
    }

    pub async fn load_library_async(&self, path: impl AsRef<Path>) -> PalResult<ComponentLibrary> {
        let locator = Locator::from(path.as_ref());
        let content = self.read(&locator).await.map_err(|e| e.at(&locator))?;
        library_from(&locator, &content)
    }

    async fn read(&self, locator: &Locator) -> Result<String, LoadFailure> {
        match locator {
            Locator::Path(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(LoadFailure::from_io),
            Locator::Url(url) => {
                debug!(url = %url, "Fetching remote artifact");
                let response = self.http.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadFailure::Http {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.text().await?)
            }
        }
    }
}

#[async_trait]
impl ArtifactLoader for FsLoader {
    async fn load(&self, locator: &Locator) -> PalResult<Artifact> {
        let content = self.read(locator).await.map_err(|e| e.at(locator))?;
        artifact_from(locator, &content)
    }

    fn load_blocking(&self, locator: &Locator) -> PalResult<Artifact> {
        let content = read_blocking(locator).map_err(|e| e.at(locator))?;
        artifact_from(locator, &content)
    }
}

fn read_blocking(locator: &Locator) -> Result<String, LoadFailure> {
    match locator {
        Locator::Path(path) => std::fs::read_to_string(path).map_err(LoadFailure::from_io),
        Locator::Url(_) => Err(LoadFailure::RemoteBlocking),
    }
}

fn artifact_from(locator: &Locator, content: &str) -> PalResult<Artifact> {
    Ok(match locator.kind() {
        ArtifactKind::Assembly => Artifact::from(assembly_from(locator, content)?),
        ArtifactKind::Library => Artifact::from(library_from(locator, content)?),
    })
}

fn assembly_from(locator: &Locator, content: &str) -> PalResult<PromptAssembly> {
    let assembly = parse_assembly(content, &locator.display_path())?;
    debug!(id = %assembly.id, version = %assembly.version, source = %locator, "Loaded assembly");
    Ok(assembly.with_source(locator.clone()))
}

fn library_from(locator: &Locator, content: &str) -> PalResult<ComponentLibrary> {
    let library = parse_library(content, &locator.display_path())?;
    debug!(id = %library.library_id, version = %library.version, source = %locator, "Loaded library");
    Ok(library.with_source(locator.clone()))
}
