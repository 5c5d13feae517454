//! ArtifactLoader port
//!
//! Reads one artifact from a locator and returns it schema-validated. The
//! resolver depends only on this trait, so tests can plug in an in-memory
//! loader and callers can wrap a loader with their own cache.

use async_trait::async_trait;

use crate::domain::entities::Artifact;
use crate::domain::value_objects::Locator;
use crate::error::PalResult;

#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    /// Load without blocking the calling task.
    async fn load(&self, locator: &Locator) -> PalResult<Artifact>;

    /// Load on the calling thread.
    fn load_blocking(&self, locator: &Locator) -> PalResult<Artifact>;
}
