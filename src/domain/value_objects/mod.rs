//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod artifact_key;
mod hash;
mod locator;

pub use artifact_key::ArtifactKey;
pub use hash::ContentHash;
pub use locator::{ArtifactKind, Locator, ASSEMBLY_SUFFIX, LIBRARY_SUFFIX};
