//! Loaded artifact
//!
//! The loader returns either document kind behind one type so the resolver
//! can treat every import uniformly as a graph node.

use std::sync::Arc;

use crate::domain::entities::{ComponentLibrary, Import, PromptAssembly};
use crate::domain::value_objects::{ArtifactKey, ArtifactKind, Locator};

#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Assembly(Arc<PromptAssembly>),
    Library(Arc<ComponentLibrary>),
}

impl Artifact {
    pub fn key(&self) -> ArtifactKey {
        match self {
            Artifact::Assembly(a) => a.key(),
            Artifact::Library(l) => l.key(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Assembly(_) => ArtifactKind::Assembly,
            Artifact::Library(_) => ArtifactKind::Library,
        }
    }

    /// Declared imports. Libraries never import.
    pub fn imports(&self) -> &[Import] {
        match self {
            Artifact::Assembly(a) => &a.imports,
            Artifact::Library(_) => &[],
        }
    }

    pub fn source(&self) -> Option<&Locator> {
        match self {
            Artifact::Assembly(a) => a.source.as_ref(),
            Artifact::Library(l) => l.source.as_ref(),
        }
    }

    pub fn as_assembly(&self) -> Option<&PromptAssembly> {
        match self {
            Artifact::Assembly(a) => Some(a),
            Artifact::Library(_) => None,
        }
    }

    pub fn as_library(&self) -> Option<&ComponentLibrary> {
        match self {
            Artifact::Library(l) => Some(l),
            Artifact::Assembly(_) => None,
        }
    }
}

impl From<PromptAssembly> for Artifact {
    fn from(assembly: PromptAssembly) -> Self {
        Artifact::Assembly(Arc::new(assembly))
    }
}

impl From<ComponentLibrary> for Artifact {
    fn from(library: ComponentLibrary) -> Self {
        Artifact::Library(Arc::new(library))
    }
}
