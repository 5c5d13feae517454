//! Tests for the import resolver

use super::*;
use crate::domain::entities::{Component, LibraryType};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory loader keyed by path, counting reads.
#[derive(Default)]
struct MemoryLoader {
    artifacts: HashMap<Locator, Artifact>,
    loads: AtomicUsize,
}

impl MemoryLoader {
    fn with(mut self, path: &str, artifact: impl Into<Artifact>) -> Self {
        let locator = Locator::Path(PathBuf::from(path));
        let artifact = match artifact.into() {
            Artifact::Assembly(a) => {
                Artifact::from((*a).clone().with_source(locator.clone()))
            }
            Artifact::Library(l) => Artifact::from((*l).clone().with_source(locator.clone())),
        };
        self.artifacts.insert(locator, artifact);
        self
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactLoader for MemoryLoader {
    async fn load(&self, locator: &Locator) -> PalResult<Artifact> {
        self.load_blocking(locator)
    }

    fn load_blocking(&self, locator: &Locator) -> PalResult<Artifact> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.artifacts
            .get(locator)
            .cloned()
            .ok_or_else(|| PalError::Load {
                path: locator.display_path(),
                message: "file not found".to_string(),
            })
    }
}

fn library(id: &str) -> ComponentLibrary {
    ComponentLibrary::new(id, "1.0.0", LibraryType::Task)
        .with_component(Component::new("greet", "Hello {{ name }}"))
}

fn root(id: &str) -> PromptAssembly {
    PromptAssembly::new(id, "1.0.0").with_source(Locator::Path(PathBuf::from("/p/root.pal")))
}

#[test]
fn resolve_without_imports_is_empty() {
    let loader = MemoryLoader::default();
    let table = Resolver::new(&loader).resolve_blocking(&root("a")).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.root(), &ArtifactKey::new("a", "1.0.0"));
    assert_eq!(loader.loads(), 0);
}

#[test]
fn resolve_binds_aliases_relative_to_importer() {
    let loader = MemoryLoader::default().with("/p/libs/common.pal.lib", library("common"));
    let assembly = root("a").with_import("lib", "libs/common.pal.lib");

    let table = Resolver::new(&loader).resolve_blocking(&assembly).unwrap();

    assert_eq!(table.len(), 1);
    let lib = table.library("lib").unwrap();
    assert_eq!(lib.library_id, "common");
    assert!(table.contains_alias("lib"));
    assert!(!table.contains_alias("other"));
}

#[test]
fn resolve_follows_transitive_imports() {
    let loader = MemoryLoader::default()
        .with(
            "/p/b.pal",
            PromptAssembly::new("b", "1.0.0").with_import("deep", "shared/deep.pal.lib"),
        )
        .with("/p/shared/deep.pal.lib", library("deep"));
    let assembly = root("a").with_import("b", "./b.pal");

    let table = Resolver::new(&loader).resolve_blocking(&assembly).unwrap();

    assert_eq!(table.len(), 2);
    let b_key = table.get("b").unwrap().key();
    assert_eq!(
        table.get_in(&b_key, "deep").unwrap().key(),
        ArtifactKey::new("deep", "1.0.0")
    );
    // Nested aliases are not visible from the root scope.
    assert!(table.get("deep").is_none());
    // Dependencies complete before their importers.
    let order: Vec<_> = table.artifacts().map(|a| a.key().id().to_string()).collect();
    assert_eq!(order, vec!["deep", "b"]);
}

#[test]
fn resolve_diamond_loads_each_artifact_once() {
    let loader = MemoryLoader::default()
        .with(
            "/p/left.pal",
            PromptAssembly::new("left", "1.0.0").with_import("s", "shared.pal.lib"),
        )
        .with(
            "/p/right.pal",
            PromptAssembly::new("right", "1.0.0").with_import("s", "shared.pal.lib"),
        )
        .with("/p/shared.pal.lib", library("shared"));
    let assembly = root("top")
        .with_import("l", "left.pal")
        .with_import("r", "right.pal")
        .with_import("direct", "shared.pal.lib");

    let table = Resolver::new(&loader).resolve_blocking(&assembly).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(loader.loads(), 3);
    assert_eq!(table.get("direct").unwrap().key().id(), "shared");
}

#[test]
fn resolve_reports_exact_cycle_path() {
    let loader = MemoryLoader::default()
        .with("/p/b.pal", PromptAssembly::new("B", "1.0.0").with_import("c", "c.pal"))
        .with("/p/c.pal", PromptAssembly::new("C", "1.0.0").with_import("b", "b.pal"));
    let assembly = root("A").with_import("b", "b.pal");

    let err = Resolver::new(&loader).resolve_blocking(&assembly).unwrap_err();

    match err {
        PalError::CircularDependency { cycle } => assert_eq!(cycle, vec!["B", "C", "B"]),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn resolve_detects_self_import() {
    let loader = MemoryLoader::default().with(
        "/p/root.pal",
        PromptAssembly::new("A", "1.0.0").with_import("me", "root.pal"),
    );
    let assembly = root("A").with_import("me", "root.pal");

    let err = Resolver::new(&loader).resolve_blocking(&assembly).unwrap_err();
    assert!(matches!(
        err,
        PalError::CircularDependency { ref cycle } if cycle == &vec!["A".to_string(), "A".to_string()]
    ));
}

#[test]
fn resolve_duplicate_alias_is_resolver_error() {
    let loader = MemoryLoader::default().with("/p/x.pal.lib", library("x"));
    let assembly = root("a")
        .with_import("lib", "x.pal.lib")
        .with_import("lib", "x.pal.lib");

    let err = Resolver::new(&loader).resolve_blocking(&assembly).unwrap_err();
    assert!(err.is_resolver_error());
    assert!(!matches!(err, PalError::CircularDependency { .. }));
    assert!(err.to_string().contains("declared more than once"));
}

#[test]
fn resolve_load_failure_carries_loader_message() {
    let loader = MemoryLoader::default();
    let assembly = root("a").with_import("gone", "missing.pal.lib");

    let err = Resolver::new(&loader).resolve_blocking(&assembly).unwrap_err();

    assert!(err.is_resolver_error());
    let ctx = err.context();
    assert_eq!(ctx["alias"], "gone");
    assert_eq!(ctx["locator"], "/p/missing.pal.lib");
    assert!(err.to_string().contains("file not found"));
}

#[tokio::test]
async fn resolve_async_matches_blocking() {
    let loader = MemoryLoader::default().with("/p/lib.pal.lib", library("lib"));
    let assembly = root("a").with_import("lib", "lib.pal.lib");

    let table = resolve(&assembly, &loader).await.unwrap();
    let blocking = Resolver::new(&loader).resolve_blocking(&assembly).unwrap();

    assert_eq!(table, blocking);
    assert_eq!(table.aliases().map(|(alias, _)| alias).collect::<Vec<_>>(), vec!["lib"]);
}
