//! Import resolver
//!
//! Walks the import graph of a root assembly, loading every referenced
//! artifact through an [`ArtifactLoader`], and produces a [`SymbolTable`].
//!
//! The walk uses an explicit work stack rather than recursion. Each node is
//! either in progress (on the stack) or done; re-entering an in-progress
//! node is a cycle and is reported with the exact path from that node back
//! to itself. Completed nodes are memoized by [`ArtifactKey`], so diamond
//! shaped graphs hold each artifact exactly once.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::entities::{Artifact, ComponentLibrary, Import, PromptAssembly};
use crate::domain::ports::ArtifactLoader;
use crate::domain::value_objects::{ArtifactKey, Locator};
use crate::error::{PalError, PalResult};

/// Every artifact reachable from one root assembly, plus alias scopes.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    root: ArtifactKey,
    artifacts: IndexMap<ArtifactKey, Artifact>,
    scopes: HashMap<ArtifactKey, IndexMap<String, ArtifactKey>>,
}

impl SymbolTable {
    /// Table for an assembly with no imports.
    pub fn empty(root: ArtifactKey) -> Self {
        let mut scopes = HashMap::new();
        scopes.insert(root.clone(), IndexMap::new());
        Self {
            root,
            artifacts: IndexMap::new(),
            scopes,
        }
    }

    pub fn root(&self) -> &ArtifactKey {
        &self.root
    }

    /// Artifact bound to `alias` in the root assembly.
    pub fn get(&self, alias: &str) -> Option<&Artifact> {
        self.get_in(&self.root, alias)
    }

    /// Artifact bound to `alias` in the scope of assembly `owner`.
    pub fn get_in(&self, owner: &ArtifactKey, alias: &str) -> Option<&Artifact> {
        let key = self.scopes.get(owner)?.get(alias)?;
        self.artifacts.get(key)
    }

    /// Library bound to `alias` in the root assembly.
    pub fn library(&self, alias: &str) -> Option<&ComponentLibrary> {
        self.get(alias).and_then(Artifact::as_library)
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    /// Root aliases in declaration order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.scopes
            .get(&self.root)
            .into_iter()
            .flat_map(|scope| scope.iter())
            .filter_map(|(alias, key)| Some((alias.as_str(), self.artifacts.get(key)?)))
    }

    pub fn artifact(&self, key: &ArtifactKey) -> Option<&Artifact> {
        self.artifacts.get(key)
    }

    /// Unique imported artifacts in completion order (dependencies first).
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    /// Number of unique imported artifacts. The root is not counted.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Resolves import graphs through a loader.
pub struct Resolver<'a> {
    loader: &'a dyn ArtifactLoader,
}

impl<'a> Resolver<'a> {
    pub fn new(loader: &'a dyn ArtifactLoader) -> Self {
        Self { loader }
    }

    /// Resolve, suspending on every load.
    pub async fn resolve(&self, assembly: &PromptAssembly) -> PalResult<SymbolTable> {
        let mut walk = Walk::start(assembly)?;
        while let Some(pending) = walk.next_pending()? {
            let artifact = self
                .loader
                .load(&pending.locator)
                .await
                .map_err(|e| pending.failure(e))?;
            walk.provide(pending, artifact)?;
        }
        Ok(walk.finish())
    }

    /// Resolve on the current thread.
    pub fn resolve_blocking(&self, assembly: &PromptAssembly) -> PalResult<SymbolTable> {
        let mut walk = Walk::start(assembly)?;
        while let Some(pending) = walk.next_pending()? {
            let artifact = self
                .loader
                .load_blocking(&pending.locator)
                .map_err(|e| pending.failure(e))?;
            walk.provide(pending, artifact)?;
        }
        Ok(walk.finish())
    }
}

/// Resolve `assembly` with `loader`.
pub async fn resolve(
    assembly: &PromptAssembly,
    loader: &dyn ArtifactLoader,
) -> PalResult<SymbolTable> {
    Resolver::new(loader).resolve(assembly).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    InProgress,
    Done,
}

struct Frame {
    key: ArtifactKey,
    artifact: Artifact,
    next_import: usize,
}

/// An import that needs a load before the walk can continue.
struct Pending {
    importer: ArtifactKey,
    alias: String,
    locator: Locator,
}

impl Pending {
    fn failure(&self, cause: PalError) -> PalError {
        PalError::Resolve {
            importer: self.importer.id().to_string(),
            alias: self.alias.clone(),
            locator: self.locator.to_string(),
            message: cause.to_string(),
        }
    }
}

/// Resolution state machine. Loads happen outside so the same walk drives
/// both the async and the blocking resolver.
struct Walk {
    root: ArtifactKey,
    stack: Vec<Frame>,
    states: HashMap<ArtifactKey, NodeState>,
    by_locator: HashMap<Locator, Artifact>,
    artifacts: IndexMap<ArtifactKey, Artifact>,
    scopes: HashMap<ArtifactKey, IndexMap<String, ArtifactKey>>,
}

impl Walk {
    fn start(assembly: &PromptAssembly) -> PalResult<Self> {
        let root = assembly.key();
        let mut walk = Self {
            root: root.clone(),
            stack: Vec::new(),
            states: HashMap::new(),
            by_locator: HashMap::new(),
            artifacts: IndexMap::new(),
            scopes: HashMap::new(),
        };
        walk.enter(root, Artifact::from(assembly.clone()))?;
        Ok(walk)
    }

    fn enter(&mut self, key: ArtifactKey, artifact: Artifact) -> PalResult<()> {
        check_unique_aliases(key.id(), artifact.imports())?;
        self.states.insert(key.clone(), NodeState::InProgress);
        self.scopes.entry(key.clone()).or_default();
        self.stack.push(Frame {
            key,
            artifact,
            next_import: 0,
        });
        Ok(())
    }

    /// Advance until a load is required. `None` once the graph is complete.
    fn next_pending(&mut self) -> PalResult<Option<Pending>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            let Some(import) = frame.artifact.imports().get(frame.next_import).cloned() else {
                self.complete_top();
                continue;
            };
            frame.next_import += 1;

            let locator = match frame.artifact.source() {
                Some(base) => base.join(&import.locator),
                None => Locator::parse(&import.locator),
            };
            let pending = Pending {
                importer: frame.key.clone(),
                alias: import.alias,
                locator,
            };

            match self.by_locator.get(&pending.locator).cloned() {
                Some(artifact) => self.provide(pending, artifact)?,
                None => return Ok(Some(pending)),
            }
        }
    }

    fn provide(&mut self, pending: Pending, artifact: Artifact) -> PalResult<()> {
        if !self.by_locator.contains_key(&pending.locator) {
            debug!(alias = %pending.alias, locator = %pending.locator, "Loaded import");
            self.by_locator
                .insert(pending.locator.clone(), artifact.clone());
        }

        let key = artifact.key();
        self.scopes
            .entry(pending.importer.clone())
            .or_default()
            .insert(pending.alias.clone(), key.clone());

        match self.states.get(&key) {
            Some(NodeState::InProgress) => Err(PalError::CircularDependency {
                cycle: self.cycle_through(&key),
            }),
            Some(NodeState::Done) => Ok(()),
            None => self.enter(key, artifact),
        }
    }

    fn complete_top(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.states.insert(frame.key.clone(), NodeState::Done);
            if frame.key != self.root {
                self.artifacts.insert(frame.key, frame.artifact);
            }
        }
    }

    /// Ids from the re-entered node down the stack and back to it.
    fn cycle_through(&self, key: &ArtifactKey) -> Vec<String> {
        let start = self
            .stack
            .iter()
            .position(|frame| &frame.key == key)
            .unwrap_or(0);
        self.stack[start..]
            .iter()
            .map(|frame| frame.key.id().to_string())
            .chain(std::iter::once(key.id().to_string()))
            .collect()
    }

    fn finish(self) -> SymbolTable {
        SymbolTable {
            root: self.root,
            artifacts: self.artifacts,
            scopes: self.scopes,
        }
    }
}

fn check_unique_aliases(importer: &str, imports: &[Import]) -> PalResult<()> {
    let mut seen = HashSet::new();
    for import in imports {
        if !seen.insert(import.alias.as_str()) {
            return Err(PalError::Resolve {
                importer: importer.to_string(),
                alias: import.alias.clone(),
                locator: import.locator.clone(),
                message: format!("alias '{}' is declared more than once", import.alias),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
