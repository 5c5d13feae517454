//! Artifact locators
//!
//! An import declares where an artifact lives: a filesystem path (relative
//! to the importing file) or an `http(s)://` URL. The locator also decides
//! which document kind is expected: `*.pal.lib` is a component library,
//! anything else is a prompt assembly.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File suffix of component libraries.
pub const LIBRARY_SUFFIX: &str = ".pal.lib";

/// File suffix of prompt assemblies.
pub const ASSEMBLY_SUFFIX: &str = ".pal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Assembly,
    Library,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Assembly => "assembly",
            ArtifactKind::Library => "library",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Path(PathBuf),
    Url(String),
}

impl Locator {
    /// Parse a raw import target.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_url(trimmed) {
            Locator::Url(trimmed.to_string())
        } else {
            Locator::Path(PathBuf::from(trimmed))
        }
    }

    /// Resolve an import target declared by the artifact at `self`.
    ///
    /// Absolute paths and URLs are returned unchanged. Relative paths are
    /// joined onto the importer's directory (or URL base).
    pub fn join(&self, raw: &str) -> Locator {
        let target = Locator::parse(raw);
        match (self, target) {
            (_, Locator::Url(url)) => Locator::Url(url),
            (_, Locator::Path(p)) if p.is_absolute() => Locator::Path(normalize(&p)),
            (Locator::Path(base), Locator::Path(rel)) => {
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Locator::Path(normalize(&dir.join(rel)))
            }
            (Locator::Url(base), Locator::Path(rel)) => {
                let dir = match base.rfind('/') {
                    Some(idx) if idx > base.find("://").map_or(0, |i| i + 2) => &base[..=idx],
                    _ => base.as_str(),
                };
                let rel = rel.to_string_lossy().replace('\\', "/");
                let rel = rel.trim_start_matches("./");
                Locator::Url(format!("{}{}", dir, rel))
            }
        }
    }

    /// Document kind expected at this locator.
    pub fn kind(&self) -> ArtifactKind {
        let name = match self {
            Locator::Path(p) => p.to_string_lossy().into_owned(),
            Locator::Url(u) => u.split(['?', '#']).next().unwrap_or(u).to_string(),
        };
        if name.ends_with(LIBRARY_SUFFIX) {
            ArtifactKind::Library
        } else {
            ArtifactKind::Assembly
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Url(_))
    }

    /// Path used in error reports.
    pub fn display_path(&self) -> PathBuf {
        match self {
            Locator::Path(p) => p.clone(),
            Locator::Url(u) => PathBuf::from(u),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Path(p) => write!(f, "{}", p.display()),
            Locator::Url(u) => f.write_str(u),
        }
    }
}

impl From<&Path> for Locator {
    fn from(path: &Path) -> Self {
        Locator::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Locator {
    fn from(path: PathBuf) -> Self {
        Locator::Path(path)
    }
}

fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// Lexically collapse `.` and `..` so the same file imported through
/// different relative routes yields the same locator.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
