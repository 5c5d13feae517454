//! Component library entity
//!
//! A library is a versioned, named collection of reusable templated text
//! components. Component names are unique within a library.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{ArtifactKey, Locator};

/// Library type tag. Decides how a whole library is composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryType {
    Persona,
    Task,
    Context,
    Rules,
    Examples,
    OutputSchema,
    Reasoning,
    Trait,
    Note,
}

impl LibraryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryType::Persona => "persona",
            LibraryType::Task => "task",
            LibraryType::Context => "context",
            LibraryType::Rules => "rules",
            LibraryType::Examples => "examples",
            LibraryType::OutputSchema => "output_schema",
            LibraryType::Reasoning => "reasoning",
            LibraryType::Trait => "trait",
            LibraryType::Note => "note",
        }
    }

    /// Separator placed between components when a library is composed whole.
    ///
    /// Rules and traits read as one list; everything else as paragraphs.
    pub fn separator(&self) -> &'static str {
        match self {
            LibraryType::Rules | LibraryType::Trait => "\n",
            _ => "\n\n",
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    pub name: String,
    pub description: String,
    pub content: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, Value>,
}

impl Component {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            content: content.into(),
            metadata: IndexMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentLibrary {
    pub pal_version: String,
    pub library_id: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "type")]
    pub library_type: LibraryType,
    pub components: Vec<Component>,
    #[serde(skip)]
    pub source: Option<Locator>,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl ComponentLibrary {
    pub fn new(
        library_id: impl Into<String>,
        version: impl Into<String>,
        library_type: LibraryType,
    ) -> Self {
        Self {
            pal_version: "1.0".to_string(),
            library_id: library_id.into(),
            version: version.into(),
            description: String::new(),
            library_type,
            components: Vec::new(),
            source: None,
            warnings: Vec::new(),
        }
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(&self.library_id, &self.version)
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_source(mut self, source: Locator) -> Self {
        self.source = Some(source);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_lookup_by_name() {
        let lib = ComponentLibrary::new("greetings", "1.0.0", LibraryType::Task)
            .with_component(Component::new("greet", "Hello {{name}}"))
            .with_component(Component::new("bye", "Bye"));

        assert_eq!(lib.component("greet").map(|c| c.content.as_str()), Some("Hello {{name}}"));
        assert!(lib.component("missing").is_none());
        assert_eq!(lib.component_names(), vec!["greet", "bye"]);
        assert_eq!(lib.key().to_string(), "greetings@1.0.0");
    }

    #[test]
    fn library_type_round_trips_snake_case() {
        let t: LibraryType = serde_yaml_ng::from_str("output_schema").unwrap();
        assert_eq!(t, LibraryType::OutputSchema);
        assert_eq!(t.to_string(), "output_schema");
    }

    #[test]
    fn rules_compose_as_lines() {
        assert_eq!(LibraryType::Rules.separator(), "\n");
        assert_eq!(LibraryType::Persona.separator(), "\n\n");
    }
}
