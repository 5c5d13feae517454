//! Prompt assembly entity
//!
//! An assembly is a versioned prompt definition: typed variables, imports
//! declared by alias and an ordered composition. Assemblies are built by the
//! loader from `*.pal` documents and are immutable afterwards.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{ArtifactKey, Locator};

/// Declared type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    #[serde(alias = "integer", alias = "float")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "array")]
    List,
    #[serde(alias = "dict")]
    Object,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::List => "list",
            VariableType::Object => "object",
        }
    }

    /// Whether a JSON value is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            VariableType::String => value.is_string(),
            VariableType::Number => value.is_number(),
            VariableType::Boolean => value.is_boolean(),
            VariableType::List => value.is_array(),
            VariableType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub description: String,
}

impl Variable {
    pub fn new(name: impl Into<String>, var_type: VariableType) -> Self {
        Self {
            name: name.into(),
            var_type,
            required: true,
            default: None,
            description: String::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One `alias: locator` pair of an assembly's imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub alias: String,
    pub locator: String,
}

impl Import {
    pub fn new(alias: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            locator: locator.into(),
        }
    }
}

/// A `alias.component` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    pub alias: String,
    pub component: String,
}

impl ComponentRef {
    pub fn new(alias: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            component: component.into(),
        }
    }

    /// Parse `alias.component`. Both halves must be non-empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (alias, component) = raw.trim().split_once('.')?;
        if alias.is_empty() || component.is_empty() || component.contains('.') {
            return None;
        }
        Some(Self::new(alias, component))
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.component)
    }
}

impl Serialize for ComponentRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Entry of an assembly's composition list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompositionEntry {
    /// Template text, rendered with the effective variables.
    Template(String),
    /// Text emitted verbatim, never rendered.
    Literal { literal: String },
    /// A single component of an imported library.
    Component {
        component: ComponentRef,
        #[serde(skip_serializing_if = "IndexMap::is_empty")]
        vars: IndexMap<String, Value>,
    },
    /// Every component of an imported library, in declared order.
    Library {
        library: String,
        #[serde(skip_serializing_if = "IndexMap::is_empty")]
        vars: IndexMap<String, Value>,
    },
}

impl CompositionEntry {
    pub fn template(text: impl Into<String>) -> Self {
        CompositionEntry::Template(text.into())
    }

    pub fn literal(text: impl Into<String>) -> Self {
        CompositionEntry::Literal {
            literal: text.into(),
        }
    }

    pub fn component(alias: &str, name: &str) -> Self {
        CompositionEntry::Component {
            component: ComponentRef::new(alias, name),
            vars: IndexMap::new(),
        }
    }

    pub fn library(alias: impl Into<String>) -> Self {
        CompositionEntry::Library {
            library: alias.into(),
            vars: IndexMap::new(),
        }
    }

    /// Attach per-entry variable overrides. No-op for text entries.
    pub fn with_var(mut self, name: impl Into<String>, value: Value) -> Self {
        match &mut self {
            CompositionEntry::Component { vars, .. } | CompositionEntry::Library { vars, .. } => {
                vars.insert(name.into(), value);
            }
            CompositionEntry::Template(_) | CompositionEntry::Literal { .. } => {}
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptAssembly {
    pub pal_version: String,
    pub id: String,
    pub version: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub variables: Vec<Variable>,
    pub imports: Vec<Import>,
    pub composition: Vec<CompositionEntry>,
    /// Where the assembly was loaded from; relative imports resolve against it.
    #[serde(skip)]
    pub source: Option<Locator>,
    /// Non-fatal findings collected while loading (e.g. ignored fields).
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl PromptAssembly {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            pal_version: "1.0".to_string(),
            id: id.into(),
            version: version.into(),
            description: String::new(),
            author: None,
            variables: Vec::new(),
            imports: Vec::new(),
            composition: Vec::new(),
            source: None,
            warnings: Vec::new(),
        }
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(&self.id, &self.version)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn import(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.alias == alias)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_import(mut self, alias: impl Into<String>, locator: impl Into<String>) -> Self {
        self.imports.push(Import::new(alias, locator));
        self
    }

    pub fn with_entry(mut self, entry: CompositionEntry) -> Self {
        self.composition.push(entry);
        self
    }

    pub fn with_source(mut self, source: Locator) -> Self {
        self.source = Some(source);
        self
    }
}
