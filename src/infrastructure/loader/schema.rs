//! Document schema
//!
//! Raw serde shapes of `*.pal` and `*.pal.lib` documents and their
//! conversion into validated domain entities. Parsing is lenient about
//! unknown fields (collected with `serde_ignored`) and strict about
//! everything the pipeline relies on.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, IntoDeserializer, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::domain::entities::{
    Component, ComponentLibrary, ComponentRef, CompositionEntry, Import, LibraryType,
    PromptAssembly, Variable, VariableType,
};
use crate::domain::services::Template;
use crate::error::{PalError, PalResult};

const DEFAULT_PAL_VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
struct RawAssembly {
    #[serde(default)]
    pal_version: Option<String>,
    id: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    variables: Vec<RawVariable>,
    #[serde(default)]
    imports: RawImports,
    composition: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawVariable {
    name: String,
    #[serde(rename = "type")]
    var_type: String,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    description: String,
}

fn default_required() -> bool {
    true
}

/// `alias: locator` pairs in document order. Repeated aliases are kept so
/// the resolver can reject them.
#[derive(Debug, Default)]
struct RawImports(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawImports {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ImportsVisitor;

        impl<'de> Visitor<'de> for ImportsVisitor {
            type Value = RawImports;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of import alias to locator")
            }

            fn visit_unit<E: de::Error>(self) -> Result<RawImports, E> {
                Ok(RawImports::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawImports, A::Error> {
                let mut pairs = Vec::new();
                while let Some((alias, locator)) = map.next_entry::<String, String>()? {
                    pairs.push((alias, locator));
                }
                Ok(RawImports(pairs))
            }
        }

        deserializer.deserialize_any(ImportsVisitor)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Map(IndexMap<String, Value>),
}

#[derive(Debug, Deserialize)]
struct RawLibrary {
    #[serde(default)]
    pal_version: Option<String>,
    library_id: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    library_type: String,
    components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
struct RawComponent {
    name: String,
    #[serde(default)]
    description: String,
    content: String,
    #[serde(default)]
    metadata: IndexMap<String, Value>,
}

/// Parse and validate an assembly document.
pub fn parse_assembly(content: &str, path: &Path) -> PalResult<PromptAssembly> {
    let (raw, mut warnings): (RawAssembly, _) = deserialize(content, path)?;
    let check = Checker::new(path, "assembly");

    check.non_empty("id", &raw.id)?;
    check.version(&raw.version)?;

    let mut variables = Vec::with_capacity(raw.variables.len());
    let mut names = HashSet::new();
    for (i, rv) in raw.variables.into_iter().enumerate() {
        let field = format!("variables[{}]", i);
        check.identifier(&field, &rv.name)?;
        if !names.insert(rv.name.clone()) {
            return Err(check.fail(&field, format!("duplicate variable '{}'", rv.name)));
        }
        let var_type: VariableType = parse_tag(&rv.var_type).ok_or_else(|| {
            check.fail(
                format!("{}.type", field),
                format!("unknown variable type '{}'", rv.var_type),
            )
        })?;
        if let Some(default) = &rv.default {
            if !var_type.accepts(default) {
                return Err(check.fail(
                    format!("{}.default", field),
                    format!(
                        "default for '{}' must be a {}, got {}",
                        rv.name, var_type, default
                    ),
                ));
            }
        }
        variables.push(Variable {
            name: rv.name,
            var_type,
            required: rv.required,
            default: rv.default,
            description: rv.description,
        });
    }

    let mut imports = Vec::with_capacity(raw.imports.0.len());
    for (alias, locator) in raw.imports.0 {
        let field = format!("imports.{}", alias);
        check.identifier(&field, &alias)?;
        check.non_empty(&field, &locator)?;
        if names.contains(&alias) {
            return Err(check.fail(
                &field,
                format!("import alias '{}' shadows a variable of the same name", alias),
            ));
        }
        imports.push(Import { alias, locator });
    }

    let mut composition = Vec::with_capacity(raw.composition.len());
    for (i, entry) in raw.composition.into_iter().enumerate() {
        let field = format!("composition[{}]", i);
        composition.push(convert_entry(&check, &field, entry, &mut warnings)?);
    }

    report_ignored(path, &warnings);
    Ok(PromptAssembly {
        pal_version: raw
            .pal_version
            .unwrap_or_else(|| DEFAULT_PAL_VERSION.to_string()),
        id: raw.id,
        version: raw.version,
        description: raw.description,
        author: raw.author,
        variables,
        imports,
        composition,
        source: None,
        warnings,
    })
}

/// Parse and validate a library document.
pub fn parse_library(content: &str, path: &Path) -> PalResult<ComponentLibrary> {
    let (raw, warnings): (RawLibrary, _) = deserialize(content, path)?;
    let check = Checker::new(path, "library");

    check.non_empty("library_id", &raw.library_id)?;
    check.version(&raw.version)?;
    let library_type: LibraryType = parse_tag(&raw.library_type).ok_or_else(|| {
        check.fail("type", format!("unknown library type '{}'", raw.library_type))
    })?;

    let mut components = Vec::with_capacity(raw.components.len());
    let mut names = HashSet::new();
    for (i, rc) in raw.components.into_iter().enumerate() {
        let field = format!("components[{}]", i);
        check.non_empty(&format!("{}.name", field), &rc.name)?;
        if !names.insert(rc.name.clone()) {
            return Err(check.fail(&field, format!("duplicate component '{}'", rc.name)));
        }
        check.template(&format!("{}.content", field), &rc.content)?;
        components.push(Component {
            name: rc.name,
            description: rc.description,
            content: rc.content,
            metadata: rc.metadata,
        });
    }

    report_ignored(path, &warnings);
    Ok(ComponentLibrary {
        pal_version: raw
            .pal_version
            .unwrap_or_else(|| DEFAULT_PAL_VERSION.to_string()),
        library_id: raw.library_id,
        version: raw.version,
        description: raw.description,
        library_type,
        components,
        source: None,
        warnings,
    })
}

fn deserialize<T: DeserializeOwned>(content: &str, path: &Path) -> PalResult<(T, Vec<String>)> {
    let mut ignored = Vec::new();
    let deserializer = serde_yaml_ng::Deserializer::from_str(content);
    let value: T = serde_ignored::deserialize(deserializer, |p| {
        ignored.push(format!("unknown field '{}' ignored", p));
    })
    .map_err(|e| PalError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok((value, ignored))
}

fn report_ignored(path: &Path, warnings: &[String]) {
    for warning in warnings {
        warn!(path = %path.display(), "{}", warning);
    }
}

fn convert_entry(
    check: &Checker<'_>,
    field: &str,
    entry: RawEntry,
    warnings: &mut Vec<String>,
) -> PalResult<CompositionEntry> {
    let mut map = match entry {
        RawEntry::Text(text) => {
            check.template(field, &text)?;
            return Ok(CompositionEntry::Template(text));
        }
        RawEntry::Map(map) => map,
    };

    let literal = map.shift_remove("literal");
    let component = map.shift_remove("component");
    let library = map.shift_remove("library");
    let vars = match map.shift_remove("vars") {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(vars)) => vars.into_iter().collect(),
        Some(_) => return Err(check.fail(format!("{}.vars", field), "vars must be a mapping")),
    };
    for key in map.keys() {
        warnings.push(format!("unknown field '{}.{}' ignored", field, key));
    }

    match (literal, component, library) {
        (Some(literal), None, None) => match literal {
            Value::String(literal) => Ok(CompositionEntry::Literal { literal }),
            _ => Err(check.fail(format!("{}.literal", field), "literal must be a string")),
        },
        (None, Some(component), None) => {
            let raw = component.as_str().unwrap_or_default();
            let component = ComponentRef::parse(raw).ok_or_else(|| {
                check.fail(
                    format!("{}.component", field),
                    format!("component reference '{}' must look like alias.name", raw),
                )
            })?;
            Ok(CompositionEntry::Component { component, vars })
        }
        (None, None, Some(library)) => match library {
            Value::String(alias) if !alias.trim().is_empty() => {
                Ok(CompositionEntry::Library { library: alias, vars })
            }
            _ => Err(check.fail(
                format!("{}.library", field),
                "library must be an import alias",
            )),
        },
        (None, None, None) => Err(check.fail(
            field,
            "entry must be text or one of 'literal', 'component', 'library'",
        )),
        _ => Err(check.fail(
            field,
            "entry must have exactly one of 'literal', 'component', 'library'",
        )),
    }
}

fn parse_tag<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let deserializer: de::value::StrDeserializer<'_, de::value::Error> =
        raw.trim().into_deserializer();
    T::deserialize(deserializer).ok()
}

/// Builds validation errors for one document.
struct Checker<'a> {
    path: &'a Path,
    kind: &'static str,
}

impl<'a> Checker<'a> {
    fn new(path: &'a Path, kind: &'static str) -> Self {
        Self { path, kind }
    }

    fn fail(&self, field: impl AsRef<str>, message: impl Into<String>) -> PalError {
        PalError::Validation {
            path: self.path.to_path_buf(),
            kind: self.kind,
            message: message.into(),
            field: Some(field.as_ref().to_string()),
        }
    }

    fn non_empty(&self, field: &str, value: &str) -> PalResult<()> {
        if value.trim().is_empty() {
            return Err(self.fail(field, format!("{} must not be empty", field)));
        }
        Ok(())
    }

    fn identifier(&self, field: &str, value: &str) -> PalResult<()> {
        let mut chars = value.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(self.fail(field, format!("'{}' is not a valid name", value)));
        }
        Ok(())
    }

    fn version(&self, version: &str) -> PalResult<()> {
        if !is_semver(version) {
            return Err(self.fail(
                "version",
                format!("'{}' is not a MAJOR.MINOR.PATCH version", version),
            ));
        }
        Ok(())
    }

    fn template(&self, field: &str, source: &str) -> PalResult<()> {
        Template::parse(source)
            .map(|_| ())
            .map_err(|e| self.fail(field, format!("invalid template: {}", e)))
    }
}

/// `MAJOR.MINOR.PATCH` with optional `-pre` and `+build` suffixes.
pub fn is_semver(version: &str) -> bool {
    let (core, build) = match version.split_once('+') {
        Some((core, build)) => (core, Some(build)),
        None => (version, None),
    };
    let (core, pre) = match core.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (core, None),
    };

    let numeric = core.split('.').collect::<Vec<_>>();
    let core_ok = numeric.len() == 3
        && numeric
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
    let suffix_ok = |s: Option<&str>| {
        s.is_none_or(|s| {
            !s.is_empty()
                && s.split('.').all(|ident| {
                    !ident.is_empty() && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                })
        })
    };

    core_ok && suffix_ok(pre) && suffix_ok(build)
}
