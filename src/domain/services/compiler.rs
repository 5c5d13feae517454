//! Prompt compiler
//!
//! Turns a resolved assembly plus variable values into final prompt text.
//!
//! Joining rule: every composition entry is rendered, trimmed, and dropped
//! when empty; the remaining entries are joined by a single blank line
//! (`"\n\n"`). The output never ends with a newline.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::resolver::SymbolTable;
use super::template::{ComponentSource, RenderContext, Rendered, Template};
use crate::domain::entities::{ComponentLibrary, CompositionEntry, PromptAssembly};
use crate::error::{PalError, PalResult};

/// Separator placed between rendered composition entries.
pub const ENTRY_SEPARATOR: &str = "\n\n";

/// Compiled text plus the non-fatal findings collected while rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompileReport {
    pub text: String,
    /// Every placeholder path that rendered without a value.
    pub undefined: BTreeSet<String>,
    /// Human-readable findings for validation tooling.
    pub warnings: Vec<String>,
}

/// Compile `assembly` to its final prompt text.
pub fn compile(
    assembly: &PromptAssembly,
    variables: &Map<String, Value>,
    symbols: &SymbolTable,
) -> PalResult<String> {
    compile_with_report(assembly, variables, symbols).map(|report| report.text)
}

pub fn compile_with_report(
    assembly: &PromptAssembly,
    variables: &Map<String, Value>,
    symbols: &SymbolTable,
) -> PalResult<CompileReport> {
    check_required(assembly, variables)?;

    let effective = effective_variables(assembly, variables);
    let mut report = CompileReport::default();
    report.warnings.extend(type_warnings(assembly, variables));

    let mut parts = Vec::with_capacity(assembly.composition.len());
    for (index, entry) in assembly.composition.iter().enumerate() {
        let rendered = render_entry(assembly, symbols, &effective, index, entry)?;
        report.undefined.extend(rendered.undefined);
        let text = rendered.text.trim();
        if !text.is_empty() {
            parts.push(text.to_string());
        }
    }

    let declared: HashSet<&str> = assembly.variables.iter().map(|v| v.name.as_str()).collect();
    for path in &report.undefined {
        let root = path.split('.').next().unwrap_or(path);
        if !declared.contains(root) {
            report
                .warnings
                .push(format!("undefined template variable '{}'", path));
        }
    }

    report.text = parts.join(ENTRY_SEPARATOR);
    debug!(
        prompt = %assembly.id,
        entries = parts.len(),
        chars = report.text.len(),
        "Compiled prompt"
    );
    Ok(report)
}

/// Root names of every placeholder referenced by the composition's
/// template entries. Needs neither values nor resolved imports.
pub fn analyze_template_variables(assembly: &PromptAssembly) -> BTreeSet<String> {
    assembly
        .composition
        .iter()
        .filter_map(|entry| match entry {
            CompositionEntry::Template(source) => Template::parse(source).ok(),
            _ => None,
        })
        .flat_map(|template| template.referenced_variables())
        .collect()
}

fn check_required(assembly: &PromptAssembly, supplied: &Map<String, Value>) -> PalResult<()> {
    for variable in &assembly.variables {
        if variable.required && variable.default.is_none() && !supplied.contains_key(&variable.name)
        {
            return Err(PalError::MissingVariable {
                prompt_id: assembly.id.clone(),
                name: variable.name.clone(),
            });
        }
    }
    Ok(())
}

/// Declared defaults overlaid with supplied values.
fn effective_variables(assembly: &PromptAssembly, supplied: &Map<String, Value>) -> Map<String, Value> {
    let mut effective = Map::new();
    for variable in &assembly.variables {
        if let Some(default) = &variable.default {
            effective.insert(variable.name.clone(), default.clone());
        }
    }
    for (name, value) in supplied {
        effective.insert(name.clone(), value.clone());
    }
    effective
}

fn type_warnings(assembly: &PromptAssembly, supplied: &Map<String, Value>) -> Vec<String> {
    assembly
        .variables
        .iter()
        .filter_map(|variable| {
            let value = supplied.get(&variable.name)?;
            (!value.is_null() && !variable.var_type.accepts(value)).then(|| {
                format!(
                    "variable '{}' expects {}, got {}",
                    variable.name, variable.var_type, value
                )
            })
        })
        .collect()
}

fn render_entry(
    assembly: &PromptAssembly,
    symbols: &SymbolTable,
    effective: &Map<String, Value>,
    index: usize,
    entry: &CompositionEntry,
) -> PalResult<Rendered> {
    match entry {
        CompositionEntry::Literal { literal } => Ok(Rendered {
            text: literal.clone(),
            ..Rendered::default()
        }),
        CompositionEntry::Template(source) => {
            let template = Template::parse(source).map_err(|e| PalError::Compile {
                prompt_id: assembly.id.clone(),
                message: format!("composition entry {}: {}", index + 1, e),
            })?;
            let components = SymbolComponents {
                assembly,
                symbols,
                vars: effective,
            };
            template.render(&RenderContext::new(effective).with_components(&components))
        }
        CompositionEntry::Component { component, vars } => {
            let content = component_in(assembly, symbols, &component.alias, &component.component)?;
            let scoped = with_overrides(effective, vars);
            render_component(assembly, &component.alias, &component.component, content, &scoped)
        }
        CompositionEntry::Library { library: alias, vars } => {
            let library = library_for(assembly, symbols, alias, "*")?;
            let scoped = with_overrides(effective, vars);
            let mut combined = Rendered::default();
            let mut texts = Vec::with_capacity(library.components.len());
            for component in &library.components {
                let rendered =
                    render_component(assembly, alias, &component.name, &component.content, &scoped)?;
                combined.undefined.extend(rendered.undefined);
                let text = rendered.text.trim();
                if !text.is_empty() {
                    texts.push(text.to_string());
                }
            }
            combined.text = texts.join(library.library_type.separator());
            Ok(combined)
        }
    }
}

fn with_overrides(
    effective: &Map<String, Value>,
    overrides: &IndexMap<String, Value>,
) -> Map<String, Value> {
    let mut scoped = effective.clone();
    for (name, value) in overrides {
        scoped.insert(name.clone(), value.clone());
    }
    scoped
}

fn library_for<'s>(
    assembly: &PromptAssembly,
    symbols: &'s SymbolTable,
    alias: &str,
    component: &str,
) -> PalResult<&'s ComponentLibrary> {
    let missing = |reason: String| PalError::MissingComponent {
        alias: alias.to_string(),
        component: component.to_string(),
        reason,
    };

    let Some(artifact) = symbols.get(alias) else {
        let reason = if assembly.import(alias).is_some() {
            format!("import '{}' is not in the symbol table", alias)
        } else {
            format!("alias '{}' is not imported by '{}'", alias, assembly.id)
        };
        return Err(missing(reason));
    };

    artifact.as_library().ok_or_else(|| {
        missing(format!(
            "alias '{}' refers to an assembly, not a library",
            alias
        ))
    })
}

fn component_in<'s>(
    assembly: &PromptAssembly,
    symbols: &'s SymbolTable,
    alias: &str,
    name: &str,
) -> PalResult<&'s str> {
    let library = library_for(assembly, symbols, alias, name)?;
    library
        .component(name)
        .map(|component| component.content.as_str())
        .ok_or_else(|| PalError::MissingComponent {
            alias: alias.to_string(),
            component: name.to_string(),
            reason: format!("library '{}' has no component '{}'", library.library_id, name),
        })
}

/// Component content is rendered with variables only.
fn render_component(
    assembly: &PromptAssembly,
    alias: &str,
    name: &str,
    content: &str,
    vars: &Map<String, Value>,
) -> PalResult<Rendered> {
    let template = Template::parse(content).map_err(|e| PalError::Compile {
        prompt_id: assembly.id.clone(),
        message: format!("component '{}.{}': {}", alias, name, e),
    })?;
    template.render(&RenderContext::new(vars))
}

/// Resolves `{{ alias.component }}` inside template entries.
struct SymbolComponents<'a> {
    assembly: &'a PromptAssembly,
    symbols: &'a SymbolTable,
    vars: &'a Map<String, Value>,
}

impl ComponentSource for SymbolComponents<'_> {
    fn component(&self, alias: &str, name: &str) -> Option<PalResult<Rendered>> {
        if !self.symbols.contains_alias(alias) && self.assembly.import(alias).is_none() {
            return None;
        }
        Some(
            component_in(self.assembly, self.symbols, alias, name).and_then(|content| {
                render_component(self.assembly, alias, name, content, self.vars)
            }),
        )
    }
}

#[cfg(test)]
mod tests;
