//! Tests for the prompt compiler

use super::*;
use crate::domain::entities::{
    Artifact, Component, ComponentLibrary, LibraryType, Variable, VariableType,
};
use crate::domain::ports::ArtifactLoader;
use crate::domain::services::resolver::Resolver;
use crate::domain::value_objects::Locator;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

struct Fixtures(HashMap<Locator, Artifact>);

#[async_trait]
impl ArtifactLoader for Fixtures {
    async fn load(&self, locator: &Locator) -> PalResult<Artifact> {
        self.load_blocking(locator)
    }

    fn load_blocking(&self, locator: &Locator) -> PalResult<Artifact> {
        self.0.get(locator).cloned().ok_or_else(|| PalError::Load {
            path: locator.display_path(),
            message: "not found".into(),
        })
    }
}

fn greetings() -> ComponentLibrary {
    ComponentLibrary::new("greetings", "1.0.0", LibraryType::Task)
        .with_component(Component::new("greet", "Hello {{name}}"))
        .with_component(Component::new("farewell", "Bye {{ name | upper }}, {{ tone }}"))
}

fn rules() -> ComponentLibrary {
    ComponentLibrary::new("rules", "1.0.0", LibraryType::Rules)
        .with_component(Component::new("one", "- be brief"))
        .with_component(Component::new("two", "  - be kind  "))
}

fn symbols_for(assembly: &PromptAssembly) -> SymbolTable {
    let mut map = HashMap::new();
    map.insert(
        Locator::Path(PathBuf::from("/p/greetings.pal.lib")),
        Artifact::from(greetings()),
    );
    map.insert(Locator::Path(PathBuf::from("/p/rules.pal.lib")), Artifact::from(rules()));
    map.insert(
        Locator::Path(PathBuf::from("/p/other.pal")),
        Artifact::from(PromptAssembly::new("other", "1.0.0")),
    );
    Resolver::new(&Fixtures(map))
        .resolve_blocking(assembly)
        .unwrap()
}

fn assembly() -> PromptAssembly {
    PromptAssembly::new("greeting", "1.0.0")
        .with_source(Locator::Path(PathBuf::from("/p/greeting.pal")))
        .with_import("lib", "greetings.pal.lib")
        .with_variable(Variable::new("name", VariableType::String))
}

fn vars(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("vars must be an object"),
    }
}

#[test]
fn test_compile_component_reference() {
    let assembly = assembly().with_entry(CompositionEntry::component("lib", "greet"));
    let symbols = symbols_for(&assembly);

    let text = compile(&assembly, &vars(json!({"name": "World"})), &symbols).unwrap();
    assert_eq!(text, "Hello World");
}

#[test]
fn test_compile_missing_required_variable_fails_before_rendering() {
    let assembly = assembly()
        .with_entry(CompositionEntry::component("lib", "nope"))
        .with_entry(CompositionEntry::component("lib", "greet"));
    let symbols = symbols_for(&assembly);

    let err = compile(&assembly, &Map::new(), &symbols).unwrap_err();
    match err {
        PalError::MissingVariable { prompt_id, name } => {
            assert_eq!(prompt_id, "greeting");
            assert_eq!(name, "name");
        }
        other => panic!("expected missing variable, got {other:?}"),
    }
}

#[test]
fn test_compile_default_satisfies_required() {
    let assembly = PromptAssembly::new("p", "1.0.0")
        .with_variable(Variable::new("tone", VariableType::String).with_default(json!("calm")))
        .with_entry(CompositionEntry::template("Tone: {{ tone }}"));
    let symbols = SymbolTable::empty(assembly.key());

    assert_eq!(compile(&assembly, &Map::new(), &symbols).unwrap(), "Tone: calm");
    assert_eq!(
        compile(&assembly, &vars(json!({"tone": "dry"})), &symbols).unwrap(),
        "Tone: dry"
    );
}

#[test]
fn test_compile_entry_overrides_take_precedence() {
    let assembly = assembly()
        .with_variable(
            Variable::new("tone", VariableType::String)
                .optional()
                .with_default(json!("warm")),
        )
        .with_entry(CompositionEntry::component("lib", "farewell"))
        .with_entry(CompositionEntry::component("lib", "farewell").with_var("tone", json!("curt")))
        .with_entry(CompositionEntry::template("{{ tone }}"));
    let symbols = symbols_for(&assembly);

    let text = compile(&assembly, &vars(json!({"name": "ada", "tone": "kind"})), &symbols).unwrap();
    assert_eq!(text, "Bye ADA, kind\n\nBye ADA, curt\n\nkind");
}

#[test]
fn test_compile_joins_trimmed_entries_and_drops_empty_ones() {
    let assembly = PromptAssembly::new("p", "1.0.0")
        .with_variable(Variable::new("flag", VariableType::Boolean).optional())
        .with_entry(CompositionEntry::template("\n  First  \n"))
        .with_entry(CompositionEntry::template("{% if flag %}hidden{% endif %}"))
        .with_entry(CompositionEntry::literal("Second {{ not rendered }}\n"));
    let symbols = SymbolTable::empty(assembly.key());

    let text = compile(&assembly, &Map::new(), &symbols).unwrap();
    assert_eq!(text, "First\n\nSecond {{ not rendered }}");
    assert!(!text.ends_with('\n'));
}

#[test]
fn test_compile_library_entry_uses_type_separator() {
    let assembly = PromptAssembly::new("p", "1.0.0")
        .with_source(Locator::Path(PathBuf::from("/p/p.pal")))
        .with_import("rules", "rules.pal.lib")
        .with_entry(CompositionEntry::template("Rules:"))
        .with_entry(CompositionEntry::library("rules"));
    let symbols = symbols_for(&assembly);

    let text = compile(&assembly, &Map::new(), &symbols).unwrap();
    assert_eq!(text, "Rules:\n\n- be brief\n- be kind");
}

#[test]
fn test_compile_inline_component_reference_in_template() {
    let assembly =
        assembly().with_entry(CompositionEntry::template("<<{{ lib.greet }}>> {{ name }}"));
    let symbols = symbols_for(&assembly);

    let text = compile(&assembly, &vars(json!({"name": "Bo"})), &symbols).unwrap();
    assert_eq!(text, "<<Hello Bo>> Bo");
}

#[test]
fn test_inline_and_entry_components_report_the_same_placeholders() {
    let values = vars(json!({"name": "Ada"}));
    let as_entry = assembly().with_entry(CompositionEntry::component("lib", "farewell"));
    let inline = assembly().with_entry(CompositionEntry::template("{{ lib.farewell }}"));

    let entry_report =
        compile_with_report(&as_entry, &values, &symbols_for(&as_entry)).unwrap();
    let inline_report = compile_with_report(&inline, &values, &symbols_for(&inline)).unwrap();

    let expected = BTreeSet::from(["tone".to_string()]);
    let warning = vec!["undefined template variable 'tone'".to_string()];
    assert_eq!(entry_report.text, "Bye ADA,");
    assert_eq!(inline_report.text, entry_report.text);
    assert_eq!(entry_report.undefined, expected);
    assert_eq!(inline_report.undefined, expected);
    assert_eq!(entry_report.warnings, warning);
    assert_eq!(inline_report.warnings, warning);
}

#[test]
fn test_compile_missing_component_names_alias_and_component() {
    let assembly = assembly().with_entry(CompositionEntry::component("lib", "missing"));
    let symbols = symbols_for(&assembly);

    let err = compile(&assembly, &vars(json!({"name": "x"})), &symbols).unwrap_err();
    match err {
        PalError::MissingComponent {
            alias, component, ..
        } => {
            assert_eq!(alias, "lib");
            assert_eq!(component, "missing");
        }
        other => panic!("expected missing component, got {other:?}"),
    }
}

#[test]
fn test_compile_unknown_alias_is_missing_component() {
    let assembly = assembly().with_entry(CompositionEntry::component("ghost", "greet"));
    let symbols = symbols_for(&assembly);

    let err = compile(&assembly, &vars(json!({"name": "x"})), &symbols).unwrap_err();
    assert!(matches!(err, PalError::MissingComponent { ref alias, .. } if alias == "ghost"));
    assert!(err.is_compiler_error());
}

#[test]
fn test_compile_assembly_alias_is_not_a_component_source() {
    let assembly = assembly()
        .with_import("other", "other.pal")
        .with_entry(CompositionEntry::component("other", "greet"));
    let symbols = symbols_for(&assembly);

    let err = compile(&assembly, &vars(json!({"name": "x"})), &symbols).unwrap_err();
    assert!(err.to_string().contains("refers to an assembly"));
}

#[test]
fn test_compile_inline_missing_component_fails() {
    let assembly = assembly().with_entry(CompositionEntry::template("{{ lib.nothing }}"));
    let symbols = symbols_for(&assembly);

    let err = compile(&assembly, &vars(json!({"name": "x"})), &symbols).unwrap_err();
    assert!(matches!(err, PalError::MissingComponent { .. }));
}

#[test]
fn test_compile_is_deterministic() {
    let assembly = assembly()
        .with_entry(CompositionEntry::template("{% for t in tags %}{{ t }};{% endfor %}"))
        .with_entry(CompositionEntry::component("lib", "greet"));
    let symbols = symbols_for(&assembly);
    let values = vars(json!({"name": "Z", "tags": ["a", "b"]}));

    let first = compile(&assembly, &values, &symbols).unwrap();
    let second = compile(&assembly, &values, &symbols).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_report_warns_on_undeclared_placeholders_only() {
    let assembly = PromptAssembly::new("p", "1.0.0")
        .with_variable(Variable::new("opt", VariableType::String).optional())
        .with_variable(Variable::new("count", VariableType::Number).optional())
        .with_entry(CompositionEntry::template("{{ opt }}{{ stray }}{{ count }}"));
    let symbols = SymbolTable::empty(assembly.key());

    let report =
        compile_with_report(&assembly, &vars(json!({"count": "three"})), &symbols).unwrap();

    assert!(report.undefined.contains("opt"));
    assert!(report.undefined.contains("stray"));
    assert!(report
        .warnings
        .contains(&"undefined template variable 'stray'".to_string()));
    assert!(!report.warnings.iter().any(|w| w.contains("'opt'")));
    assert!(report.warnings.iter().any(|w| w.contains("expects number")));
}

#[test]
fn test_analyze_template_variables() {
    let assembly = PromptAssembly::new("p", "1.0.0")
        .with_entry(CompositionEntry::template(
            "{{ role }}{% for e in examples %}{{ e }}{{ loop.index }}{% endfor %}",
        ))
        .with_entry(CompositionEntry::literal("{{ ignored }}"))
        .with_entry(CompositionEntry::component("lib", "greet"))
        .with_entry(CompositionEntry::template("{% if strict %}{{ lib.rules }}{% endif %}"));

    let names: Vec<_> = analyze_template_variables(&assembly).into_iter().collect();
    assert_eq!(names, vec!["examples", "lib", "role", "strict"]);
}
