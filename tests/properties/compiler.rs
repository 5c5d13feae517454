//! Property tests for compilation.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use pal::domain::entities::{CompositionEntry, PromptAssembly, Variable, VariableType};
use pal::{compile, PalError, SymbolTable};

fn name_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("v_[a-z0-9_]{0,10}").unwrap()
}

/// Plain text without template syntax.
fn text_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 ,.!?-]{1,40}").unwrap()
}

fn assembly_with(var: &str, texts: &[String]) -> PromptAssembly {
    let mut assembly = PromptAssembly::new("prop", "1.0.0")
        .with_variable(Variable::new(var, VariableType::String));
    for text in texts {
        assembly = assembly.with_entry(CompositionEntry::template(text.clone()));
    }
    assembly.with_entry(CompositionEntry::template(format!("{{{{ {var} }}}}")))
}

fn symbols_for(assembly: &PromptAssembly) -> SymbolTable {
    SymbolTable::empty(assembly.key())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: compiling the same inputs twice yields identical text.
    #[test]
    fn property_compile_is_deterministic(
        var in name_strategy(),
        texts in proptest::collection::vec(text_strategy(), 0..6),
        value in text_strategy(),
    ) {
        let assembly = assembly_with(&var, &texts);
        let symbols = symbols_for(&assembly);
        let mut vars = Map::new();
        vars.insert(var.clone(), json!(value));

        let first = compile(&assembly, &vars, &symbols).unwrap();
        let second = compile(&assembly, &vars, &symbols).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.ends_with(value.trim()));
    }

    /// PROPERTY: a required variable without value or default always fails
    /// with `MissingVariable` naming it.
    #[test]
    fn property_missing_required_variable_is_reported(
        var in name_strategy(),
        texts in proptest::collection::vec(text_strategy(), 0..4),
    ) {
        let assembly = assembly_with(&var, &texts);
        let symbols = symbols_for(&assembly);

        let err = compile(&assembly, &Map::new(), &symbols).unwrap_err();
        match err {
            PalError::MissingVariable { prompt_id, name } => {
                prop_assert_eq!(prompt_id, "prop");
                prop_assert_eq!(name, var);
            }
            other => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// PROPERTY: literal entries come out verbatim, braces included.
    #[test]
    fn property_literal_entries_are_not_rendered(
        inner in "[a-z]{1,10}",
    ) {
        let raw = format!("{{{{ {inner} }}}}");
        let assembly = PromptAssembly::new("lit", "1.0.0")
            .with_entry(CompositionEntry::literal(raw.clone()));
        let symbols = symbols_for(&assembly);

        let mut vars = Map::new();
        vars.insert(inner, Value::String("replaced".into()));
        prop_assert_eq!(compile(&assembly, &vars, &symbols).unwrap(), raw);
    }
}
