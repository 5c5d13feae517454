//! Property tests for the template engine.

use proptest::prelude::*;
use serde_json::{json, Map};

use pal::domain::services::{RenderContext, Template};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: parsing never panics, whatever the input.
    #[test]
    fn property_parse_never_panics(source in ".{0,200}") {
        let _ = Template::parse(&source);
    }

    /// PROPERTY: text without template delimiters renders unchanged.
    #[test]
    fn property_plain_text_renders_verbatim(source in "[^{}%#]{0,120}") {
        let template = Template::parse(&source).unwrap();
        prop_assert!(template.is_static());

        let vars = Map::new();
        let rendered = template.render(&RenderContext::new(&vars)).unwrap();
        prop_assert_eq!(rendered.text, source);
        prop_assert!(rendered.undefined.is_empty());
    }

    /// PROPERTY: an undefined placeholder renders empty and is reported.
    #[test]
    fn property_undefined_placeholder_renders_empty(
        name in "u_[a-z]{1,8}",
        prefix in "[A-Za-z ]{0,20}",
    ) {
        let template = Template::parse(&format!("{prefix}{{{{ {name} }}}}")).unwrap();
        let vars = Map::new();
        let rendered = template.render(&RenderContext::new(&vars)).unwrap();

        prop_assert_eq!(rendered.text, prefix);
        prop_assert!(rendered.undefined.contains(&name));
    }

    /// PROPERTY: a for loop emits its body once per list element.
    #[test]
    fn property_for_loop_visits_every_item(items in proptest::collection::vec("[a-z]{1,6}", 0..10)) {
        let template = Template::parse("{% for item in items %}[{{ item }}]{% endfor %}").unwrap();
        let mut vars = Map::new();
        vars.insert("items".into(), json!(items));

        let rendered = template.render(&RenderContext::new(&vars)).unwrap();
        let expected: String = items.iter().map(|i| format!("[{i}]")).collect();
        prop_assert_eq!(rendered.text, expected);
    }
}
