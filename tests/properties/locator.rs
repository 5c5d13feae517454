//! Property tests for import locators.

use std::path::{Component, PathBuf};

use proptest::prelude::*;

use pal::domain::value_objects::{ArtifactKind, Locator};

fn segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_-]{1,12}").unwrap()
}

fn relative_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..=4).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: joined relative locators never keep `.` segments.
    #[test]
    fn property_join_normalizes_current_dir(
        base in relative_path(),
        target in relative_path(),
    ) {
        let importer = Locator::parse(&format!("{base}/main.pal"));
        let joined = importer.join(&format!("./{target}.pal.lib"));

        match joined {
            Locator::Path(path) => {
                prop_assert!(path.components().all(|c| c != Component::CurDir));
                prop_assert_eq!(path, PathBuf::from(format!("{base}/{target}.pal.lib")));
            }
            Locator::Url(url) => prop_assert!(false, "unexpected url {url}"),
        }
    }

    /// PROPERTY: `sub/..` round trips back to the importer's directory.
    #[test]
    fn property_parent_segments_cancel(
        base in relative_path(),
        sub in segment(),
        name in segment(),
    ) {
        let importer = Locator::parse(&format!("{base}/main.pal"));
        let direct = importer.join(&format!("{name}.pal"));
        let detour = importer.join(&format!("{sub}/../{name}.pal"));
        prop_assert_eq!(direct, detour);
    }

    /// PROPERTY: the `.pal.lib` suffix alone decides the artifact kind.
    #[test]
    fn property_kind_follows_suffix(path in relative_path()) {
        prop_assert_eq!(Locator::parse(&format!("{path}.pal.lib")).kind(), ArtifactKind::Library);
        prop_assert_eq!(Locator::parse(&format!("{path}.pal")).kind(), ArtifactKind::Assembly);
    }
}
