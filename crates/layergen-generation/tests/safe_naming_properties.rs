//! Property-based tests for keyword-safe name derivation
//!
//! A name set is derived once per entity and reused everywhere; these
//! properties pin down the relationship between its variants.

use proptest::prelude::*;

use layergen_generation::NamingResolver;

fn entity_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,10}"
}

proptest! {
    /// The canonical name is always the raw name, untouched.
    #[test]
    fn prop_canonical_preserves_raw_name(name in entity_name_strategy()) {
        let names = NamingResolver::new().resolve(&name, "Core").unwrap();
        prop_assert_eq!(names.canonical, name);
    }

    /// The safe name is either the raw name or the raw name plus the suffix,
    /// and never collides with the reserved set.
    #[test]
    fn prop_safe_name_is_raw_or_suffixed(name in entity_name_strategy()) {
        let resolver = NamingResolver::new();
        let names = resolver.resolve(&name, "Core").unwrap();
        prop_assert!(
            names.safe == names.canonical
                || names.safe == format!("{}Model", names.canonical),
            "safe name {:?} is neither the canonical name nor the suffixed form",
            names.safe
        );
    }

    /// The lower-start name differs from the safe name only in its first
    /// character.
    #[test]
    fn prop_lower_start_lowercases_first_char(name in entity_name_strategy()) {
        let names = NamingResolver::new().resolve(&name, "Core").unwrap();
        let mut chars = names.lower_start.chars();
        let first = chars.next().unwrap();
        prop_assert!(!first.is_uppercase());
        prop_assert_eq!(chars.as_str(), &names.safe[1..]);
    }

    /// Resolution is deterministic.
    #[test]
    fn prop_resolution_is_deterministic(name in entity_name_strategy()) {
        let resolver = NamingResolver::new();
        let first = resolver.resolve(&name, "Core").unwrap();
        let second = resolver.resolve(&name, "Core").unwrap();
        prop_assert_eq!(first, second);
    }

    /// Distinct non-reserved raw names keep distinct safe names, so generated
    /// members never collide within a group.
    #[test]
    fn prop_distinct_names_stay_distinct(
        a in entity_name_strategy(),
        b in entity_name_strategy(),
    ) {
        prop_assume!(a != b);
        let resolver = NamingResolver::new();
        let sa = resolver.resolve(&a, "Core").unwrap();
        let sb = resolver.resolve(&b, "Core").unwrap();
        prop_assume!(sa.safe == sa.canonical && sb.safe == sb.canonical);
        prop_assert_ne!(sa.safe, sb.safe);
    }
}

#[test]
fn test_reserved_words_get_suffixed() {
    let resolver = NamingResolver::new();
    for raw in ["Range", "Delegate", "Route", "Object", "String"] {
        let names = resolver.resolve(raw, "Common").unwrap();
        assert_eq!(names.canonical, raw);
        assert_eq!(names.safe, format!("{raw}Model"));
    }
}

#[test]
fn test_non_reserved_passes_through() {
    let names = NamingResolver::new().resolve("Item", "Inventory").unwrap();
    assert_eq!(names.safe, "Item");
    assert_eq!(names.lower_start, "item");
    assert_eq!(names.schema, "Inventory");
}

#[test]
fn test_invalid_names_rejected() {
    let resolver = NamingResolver::new();
    assert!(resolver.resolve("", "Core").is_err());
    assert!(resolver.resolve("9Lives", "Core").is_err());
    assert!(resolver.resolve("has space", "Core").is_err());
}
