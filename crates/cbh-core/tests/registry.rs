//! Identifier resolution properties.

use std::collections::HashSet;

use cbh_core::IdentifierRegistry;
use cbh_model::IdKind;
use proptest::prelude::*;

fn kind() -> impl Strategy<Value = IdKind> {
    prop_oneof![Just(IdKind::Donor), Just(IdKind::Master), Just(IdKind::Sample)]
}

proptest! {
    #[test]
    fn resolving_twice_is_idempotent(kind in kind(), external in "[A-Za-z0-9-]{1,12}") {
        let mut registry = IdentifierRegistry::new();
        let before = registry.next_counter(kind);
        let first = registry.resolve(kind, Some(&external)).unwrap();
        let second = registry.resolve(kind, Some(&external)).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(registry.next_counter(kind), before.map(|counter| counter + 1));
        prop_assert_eq!(registry.pending().len(), 1);
    }

    #[test]
    fn unmapped_rows_never_collide(kind in kind(), rows in 1usize..200) {
        let mut registry = IdentifierRegistry::new();
        let ids: HashSet<_> = (0..rows).map(|_| registry.resolve(kind, None).unwrap()).collect();
        prop_assert_eq!(ids.len(), rows);
        prop_assert!(registry.pending().is_empty());
    }

    #[test]
    fn distinct_external_ids_get_distinct_canonical_ids(
        kind in kind(),
        externals in proptest::collection::hash_set("[a-z]{1,6}", 1..50),
    ) {
        let mut registry = IdentifierRegistry::new();
        let ids: HashSet<_> = externals
            .iter()
            .map(|external| registry.resolve(kind, Some(external)).unwrap())
            .collect();
        prop_assert_eq!(ids.len(), externals.len());
        prop_assert_eq!(registry.known(kind), externals.len());
    }
}
