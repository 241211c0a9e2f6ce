//! Property-based tests for module ordering.
//!
//! - All-zero orders keep catalog order
//! - Reordering a, b and back restores their relative order
//! - Reorder is a permutation with ranks 1..=n

use dashbank_shared::types::ModuleId;
use proptest::prelude::*;

use super::ordering::{default_sequence, ordered_modules, reorder};
use super::types::ModuleDescriptor;

fn catalog(defaults: &[u32]) -> Vec<ModuleDescriptor> {
    defaults
        .iter()
        .enumerate()
        .map(|(i, order)| ModuleDescriptor::new(format!("m{i}"), format!("Module {i}"), *order))
        .collect()
}

fn ids(modules: &[ModuleDescriptor]) -> Vec<String> {
    modules.iter().map(|m| m.id.to_string()).collect()
}

/// Strategy for a catalog size plus two distinct indices into it.
fn catalog_with_pair() -> impl Strategy<Value = (Vec<u32>, usize, usize)> {
    prop::collection::vec(0u32..20, 2..12).prop_flat_map(|defaults| {
        let len = defaults.len();
        (Just(defaults), 0..len, 0..len).prop_filter("distinct", |(_, a, b)| a != b)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// With no ranks anywhere the catalog order is the render order.
    #[test]
    fn prop_all_zero_orders_keep_catalog_order(len in 0usize..20) {
        let modules = catalog(&vec![0; len]);

        let ordered = ordered_modules(&modules, &[]);

        prop_assert_eq!(ids(&ordered), ids(&modules));
    }

    /// Dragging a onto b and then b onto a restores which of the two comes first.
    #[test]
    fn prop_reorder_back_restores_relative_order((defaults, a, b) in catalog_with_pair()) {
        let start = default_sequence(&catalog(&defaults));
        let id_a = start[a].id.clone();
        let id_b = start[b].id.clone();

        let once = reorder(&start, &id_a, &id_b).unwrap();
        let twice = reorder(&once, &id_b, &id_a).unwrap();

        let pos = |seq: &[ModuleDescriptor], id: &ModuleId| seq.iter().position(|m| &m.id == id).unwrap();
        prop_assert_eq!(
            pos(&start, &id_a) < pos(&start, &id_b),
            pos(&twice, &id_a) < pos(&twice, &id_b)
        );
    }

    /// Reorder never drops or duplicates a module and always renumbers from 1.
    #[test]
    fn prop_reorder_is_renumbered_permutation((defaults, a, b) in catalog_with_pair()) {
        let start = default_sequence(&catalog(&defaults));

        let moved = reorder(&start, &start[a].id, &start[b].id).unwrap();

        let mut before = ids(&start);
        let mut after = ids(&moved);
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);

        let orders: Vec<u32> = moved.iter().map(|m| m.order).collect();
        let expected: Vec<u32> = (1..=u32::try_from(moved.len()).unwrap()).collect();
        prop_assert_eq!(orders, expected);
        prop_assert_eq!(&moved[b].id, &start[a].id);
    }
}
