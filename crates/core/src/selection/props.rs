//! Property-based tests for `SelectionSet`.

use proptest::prelude::*;

use dashbank_shared::types::{CurrencyCode, ItemId};

use super::set::{Capacity, SelectionSet, Toggle};
use crate::aggregation::{FinancialItem, ItemKind};

/// A toggle or toggle-all press against an index into a ten-item pool.
#[derive(Debug, Clone)]
enum Press {
    One(usize),
    All,
}

fn press() -> impl Strategy<Value = Press> {
    prop_oneof![
        4 => (0usize..10).prop_map(Press::One),
        1 => Just(Press::All),
    ]
}

fn pool() -> Vec<FinancialItem> {
    (0..10)
        .map(|i| FinancialItem::new(format!("item-{i}"), ItemKind::Card, CurrencyCode::base()))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// No sequence of presses pushes the selection past capacity.
    #[test]
    fn prop_never_exceeds_capacity(
        capacity in 0usize..6,
        presses in prop::collection::vec(press(), 0..60),
    ) {
        let mut set = SelectionSet::new(pool(), Capacity::Bounded(capacity));
        for p in presses {
            match p {
                Press::One(i) => { set.toggle(&ItemId::new(format!("item-{i}"))); }
                Press::All => set.toggle_all(),
            }
            prop_assert!(set.len() <= capacity);
        }
    }

    /// Toggling an already-selected id always removes it, even at capacity.
    #[test]
    fn prop_toggle_selected_removes(capacity in 1usize..6, pick in 0usize..10) {
        let mut set = SelectionSet::new(pool(), Capacity::Bounded(capacity));
        set.toggle_all();
        let id = ItemId::new(format!("item-{pick}"));

        if set.is_selected(&id) {
            prop_assert_eq!(set.toggle(&id), Toggle::Deselected);
            prop_assert!(!set.is_selected(&id));
        } else {
            prop_assert_eq!(set.toggle(&id), Toggle::Ignored);
        }
    }

    /// Two toggles of the same id with room to spare leave the set unchanged.
    #[test]
    fn prop_double_toggle_is_identity(pick in 0usize..10, seed in prop::collection::vec(0usize..10, 0..4)) {
        let mut set = SelectionSet::new(pool(), Capacity::Unbounded)
            .with_selected(seed.into_iter().map(|i| ItemId::new(format!("item-{i}"))));
        let before = set.selected_ids().to_vec();
        let id = ItemId::new(format!("item-{pick}"));

        set.toggle(&id);
        set.toggle(&id);

        let mut after = set.selected_ids().to_vec();
        let mut expected = before;
        after.sort();
        expected.sort();
        prop_assert_eq!(after, expected);
    }
}
