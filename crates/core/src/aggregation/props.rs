//! Property-based tests for aggregation.
//!
//! - Base-only collections sum exactly
//! - Recomputing on unchanged inputs renders byte-identical output
//! - An empty rate table counts base-currency items only

use proptest::prelude::*;
use rust_decimal::Decimal;

use dashbank_shared::types::CurrencyCode;

use super::engine::compute_totals;
use super::format::format_grouped;
use super::types::{FinancialItem, ItemKind};
use crate::currency::{ExchangeRateTable, ReverseRate, round_for_display};

/// Strategy to generate balances with cents (-100,000.00 to 1,000,000.00).
fn balance() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate reverse rates (0.0001 to 1000.0000).
fn reverse_rate() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn currency() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("BGN"), Just("EUR"), Just("USD"), Just("GBP")]
}

fn accounts(max: usize) -> impl Strategy<Value = Vec<(Decimal, &'static str)>> {
    prop::collection::vec((balance(), currency()), 0..max)
}

fn build(accounts: &[(Decimal, &str)]) -> Vec<FinancialItem> {
    accounts
        .iter()
        .enumerate()
        .map(|(i, (amount, code))| {
            FinancialItem::new(
                format!("acc-{i}"),
                ItemKind::Account,
                CurrencyCode::parse(code).unwrap(),
            )
            .with_field("currentBalance", &amount.to_string())
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Base-only collections equal the plain sum with nothing lost at 2 decimals.
    #[test]
    fn prop_base_only_sum_is_exact(amounts in prop::collection::vec(balance(), 0..40)) {
        let pairs: Vec<_> = amounts.iter().map(|a| (*a, "BGN")).collect();
        let totals = compute_totals(&build(&pairs), &ExchangeRateTable::empty());

        let expected: Decimal = amounts.iter().copied().sum();
        prop_assert_eq!(totals.current_balance.value, expected);
        prop_assert_eq!(round_for_display(totals.current_balance.value), expected);
        prop_assert!(totals.warnings.is_empty());
    }

    /// Recomputing with unchanged inputs renders the same bytes.
    #[test]
    fn prop_recompute_is_idempotent(
        pairs in accounts(30),
        eur in reverse_rate(),
        usd in reverse_rate(),
    ) {
        let mut table = ExchangeRateTable::empty();
        table.insert(CurrencyCode::parse("EUR").unwrap(), ReverseRate::new(eur).unwrap());
        table.insert(CurrencyCode::parse("USD").unwrap(), ReverseRate::new(usd).unwrap());
        let items = build(&pairs);

        let first = compute_totals(&items, &table);
        let second = compute_totals(&items, &table);

        prop_assert_eq!(first.view(), second.view());
        prop_assert_eq!(&first, &second);
    }

    /// With no rates, non-base items are excluded rather than zeroed.
    #[test]
    fn prop_empty_table_counts_base_only(pairs in accounts(30)) {
        let totals = compute_totals(&build(&pairs), &ExchangeRateTable::empty());

        let expected: Decimal = pairs
            .iter()
            .filter(|(_, code)| *code == "BGN")
            .map(|(amount, _)| *amount)
            .sum();
        let foreign = pairs.iter().filter(|(_, code)| *code != "BGN").count();

        prop_assert_eq!(totals.current_balance.value, expected);
        prop_assert_eq!(totals.warnings.len(), foreign);
    }

    /// Grouped output only ever contains digits, spaces, one dot and a leading sign.
    #[test]
    fn prop_grouped_format_shape(value in balance()) {
        let text = format_grouped(value);
        let unsigned = text.strip_prefix('-').unwrap_or(&text);
        let (integer, fraction) = unsigned.split_once('.').unwrap();

        prop_assert_eq!(fraction.len(), 2);
        for group in integer.split(' ').skip(1) {
            prop_assert_eq!(group.len(), 3);
        }
        prop_assert!(integer.replace(' ', "").parse::<i64>().is_ok());
    }
}
