//! Aggregation engine: converts per-item balances into base-currency totals.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::types::{
    AggregateTotal, AggregationWarning, FieldValue, FinancialItem, SumSpec, Totals, TotalsLayout,
};
use crate::currency::{ConversionError, ExchangeRateTable, try_convert_to_base};

/// Computes dashboard totals from a snapshot of items and a rate table.
///
/// Items whose currency is neither base nor in the table, or whose amounts
/// fall outside the `Decimal` range, are skipped for the affected sum and
/// reported as warnings. Sums keep full decimal precision.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    layout: TotalsLayout,
}

impl AggregationEngine {
    /// Creates an engine with a custom field layout.
    #[must_use]
    pub const fn new(layout: TotalsLayout) -> Self {
        Self { layout }
    }

    /// Returns the field layout.
    #[must_use]
    pub const fn layout(&self) -> &TotalsLayout {
        &self.layout
    }

    /// Sums `asset - liability` over items matching `spec`, converted to base.
    ///
    /// Skipped items are appended to `warnings`.
    pub fn sum_converted(
        &self,
        items: &[FinancialItem],
        spec: &SumSpec,
        table: &ExchangeRateTable,
        warnings: &mut Vec<AggregationWarning>,
    ) -> Decimal {
        let mut total = Decimal::ZERO;

        for item in items.iter().filter(|item| item.kind == spec.kind) {
            let Some(net) = Self::net_amount(item, spec, warnings) else {
                continue;
            };

            let converted = match try_convert_to_base(net, &item.currency, table) {
                Ok(converted) => converted,
                Err(ConversionError::NoRate) => {
                    debug!(
                        item_id = %item.id,
                        currency = %item.currency,
                        "Skipping item without exchange rate"
                    );
                    warnings.push(AggregationWarning::UnconvertibleCurrency {
                        item_id: item.id.clone(),
                        currency: item.currency.clone(),
                    });
                    continue;
                }
                Err(ConversionError::Overflow) => {
                    warnings.push(Self::overflow(item));
                    continue;
                }
            };

            match total.checked_add(converted) {
                Some(sum) => total = sum,
                None => warnings.push(Self::overflow(item)),
            }
        }

        total
    }

    /// Computes net availability, current balance and total net funds.
    #[must_use]
    pub fn compute_totals(&self, items: &[FinancialItem], table: &ExchangeRateTable) -> Totals {
        let mut warnings = Vec::new();

        let net_availability =
            self.sum_converted(items, &self.layout.net_availability, table, &mut warnings);
        let current_balance =
            self.sum_converted(items, &self.layout.current_balance, table, &mut warnings);
        let fees_due = self.sum_converted(items, &self.layout.fees_due, table, &mut warnings);

        let total_net_funds = net_availability
            .checked_add(current_balance)
            .and_then(|sum| sum.checked_sub(fees_due))
            .unwrap_or_else(|| {
                warnings.push(AggregationWarning::TotalOverflow);
                net_availability
                    .saturating_add(current_balance)
                    .saturating_sub(fees_due)
            });

        warnings.sort();
        warnings.dedup();

        Totals {
            net_availability: AggregateTotal::grouped(net_availability),
            current_balance: AggregateTotal::grouped(current_balance),
            total_net_funds: AggregateTotal::grouped(total_net_funds),
            warnings,
        }
    }

    /// Reads `asset - liability` for one item in its own currency.
    ///
    /// A missing field counts as zero; a malformed one excludes the item.
    fn net_amount(
        item: &FinancialItem,
        spec: &SumSpec,
        warnings: &mut Vec<AggregationWarning>,
    ) -> Option<Decimal> {
        let asset = Self::field_or_zero(item, &spec.asset, warnings)?;
        let liability = match &spec.liability {
            Some(field) => Self::field_or_zero(item, field, warnings)?,
            None => Decimal::ZERO,
        };
        let net = asset.checked_sub(liability);
        if net.is_none() {
            warnings.push(Self::overflow(item));
        }
        net
    }

    fn overflow(item: &FinancialItem) -> AggregationWarning {
        warn!(item_id = %item.id, currency = %item.currency, "Amount out of range, skipping item");
        AggregationWarning::AmountOverflow {
            item_id: item.id.clone(),
        }
    }

    fn field_or_zero(
        item: &FinancialItem,
        field: &str,
        warnings: &mut Vec<AggregationWarning>,
    ) -> Option<Decimal> {
        match item.amount(field) {
            FieldValue::Amount(value) => Some(value),
            FieldValue::Missing => Some(Decimal::ZERO),
            FieldValue::Malformed => {
                warnings.push(AggregationWarning::MalformedAmount {
                    item_id: item.id.clone(),
                    field: field.to_string(),
                });
                None
            }
        }
    }
}

/// Computes totals with the default field layout.
#[must_use]
pub fn compute_totals(items: &[FinancialItem], table: &ExchangeRateTable) -> Totals {
    AggregationEngine::default().compute_totals(items, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::types::ItemKind;
    use crate::currency::ReverseRate;
    use dashbank_shared::types::CurrencyCode;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn eur_table() -> ExchangeRateTable {
        let mut table = ExchangeRateTable::empty();
        table.insert(code("EUR"), ReverseRate::new(dec!(0.511292)).unwrap());
        table
    }

    fn account(id: &str, currency: &str, balance: &str) -> FinancialItem {
        FinancialItem::new(id, ItemKind::Account, code(currency)).with_field("currentBalance", balance)
    }

    fn card(id: &str, currency: &str, available: &str, outstanding: &str) -> FinancialItem {
        FinancialItem::new(id, ItemKind::Card, code(currency))
            .with_field("availableBalance", available)
            .with_field("outstandingBalance", outstanding)
    }

    #[test]
    fn test_mixed_currency_current_balance() {
        let items = vec![account("a1", "BGN", "100"), account("a2", "EUR", "50")];

        let totals = compute_totals(&items, &eur_table());

        assert_eq!(totals.current_balance.render(), "197.79");
        assert!(totals.warnings.is_empty());
    }

    #[test]
    fn test_empty_table_counts_base_only() {
        let items = vec![
            account("a1", "BGN", "100"),
            account("a2", "EUR", "50"),
            card("c1", "BGN", "300", "120.25"),
            card("c2", "USD", "10", "0"),
        ];

        let totals = compute_totals(&items, &ExchangeRateTable::empty());

        assert_eq!(totals.current_balance.value, dec!(100));
        assert_eq!(totals.net_availability.value, dec!(179.75));
        assert_eq!(totals.total_net_funds.value, dec!(279.75));
        assert_eq!(
            totals.warnings,
            vec![
                AggregationWarning::UnconvertibleCurrency {
                    item_id: "a2".into(),
                    currency: code("EUR"),
                },
                AggregationWarning::UnconvertibleCurrency {
                    item_id: "c2".into(),
                    currency: code("USD"),
                },
            ]
        );
    }

    #[test]
    fn test_fees_due_reduce_total_net_funds() {
        let items = vec![
            account("a1", "BGN", "1000"),
            card("c1", "BGN", "500", "200").with_field("feesDue", "12.50"),
        ];

        let totals = compute_totals(&items, &ExchangeRateTable::empty());

        assert_eq!(totals.net_availability.value, dec!(300));
        assert_eq!(totals.current_balance.value, dec!(1000));
        assert_eq!(totals.total_net_funds.value, dec!(1287.50));
        assert_eq!(totals.total_net_funds.render(), "1 287.50");
    }

    #[test]
    fn test_malformed_field_skips_item_only() {
        let items = vec![account("a1", "BGN", "12,00"), account("a2", "BGN", "8.00")];

        let totals = compute_totals(&items, &ExchangeRateTable::empty());

        assert_eq!(totals.current_balance.value, dec!(8));
        assert_eq!(
            totals.warnings,
            vec![AggregationWarning::MalformedAmount {
                item_id: "a1".into(),
                field: "currentBalance".into(),
            }]
        );
    }

    #[test]
    fn test_other_kinds_are_ignored() {
        let deposit = FinancialItem::new("d1", ItemKind::Deposit, code("BGN"))
            .with_field("currentBalance", "5000");

        let totals = compute_totals(&[deposit], &ExchangeRateTable::empty());

        assert_eq!(totals.current_balance.value, Decimal::ZERO);
        assert_eq!(totals.total_net_funds.render(), "0.00");
    }

    #[test]
    fn test_sum_overflow_skips_item_and_keeps_rendering() {
        let huge = "70000000000000000000000000000";
        let items = vec![
            account("a1", "BGN", huge),
            account("a2", "BGN", huge),
            account("a3", "BGN", "5"),
        ];

        let totals = compute_totals(&items, &ExchangeRateTable::empty());

        assert_eq!(totals.current_balance.value, dec!(70000000000000000000000000005));
        assert_eq!(
            totals.warnings,
            vec![AggregationWarning::AmountOverflow {
                item_id: "a2".into()
            }]
        );
    }

    #[test]
    fn test_net_overflow_skips_card() {
        let items = vec![
            card("c1", "BGN", "70000000000000000000000000000", "-70000000000000000000000000000"),
            card("c2", "BGN", "10", "4"),
        ];

        let totals = compute_totals(&items, &ExchangeRateTable::empty());

        assert_eq!(totals.net_availability.value, dec!(6));
        assert_eq!(
            totals.warnings,
            vec![AggregationWarning::AmountOverflow {
                item_id: "c1".into()
            }]
        );
    }

    #[test]
    fn test_total_net_funds_saturates() {
        let items = vec![
            account("a1", "BGN", "70000000000000000000000000000"),
            card("c1", "BGN", "70000000000000000000000000000", "0"),
        ];

        let totals = compute_totals(&items, &ExchangeRateTable::empty());

        assert_eq!(totals.total_net_funds.value, Decimal::MAX);
        assert_eq!(totals.warnings, vec![AggregationWarning::TotalOverflow]);
        assert!(!totals.total_net_funds.render().is_empty());
    }

    #[test]
    fn test_tiny_rate_reports_overflow_not_missing_rate() {
        let mut table = ExchangeRateTable::empty();
        table.insert(
            code("XAU"),
            ReverseRate::new(dec!(0.0000000000000000000000000001)).unwrap(),
        );
        let items = vec![account("a1", "XAU", "1000"), account("a2", "BGN", "1")];

        let totals = compute_totals(&items, &table);

        assert_eq!(totals.current_balance.value, dec!(1));
        assert_eq!(
            totals.warnings,
            vec![AggregationWarning::AmountOverflow {
                item_id: "a1".into()
            }]
        );
    }

    #[test]
    fn test_intermediate_sums_keep_precision() {
        // Rounding each converted item first would report 0.03
        let mut table = ExchangeRateTable::empty();
        table.insert(code("EUR"), ReverseRate::new(dec!(3)).unwrap());
        let items = vec![
            account("a1", "EUR", "0.02"),
            account("a2", "EUR", "0.02"),
            account("a3", "EUR", "0.02"),
        ];

        let totals = compute_totals(&items, &table);

        assert_eq!(totals.current_balance.render(), "0.02");
        assert!(totals.current_balance.value > dec!(0.0199));
    }
}
