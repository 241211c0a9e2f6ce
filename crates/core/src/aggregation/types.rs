//! Aggregation domain types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use dashbank_shared::types::{CurrencyCode, ItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::format::{format_grouped, format_plain};

/// Kind of a collection item.
///
/// The document store returns heterogeneous shapes per collection; the kind
/// is the discriminator every consumer matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Current or savings account.
    Account,
    /// Debit or credit card.
    Card,
    /// Term deposit.
    Deposit,
    /// Scheduled or past payment.
    Payment,
    /// Liability (loan instalment, overdraft).
    Liability,
    /// Credit product.
    Credit,
    /// Currency quote row.
    Currency,
    /// Account or deposit movement.
    Transaction,
}

impl ItemKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Card => "card",
            Self::Deposit => "deposit",
            Self::Payment => "payment",
            Self::Liability => "liability",
            Self::Credit => "credit",
            Self::Currency => "currency",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of reading a balance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Field absent from the item.
    Missing,
    /// Field parsed as a decimal.
    Amount(Decimal),
    /// Field present but not a decimal.
    Malformed,
}

/// One item of a fetched collection.
///
/// Balance fields are kept as the strings the store returned and parsed on
/// demand, so a single bad field does not reject the whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialItem {
    /// Item key.
    pub id: ItemId,
    /// Discriminator.
    pub kind: ItemKind,
    /// Currency of every balance field.
    pub currency: CurrencyCode,
    /// Display label, if the store provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Named decimal strings (`availableBalance`, `currentBalance`, ...).
    #[serde(default)]
    pub balance_fields: BTreeMap<String, String>,
}

impl FinancialItem {
    /// Creates an item without balance fields.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, kind: ItemKind, currency: CurrencyCode) -> Self {
        Self {
            id: id.into(),
            kind,
            currency,
            label: None,
            balance_fields: BTreeMap::new(),
        }
    }

    /// Adds a balance field.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.balance_fields
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Reads a balance field as a decimal.
    #[must_use]
    pub fn amount(&self, field: &str) -> FieldValue {
        match self.balance_fields.get(field) {
            None => FieldValue::Missing,
            Some(raw) => Decimal::from_str(raw.trim())
                .map_or(FieldValue::Malformed, FieldValue::Amount),
        }
    }
}

/// Which items and fields feed one sum.
///
/// The sum is `asset - liability` per item; a missing liability field counts
/// as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumSpec {
    /// Items of this kind participate.
    pub kind: ItemKind,
    /// Field holding the positive amount.
    pub asset: String,
    /// Field subtracted from the asset, if any.
    pub liability: Option<String>,
}

impl SumSpec {
    /// Creates a spec summing a single field.
    #[must_use]
    pub fn asset(kind: ItemKind, field: &str) -> Self {
        Self {
            kind,
            asset: field.to_string(),
            liability: None,
        }
    }

    /// Creates a spec summing `asset - liability`.
    #[must_use]
    pub fn net(kind: ItemKind, asset: &str, liability: &str) -> Self {
        Self {
            kind,
            asset: asset.to_string(),
            liability: Some(liability.to_string()),
        }
    }
}

/// Field layout for the dashboard totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsLayout {
    /// Card availability net of outstanding balance.
    pub net_availability: SumSpec,
    /// Account balances.
    pub current_balance: SumSpec,
    /// Fees due, subtracted from total net funds.
    pub fees_due: SumSpec,
}

impl Default for TotalsLayout {
    fn default() -> Self {
        Self {
            net_availability: SumSpec::net(
                ItemKind::Card,
                "availableBalance",
                "outstandingBalance",
            ),
            current_balance: SumSpec::asset(ItemKind::Account, "currentBalance"),
            fees_due: SumSpec::asset(ItemKind::Card, "feesDue"),
        }
    }
}

/// How an aggregate renders as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// `1234567.50`
    Plain,
    /// `1 234 567.50`
    #[default]
    Grouped,
}

/// A derived total in base currency.
///
/// `value` keeps full precision; rounding happens in [`AggregateTotal::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTotal {
    /// Unrounded value in base currency.
    pub value: Decimal,
    /// Serialization mode.
    pub mode: RenderMode,
}

impl AggregateTotal {
    /// Creates a total rendered with space grouping.
    #[must_use]
    pub const fn grouped(value: Decimal) -> Self {
        Self {
            value,
            mode: RenderMode::Grouped,
        }
    }

    /// Returns the same total in another mode.
    #[must_use]
    pub const fn with_mode(self, mode: RenderMode) -> Self {
        Self { mode, ..self }
    }

    /// Renders the total at 2 fraction digits.
    #[must_use]
    pub fn render(&self) -> String {
        match self.mode {
            RenderMode::Plain => format_plain(self.value),
            RenderMode::Grouped => format_grouped(self.value),
        }
    }
}

/// Non-fatal conditions met while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AggregationWarning {
    /// The rate source failed; only base-currency items were counted.
    RatesUnavailable,
    /// An item's currency is missing from the rate table.
    #[serde(rename_all = "camelCase")]
    UnconvertibleCurrency {
        /// Skipped item.
        item_id: ItemId,
        /// Its currency.
        currency: CurrencyCode,
    },
    /// A balance field could not be parsed as a decimal.
    #[serde(rename_all = "camelCase")]
    MalformedAmount {
        /// Skipped item.
        item_id: ItemId,
        /// Offending field.
        field: String,
    },
    /// An amount or running sum left the `Decimal` range; the item was skipped.
    #[serde(rename_all = "camelCase")]
    AmountOverflow {
        /// Skipped item.
        item_id: ItemId,
    },
    /// Total net funds saturated at the `Decimal` bounds.
    TotalOverflow,
}

/// Dashboard totals in base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Σ (card availability - outstanding).
    pub net_availability: AggregateTotal,
    /// Σ account balances.
    pub current_balance: AggregateTotal,
    /// net availability + current balance - fees due.
    pub total_net_funds: AggregateTotal,
    /// Items left out and why; sorted and deduplicated.
    pub warnings: Vec<AggregationWarning>,
}

impl Totals {
    /// Records a warning, keeping the list sorted and unique.
    pub fn push_warning(&mut self, warning: AggregationWarning) {
        if let Err(pos) = self.warnings.binary_search(&warning) {
            self.warnings.insert(pos, warning);
        }
    }

    /// Returns true if any item was excluded or the rates were unavailable.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Flattens the totals into rendered strings.
    #[must_use]
    pub fn view(&self) -> TotalsView {
        TotalsView {
            net_availability: self.net_availability.render(),
            current_balance: self.current_balance.render(),
            total_net_funds: self.total_net_funds.render(),
            partial: self.is_partial(),
        }
    }
}

/// Rendered totals handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    /// Rendered net availability.
    pub net_availability: String,
    /// Rendered current balance.
    pub current_balance: String,
    /// Rendered total net funds.
    pub total_net_funds: String,
    /// True when some items were excluded.
    pub partial: bool,
}
