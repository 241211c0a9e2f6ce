//! Dashboard module catalog types.

use std::fmt;
use std::str::FromStr;

use dashbank_shared::types::{ItemId, ModuleId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregation::ItemKind;

/// Dashboard module family.
///
/// Also names the collection a module lists and the preference bucket its
/// selection is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    /// Current and savings accounts.
    Accounts,
    /// Cards.
    Cards,
    /// Payments.
    Payments,
    /// Liabilities.
    Liabilities,
    /// Movements on accounts and deposits.
    Transactions,
    /// Credit products.
    Credits,
    /// Term deposits.
    Deposits,
    /// Currency quotes.
    Currencies,
}

impl ModuleType {
    /// Every module type, in catalog order.
    pub const ALL: [Self; 8] = [
        Self::Accounts,
        Self::Cards,
        Self::Payments,
        Self::Liabilities,
        Self::Transactions,
        Self::Credits,
        Self::Deposits,
        Self::Currencies,
    ];

    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Cards => "cards",
            Self::Payments => "payments",
            Self::Liabilities => "liabilities",
            Self::Transactions => "transactions",
            Self::Credits => "credits",
            Self::Deposits => "deposits",
            Self::Currencies => "currencies",
        }
    }

    /// Item kinds a visibility editor for this type offers.
    ///
    /// `Transactions` draws from accounts and deposits under one budget.
    #[must_use]
    pub const fn universe(&self) -> &'static [ItemKind] {
        match self {
            Self::Accounts => &[ItemKind::Account],
            Self::Cards => &[ItemKind::Card],
            Self::Payments => &[ItemKind::Payment],
            Self::Liabilities => &[ItemKind::Liability],
            Self::Transactions => &[ItemKind::Account, ItemKind::Deposit],
            Self::Credits => &[ItemKind::Credit],
            Self::Deposits => &[ItemKind::Deposit],
            Self::Currencies => &[ItemKind::Currency],
        }
    }

    /// Kind of the items stored in this type's own collection.
    #[must_use]
    pub const fn item_kind(&self) -> ItemKind {
        match self {
            Self::Accounts => ItemKind::Account,
            Self::Cards => ItemKind::Card,
            Self::Payments => ItemKind::Payment,
            Self::Liabilities => ItemKind::Liability,
            Self::Transactions => ItemKind::Transaction,
            Self::Credits => ItemKind::Credit,
            Self::Deposits => ItemKind::Deposit,
            Self::Currencies => ItemKind::Currency,
        }
    }

    /// Collections that must be fetched to build this type's universe.
    #[must_use]
    pub const fn source_collections(&self) -> &'static [Self] {
        match self {
            Self::Transactions => &[Self::Accounts, Self::Deposits],
            Self::Accounts => &[Self::Accounts],
            Self::Cards => &[Self::Cards],
            Self::Payments => &[Self::Payments],
            Self::Liabilities => &[Self::Liabilities],
            Self::Credits => &[Self::Credits],
            Self::Deposits => &[Self::Deposits],
            Self::Currencies => &[Self::Currencies],
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown module type: {s}"))
    }
}

/// Catalog entry for one dashboard module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescriptor {
    /// Module key.
    pub id: ModuleId,
    /// Display name.
    pub name: String,
    /// Catalog rank; 0 means unranked.
    #[serde(default)]
    pub default_order: u32,
    /// Effective rank; 0 means unset.
    #[serde(default)]
    pub order: u32,
    /// Hidden from plain users.
    #[serde(default)]
    pub is_restricted: bool,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Family, when the module lists a collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_type: Option<ModuleType>,
}

impl ModuleDescriptor {
    /// Creates an unrestricted module with the given catalog rank.
    #[must_use]
    pub fn new(id: impl Into<ModuleId>, name: impl Into<String>, default_order: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            default_order,
            order: 0,
            is_restricted: false,
            description: String::new(),
            module_type: None,
        }
    }

    /// Sets the module type.
    #[must_use]
    pub const fn with_type(mut self, module_type: ModuleType) -> Self {
        self.module_type = Some(module_type);
        self
    }

    /// Marks the module restricted.
    #[must_use]
    pub const fn restricted(mut self) -> Self {
        self.is_restricted = true;
        self
    }
}

/// Stored rank of one module for one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredOrderEntry {
    /// Module key.
    pub module_id: ModuleId,
    /// 1-based rank.
    pub order: u32,
}

impl PreferredOrderEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(module_id: impl Into<ModuleId>, order: u32) -> Self {
        Self {
            module_id: module_id.into(),
            order,
        }
    }
}

/// Items a user chose to show in one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPreference {
    /// Owner.
    pub user_id: UserId,
    /// Selected item keys.
    pub selected_ids: Vec<ItemId>,
    /// Module the selection belongs to.
    pub module_type: ModuleType,
}

/// Role the catalog is fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer.
    #[default]
    User,
    /// Staff with access to restricted modules.
    Admin,
}

impl Role {
    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Returns true if this role may see `module`.
    #[must_use]
    pub const fn can_view(&self, module: &ModuleDescriptor) -> bool {
        match self {
            Self::User => !module.is_restricted,
            Self::Admin => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("accounts", ModuleType::Accounts)]
    #[case("transactions", ModuleType::Transactions)]
    #[case("currencies", ModuleType::Currencies)]
    fn test_module_type_round_trips_through_str(#[case] s: &str, #[case] expected: ModuleType) {
        assert_eq!(s.parse::<ModuleType>().unwrap(), expected);
        assert_eq!(expected.to_string(), s);
    }

    #[test]
    fn test_unknown_module_type_is_rejected() {
        assert!("widgets".parse::<ModuleType>().is_err());
    }

    #[test]
    fn test_transactions_universe_spans_accounts_and_deposits() {
        assert_eq!(
            ModuleType::Transactions.universe(),
            &[ItemKind::Account, ItemKind::Deposit]
        );
        assert_eq!(ModuleType::Cards.universe(), &[ItemKind::Card]);
    }

    #[rstest]
    #[case(ModuleType::Accounts, ItemKind::Account)]
    #[case(ModuleType::Deposits, ItemKind::Deposit)]
    #[case(ModuleType::Currencies, ItemKind::Currency)]
    fn test_collection_item_kind(#[case] module_type: ModuleType, #[case] kind: ItemKind) {
        assert_eq!(module_type.item_kind(), kind);
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let json = r#"{"id":"m1","name":"Accounts","defaultOrder":2,"moduleType":"accounts"}"#;
        let module: ModuleDescriptor = serde_json::from_str(json).unwrap();

        assert_eq!(module.id.as_str(), "m1");
        assert_eq!(module.default_order, 2);
        assert_eq!(module.order, 0);
        assert!(!module.is_restricted);
        assert_eq!(module.module_type, Some(ModuleType::Accounts));
    }

    #[test]
    fn test_user_role_hides_restricted_modules() {
        let open = ModuleDescriptor::new("m1", "Accounts", 1);
        let closed = ModuleDescriptor::new("m2", "Audit", 2).restricted();

        assert!(Role::User.can_view(&open));
        assert!(!Role::User.can_view(&closed));
        assert!(Role::Admin.can_view(&closed));
    }

    #[rstest]
    #[case("user", Role::User)]
    #[case("Admin", Role::Admin)]
    fn test_role_parses_case_insensitively(#[case] s: &str, #[case] expected: Role) {
        assert_eq!(s.parse::<Role>().unwrap(), expected);
    }

    #[test]
    fn test_selection_preference_serializes_camel_case() {
        let pref = SelectionPreference {
            user_id: UserId::from("u1"),
            selected_ids: vec![ItemId::from("a1")],
            module_type: ModuleType::Transactions,
        };

        let json = serde_json::to_value(&pref).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "userId": "u1",
                "selectedIds": ["a1"],
                "moduleType": "transactions"
            })
        );
    }
}
