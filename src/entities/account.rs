// 💳 Account Entity - Stable identity with Bank relationship
//
// Accounts are the one entity type that can sit on either side of a ledger
// entry: a transfer's counterparty or its funding source.

use super::{fetch_from_store, Entity, EntityStore};
use crate::error::Result;
use crate::resolver::Resolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TYPE_KEY: &str = "account";

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountType {
    /// Checking account (debit card, daily transactions)
    Checking,

    /// Savings account (interest-bearing)
    Savings,

    /// Credit card (credit line)
    Credit,

    /// Investment account (brokerage, stocks, bonds)
    Investment,

    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::Credit => "Credit",
            AccountType::Investment => "Investment",
            AccountType::Other => "Other",
        }
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// Relationship: bank_id → Bank entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,

    /// Account name (e.g., "BofA Checking *1234")
    pub name: String,

    /// Last 4 digits, masked (e.g., "*1234")
    pub account_number: String,

    pub bank_id: String,

    pub account_type: AccountType,

    /// ISO 4217 code: USD, EUR, MXN, etc.
    pub currency: String,

    pub system_time: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: String,
        account_number: String,
        bank_id: String,
        account_type: AccountType,
        currency: String,
    ) -> Self {
        Account {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            account_number,
            bank_id,
            account_type,
            currency,
            system_time: Utc::now(),
        }
    }

    /// Reference to the bank holding this account
    pub fn bank_reference(&self) -> crate::reference::ReferenceDict {
        crate::reference::ReferenceDict::new(super::bank::TYPE_KEY, self.bank_id.clone())
    }
}

// ============================================================================
// ACCOUNT RESOLVER
// ============================================================================

pub struct AccountResolver {
    store: Arc<dyn EntityStore>,
}

impl AccountResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        AccountResolver { store }
    }
}

impl Resolver<Entity> for AccountResolver {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::Account(_))
    }

    fn build_reference(&self, entity: &Entity) -> String {
        entity.id().to_string()
    }

    fn fetch_entity(&self, id: &str) -> Result<Entity> {
        fetch_from_store(self.store.as_ref(), TYPE_KEY, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{default_registry, Bank, BankType};
    use crate::store::MemoryStore;

    #[test]
    fn test_account_bank_reference_resolves() {
        let store = Arc::new(MemoryStore::new());
        let bank = Entity::from(Bank::new(
            "Scotiabank".to_string(),
            "CA".to_string(),
            BankType::Checking,
        ));
        let account = Account::new(
            "Scotia Checking *5678".to_string(),
            "*5678".to_string(),
            bank.id().to_string(),
            AccountType::Checking,
            "CAD".to_string(),
        );
        store.put(&bank).unwrap();
        store.put(&Entity::from(account.clone())).unwrap();

        let registry = default_registry(store).unwrap();
        let resolved = registry.resolve_entity(&account.bank_reference()).unwrap();
        assert_eq!(resolved, bank);
    }

    #[test]
    fn test_account_resolver_matches_only_accounts() {
        let resolver = AccountResolver::new(Arc::new(MemoryStore::new()));
        let account = Entity::from(Account::new(
            "Savings".to_string(),
            "*0001".to_string(),
            "bank-id".to_string(),
            AccountType::Savings,
            "USD".to_string(),
        ));
        let bank = Entity::from(Bank::new("Wise".to_string(), "UK".to_string(), BankType::Unknown));

        assert!(resolver.matches_entity(&account));
        assert!(!resolver.matches_entity(&bank));
    }
}
