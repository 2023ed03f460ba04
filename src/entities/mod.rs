// Entity Models - the concrete entity types references can point at
//
// Each entity type has:
// - Stable identity (UUID) that doubles as its reference id
// - A resolver that recognises it and fetches it back from an EntityStore
//
// The registry built here is the process-wide one: installed once at startup,
// read-only afterwards.

pub mod account;
pub mod bank;
pub mod category;
pub mod merchant;

pub use account::{Account, AccountResolver, AccountType};
pub use bank::{Bank, BankResolver, BankType};
pub use category::{Category, CategoryResolver, CategoryType};
pub use merchant::{Merchant, MerchantResolver, MerchantType};

use crate::error::{ReferenceError, Result};
use crate::reference::ReferenceDict;
use crate::registry::ResolverRegistry;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// ENTITY
// ============================================================================

/// Any entity a reference can point at, tagged by its type key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type_key", rename_all = "lowercase")]
pub enum Entity {
    Bank(Bank),
    Merchant(Merchant),
    Account(Account),
    Category(Category),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Bank(b) => &b.id,
            Entity::Merchant(m) => &m.id,
            Entity::Account(a) => &a.id,
            Entity::Category(c) => &c.id,
        }
    }

    pub fn type_key(&self) -> &'static str {
        match self {
            Entity::Bank(_) => bank::TYPE_KEY,
            Entity::Merchant(_) => merchant::TYPE_KEY,
            Entity::Account(_) => account::TYPE_KEY,
            Entity::Category(_) => category::TYPE_KEY,
        }
    }

    /// Human-readable name, whatever the entity type calls it
    pub fn display_name(&self) -> &str {
        match self {
            Entity::Bank(b) => &b.canonical_name,
            Entity::Merchant(m) => &m.canonical_name,
            Entity::Account(a) => &a.name,
            Entity::Category(c) => &c.name,
        }
    }

    /// Sub-kind label, e.g. "Credit Card" for a bank or "Expense" for a category
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Bank(b) => b.bank_type.as_str(),
            Entity::Merchant(m) => m.merchant_type.as_str(),
            Entity::Account(a) => a.account_type.as_str(),
            Entity::Category(c) => c.category_type.as_str(),
        }
    }

    /// References this entity holds to other entities (account -> bank, category -> parent)
    pub fn linked_references(&self) -> Vec<(&'static str, ReferenceDict)> {
        match self {
            Entity::Account(a) => vec![("bank", a.bank_reference())],
            Entity::Category(c) => c
                .parent_reference()
                .map(|parent| vec![("parent", parent)])
                .unwrap_or_default(),
            Entity::Bank(_) | Entity::Merchant(_) => Vec::new(),
        }
    }
}

impl From<Bank> for Entity {
    fn from(bank: Bank) -> Self {
        Entity::Bank(bank)
    }
}

impl From<Merchant> for Entity {
    fn from(merchant: Merchant) -> Self {
        Entity::Merchant(merchant)
    }
}

impl From<Account> for Entity {
    fn from(account: Account) -> Self {
        Entity::Account(account)
    }
}

impl From<Category> for Entity {
    fn from(category: Category) -> Self {
        Entity::Category(category)
    }
}

// ============================================================================
// STORAGE COLLABORATOR
// ============================================================================

/// Storage layer the resolvers call into
pub trait EntityStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under (type_key, id)
    fn fetch(&self, type_key: &str, id: &str) -> anyhow::Result<Option<Entity>>;

    /// Insert or replace an entity
    fn put(&self, entity: &Entity) -> anyhow::Result<()>;
}

/// Fetch through the store, mapping its outcome onto reference errors
pub(crate) fn fetch_from_store(
    store: &dyn EntityStore,
    type_key: &str,
    id: &str,
) -> Result<Entity> {
    let entity = store
        .fetch(type_key, id)
        .map_err(|e| ReferenceError::Storage(format!("{:#}", e)))?
        .ok_or_else(|| ReferenceError::not_found(type_key, id))?;

    if entity.type_key() != type_key {
        return Err(ReferenceError::Storage(format!(
            "store returned a {} for {{\"{}\": \"{}\"}}",
            entity.type_key(),
            type_key,
            id
        )));
    }

    Ok(entity)
}

// ============================================================================
// REGISTRY SETUP
// ============================================================================

/// Every built-in type key, in default match order
pub const DEFAULT_ORDER: [&str; 4] = [
    bank::TYPE_KEY,
    merchant::TYPE_KEY,
    account::TYPE_KEY,
    category::TYPE_KEY,
];

/// Registry with every built-in resolver, in `DEFAULT_ORDER`
pub fn default_registry(store: Arc<dyn EntityStore>) -> Result<ResolverRegistry<Entity>> {
    registry_with_order(store, &DEFAULT_ORDER[..])
}

/// Registry with the named resolvers, registered in the given order
pub fn registry_with_order<S: AsRef<str>>(
    store: Arc<dyn EntityStore>,
    order: &[S],
) -> Result<ResolverRegistry<Entity>> {
    let mut registry = ResolverRegistry::new();

    for type_key in order {
        let store = Arc::clone(&store);
        match type_key.as_ref() {
            bank::TYPE_KEY => registry.register(BankResolver::new(store))?,
            merchant::TYPE_KEY => registry.register(MerchantResolver::new(store))?,
            account::TYPE_KEY => registry.register(AccountResolver::new(store))?,
            category::TYPE_KEY => registry.register(CategoryResolver::new(store))?,
            other => {
                return Err(ReferenceError::UnregisteredType(format!(
                    "type key '{}' (no built-in resolver)",
                    other
                )))
            }
        }
    }

    Ok(registry)
}

static REGISTRY: OnceCell<Arc<ResolverRegistry<Entity>>> = OnceCell::new();

/// Install the process-wide registry; only the first call succeeds
pub fn install_registry(
    registry: ResolverRegistry<Entity>,
) -> std::result::Result<Arc<ResolverRegistry<Entity>>, ResolverRegistry<Entity>> {
    if let Err(rejected) = REGISTRY.set(Arc::new(registry)) {
        return Err(Arc::try_unwrap(rejected).unwrap_or_default());
    }

    let shared = REGISTRY.get().cloned().unwrap_or_default();
    tracing::info!(resolvers = shared.len(), "installed resolver registry");
    Ok(shared)
}

/// The process-wide registry, if installed
pub fn installed_registry() -> Option<Arc<ResolverRegistry<Entity>>> {
    REGISTRY.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry(Arc::new(MemoryStore::new())).unwrap();
        let keys: Vec<&str> = registry.type_keys().collect();
        assert_eq!(keys, vec!["bank", "merchant", "account", "category"]);
    }

    #[test]
    fn test_registry_with_custom_order() {
        let order = vec!["category".to_string(), "bank".to_string()];
        let registry = registry_with_order(Arc::new(MemoryStore::new()), order.as_slice()).unwrap();
        let keys: Vec<&str> = registry.type_keys().collect();
        assert_eq!(keys, vec!["category", "bank"]);
    }

    #[test]
    fn test_registry_with_unknown_or_duplicate_key() {
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());

        let unknown = registry_with_order(Arc::clone(&store), &["bank", "user"][..]);
        assert!(matches!(unknown, Err(ReferenceError::UnregisteredType(_))));

        let duplicate = registry_with_order(store, &["bank", "bank"][..]);
        assert_eq!(
            duplicate.unwrap_err(),
            ReferenceError::DuplicateTypeKey("bank".to_string())
        );
    }

    #[test]
    fn test_entity_json_is_tagged_by_type_key() {
        let bank = Bank::new("Wise".to_string(), "UK".to_string(), BankType::PaymentProcessor);
        let entity = Entity::from(bank.clone());

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type_key"], "bank");
        assert_eq!(json["canonical_name"], "Wise");

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, Entity::Bank(bank));
    }

    #[test]
    fn test_round_trip_through_registry() {
        let store = Arc::new(MemoryStore::new());
        let merchant = Merchant::new("Starbucks".to_string(), MerchantType::Restaurant, None);
        let entity = Entity::from(merchant);
        store.put(&entity).unwrap();

        let registry = default_registry(store).unwrap();
        let reference = registry.reference_entity(&entity, true).unwrap().unwrap();
        assert_eq!(reference, ReferenceDict::new("merchant", entity.id()));

        let proxy = registry.resolve_entity_proxy(&reference).unwrap();
        assert_eq!(proxy.resolve().unwrap(), &entity);
    }

    #[test]
    fn test_entity_kind_labels() {
        let card = Bank::new("Apple Card".to_string(), "US".to_string(), BankType::CreditCard);
        let uber = Merchant::new("Uber".to_string(), MerchantType::OnlineService, None);
        let savings = Account::new(
            "Wise EUR".to_string(),
            "*9876".to_string(),
            card.id.clone(),
            AccountType::Savings,
            "EUR".to_string(),
        );
        let salary = Category::new("Salary".to_string(), None, CategoryType::Income);

        assert_eq!(Entity::from(card).kind(), "Credit Card");
        assert_eq!(Entity::from(uber).kind(), "Online Service");
        assert_eq!(Entity::from(savings).kind(), "Savings");
        assert_eq!(Entity::from(salary).kind(), "Income");
    }

    #[test]
    fn test_linked_references() {
        let bank = Bank::new("Scotiabank".to_string(), "MX".to_string(), BankType::Checking);
        let account = Account::new(
            "Scotia Checking *4321".to_string(),
            "*4321".to_string(),
            bank.id.clone(),
            AccountType::Checking,
            "MXN".to_string(),
        );
        let food = Category::new("Food & Dining".to_string(), None, CategoryType::Expense);
        let groceries = Category::new(
            "Groceries".to_string(),
            Some(food.id.clone()),
            CategoryType::Expense,
        );

        assert_eq!(
            Entity::from(account).linked_references(),
            vec![("bank", ReferenceDict::new("bank", bank.id.clone()))]
        );
        assert_eq!(
            Entity::from(groceries).linked_references(),
            vec![("parent", ReferenceDict::new("category", food.id.clone()))]
        );
        assert!(Entity::from(food).linked_references().is_empty());
        assert!(Entity::from(bank).linked_references().is_empty());
    }

    #[test]
    fn test_install_registry_only_once() {
        let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());

        let installed = install_registry(default_registry(Arc::clone(&store)).unwrap()).unwrap();
        assert_eq!(installed.len(), 4);

        let rejected = install_registry(registry_with_order(store, &["bank"][..]).unwrap())
            .unwrap_err();
        assert_eq!(rejected.len(), 1);

        let global = installed_registry().unwrap();
        assert!(Arc::ptr_eq(&global, &installed));
        assert_eq!(global.type_keys().collect::<Vec<_>>(), DEFAULT_ORDER.to_vec());
    }

    #[test]
    fn test_store_type_mismatch_is_a_storage_error() {
        struct LyingStore;

        impl EntityStore for LyingStore {
            fn fetch(&self, _type_key: &str, _id: &str) -> anyhow::Result<Option<Entity>> {
                Ok(Some(Entity::from(Category::new(
                    "Food".to_string(),
                    None,
                    CategoryType::Expense,
                ))))
            }

            fn put(&self, _entity: &Entity) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let result = fetch_from_store(&LyingStore, "bank", "x");
        assert!(matches!(result, Err(ReferenceError::Storage(_))));
    }

    #[test]
    fn test_store_failure_is_a_storage_error() {
        struct BrokenStore;

        impl EntityStore for BrokenStore {
            fn fetch(&self, _type_key: &str, _id: &str) -> anyhow::Result<Option<Entity>> {
                anyhow::bail!("database is locked")
            }

            fn put(&self, _entity: &Entity) -> anyhow::Result<()> {
                anyhow::bail!("database is locked")
            }
        }

        let result = fetch_from_store(&BrokenStore, "bank", "x");
        assert_eq!(
            result,
            Err(ReferenceError::Storage("database is locked".to_string()))
        );
    }
}
