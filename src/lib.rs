// Entity References - Core Library
// Polymorphic entity references: resolver registry, lazy proxies, validated fields

pub mod error;
pub mod reference;
pub mod resolver;
pub mod registry;
pub mod proxy;
pub mod check;
pub mod field;
pub mod entities;
pub mod store;
pub mod ledger;
pub mod config;

// Re-export commonly used types
pub use error::{ReferenceError, Result};
pub use reference::ReferenceDict;
pub use resolver::Resolver;
pub use registry::ResolverRegistry;
pub use proxy::EntityProxy;
pub use check::AllowedReferences;
pub use field::{FieldState, FieldValue, ProxyCache, Record, ReferencedEntityField};
pub use entities::{
    Account, AccountResolver, AccountType,
    Bank, BankResolver, BankType,
    Category, CategoryResolver, CategoryType,
    Merchant, MerchantResolver, MerchantType,
    Entity, EntityStore,
    default_registry, registry_with_order, install_registry, installed_registry,
};
pub use store::{MemoryStore, SqliteStore, seed_defaults};
pub use ledger::{EntryType, LedgerEntry, LedgerFields, ReferencePolicy};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
