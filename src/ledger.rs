// Ledger entries - host records carrying entity references
//
// A ledger entry points at up to three entities:
// - counterparty:   who the money went to / came from (merchant or account)
// - funding_source: where the money was held (bank or account)
// - category:       how the entry is classified
//
// Which entity types (and whether absence) each role accepts is decided by
// the entry's EntryType, so one field definition serves every entry type.

use crate::check::AllowedReferences;
use crate::entities::Entity;
use crate::error::Result;
use crate::field::{FieldValue, ProxyCache, Record, ReferencedEntityField};
use crate::proxy::EntityProxy;
use crate::registry::ResolverRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const COUNTERPARTY: &str = "counterparty";
pub const FUNDING_SOURCE: &str = "funding_source";
pub const CATEGORY: &str = "category";

// ============================================================================
// ENTRY TYPES
// ============================================================================

/// Which references one role on an entry accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePolicy {
    #[serde(default)]
    pub allows_none: bool,

    pub allowed_types: Vec<String>,
}

impl ReferencePolicy {
    pub fn new(allows_none: bool, allowed_types: &[&str]) -> Self {
        ReferencePolicy {
            allows_none,
            allowed_types: allowed_types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryType {
    /// e.g. "purchase", "transfer", "income"
    pub name: String,
    pub counterparty: ReferencePolicy,
    pub funding_source: ReferencePolicy,
    pub category: ReferencePolicy,
}

impl EntryType {
    /// Card or account purchase at a merchant
    pub fn purchase() -> Self {
        EntryType {
            name: "purchase".to_string(),
            counterparty: ReferencePolicy::new(false, &["merchant"]),
            funding_source: ReferencePolicy::new(false, &["bank", "account"]),
            category: ReferencePolicy::new(true, &["category"]),
        }
    }

    /// Money moved between two accounts
    pub fn transfer() -> Self {
        EntryType {
            name: "transfer".to_string(),
            counterparty: ReferencePolicy::new(false, &["account"]),
            funding_source: ReferencePolicy::new(false, &["account"]),
            category: ReferencePolicy::new(true, &["category"]),
        }
    }

    /// Money received; the payer may be unknown
    pub fn income() -> Self {
        EntryType {
            name: "income".to_string(),
            counterparty: ReferencePolicy::new(true, &["merchant", "account"]),
            funding_source: ReferencePolicy::new(false, &["bank", "account"]),
            category: ReferencePolicy::new(false, &["category"]),
        }
    }

    pub fn builtins() -> Vec<EntryType> {
        vec![Self::purchase(), Self::transfer(), Self::income()]
    }
}

// ============================================================================
// CHECK FUNCTIONS
// ============================================================================

pub fn counterparty_check() -> AllowedReferences<LedgerEntry> {
    AllowedReferences::<LedgerEntry>::new(
        |e| e.entry_type.counterparty.allows_none,
        |e| e.entry_type.counterparty.allowed_types.as_slice(),
    )
}

pub fn funding_source_check() -> AllowedReferences<LedgerEntry> {
    AllowedReferences::<LedgerEntry>::new(
        |e| e.entry_type.funding_source.allows_none,
        |e| e.entry_type.funding_source.allowed_types.as_slice(),
    )
}

pub fn category_check() -> AllowedReferences<LedgerEntry> {
    AllowedReferences::<LedgerEntry>::new(
        |e| e.entry_type.category.allows_none,
        |e| e.entry_type.category.allowed_types.as_slice(),
    )
}

// ============================================================================
// LEDGER ENTRY
// ============================================================================

#[derive(Debug)]
pub struct LedgerEntry {
    pub id: String,
    pub entry_type: EntryType,
    data: Map<String, Value>,
    cache: ProxyCache<Entity>,
}

impl LedgerEntry {
    pub fn new(entry_type: EntryType) -> Self {
        LedgerEntry {
            id: uuid::Uuid::new_v4().to_string(),
            entry_type,
            data: Map::new(),
            cache: ProxyCache::new(),
        }
    }

    /// Rebuild an entry from stored data; references are parsed lazily on read
    pub fn from_data(id: String, entry_type: EntryType, data: Map<String, Value>) -> Self {
        LedgerEntry {
            id,
            entry_type,
            data,
            cache: ProxyCache::new(),
        }
    }

    /// Stored data, reference dicts included, as JSON
    pub fn to_json(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

impl Record<Entity> for LedgerEntry {
    fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    fn proxy_cache(&self) -> &ProxyCache<Entity> {
        &self.cache
    }

    fn proxy_cache_mut(&mut self) -> &mut ProxyCache<Entity> {
        &mut self.cache
    }
}

/// The three referenced-entity fields of a ledger entry
pub struct LedgerFields {
    pub counterparty: ReferencedEntityField<LedgerEntry, Entity>,
    pub funding_source: ReferencedEntityField<LedgerEntry, Entity>,
    pub category: ReferencedEntityField<LedgerEntry, Entity>,
}

impl LedgerFields {
    pub fn new(registry: Arc<ResolverRegistry<Entity>>) -> Self {
        LedgerFields {
            counterparty: ReferencedEntityField::new(COUNTERPARTY, Arc::clone(&registry))
                .with_allowed(counterparty_check()),
            funding_source: ReferencedEntityField::new(FUNDING_SOURCE, Arc::clone(&registry))
                .with_allowed(funding_source_check()),
            category: ReferencedEntityField::new(CATEGORY, registry)
                .with_allowed(category_check()),
        }
    }

    /// Look a field up by its storage key
    pub fn by_key(&self, key: &str) -> Option<&ReferencedEntityField<LedgerEntry, Entity>> {
        match key {
            COUNTERPARTY => Some(&self.counterparty),
            FUNDING_SOURCE => Some(&self.funding_source),
            CATEGORY => Some(&self.category),
            _ => None,
        }
    }

    /// Set all three references in one go; stops at the first rejected value
    pub fn assign(
        &self,
        entry: &mut LedgerEntry,
        counterparty: FieldValue<Entity>,
        funding_source: FieldValue<Entity>,
        category: FieldValue<Entity>,
    ) -> Result<()> {
        self.counterparty.set_obj(entry, counterparty)?;
        self.funding_source.set_obj(entry, funding_source)?;
        self.category.set_obj(entry, category)?;
        Ok(())
    }

    /// Resolve every set reference on the entry, keyed by storage key
    pub fn resolve_all(&self, entry: &mut LedgerEntry) -> Result<Vec<(&'static str, Entity)>> {
        let mut resolved = Vec::new();

        for (key, field) in [
            (COUNTERPARTY, &self.counterparty),
            (FUNDING_SOURCE, &self.funding_source),
            (CATEGORY, &self.category),
        ] {
            let proxy: Option<Arc<EntityProxy<Entity>>> = field.get_obj(entry)?;
            if let Some(proxy) = proxy {
                resolved.push((key, proxy.resolve()?.clone()));
            }
        }

        Ok(resolved)
    }
}
