// Referenced Entity Field - validated, cached reference on a host record
//
// The field itself is shared configuration (storage key, registry, check).
// Per-record state lives on the record: the stored reference dict in its data
// map and the derived proxy in its ProxyCache. Every successful set_obj
// overwrites the dict and drops the cached proxy.
//
//   EMPTY --set_obj--> DICT_SET --get_obj--> PROXY_CACHED
//     ^                   ^                       |
//     +----set_obj(None)--+-------set_obj---------+

use crate::check::AllowedReferences;
use crate::error::{ReferenceError, Result};
use crate::proxy::EntityProxy;
use crate::reference::ReferenceDict;
use crate::registry::ResolverRegistry;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// ============================================================================
// HOST RECORD SEAM
// ============================================================================

/// What a host record must expose for referenced-entity fields to attach
pub trait Record<E> {
    /// Data map holding the stored reference dicts
    fn data(&self) -> &Map<String, Value>;

    fn data_mut(&mut self) -> &mut Map<String, Value>;

    fn proxy_cache(&self) -> &ProxyCache<E>;

    fn proxy_cache_mut(&mut self) -> &mut ProxyCache<E>;
}

/// Per-record proxy slots, one per field storage key
pub struct ProxyCache<E> {
    slots: HashMap<String, Arc<EntityProxy<E>>>,
}

impl<E> ProxyCache<E> {
    pub fn new() -> Self {
        ProxyCache {
            slots: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Arc<EntityProxy<E>>> {
        self.slots.get(key)
    }

    pub fn insert(&mut self, key: &str, proxy: Arc<EntityProxy<E>>) {
        self.slots.insert(key.to_string(), proxy);
    }

    pub fn clear(&mut self, key: &str) -> Option<Arc<EntityProxy<E>>> {
        self.slots.remove(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<E> Default for ProxyCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ProxyCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(k, p)| (k, p.reference_dict())))
            .finish()
    }
}

// ============================================================================
// FIELD VALUES & STATE
// ============================================================================

/// Anything a field accepts on assignment
pub enum FieldValue<E> {
    Entity(E),
    Proxy(Arc<EntityProxy<E>>),
    Reference(ReferenceDict),
    /// Reference dict still in JSON form; `null` means absent
    Raw(Value),
    Absent,
}

impl<E> From<ReferenceDict> for FieldValue<E> {
    fn from(reference: ReferenceDict) -> Self {
        FieldValue::Reference(reference)
    }
}

impl<E> From<Option<ReferenceDict>> for FieldValue<E> {
    fn from(reference: Option<ReferenceDict>) -> Self {
        reference.map_or(FieldValue::Absent, FieldValue::Reference)
    }
}

impl<E> From<Arc<EntityProxy<E>>> for FieldValue<E> {
    fn from(proxy: Arc<EntityProxy<E>>) -> Self {
        FieldValue::Proxy(proxy)
    }
}

impl<E> From<Value> for FieldValue<E> {
    fn from(value: Value) -> Self {
        FieldValue::Raw(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// No dict stored
    Empty,
    /// Dict stored, no proxy built yet
    DictSet,
    /// Dict stored and proxy cached (possibly resolved)
    ProxyCached,
}

// ============================================================================
// REFERENCED ENTITY FIELD
// ============================================================================

type CheckFn<R> = Box<dyn Fn(&R, Option<&ReferenceDict>) -> bool + Send + Sync>;

pub struct ReferencedEntityField<R, E> {
    key: String,
    registry: Arc<ResolverRegistry<E>>,
    check: Option<CheckFn<R>>,
}

impl<R, E> ReferencedEntityField<R, E>
where
    R: Record<E>,
    E: fmt::Debug + 'static,
{
    pub fn new(key: impl Into<String>, registry: Arc<ResolverRegistry<E>>) -> Self {
        ReferencedEntityField {
            key: key.into(),
            registry,
            check: None,
        }
    }

    /// Builder: attach a check function
    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&R, Option<&ReferenceDict>) -> bool + Send + Sync + 'static,
    {
        self.check = Some(Box::new(check));
        self
    }

    /// Builder: attach an AllowedReferences policy as the check function
    pub fn with_allowed(self, policy: AllowedReferences<R>) -> Self
    where
        R: 'static,
    {
        self.with_check(move |owner: &R, reference: Option<&ReferenceDict>| {
            policy.check(owner, reference)
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn registry(&self) -> &Arc<ResolverRegistry<E>> {
        &self.registry
    }

    /// Any reference passes when no check function is configured
    pub fn check_reference(&self, owner: &R, reference: Option<&ReferenceDict>) -> bool {
        match &self.check {
            Some(check) => check(owner, reference),
            None => true,
        }
    }

    fn normalize(&self, value: FieldValue<E>) -> Result<Option<ReferenceDict>> {
        match value {
            FieldValue::Reference(reference) => Ok(Some(reference)),
            FieldValue::Proxy(proxy) => Ok(Some(proxy.reference_dict().clone())),
            FieldValue::Entity(entity) => self.registry.reference_entity(&entity, true),
            FieldValue::Raw(Value::Null) | FieldValue::Absent => Ok(None),
            FieldValue::Raw(value) => ReferenceDict::from_value(&value).map(Some),
        }
    }

    /// Assign a reference; validates, stores the dict and clears the cache
    pub fn set_obj(&self, record: &mut R, value: impl Into<FieldValue<E>>) -> Result<()> {
        let reference = self.normalize(value.into())?;

        if !self.check_reference(record, reference.as_ref()) {
            let shown = reference
                .as_ref()
                .map_or_else(|| "null".to_string(), |r| r.to_string());
            warn!(field = %self.key, reference = %shown, "rejected reference");
            return Err(ReferenceError::InvalidReference {
                field: self.key.clone(),
                reference: shown,
            });
        }

        match &reference {
            Some(reference) => {
                record.data_mut().insert(self.key.clone(), reference.to_value());
            }
            None => {
                record.data_mut().remove(&self.key);
            }
        }

        if record.proxy_cache_mut().clear(&self.key).is_some() {
            trace!(field = %self.key, "cleared cached proxy");
        }
        debug!(field = %self.key, reference = ?reference, "stored reference");
        Ok(())
    }

    /// Read the stored dict without touching the proxy cache
    pub fn reference(&self, record: &R) -> Result<Option<ReferenceDict>> {
        match record.data().get(&self.key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => ReferenceDict::from_value(value).map(Some),
        }
    }

    /// The referenced entity as a proxy, built once and cached on the record
    pub fn get_obj(&self, record: &mut R) -> Result<Option<Arc<EntityProxy<E>>>> {
        if let Some(proxy) = record.proxy_cache().get(&self.key) {
            return Ok(Some(Arc::clone(proxy)));
        }

        let Some(reference) = self.reference(record)? else {
            return Ok(None);
        };

        let proxy = Arc::new(self.registry.resolve_entity_proxy(&reference)?);
        record.proxy_cache_mut().insert(&self.key, Arc::clone(&proxy));
        trace!(field = %self.key, %reference, "cached proxy");
        Ok(Some(proxy))
    }

    pub fn state(&self, record: &R) -> FieldState {
        if record.proxy_cache().get(&self.key).is_some() {
            FieldState::ProxyCached
        } else if matches!(record.data().get(&self.key), None | Some(Value::Null)) {
            FieldState::Empty
        } else {
            FieldState::DictSet
        }
    }
}

impl<R, E: 'static> fmt::Debug for ReferencedEntityField<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferencedEntityField")
            .field("key", &self.key)
            .field("registry", &self.registry)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}
