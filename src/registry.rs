// Resolver Registry - ordered dispatch over resolvers
//
// Built once at startup with register(), then shared read-only behind an Arc.
// Registration order is match priority: the first resolver that matches an
// entity or a reference dict wins, even if a later one would match too.

use crate::error::{ReferenceError, Result};
use crate::proxy::EntityProxy;
use crate::reference::ReferenceDict;
use crate::resolver::Resolver;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub struct ResolverRegistry<E> {
    resolvers: Vec<Arc<dyn Resolver<E>>>,
}

impl<E: 'static> ResolverRegistry<E> {
    pub fn new() -> Self {
        ResolverRegistry {
            resolvers: Vec::new(),
        }
    }

    /// Append a resolver; fails if its type key is already taken
    pub fn register<R: Resolver<E> + 'static>(&mut self, resolver: R) -> Result<()> {
        self.register_shared(Arc::new(resolver))
    }

    pub fn register_shared(&mut self, resolver: Arc<dyn Resolver<E>>) -> Result<()> {
        let type_key = resolver.type_key();
        if self.get_resolver(type_key).is_some() {
            return Err(ReferenceError::DuplicateTypeKey(type_key.to_string()));
        }

        debug!(type_key, position = self.resolvers.len(), "registered resolver");
        self.resolvers.push(resolver);
        Ok(())
    }

    /// Builder: register and return self
    pub fn with<R: Resolver<E> + 'static>(mut self, resolver: R) -> Result<Self> {
        self.register(resolver)?;
        Ok(self)
    }

    pub fn get_resolver(&self, type_key: &str) -> Option<&Arc<dyn Resolver<E>>> {
        self.resolvers.iter().find(|r| r.type_key() == type_key)
    }

    /// First resolver (in registration order) claiming the entity
    pub fn resolver_for_entity(&self, entity: &E) -> Option<&Arc<dyn Resolver<E>>> {
        self.resolvers.iter().find(|r| r.matches_entity(entity))
    }

    /// Build the reference dict for an entity.
    ///
    /// When no resolver matches, `strict` decides between `Ok(None)` and
    /// `UnregisteredType`.
    pub fn reference_entity(&self, entity: &E, strict: bool) -> Result<Option<ReferenceDict>>
    where
        E: fmt::Debug,
    {
        match self.resolver_for_entity(entity) {
            Some(resolver) => Ok(Some(resolver.reference_entity(entity))),
            None if strict => Err(ReferenceError::UnregisteredType(format!(
                "entity {:?}",
                entity
            ))),
            None => Ok(None),
        }
    }

    /// Bind a new proxy to the resolver responsible for the reference
    pub fn resolve_entity_proxy(&self, reference: &ReferenceDict) -> Result<EntityProxy<E>> {
        let resolver = self
            .resolvers
            .iter()
            .find(|r| r.matches_reference_dict(reference))
            .ok_or_else(|| {
                ReferenceError::UnregisteredType(format!("type key '{}'", reference.type_key()))
            })?;

        Ok(EntityProxy::new(Arc::clone(resolver), reference.clone()))
    }

    /// Same as `resolve_entity_proxy`, for a reference dict still in JSON form
    pub fn resolve_entity_proxy_value(&self, value: &Value) -> Result<EntityProxy<E>> {
        let reference = ReferenceDict::from_value(value)?;
        self.resolve_entity_proxy(&reference)
    }

    /// Fetch the entity behind a reference right away
    pub fn resolve_entity(&self, reference: &ReferenceDict) -> Result<E>
    where
        E: Clone,
    {
        let proxy = self.resolve_entity_proxy(reference)?;
        proxy.resolve().cloned()
    }

    pub fn type_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.resolvers.iter().map(|r| r.type_key())
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl<E: 'static> Default for ResolverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> fmt::Debug for ResolverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("type_keys", &self.type_keys().collect::<Vec<_>>())
            .finish()
    }
}
