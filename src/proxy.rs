// Entity Proxy - lazy handle to a referenced entity
//
// Holds the reference dict and the resolver responsible for it. The entity is
// fetched on the first resolve() and kept for the lifetime of the proxy.
// Identity is the reference dict: resolution state never affects equality.

use crate::error::Result;
use crate::reference::ReferenceDict;
use crate::resolver::Resolver;
use once_cell::sync::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

pub struct EntityProxy<E> {
    resolver: Arc<dyn Resolver<E>>,
    reference: ReferenceDict,
    entity: OnceCell<E>,
}

impl<E> EntityProxy<E> {
    /// Only the registry binds proxies to resolvers
    pub(crate) fn new(resolver: Arc<dyn Resolver<E>>, reference: ReferenceDict) -> Self {
        EntityProxy {
            resolver,
            reference,
            entity: OnceCell::new(),
        }
    }

    pub fn reference_dict(&self) -> &ReferenceDict {
        &self.reference
    }

    pub fn type_key(&self) -> &str {
        self.reference.type_key()
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Fetch the entity on first call, then serve it from the proxy.
    ///
    /// A failed fetch leaves the proxy unresolved; it is not retried here.
    pub fn resolve(&self) -> Result<&E> {
        self.entity.get_or_try_init(|| {
            debug!(
                type_key = self.reference.type_key(),
                id = self.reference.id(),
                "resolving entity"
            );
            self.resolver.fetch_entity(self.reference.id())
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.entity.get().is_some()
    }

    pub fn resolver(&self) -> &dyn Resolver<E> {
        self.resolver.as_ref()
    }
}

impl<E: Clone> Clone for EntityProxy<E> {
    fn clone(&self) -> Self {
        EntityProxy {
            resolver: Arc::clone(&self.resolver),
            reference: self.reference.clone(),
            entity: self.entity.clone(),
        }
    }
}

impl<E> PartialEq for EntityProxy<E> {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl<E> Eq for EntityProxy<E> {}

impl<E> Hash for EntityProxy<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

impl<E> fmt::Debug for EntityProxy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityProxy")
            .field("reference", &self.reference)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
