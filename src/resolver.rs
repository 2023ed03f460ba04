// Resolver - per-entity-type adapter
//
// One implementation per entity type. A resolver knows how to recognise its
// entities, how to turn one into a reference id, and how to fetch an entity
// back from the storage layer.

use crate::error::Result;
use crate::reference::ReferenceDict;

pub trait Resolver<E>: Send + Sync {
    /// Short key identifying the entity type, unique within a registry
    fn type_key(&self) -> &str;

    /// True if the entity belongs to this resolver's type
    fn matches_entity(&self, entity: &E) -> bool;

    /// True if the reference dict points at this resolver's type
    fn matches_reference_dict(&self, reference: &ReferenceDict) -> bool {
        reference.type_key() == self.type_key()
    }

    /// Canonical identifier for an entity of this type
    fn build_reference(&self, entity: &E) -> String;

    /// Look up the entity behind `id`; `EntityNotFound` when there is none
    fn fetch_entity(&self, id: &str) -> Result<E>;

    fn reference_entity(&self, entity: &E) -> ReferenceDict {
        ReferenceDict::new(self.type_key(), self.build_reference(entity))
    }
}

/// Users and groups behind counting resolvers, shared by the core tests
#[cfg(test)]
pub(crate) mod fixtures {
    use super::Resolver;
    use crate::error::{ReferenceError, Result};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum TestEntity {
        User { id: u32, name: String },
        Group { id: u32, name: String },
        Robot,
    }

    pub fn user(id: u32, name: &str) -> TestEntity {
        TestEntity::User { id, name: name.to_string() }
    }

    pub fn group(id: u32, name: &str) -> TestEntity {
        TestEntity::Group { id, name: name.to_string() }
    }

    /// Resolver over an in-memory table, counting every fetch
    pub struct TableResolver {
        type_key: &'static str,
        rows: HashMap<String, TestEntity>,
        fetches: Arc<AtomicUsize>,
        matcher: fn(&TestEntity) -> Option<u32>,
    }

    impl TableResolver {
        pub fn users(rows: Vec<TestEntity>) -> Self {
            Self::new("user", rows, |e| match e {
                TestEntity::User { id, .. } => Some(*id),
                _ => None,
            })
        }

        pub fn groups(rows: Vec<TestEntity>) -> Self {
            Self::new("group", rows, |e| match e {
                TestEntity::Group { id, .. } => Some(*id),
                _ => None,
            })
        }

        pub fn new(
            type_key: &'static str,
            rows: Vec<TestEntity>,
            matcher: fn(&TestEntity) -> Option<u32>,
        ) -> Self {
            let rows = rows
                .into_iter()
                .filter_map(|e| matcher(&e).map(|id| (id.to_string(), e)))
                .collect();

            TableResolver {
                type_key,
                rows,
                fetches: Arc::new(AtomicUsize::new(0)),
                matcher,
            }
        }

        pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.fetches)
        }
    }

    impl Resolver<TestEntity> for TableResolver {
        fn type_key(&self) -> &str {
            self.type_key
        }

        fn matches_entity(&self, entity: &TestEntity) -> bool {
            (self.matcher)(entity).is_some()
        }

        fn build_reference(&self, entity: &TestEntity) -> String {
            (self.matcher)(entity).map(|id| id.to_string()).unwrap_or_default()
        }

        fn fetch_entity(&self, id: &str) -> Result<TestEntity> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.rows
                .get(id)
                .cloned()
                .ok_or_else(|| ReferenceError::not_found(self.type_key, id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_matches_reference_dict_by_type_key() {
        let resolver = TableResolver::users(vec![user(1, "alice")]);

        assert!(resolver.matches_reference_dict(&ReferenceDict::new("user", "1")));
        assert!(!resolver.matches_reference_dict(&ReferenceDict::new("group", "1")));
    }

    #[test]
    fn test_reference_entity_builds_dict() {
        let resolver = TableResolver::users(vec![]);
        let reference = resolver.reference_entity(&user(42, "bob"));

        assert_eq!(reference, ReferenceDict::new("user", "42"));
    }

    #[test]
    fn test_fetch_missing_entity() {
        let resolver = TableResolver::groups(vec![group(7, "admins")]);

        assert_eq!(resolver.fetch_entity("7").unwrap(), group(7, "admins"));
        assert!(matches!(
            resolver.fetch_entity("8"),
            Err(crate::error::ReferenceError::EntityNotFound { .. })
        ));
    }
}
