// 🏷️ Category Entity - Hierarchical categories with stable identity
//
// Hierarchy: parent_id creates a tree ("Food & Dining" → "Restaurants").

use super::{fetch_from_store, Entity, EntityStore};
use crate::error::Result;
use crate::resolver::Resolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TYPE_KEY: &str = "category";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CategoryType {
    /// Money going out
    Expense,

    /// Money coming in
    Income,

    /// Transfer between accounts (neutral)
    Transfer,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Expense => "Expense",
            CategoryType::Income => "Income",
            CategoryType::Transfer => "Transfer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,

    pub name: String,

    /// Parent category UUID; None for root categories
    pub parent_id: Option<String>,

    pub category_type: CategoryType,

    pub system_time: DateTime<Utc>,
}

impl Category {
    pub fn new(name: String, parent_id: Option<String>, category_type: CategoryType) -> Self {
        Category {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            parent_id,
            category_type,
            system_time: Utc::now(),
        }
    }

    /// Reference to the parent category, if any
    pub fn parent_reference(&self) -> Option<crate::reference::ReferenceDict> {
        self.parent_id
            .as_ref()
            .map(|id| crate::reference::ReferenceDict::new(TYPE_KEY, id.clone()))
    }
}

pub struct CategoryResolver {
    store: Arc<dyn EntityStore>,
}

impl CategoryResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        CategoryResolver { store }
    }
}

impl Resolver<Entity> for CategoryResolver {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::Category(_))
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
    use crate::reference::ReferenceDict;

    #[test]
    fn test_category_hierarchy_references() {
        let food = Category::new("Food & Dining".to_string(), None, CategoryType::Expense);
        let restaurants = Category::new(
            "Restaurants".to_string(),
            Some(food.id.clone()),
            CategoryType::Expense,
        );

        assert!(food.parent_reference().is_none());
        assert_eq!(
            restaurants.parent_reference(),
            Some(ReferenceDict::new("category", food.id.clone()))
        );
    }
}
