// 🏪 Merchant Entity - counterparty of purchases
//
// "Merchant name is a VALUE (can change), Merchant UUID is IDENTITY (never changes)"

use super::{fetch_from_store, Entity, EntityStore};
use crate::error::Result;
use crate::resolver::Resolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TYPE_KEY: &str = "merchant";

// ============================================================================
// MERCHANT TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MerchantType {
    /// Restaurant / Café / Food service
    Restaurant,

    /// Retail store / Shop
    Retail,

    /// Online service (SaaS, subscriptions)
    OnlineService,

    /// Utility (electricity, water, internet)
    Utility,

    /// Transportation (Uber, Lyft, gas stations)
    Transportation,

    /// Financial service (bank fees, wire transfers)
    Financial,

    Other,
}

impl MerchantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantType::Restaurant => "Restaurant",
            MerchantType::Retail => "Retail",
            MerchantType::OnlineService => "Online Service",
            MerchantType::Utility => "Utility",
            MerchantType::Transportation => "Transportation",
            MerchantType::Financial => "Financial",
            MerchantType::Other => "Other",
        }
    }
}

// ============================================================================
// MERCHANT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub id: String,

    pub canonical_name: String,

    /// Example: ["STARBUCKS *123", "Starbucks Coffee"]
    pub aliases: Vec<String>,

    pub merchant_type: MerchantType,

    /// Suggested category name (None if unknown)
    pub suggested_category: Option<String>,

    pub system_time: DateTime<Utc>,
}

impl Merchant {
    pub fn new(
        canonical_name: String,
        merchant_type: MerchantType,
        suggested_category: Option<String>,
    ) -> Self {
        Merchant {
            id: uuid::Uuid::new_v4().to_string(),
            canonical_name,
            aliases: Vec::new(),
            merchant_type,
            suggested_category,
            system_time: Utc::now(),
        }
    }
}

// ============================================================================
// MERCHANT RESOLVER
// ============================================================================

pub struct MerchantResolver {
    store: Arc<dyn EntityStore>,
}

impl MerchantResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        MerchantResolver { store }
    }
}

impl Resolver<Entity> for MerchantResolver {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::Merchant(_))
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
    use crate::store::MemoryStore;

    #[test]
    fn test_merchant_creation() {
        let merchant = Merchant::new(
            "Starbucks".to_string(),
            MerchantType::Restaurant,
            Some("Café".to_string()),
        );

        assert!(!merchant.id.is_empty());
        assert!(merchant.aliases.is_empty());
        assert_eq!(merchant.merchant_type.as_str(), "Restaurant");
    }

    #[test]
    fn test_merchant_resolver() {
        let store = Arc::new(MemoryStore::new());
        let amazon = Entity::from(Merchant::new(
            "Amazon".to_string(),
            MerchantType::Retail,
            Some("Shopping".to_string()),
        ));
        store.put(&amazon).unwrap();

        let resolver = MerchantResolver::new(store);
        assert!(resolver.matches_entity(&amazon));
        assert_eq!(resolver.build_reference(&amazon), amazon.id());
        assert_eq!(resolver.fetch_entity(amazon.id()).unwrap(), amazon);
    }
}
