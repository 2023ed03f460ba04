// 🏦 Bank Entity - Stable identity + reference resolution
//
// "Bank name is a VALUE (can change), Bank UUID is IDENTITY (never changes)"
//
// References to banks are stored as {"bank": "<uuid>"}; the resolver turns
// them back into a Bank through the entity store.

use super::{fetch_from_store, Entity, EntityStore};
use crate::error::Result;
use crate::resolver::Resolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TYPE_KEY: &str = "bank";

// ============================================================================
// BANK TYPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BankType {
    /// Checking account
    Checking,

    /// Savings account
    Savings,

    /// Credit card
    CreditCard,

    /// Payment processor (Stripe, Wise, PayPal)
    PaymentProcessor,

    /// Brokerage / Investment account
    Investment,

    /// Unknown / Other
    Unknown,
}

impl BankType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankType::Checking => "Checking",
            BankType::Savings => "Savings",
            BankType::CreditCard => "Credit Card",
            BankType::PaymentProcessor => "Payment Processor",
            BankType::Investment => "Investment",
            BankType::Unknown => "Unknown",
        }
    }
}

// ============================================================================
// BANK ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    /// Stable identity (UUID), also the reference id
    pub id: String,

    /// Canonical name (the "official" name we use)
    pub canonical_name: String,

    /// Alternative names that map to this bank
    /// Example: ["BofA", "BoA", "Bank of America NA"]
    pub aliases: Vec<String>,

    /// Country code (ISO 3166-1 alpha-2)
    pub country: String,

    pub bank_type: BankType,

    pub system_time: DateTime<Utc>,
}

impl Bank {
    /// Create new bank entity with UUID
    pub fn new(canonical_name: String, country: String, bank_type: BankType) -> Self {
        Bank {
            id: uuid::Uuid::new_v4().to_string(),
            canonical_name,
            aliases: Vec::new(),
            country,
            bank_type,
            system_time: Utc::now(),
        }
    }

    /// Add an alias to this bank
    pub fn add_alias(&mut self, alias: String) {
        if !self.aliases.contains(&alias) && alias != self.canonical_name {
            self.aliases.push(alias);
        }
    }
}

// ============================================================================
// BANK RESOLVER
// ============================================================================

pub struct BankResolver {
    store: Arc<dyn EntityStore>,
}

impl BankResolver {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        BankResolver { store }
    }
}

impl Resolver<Entity> for BankResolver {
    fn type_key(&self) -> &str {
        TYPE_KEY
    }

    fn matches_entity(&self, entity: &Entity) -> bool {
        matches!(entity, Entity::Bank(_))
    }

    fn build_reference(&self, entity: &Entity) -> String {
        entity.id().to_string()
    }

    fn fetch_entity(&self, id: &str) -> Result<Entity> {
        fetch_from_store(self.store.as_ref(), TYPE_KEY, id)
    }
}
