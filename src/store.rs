// Entity stores - the storage layer behind the resolvers
//
// MemoryStore keeps entities in a map (tests, demos). SqliteStore persists them
// as JSON rows keyed by (type_key, entity_id).

use crate::entities::{
    Account, AccountType, Bank, BankType, Category, CategoryType, Entity, EntityStore, Merchant,
    MerchantType,
};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};
use tracing::debug;

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entities: RwLock<HashMap<(String, String), Entity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        let entities = self
            .entities
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entities.len())
    }
}

impl EntityStore for MemoryStore {
    fn fetch(&self, type_key: &str, id: &str) -> Result<Option<Entity>> {
        let entities = self
            .entities
            .read()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entities
            .get(&(type_key.to_string(), id.to_string()))
            .cloned())
    }

    fn put(&self, entity: &Entity) -> Result<()> {
        let mut entities = self
            .entities
            .write()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        entities.insert(
            (entity.type_key().to_string(), entity.id().to_string()),
            entity.clone(),
        );
        Ok(())
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open entity store at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("sqlite store lock poisoned"))
    }

    /// Number of stored entities, optionally of one type
    pub fn count(&self, type_key: Option<&str>) -> Result<i64> {
        let conn = self.lock()?;
        let count = match type_key {
            Some(type_key) => conn.query_row(
                "SELECT COUNT(*) FROM entities WHERE type_key = ?1",
                params![type_key],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// All stored (type_key, entity_id, name) triples, ordered by type then name
    pub fn list(&self) -> Result<Vec<(String, String, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT type_key, entity_id, name FROM entities ORDER BY type_key, name",
        )?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_key TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            stored_at TEXT NOT NULL,
            UNIQUE (type_key, entity_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entities_ref ON entities(type_key, entity_id)",
        [],
    )?;

    Ok(())
}

impl EntityStore for SqliteStore {
    fn fetch(&self, type_key: &str, id: &str) -> Result<Option<Entity>> {
        let conn = self.lock()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM entities WHERE type_key = ?1 AND entity_id = ?2",
                params![type_key, id],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|json| {
            serde_json::from_str(&json)
                .with_context(|| format!("Corrupt entity row for {{\"{}\": \"{}\"}}", type_key, id))
        })
        .transpose()
    }

    fn put(&self, entity: &Entity) -> Result<()> {
        let data = serde_json::to_string(entity)?;
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO entities (type_key, entity_id, name, data, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (type_key, entity_id)
             DO UPDATE SET name = excluded.name, data = excluded.data, stored_at = excluded.stored_at",
            params![
                entity.type_key(),
                entity.id(),
                entity.display_name(),
                data,
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!(type_key = entity.type_key(), id = entity.id(), "stored entity");
        Ok(())
    }
}

// ============================================================================
// DEFAULT DATA
// ============================================================================

/// Seed a store with the banks, merchants, categories and accounts we know about.
///
/// Returns the seeded entities in insertion order.
pub fn seed_defaults(store: &dyn EntityStore) -> Result<Vec<Entity>> {
    let mut seeded = Vec::new();

    let banks = [
        ("Bank of America", "US", BankType::Checking, &["BofA", "BoA"][..]),
        ("Apple Card", "US", BankType::CreditCard, &["AppleCard"][..]),
        ("Stripe", "US", BankType::PaymentProcessor, &["Stripe Inc"][..]),
        ("Wise", "UK", BankType::PaymentProcessor, &["TransferWise"][..]),
        ("Scotiabank", "CA", BankType::Checking, &["Scotia"][..]),
    ];
    for (name, country, bank_type, aliases) in banks {
        let mut bank = Bank::new(name.to_string(), country.to_string(), bank_type);
        for alias in aliases {
            bank.add_alias(alias.to_string());
        }
        seeded.push(Entity::from(bank));
    }

    let merchants = [
        ("Starbucks", MerchantType::Restaurant, "Restaurants"),
        ("Amazon", MerchantType::Retail, "Shopping"),
        ("Uber", MerchantType::Transportation, "Transportation"),
    ];
    for (name, merchant_type, category) in merchants {
        seeded.push(Entity::from(Merchant::new(
            name.to_string(),
            merchant_type,
            Some(category.to_string()),
        )));
    }

    let food = Category::new("Food & Dining".to_string(), None, CategoryType::Expense);
    let restaurants = Category::new(
        "Restaurants".to_string(),
        Some(food.id.clone()),
        CategoryType::Expense,
    );
    seeded.push(Entity::from(food));
    seeded.push(Entity::from(restaurants));
    seeded.push(Entity::from(Category::new(
        "Shopping".to_string(),
        None,
        CategoryType::Expense,
    )));
    seeded.push(Entity::from(Category::new(
        "Salary".to_string(),
        None,
        CategoryType::Income,
    )));
    seeded.push(Entity::from(Category::new(
        "Transfers".to_string(),
        None,
        CategoryType::Transfer,
    )));

    // One checking account at the first seeded bank
    let bofa_id = seeded[0].id().to_string();
    seeded.push(Entity::from(Account::new(
        "BofA Checking *1234".to_string(),
        "*1234".to_string(),
        bofa_id,
        AccountType::Checking,
        "USD".to_string(),
    )));

    for entity in &seeded {
        store.put(entity)?;
    }

    Ok(seeded)
}
