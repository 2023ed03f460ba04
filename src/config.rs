// Configuration - resolver order and entry-type reference policies
//
// Loaded once at startup from JSON. Everything has a default, so an empty
// object `{}` is a valid configuration.

use crate::entities::{registry_with_order, Entity, EntityStore, DEFAULT_ORDER};
use crate::ledger::EntryType;
use crate::registry::ResolverRegistry;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_ENV: &str = "ENTITY_REFS_CONFIG";
pub const DATABASE_ENV: &str = "ENTITY_REFS_DB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Type keys in match-priority order
    pub resolver_order: Vec<String>,

    pub entry_types: Vec<EntryType>,

    /// SQLite entity store; None keeps entities in memory
    pub database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            resolver_order: DEFAULT_ORDER.iter().map(|k| k.to_string()).collect(),
            entry_types: EntryType::builtins(),
            database: None,
        }
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Config from `ENTITY_REFS_CONFIG` if set, defaults otherwise.
    /// `ENTITY_REFS_DB` overrides the database path either way.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(db) = std::env::var_os(DATABASE_ENV) {
            config.database = Some(PathBuf::from(db));
        }

        Ok(config)
    }

    /// Every allowed type must have a resolver, and entry type names must be unique
    pub fn validate(&self) -> Result<()> {
        for (i, entry_type) in self.entry_types.iter().enumerate() {
            if self.entry_types[..i].iter().any(|e| e.name == entry_type.name) {
                bail!("Duplicate entry type '{}'", entry_type.name);
            }

            let policies = [
                ("counterparty", &entry_type.counterparty),
                ("funding_source", &entry_type.funding_source),
                ("category", &entry_type.category),
            ];
            for (role, policy) in policies {
                for allowed in &policy.allowed_types {
                    if !self.resolver_order.contains(allowed) {
                        bail!(
                            "Entry type '{}' allows '{}' as {}, but no resolver is configured for it",
                            entry_type.name,
                            allowed,
                            role
                        );
                    }
                }
            }
        }

        Ok(())
    }

    pub fn entry_type(&self, name: &str) -> Option<&EntryType> {
        self.entry_types.iter().find(|e| e.name == name)
    }

    pub fn build_registry(&self, store: Arc<dyn EntityStore>) -> Result<ResolverRegistry<Entity>> {
        registry_with_order(store, self.resolver_order.as_slice())
            .context("Failed to build resolver registry")
    }
}
