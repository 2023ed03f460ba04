use anyhow::{bail, Context, Result};
use entity_refs::{
    install_registry, installed_registry, seed_defaults, Config, Entity, EntityStore, FieldValue,
    LedgerEntry, LedgerFields, MemoryStore, ReferenceDict, ResolverRegistry, SqliteStore,
};
use std::env;
use std::sync::Arc;

const USAGE: &str = "usage:
  entity-refs seed                                   seed the entity store with default entities
  entity-refs list                                   list stored entities as reference dicts
  entity-refs resolvers                              show resolvers in match order
  entity-refs resolve '<reference>'                  resolve e.g. '{\"bank\": \"<id>\"}'
  entity-refs check <entry_type> <field> '<reference|null>'

environment:
  ENTITY_REFS_CONFIG   path to a JSON config file
  ENTITY_REFS_DB       path to the SQLite entity store
  RUST_LOG             log filter (default: warn)";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    run(&args)
}

fn run(args: &[String]) -> Result<()> {
    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(&Config::from_env()?),
        Some("list") => run_list(&Config::from_env()?),
        Some("resolvers") => run_resolvers(&Config::from_env()?),
        Some("resolve") => match args.get(2) {
            Some(reference) => run_resolve(&Config::from_env()?, reference),
            None => bail!("missing reference\n\n{}", USAGE),
        },
        Some("check") => match (args.get(2), args.get(3), args.get(4)) {
            (Some(entry_type), Some(field), Some(reference)) => {
                run_check(&Config::from_env()?, entry_type, field, reference)
            }
            _ => bail!("check needs an entry type, a field and a reference\n\n{}", USAGE),
        },
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn open_sqlite(config: &Config) -> Result<SqliteStore> {
    match &config.database {
        Some(path) => SqliteStore::open(path),
        None => bail!("no database configured (set ENTITY_REFS_DB or \"database\" in the config)"),
    }
}

/// SQLite store when configured, otherwise an in-memory store with the defaults seeded
fn open_store(config: &Config) -> Result<Arc<dyn EntityStore>> {
    if config.database.is_some() {
        return Ok(Arc::new(open_sqlite(config)?));
    }

    let store = MemoryStore::new();
    seed_defaults(&store)?;
    Ok(Arc::new(store))
}

/// The process-wide registry, installed from `config` on first use
fn shared_registry(config: &Config) -> Result<Arc<ResolverRegistry<Entity>>> {
    if let Some(registry) = installed_registry() {
        return Ok(registry);
    }

    let store = open_store(config)?;
    if install_registry(config.build_registry(store)?).is_err() {
        bail!("resolver registry was installed concurrently");
    }

    installed_registry().context("resolver registry is not installed")
}

fn print_entity(entity: &Entity) {
    println!(
        "  {}  {} ({})",
        ReferenceDict::new(entity.type_key(), entity.id()),
        entity.display_name(),
        entity.kind()
    );
    for (role, reference) in entity.linked_references() {
        println!("      {} -> {}", role, reference);
    }
}

fn run_seed(config: &Config) -> Result<()> {
    let store = open_sqlite(config)?;

    println!("🌱 Seeding entity store...");
    let seeded = seed_defaults(&store)?;
    for entity in &seeded {
        print_entity(entity);
    }

    println!("✓ Stored {} entities ({} total)", seeded.len(), store.count(None)?);
    Ok(())
}

fn run_list(config: &Config) -> Result<()> {
    let store = open_sqlite(config)?;

    for (type_key, id, name) in store.list()? {
        println!("{}  {}", ReferenceDict::new(type_key, id), name);
    }

    Ok(())
}

fn run_resolvers(config: &Config) -> Result<()> {
    let registry = shared_registry(config)?;

    for (position, type_key) in registry.type_keys().enumerate() {
        println!("{}. {}", position + 1, type_key);
    }

    Ok(())
}

fn run_resolve(config: &Config, reference: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(reference).context("Reference is not valid JSON")?;

    let registry = shared_registry(config)?;

    let proxy = registry.resolve_entity_proxy_value(&value)?;
    let entity = proxy.resolve()?;

    println!("🔗 {}", proxy.reference_dict());
    print_entity(entity);
    println!("{}", serde_json::to_string_pretty(entity)?);
    Ok(())
}

fn run_check(config: &Config, entry_type: &str, field: &str, reference: &str) -> Result<()> {
    let entry_type = config
        .entry_type(entry_type)
        .with_context(|| format!("Unknown entry type '{}'", entry_type))?
        .clone();
    let value: serde_json::Value =
        serde_json::from_str(reference).context("Reference is not valid JSON")?;

    let fields = LedgerFields::new(shared_registry(config)?);
    let field = fields
        .by_key(field)
        .with_context(|| format!("Unknown field '{}'", field))?;

    let mut entry = LedgerEntry::new(entry_type);
    field.set_obj(&mut entry, FieldValue::Raw(value))?;

    println!("✅ accepted: {}", entry.to_json());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_refs::config::{CONFIG_ENV, DATABASE_ENV};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_cli_config_loading_and_shared_registry() {
        std::env::remove_var(DATABASE_ENV);
        std::env::set_var(CONFIG_ENV, "/nonexistent/entity-refs.json");

        // usage never touches the config
        assert!(run(&args(&["entity-refs"])).is_ok());
        assert!(run(&args(&["entity-refs", "help"])).is_ok());
        assert!(run(&args(&["entity-refs", "resolvers"])).is_err());
        assert!(installed_registry().is_none());

        std::env::remove_var(CONFIG_ENV);
        assert!(run(&args(&["entity-refs", "resolvers"])).is_ok());

        let installed = installed_registry().unwrap();
        assert_eq!(installed.len(), 4);

        let again = shared_registry(&Config::default()).unwrap();
        assert!(Arc::ptr_eq(&installed, &again));

        let missing = run(&args(&["entity-refs", "resolve", r#"{"bank": "no-such-bank"}"#]));
        assert!(missing.is_err());
        assert!(run(&args(&["entity-refs", "check", "purchase", "counterparty", "null"])).is_err());
    }
}
