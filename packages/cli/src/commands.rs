//! Subcommand implementations

use anyhow::{bail, Context, Result};
use clap::Args;
use lineage_core::db::LibsqlStore;
use lineage_core::fixtures::greek_gods;
use lineage_core::services::{CancellationSignal, LookupService, TraversalConfig};
use lineage_core::{Direction, NodePredicate, Shape, TraversalRequest};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

pub const ENV_DB_PATH: &str = "LINEAGE_DB_PATH";

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Insert the sample tree even if the database already holds nodes
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Match the seed node by id
    #[arg(long, conflicts_with_all = ["field", "value"])]
    pub id: Option<String>,

    /// Attribute name to match seeds on
    #[arg(long, requires = "value")]
    pub field: Option<String>,

    /// Attribute value; parsed as JSON when possible, otherwise taken as text
    #[arg(long, requires = "field")]
    pub value: Option<String>,

    /// Depth bound (defaults to LINEAGE_MAX_DEPTH or 64)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Output shape: flat or nested
    #[arg(long, default_value = "flat")]
    pub shape: Shape,
}

impl LookupArgs {
    fn predicate(&self) -> Result<NodePredicate> {
        match (&self.id, &self.field, &self.value) {
            (Some(id), None, None) => Ok(NodePredicate::id(id.clone())),
            (None, Some(field), Some(value)) => {
                Ok(NodePredicate::attribute(field.clone(), parse_value(value)))
            }
            _ => bail!("Specify either --id or both --field and --value"),
        }
    }
}

/// `3` and `true` stay typed; anything that is not valid JSON is text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `--db`, then `LINEAGE_DB_PATH`, then `~/.lineage/lineage.db`.
pub fn resolve_db_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        return Ok(PathBuf::from(path));
    }
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
    Ok(home_dir.join(".lineage").join("lineage.db"))
}

pub async fn seed(db_path: PathBuf, args: SeedArgs) -> Result<()> {
    let store = LibsqlStore::open(db_path.clone()).await?;
    let db = store.database();

    let existing = db.db_count_nodes().await?;
    if existing > 0 && !args.force {
        tracing::warn!(
            path = %db_path.display(),
            existing,
            "Database already holds nodes, skipping seed (use --force to insert anyway)"
        );
        return Ok(());
    }

    let gods = greek_gods();
    db.db_insert_nodes(&gods)
        .await
        .context("Failed to insert sample tree")?;
    tracing::info!(path = %db_path.display(), inserted = gods.len(), "Seeded Greek gods");
    Ok(())
}

pub async fn lookup(db_path: PathBuf, direction: Direction, args: LookupArgs) -> Result<()> {
    let predicate = args.predicate()?;
    let config = TraversalConfig::from_env();
    let max_depth = args.max_depth.unwrap_or(config.default_max_depth);

    let store = LibsqlStore::open(db_path).await?;
    let service = LookupService::with_config(Arc::new(store), config);

    let signal = CancellationSignal::new();
    let on_interrupt = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling lookup");
            on_interrupt.cancel();
        }
    });

    let request = TraversalRequest::new(predicate, direction, max_depth);
    let result = service.lookup(&request, args.shape, &signal).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(id: Option<&str>, field: Option<&str>, value: Option<&str>) -> LookupArgs {
        LookupArgs {
            id: id.map(str::to_string),
            field: field.map(str::to_string),
            value: value.map(str::to_string),
            max_depth: None,
            shape: Shape::Flat,
        }
    }

    #[test]
    fn test_value_parsing() {
        assert_eq!(parse_value("Death"), json!("Death"));
        assert_eq!(parse_value("3"), json!(3));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("\"3\""), json!("3"));
    }

    #[test]
    fn test_predicate_from_args() {
        let by_field = args(None, Some("knownAs"), Some("Death")).predicate().unwrap();
        assert_eq!(by_field, NodePredicate::attribute("knownAs", "Death"));

        let by_id = args(Some("abc"), None, None).predicate().unwrap();
        assert_eq!(by_id, NodePredicate::id("abc"));

        assert!(args(None, None, None).predicate().is_err());
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let path = resolve_db_path(Some(PathBuf::from("/tmp/x.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/x.db"));
    }
}
