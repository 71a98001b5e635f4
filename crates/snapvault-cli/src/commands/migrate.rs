//! Schema migration command

use crate::commands::print_json;
use crate::config::SnapvaultConfig;
use snapvault_store::{db, migrations};

pub fn execute(config: &SnapvaultConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = db::open(&config.db_path)?;
    db::configure(&conn, config.busy_timeout())?;

    let before = migrations::applied_migrations(&conn)?;
    migrations::apply_migrations(&mut conn)?;
    let applied = migrations::applied_migrations(&conn)?;

    let newly: Vec<&String> = applied.iter().filter(|id| !before.contains(id)).collect();
    print_json(&serde_json::json!({
        "applied": newly,
        "current": applied,
    }))
}
