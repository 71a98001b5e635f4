//! Snapshot commands: create, get, delete, delete-expired, list

use crate::commands::{open_service, print_json};
use crate::config::SnapvaultConfig;
use chrono::{DateTime, Utc};
use clap::Args;
use snapvault_core::store::{GetByKeyQuery, ListQuery};
use snapvault_core::CreateCommand;
use std::path::PathBuf;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, default_value = "")]
    pub name: String,

    /// Lifetime in seconds; 0 never expires
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub expires: i64,

    #[arg(long)]
    pub org_id: i64,

    #[arg(long)]
    pub user_id: i64,

    /// Dashboard document as inline JSON
    #[arg(long, conflicts_with = "dashboard_file")]
    pub dashboard: Option<String>,

    /// Read the dashboard document from a file
    #[arg(long)]
    pub dashboard_file: Option<PathBuf>,

    /// The snapshot is hosted elsewhere; requires --key and --delete-key
    #[arg(long)]
    pub external: bool,

    #[arg(long, default_value = "")]
    pub external_url: String,

    #[arg(long, default_value = "")]
    pub external_delete_url: String,

    /// Read key; generated when omitted
    #[arg(long, default_value = "")]
    pub key: String,

    /// Delete key; generated when omitted
    #[arg(long, default_value = "")]
    pub delete_key: String,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub key: String,

    /// Only return the snapshot if this delete key matches
    #[arg(long)]
    pub delete_key: Option<String>,

    /// Include the delete key and external delete URL; needs --delete-key
    #[arg(long)]
    pub include_secrets: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub delete_key: String,
}

#[derive(Debug, Args)]
pub struct DeleteExpiredArgs {
    /// Sweep as of this RFC 3339 instant instead of the current time
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub org_id: i64,

    /// Case-sensitive name prefix
    #[arg(long)]
    pub name_prefix: Option<String>,

    /// Maximum results (defaults to the configured list_limit)
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn create(config: &SnapvaultConfig, args: CreateArgs) -> CmdResult {
    let dashboard = match (args.dashboard, args.dashboard_file) {
        (Some(inline), _) => Some(serde_json::from_str(&inline)?),
        (None, Some(path)) => Some(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        (None, None) => None,
    };

    let cmd = CreateCommand {
        name: args.name,
        expires_seconds: args.expires,
        external: args.external,
        external_url: args.external_url,
        external_delete_url: args.external_delete_url,
        key: args.key,
        delete_key: args.delete_key,
        org_id: args.org_id,
        user_id: args.user_id,
        dashboard,
    };

    let service = open_service(config)?;
    let snapshot = service.create(&cmd, Utc::now())?;
    print_json(&serde_json::json!({ "snapshot": snapshot }))
}

pub fn get(config: &SnapvaultConfig, args: GetArgs) -> CmdResult {
    let mut query = GetByKeyQuery::new(args.key);
    if let Some(delete_key) = args.delete_key {
        query = query.with_delete_key(delete_key);
    }
    if args.include_secrets {
        query = query.include_secrets();
    }

    let service = open_service(config)?;
    let snapshot = service.get(&query)?;
    print_json(&serde_json::json!({ "snapshot": snapshot }))
}

pub fn delete(config: &SnapvaultConfig, args: DeleteArgs) -> CmdResult {
    let service = open_service(config)?;
    let deleted = service.delete(&args.delete_key)?;
    print_json(&serde_json::json!({ "deleted": deleted }))
}

pub fn delete_expired(config: &SnapvaultConfig, args: DeleteExpiredArgs) -> CmdResult {
    let service = open_service(config)?;
    let count = service.delete_expired(args.now.unwrap_or_else(Utc::now))?;
    print_json(&serde_json::json!({ "deletedCount": count }))
}

pub fn list(config: &SnapvaultConfig, args: ListArgs) -> CmdResult {
    let mut query = ListQuery::new(args.org_id, args.limit.unwrap_or(config.list_limit));
    if let Some(prefix) = args.name_prefix {
        query = query.with_name_prefix(prefix);
    }

    let service = open_service(config)?;
    let snapshots = service.list(&query)?;
    print_json(&serde_json::json!({ "snapshots": snapshots }))
}
