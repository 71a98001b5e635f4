//! Name search command

use crate::commands::{open_service, print_json};
use crate::config::SnapvaultConfig;
use clap::Args;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text query; tokens match word prefixes
    pub query: String,

    #[arg(long)]
    pub org_id: i64,
}

pub fn execute(config: &SnapvaultConfig, args: SearchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = open_service(config)?;
    let results = service.search(&args.query, args.org_id)?;
    print_json(&serde_json::json!({ "results": results }))
}
