use fushigi_core::sync::StoreSnapshot;
use serde::Serialize;

use crate::commands::common::{format_snapshot_line, open_stores, CliContext};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusReport {
    db_path: String,
    api_base_url: String,
    collections: Vec<StoreSnapshot>,
}

pub async fn run_status(as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let stores = open_stores(ctx).await?;
    let snapshots = stores.snapshots();

    if as_json {
        let report = StatusReport {
            db_path: ctx.db_path.display().to_string(),
            api_base_url: stores.client().base_url().to_string(),
            collections: snapshots.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Database: {}", ctx.db_path.display());
    println!("Backend:  {}", stores.client().base_url());
    for snapshot in &snapshots {
        println!("{}", format_snapshot_line(snapshot));
    }
    Ok(())
}
