use serde::Serialize;

use crate::commands::common::{describe_outcome, open_stores, snapshot_warning, CliContext};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SyncItem {
    collection: &'static str,
    outcome: String,
    synced: bool,
}

pub async fn run_sync(refresh: bool, as_json: bool, ctx: &CliContext) -> Result<(), CliError> {
    let stores = open_stores(&CliContext {
        sync_first: false,
        ..ctx.clone()
    })
    .await?;

    let report = if refresh {
        stores.refresh_all().await
    } else {
        stores.sync_all().await
    };

    if as_json {
        let items = report
            .entries()
            .into_iter()
            .map(|(collection, outcome)| SyncItem {
                collection,
                outcome: describe_outcome(outcome),
                synced: matches!(outcome, fushigi_core::SyncOutcome::Synced { .. }),
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for (collection, outcome) in report.entries() {
        println!("{collection:<10}  {}", describe_outcome(outcome));
    }
    for snapshot in stores.snapshots() {
        if let Some(warning) = snapshot_warning(&snapshot) {
            eprintln!("{warning}");
        }
    }
    Ok(())
}
