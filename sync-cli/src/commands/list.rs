//! Print the current collection.

use anyhow::Result;
use sync_client::{DocumentStore, SyncEngine};

use super::{render, report_load};

/// Run the list command.
pub async fn run<S: DocumentStore>(engine: &SyncEngine<S>) -> Result<()> {
    let report = engine.load().await;
    report_load(&report);
    println!("{}", render(&report.items));
    Ok(())
}
