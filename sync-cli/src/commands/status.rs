//! Show sync status.

use anyhow::Result;
use std::time::SystemTime;
use sync_client::{DocumentStore, StoreConfig, SyncEngine};

use super::report_load;

/// Run the status command.
pub async fn run<S: DocumentStore>(engine: &SyncEngine<S>, config: &StoreConfig) -> Result<()> {
    let report = engine.load().await;
    let status = engine.status();

    println!("=== vigil status ===");
    println!();
    println!("Document:");
    println!("  ID:       {}", config.document_id());
    println!("  File:     {}", config.file_name());
    println!("  Endpoint: {}", config.endpoint());
    println!(
        "  Access:   {}",
        if engine.store().is_writable() {
            "read-write"
        } else {
            "read-only (no token)"
        }
    );
    println!();
    println!("Sync:");
    match (&report.warning, &status.last_revision) {
        (Some(warning), _) => println!("  Status:   UNREACHABLE ({})", warning),
        (None, Some(revision)) => println!("  Revision: {}", revision),
        (None, None) => println!("  Revision: unknown"),
    }
    println!("  Items:    {}", report.items.len());
    if let Some(at) = status.last_synced_at {
        println!("  Synced:   {}", format_age(at));
    }

    Ok(())
}

fn format_age(at: SystemTime) -> String {
    match SystemTime::now().duration_since(at) {
        Ok(age) if age.as_secs() < 1 => "just now".to_string(),
        Ok(age) => format!("{}s ago", age.as_secs()),
        // Clock went backwards
        Err(_) => "just now".to_string(),
    }
}
