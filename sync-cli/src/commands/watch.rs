//! Follow the document until interrupted.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use sync_client::{DocumentStore, SyncEngine};

use super::{render, report_load};

/// Run the watch command.
///
/// Prints the current collection, then every change picked up by polling,
/// until Ctrl-C.
pub async fn run<S: DocumentStore + 'static>(
    engine: Arc<SyncEngine<S>>,
    interval: Duration,
) -> Result<()> {
    let report = engine.load().await;
    report_load(&report);
    println!("{}", render(&report.items));

    let poller = engine.start_polling(
        |items| {
            println!();
            println!("{}", render(items));
        },
        interval,
    );
    eprintln!(
        "watching every {}s, press Ctrl-C to stop",
        interval.as_secs_f64()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    engine.stop_polling(poller);
    Ok(())
}
