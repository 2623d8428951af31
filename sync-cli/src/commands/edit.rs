//! Mutation commands: add, rename, move, remove.

use anyhow::{Context, Result};
use sync_client::{DocumentStore, Mutation, MutationOutcome, SyncEngine};

use super::{render, report_load};

/// Run a mutation against the freshly loaded document.
pub async fn run<S: DocumentStore>(engine: &SyncEngine<S>, mutation: Mutation) -> Result<()> {
    let report = engine.load().await;
    report_load(&report);

    let verb = verb(&mutation);
    let outcome = match engine.mutate(mutation).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if e.is_persistent_failure() {
                eprintln!(
                    "warning: local state may differ from the remote document; \
                     run `vigil list` to re-read it"
                );
            }
            return Err(e).with_context(|| format!("{} failed", verb));
        }
    };

    println!("{}", describe(&outcome));
    println!("{}", render(&engine.snapshot()));
    Ok(())
}

fn verb(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Add { .. } => "add",
        Mutation::Rename { .. } => "rename",
        Mutation::Move { .. } => "move",
        Mutation::Remove { .. } => "remove",
    }
}

/// One-line summary of what a mutation did remotely.
pub fn describe(outcome: &MutationOutcome) -> String {
    match outcome {
        MutationOutcome::Added(id) => format!("added item {}", id),
        MutationOutcome::Updated(id) => format!("updated item {}", id),
        MutationOutcome::Removed(id) => format!("removed item {}", id),
        MutationOutcome::Unchanged(id) => format!("item {} unchanged", id),
    }
}
