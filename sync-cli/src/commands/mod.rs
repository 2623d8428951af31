//! CLI command implementations.

pub mod edit;
pub mod list;
pub mod status;
pub mod watch;

use sync_client::{Collection, LoadReport};

/// Render a snapshot as one line per item.
pub fn render(items: &Collection) -> String {
    if items.is_empty() {
        return "(no items)".to_string();
    }

    items
        .iter()
        .map(|item| {
            let name = if item.name.is_empty() { "-" } else { &item.name };
            format!("{:>4}  ({}, {})  {}", item.id.value(), item.x, item.y, name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a load warning to stderr, if there is one.
pub fn report_load(report: &LoadReport) {
    if let Some(warning) = &report.warning {
        eprintln!("warning: could not read the remote document: {}", warning);
    }
}
