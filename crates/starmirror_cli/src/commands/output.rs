use clap::ValueEnum;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use starmirror::SyncRunModel;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

pub(crate) fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Display struct for one sync run.
#[derive(Debug, Clone, Tabled)]
pub(crate) struct RunDisplay {
    #[tabled(rename = "Started")]
    pub started_at: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Total")]
    pub total: i32,
    #[tabled(rename = "Synced")]
    pub synced: i32,
    #[tabled(rename = "Deleted")]
    pub deleted: i32,
    #[tabled(rename = "Duration")]
    pub duration: String,
    #[tabled(rename = "Error")]
    pub error: String,
}

impl From<&SyncRunModel> for RunDisplay {
    fn from(run: &SyncRunModel) -> Self {
        let duration = run
            .finished_at
            .map(|finished| format_duration((finished - run.started_at).num_milliseconds()))
            .unwrap_or_else(|| "-".to_string());
        Self {
            started_at: run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: run.kind.to_string(),
            status: run.status.to_string(),
            total: run.total_count,
            synced: run.synced_count,
            deleted: run.deleted_count,
            duration,
            error: run.error_message.clone().unwrap_or_default(),
        }
    }
}

/// Two-column key/value row.
#[derive(Debug, Clone, Tabled)]
pub(crate) struct PropertyRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl PropertyRow {
    pub(crate) fn new(property: &str, value: impl ToString) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

fn format_duration(millis: i64) -> String {
    let millis = millis.max(0);
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", millis as f64 / 1000.0)
    } else {
        format!("{}m{:02}s", millis / 60_000, (millis % 60_000) / 1000)
    }
}
