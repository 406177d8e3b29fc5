use starmirror::connect_and_migrate;

use crate::commands::output::{OutputFormat, RunDisplay, print_json, print_table};
use crate::commands::shared::build_coordinator;
use crate::config::Config;

/// Show one page of the sync run log, newest first.
pub(crate) async fn handle_history(
    config: &Config,
    database_url: &str,
    page: u64,
    page_size: u64,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = connect_and_migrate(database_url).await?;
    let coordinator = build_coordinator(config, db, None)?;
    let history = coordinator.history(page, page_size).await?;

    match output {
        OutputFormat::Json => print_json(&history)?,
        OutputFormat::Table => {
            if history.records.is_empty() {
                println!("No sync runs on page {}.", history.current_page);
            } else {
                print_table(history.records.iter().map(RunDisplay::from));
            }
            println!(
                "Page {} of {} ({} runs)",
                history.current_page,
                history.page_count.max(1),
                history.total
            );
        }
    }
    Ok(())
}
