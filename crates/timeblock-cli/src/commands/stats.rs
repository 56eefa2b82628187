use chrono::NaiveDate;
use clap::Subcommand;
use serde_json::json;

use timeblock_core::storage::SqliteStore;
use timeblock_core::tally::{self, DailyTally, LastSession};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Focus credited to a single day
    Today {
        /// Show a specific day instead of today, as YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Every recorded day plus lifetime totals
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let tally = DailyTally::load(&store);

    match action {
        StatsAction::Today { date } => {
            let day = date.unwrap_or_else(tally::today);
            let secs = tally.seconds_on(day);
            let value = json!({
                "date": day.to_string(),
                "focus_seconds": secs,
                "focus_minutes": secs / 60,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        StatsAction::All => {
            let days: Vec<_> = tally
                .iter()
                .map(|(day, secs)| {
                    json!({
                        "date": day.to_string(),
                        "focus_seconds": secs,
                    })
                })
                .collect();
            let value = json!({
                "total_seconds": tally.total_seconds(),
                "total_minutes": tally.total_seconds() / 60,
                "days": days,
                "last_session": LastSession::load(&store),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
