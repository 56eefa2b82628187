use clap::{Subcommand, ValueEnum};

use timeblock_core::account::{focus, friends, streaks};
use timeblock_core::{Config, FileRecordStore};

use super::require_user;

#[derive(Clone, Copy, ValueEnum)]
pub enum Board {
    /// Consecutive active days
    Streak,
    /// Lifetime focused minutes
    Minutes,
}

#[derive(Subcommand)]
pub enum SocialAction {
    /// Show your streak
    Streak,
    /// Top users, best first
    Leaderboard {
        #[arg(long, value_enum, default_value = "streak")]
        by: Board,
        /// Rows to show; defaults to the configured size
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Your 1-based leaderboard position
    Rank {
        #[arg(long, value_enum, default_value = "streak")]
        by: Board,
    },
    /// List accepted friends
    Friends,
    /// Send a friend request by email
    Add { email: String },
    /// Requests waiting on your answer
    Requests,
    /// Accept a pending request
    Accept { request_id: String },
    /// Reject a pending request
    Reject { request_id: String },
}

pub fn run(action: SocialAction) -> Result<(), Box<dyn std::error::Error>> {
    let records = FileRecordStore::open_default()?;
    match action {
        SocialAction::Streak => {
            let user = require_user(&records)?;
            let record = streaks::get_or_init(&records, &user.uid)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        SocialAction::Leaderboard { by, limit } => {
            let config = Config::load_or_default();
            let limit = limit.unwrap_or(config.leaderboard.size as usize);
            match by {
                Board::Streak => {
                    let rows = streaks::leaderboard(&records, limit)?;
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                Board::Minutes => {
                    let rows = focus::leaderboard(&records, limit)?;
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
        }
        SocialAction::Rank { by } => {
            let user = require_user(&records)?;
            let rank = match by {
                Board::Streak => {
                    let record = streaks::get_or_init(&records, &user.uid)?;
                    streaks::rank(&records, record.current_streak)?
                }
                Board::Minutes => {
                    let record = focus::get_or_init(&records, &user.uid)?;
                    focus::rank(&records, record.total_minutes)?
                }
            };
            println!("{rank}");
        }
        SocialAction::Friends => {
            let user = require_user(&records)?;
            let rows = friends::friends_of(&records, &user.uid)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        SocialAction::Add { email } => {
            let user = require_user(&records)?;
            friends::send_request(&records, &user, &email)?;
            println!("ok");
        }
        SocialAction::Requests => {
            let user = require_user(&records)?;
            let rows: Vec<_> = friends::pending_requests(&records, &user.uid)?
                .into_iter()
                .map(|(id, request)| {
                    serde_json::json!({
                        "id": id,
                        "from": request.from_name,
                        "from_email": request.from_email,
                        "created_at": request.created_at,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        SocialAction::Accept { request_id } => {
            friends::accept_request(&records, &request_id)?;
            println!("ok");
        }
        SocialAction::Reject { request_id } => {
            friends::reject_request(&records, &request_id)?;
            println!("ok");
        }
    }
    Ok(())
}
