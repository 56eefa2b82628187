use clap::Subcommand;
use uuid::Uuid;

use timeblock_core::{FileRecordStore, UserProfile};

use super::require_user;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Sign in as a local profile
    Login {
        #[arg(long)]
        email: String,
        /// Display name shown on leaderboards
        #[arg(long)]
        name: Option<String>,
        /// Stable user id; generated when omitted
        #[arg(long)]
        uid: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in profile
    Whoami,
}

pub fn run(action: AccountAction) -> Result<(), Box<dyn std::error::Error>> {
    let records = FileRecordStore::open_default()?;
    match action {
        AccountAction::Login { email, name, uid } => {
            let profile = UserProfile {
                uid: uid.unwrap_or_else(|| Uuid::new_v4().to_string()),
                email,
                display_name: name,
            };
            records.sign_in(profile.clone())?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        AccountAction::Logout => {
            records.sign_out()?;
            println!("ok");
        }
        AccountAction::Whoami => {
            let profile = require_user(&records)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
