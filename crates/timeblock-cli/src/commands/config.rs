//! The `config` subcommand: dot-path reads and writes over the TOML file.

use clap::Subcommand;

use timeblock_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a single value
    Get {
        /// Dot-path key, e.g. "timer.default_minutes"
        key: String,
    },
    /// Change a value and write the file back
    Set {
        /// Dot-path key, e.g. "notifications.enabled"
        key: String,
        /// New value, parsed to the key's type
        value: String,
    },
    /// Print the whole configuration as JSON
    List,
    /// Restore the defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let Some(value) = config.get(&key) else {
                eprintln!("unknown key: {key}");
                std::process::exit(1);
            };
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            // set() validates and writes the file itself.
            Config::load()?.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
