use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "timeblock", version, about = "TimeBlock focus timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Countdown control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Run a live session driven by JSON commands on stdin
    Serve,
    /// Focus statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Read and change settings
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Local account session
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Streaks, leaderboards and friends
    Social {
        #[command(subcommand)]
        action: commands::social::SocialAction,
    },
}

fn main() {
    let filter =
        EnvFilter::try_from_env("TIMEBLOCK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Serve => commands::serve::run(),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Account { action } => commands::account::run(action),
        Commands::Social { action } => commands::social::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
