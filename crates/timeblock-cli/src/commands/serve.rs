//! Long-running session driven over stdin/stdout.
//!
//! Commands arrive as JSON lines on stdin and each gets a JSON reply on
//! stdout. State changes stream to stdout as they happen, so a client
//! sees every tick whether or not it asked for anything. Sign-ins are
//! observed through the record store's watch channel rather than polled.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use timeblock_core::account::RecordStore;
use timeblock_core::storage::Config;
use timeblock_core::{parse_request, CommandReply};

use super::open_session;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (handle, join, records) = open_session(&config)?;
        let mut events = handle.subscribe();
        let mut user_rx = records.watch_user();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                Ok(()) = user_rx.changed() => {
                    match user_rx.borrow_and_update().as_ref() {
                        Some(user) => info!(email = %user.email, "signed in"),
                        None => info!("signed out"),
                    }
                }
                event = events.recv() => match event {
                    Ok(event) => println!("{}", serde_json::to_string(&event)?),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                line = lines.next_line() => match line {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        let reply = match parse_request(line.trim()) {
                            Ok(command) => handle.apply(command).await?,
                            Err(e) => CommandReply::failed(e.to_string()),
                        };
                        println!("{}", serde_json::to_string(&reply)?);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                },
            }
        }

        drop(handle);
        let _ = join.await;
        Ok(())
    })
}
