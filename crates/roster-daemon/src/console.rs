//! Administrative console on standard input.
//!
//! Recognised commands:
//! - `exit`: request a graceful shutdown;
//! - `save`: retained for operator muscle memory; the collection is
//!   write-through, so there is nothing to flush.
//!
//! Anything else prints `Unknown command`.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::state::SharedState;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reads console commands until EOF or shutdown.
pub async fn run(state: SharedState) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&line, &state),
                // EOF or unreadable stdin: the console simply goes away;
                // the server keeps running until told otherwise.
                Ok(None) | Err(_) => return,
            },
            () = tokio::time::sleep(SHUTDOWN_POLL_INTERVAL) => {
                if state.is_shutdown_requested() {
                    return;
                }
            }
        }
    }
}

fn handle_line(line: &str, state: &SharedState) {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => {}
        "exit" => {
            info!("console requested shutdown");
            state.request_shutdown();
        }
        "save" => {
            info!("console requested save; collection is write-through, nothing to do");
            println!("Collection is persistent; nothing to save.");
        }
        other => {
            info!(command = other, "unknown console command");
            println!("Unknown command");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DaemonState;

    #[test]
    fn exit_sets_the_shutdown_flag() {
        let state = DaemonState::shared();
        handle_line("  EXIT ", &state);
        assert!(state.is_shutdown_requested());
    }

    #[test]
    fn save_and_unknown_do_not_shut_down() {
        let state = DaemonState::shared();
        handle_line("save", &state);
        handle_line("flush", &state);
        assert!(!state.is_shutdown_requested());
    }
}
