//! Long-running session watcher.
//!
//! Stands in for the web view layer: subscribes to reconciler snapshots
//! and prints each transition, while the scheduler keeps the session
//! validated (periodic cadence plus an idle debounce fed by terminal
//! input).

use tokio::io::AsyncBufReadExt;

use veritas_client::config::ClientConfig;
use veritas_client::session::{AuthSnapshot, Reconciler, ValidationScheduler};

/// Run until Ctrl-C, printing every authentication state transition.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let reconciler = Reconciler::new(&config)?;
    let mut updates = reconciler.subscribe();

    reconciler.initialize().await;
    print_snapshot(&updates.borrow_and_update());

    let scheduler = ValidationScheduler::spawn(
        reconciler,
        config.validate_interval,
        config.idle_timeout,
    );

    // Any line on stdin counts as user activity for the idle debounce.
    let mut input = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_snapshot(&updates.borrow_and_update());
            }
            line = input.next_line(), if stdin_open => {
                match line {
                    Ok(Some(_)) => scheduler.record_activity(),
                    // EOF or read error: stop polling stdin.
                    _ => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopping");
                break;
            }
        }
    }

    scheduler.shutdown();
    Ok(())
}

fn print_snapshot(snapshot: &AuthSnapshot) {
    match &snapshot.identity {
        Some(identity) if snapshot.authenticated => {
            println!("-> authenticated as {} <{}>", identity.username, identity.email);
        }
        _ => println!("-> logged out"),
    }
}
