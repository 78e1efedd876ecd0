//! Login, registration, status, and logout commands.

use super::{password_or_prompt, reconciler};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Log in and persist the session cache for later commands.
pub async fn login(username: &str, password: Option<String>) -> CommandResult {
    let reconciler = reconciler()?;
    let password = password_or_prompt(password)?;

    let identity = reconciler.login(username, &password).await?;
    println!("Logged in as {} <{}>", identity.username, identity.email);
    Ok(())
}

/// Create an account. Does not log in.
pub async fn register(username: &str, email: &str, password: Option<String>) -> CommandResult {
    let reconciler = reconciler()?;
    let password = password_or_prompt(password)?;

    reconciler.register(username, email, &password).await?;
    println!("Registered {username}. Log in with `veritas login -u {username}`.");
    Ok(())
}

/// Reconcile once with the server and print the outcome.
pub async fn status() -> CommandResult {
    let reconciler = reconciler()?;
    reconciler.initialize().await;
    // initialize() may have restored optimistically; force a confirmed answer.
    reconciler.validate().await;

    let snapshot = reconciler.snapshot();
    match snapshot.identity {
        Some(identity) if snapshot.authenticated => {
            println!("Authenticated as {} <{}>", identity.username, identity.email);
        }
        _ => println!("Not authenticated"),
    }
    Ok(())
}

/// Notify the server (best-effort) and clear local state.
pub async fn logout() -> CommandResult {
    let reconciler = reconciler()?;
    reconciler.initialize().await;
    reconciler.logout().await;
    println!("Logged out");
    Ok(())
}
