//! Account data commands.

use super::reconciler;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print the full account profile.
pub async fn profile() -> CommandResult {
    let reconciler = reconciler()?;
    reconciler.initialize().await;

    let profile = reconciler.profile().await?;
    println!(
        "{} <{}>",
        profile.identity.username, profile.identity.email
    );
    if let Some(created_at) = profile.identity.created_at {
        println!("Member since: {created_at}");
    }
    if let Some(last_login) = profile.identity.last_login {
        println!("Last login:   {last_login}");
    }
    println!(
        "Predictions:  {} ({} fake, {} real)",
        profile.predictions_made, profile.fake_detected, profile.real_detected
    );
    Ok(())
}

/// Print aggregate usage counters.
pub async fn stats() -> CommandResult {
    let reconciler = reconciler()?;
    reconciler.initialize().await;

    let stats = reconciler.stats().await?;
    println!("Total predictions: {}", stats.total_predictions);
    println!(
        "Fake: {} ({:.1}%)  Real: {} ({:.1}%)",
        stats.fake_detected, stats.fake_percentage, stats.real_detected, stats.real_percentage
    );
    Ok(())
}
