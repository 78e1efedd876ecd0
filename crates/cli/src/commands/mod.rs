//! CLI command implementations.

pub mod account;
pub mod auth;
pub mod watch;

use veritas_client::config::ClientConfig;
use veritas_client::session::Reconciler;

/// Build a reconciler from the environment.
pub fn reconciler() -> Result<Reconciler, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    Ok(Reconciler::new(&config)?)
}

/// Read a password from stdin when it was not passed as a flag.
pub fn password_or_prompt(password: Option<String>) -> Result<String, std::io::Error> {
    match password {
        Some(password) => Ok(password),
        None => {
            println!("Password:");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok(line.trim_end_matches(['\r', '\n']).to_owned())
        }
    }
}
