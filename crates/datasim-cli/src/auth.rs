use std::io::{self, BufRead, Write};

use datasim_client::ApiClient;
use tracing::info;

use crate::settings::{self, Settings};
use crate::CliError;

/// Request a one-time code, read it from stdin, exchange it for a session,
/// and persist the token.
pub async fn login(settings: &Settings, email: &str) -> Result<(), CliError> {
    let client = ApiClient::new(settings.client.clone())?;
    client.request_otp(email).await?;
    println!("A one-time code was sent to {email}.");

    print!("Code: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin().lock().read_line(&mut code)?;

    let session = client.verify_otp(email, code.trim()).await?;
    settings::store_token(session.token())?;
    info!("session stored");
    Ok(())
}

pub fn logout() -> Result<(), CliError> {
    settings::clear_token()?;
    println!("Logged out.");
    Ok(())
}
