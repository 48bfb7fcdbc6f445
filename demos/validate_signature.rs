//! Build a user signature and submit it for validation.
//!
//! ```sh
//! AGYLIA_API_USERNAME=... AGYLIA_API_KEY=... \
//! AGYLIA_USER_USERNAME=testuser AGYLIA_USER_PASSWORD=testpassword \
//!     cargo run --example validate_signature
//! ```

use agylia_sdk::prelude::*;
use tracing::error;
use tracing_subscriber::EnvFilter;

async fn run() -> Result<()> {
    let client = PortalClient::new(PortalConfig::default(), ApiCredentials::from_env()?)?;
    let user = UserCredentials::from_env()?;

    let outcome = client.validate_user(&user).await?;
    println!("{} - {}", outcome.status, outcome.body);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        match e.status() {
            Some(status) => println!("ERR! {status}"),
            None => println!("ERR! {e}"),
        }
        error!(category = e.category(), error = %e, "Signature validation failed");
    }
}
