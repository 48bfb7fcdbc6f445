//! Fetch all user activity in a date range, following cursors.
//!
//! ```sh
//! AGYLIA_API_USERNAME=... AGYLIA_API_KEY=... \
//!     cargo run --example users_activity
//! ```
//!
//! `AGYLIA_FROM_DATE` / `AGYLIA_TO_DATE` override the default window.
//!
//! Each page prints as `[activity_count: N, next_cursor: C]` without the HTTP
//! status. Only 2xx responses reach the page callback; a failed request
//! prints `ERR! <status>` and stops.

use agylia_sdk::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FROM_DATE: &str = "2017-01-01T00:00:00.000Z";
const DEFAULT_TO_DATE: &str = "2020-01-01T00:00:00.000Z";

async fn run() -> Result<()> {
    let credentials = ApiCredentials::from_env()?;
    let client = PortalClient::new(PortalConfig::default(), credentials)?;

    let range = DateRange::new(
        std::env::var("AGYLIA_FROM_DATE").unwrap_or_else(|_| DEFAULT_FROM_DATE.to_string()),
        std::env::var("AGYLIA_TO_DATE").unwrap_or_else(|_| DEFAULT_TO_DATE.to_string()),
    )?;

    let mut total = 0;
    let pages = client
        .activity_pager(range)
        .for_each_page(|page| {
            total += page.len();
            println!(
                "[activity_count: {}, next_cursor: {}]",
                page.len(),
                page.next_cursor().unwrap_or("null")
            );
        })
        .await?;

    info!(pages, total, "Finished fetching user activity");
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
        error!(category = e.category(), error = %e, "User activity fetch failed");
    }
}
