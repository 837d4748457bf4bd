use anyhow::{Context, Result, bail};
use scrapeline::{app_state::build_scraper, config::Config, telemetry};

/// One-shot batch: `scrape <url>...` prints the report as pretty JSON.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        bail!("usage: scrape <url> [<url>...]");
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let scraper = build_scraper(&config)?;

    let report = scraper.run(&urls).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
