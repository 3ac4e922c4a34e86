use anyhow::Context;
use clap::Parser;
use contact_parser::api;
use contact_parser::config::{load_country_table, ServerConfig};
use contact_parser::logging;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    logging::init("info");

    let table = load_country_table(config.country_table.as_deref())
        .context("failed to load country table")?;
    let countries: Vec<&str> = table.iter().map(|c| c.id.as_str()).collect();
    info!(countries = %countries.join(","), "country table loaded");

    let routes = api::routes(Arc::new(table));
    let addr = config.addr();

    info!("contact parser listening on http://{}", addr);
    info!("health check: http://{}/health", addr);
    info!("contact endpoint: http://{}/contact", addr);

    warp::serve(routes).run(addr).await;
    Ok(())
}
