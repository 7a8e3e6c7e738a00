use anyhow::{Context, Result};
use hdo_tariffs::web::{self, APP_VERSION};
use hdo_tariffs::{Config, ProcessFetcher, TariffCache, logging};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    info!("HDO tariff service {} starting up", APP_VERSION);

    let fetcher = Arc::new(ProcessFetcher::new(config.fetcher.clone()));
    let cache = Arc::new(TariffCache::new(
        config.cache.directory.clone(),
        config.tz()?,
        fetcher,
    ));
    info!(
        "Caching tariffs in {} (timezone {})",
        cache.directory().display(),
        config.timezone
    );

    if let Err(e) = web::serve(cache, &config.web.host, config.web.port).await {
        error!("Web server error: {}", e);
        return Err(e);
    }
    Ok(())
}
