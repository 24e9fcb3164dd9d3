use crate::config::Config;
use crate::error::Error;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,tower_http=debug,hyper=warn,reqwest=warn")
        }))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config, logging failures
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            info!(
                model = %config.extractor.model,
                max_tokens = config.extractor.max_tokens,
                default_credential = config.default_credential().is_some(),
                "Configuration loaded"
            );
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}
