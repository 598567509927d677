use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log events go. Console output is always on; Loki is added when
/// `LOKI_ENABLED=true` and the crate is built with the `loki` feature.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub filter: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let loki_enabled = lookup("LOKI_ENABLED")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            // LOKI_URL alone does not turn shipping on
            loki_url: lookup("LOKI_URL").filter(|_| loki_enabled),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "stockdb".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            filter: lookup("RUST_LOG")
                .unwrap_or_else(|| "stockdb_backend=info,tower_http=info".to_string()),
        }
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_new(&config.filter)?;

    #[cfg(feature = "loki")]
    let loki_layer = match &config.loki_url {
        Some(loki_url) => {
            let (layer, task) = tracing_loki::builder()
                .label("service", &config.service_name)?
                .label("environment", &config.environment)?
                .build_url(url::Url::parse(loki_url)?)?;
            tokio::spawn(task);
            Some(layer)
        }
        None => None,
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false));

    #[cfg(feature = "loki")]
    registry.with(loki_layer).try_init()?;
    #[cfg(not(feature = "loki"))]
    registry.try_init()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        loki = config.loki_url.is_some(),
        "📊 Logging initialized ({})",
        config.filter
    );
    Ok(())
}
