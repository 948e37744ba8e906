use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Installs the global subscriber writing to stderr. `RUST_LOG` wins over
/// `fallback_filter`. A second call is a no-op.
pub fn init(fallback_filter: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::init;
    use crate::config::LogFormat;

    #[test]
    fn repeated_init_does_not_panic() {
        init("debug", LogFormat::Text);
        init("not a valid ==== filter", LogFormat::Json);
        tracing::info!("still logging");
    }
}
