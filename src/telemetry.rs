use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes structured JSON logging on stdout.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Records emitted
/// through the `log` facade (actix-web's `Logger`, `LoggerMiddleware`) are
/// forwarded into the same subscriber.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    // A second call (e.g. from several tests) keeps the first subscriber
    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()
    {
        eprintln!("Telemetry already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_does_not_panic() {
        init_telemetry();
        init_telemetry();
        tracing::info!("telemetry initialized");
        log::info!("log records are bridged");
    }
}
