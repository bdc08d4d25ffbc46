//! Tracing and telemetry bootstrap for binaries.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// provided default directive.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Initialize error reporting when a telemetry endpoint is configured.
/// The returned guard must outlive the program's useful work.
pub fn init_telemetry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let dsn = config.telemetry_endpoint.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: Some(config.version.clone().into()),
            environment: Some(config.environment.as_str().into()),
            ..Default::default()
        },
    )))
}
