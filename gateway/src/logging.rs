use crate::config::LoggingConfig;
use log_insights::writer::ACCESS_LOG_TARGET;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
///
/// Access log lines are always let through: reading them back depends on them
/// reaching the log stream. Under Lambda the runtime adds its own timestamps,
/// so the formatter drops time and colour.
pub fn init(config: &LoggingConfig, lambda: bool) -> Option<sentry::ClientInitGuard> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if let Ok(directive) = format!("{ACCESS_LOG_TARGET}=info").parse() {
        filter = filter.add_directive(directive);
    }

    let sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let sentry_layer = sentry_guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with((!lambda).then(fmt::layer))
        .with(lambda.then(|| fmt::layer().with_ansi(false).without_time()))
        .with(sentry_layer)
        .init();

    sentry_guard
}
