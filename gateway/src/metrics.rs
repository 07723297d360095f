use crate::config::MetricsConfig;
use crate::errors::GatewayError;
use metrics_exporter_statsd::StatsdBuilder;
use shared::metrics_defs::describe_all;

pub fn init(config: &MetricsConfig) -> Result<(), GatewayError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(config.prefix.as_str()))?;

    metrics::set_global_recorder(recorder)
        .map_err(|e| GatewayError::MetricsRecorder(e.to_string()))?;

    describe_all(log_insights::metrics_defs::ALL_METRICS);
    describe_all(weather::metrics_defs::ALL_METRICS);
    describe_all(todo::metrics_defs::ALL_METRICS);
    describe_all(notify::metrics_defs::ALL_METRICS);
    describe_all(queue::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Statsd metrics enabled"
    );
    Ok(())
}
