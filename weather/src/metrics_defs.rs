use shared::metrics_defs::{MetricDef, MetricType};

pub const LOOKUPS: MetricDef = MetricDef {
    name: "weather.lookups",
    metric_type: MetricType::Counter,
    description: "Weather requests answered. Tagged with outcome.",
};

pub const UPSTREAM_DURATION: MetricDef = MetricDef {
    name: "weather.upstream.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent on geocoding and forecast calls for one request, in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[LOOKUPS, UPSTREAM_DURATION];
