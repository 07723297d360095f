use shared::metrics_defs::{MetricDef, MetricType};

pub const QUERIES_SUBMITTED: MetricDef = MetricDef {
    name: "log_query.submitted",
    metric_type: MetricType::Counter,
    description: "Number of log queries submitted to the backend. Tagged with backend.",
};

pub const QUERY_POLLS: MetricDef = MetricDef {
    name: "log_query.polls",
    metric_type: MetricType::Histogram,
    description: "Result fetches issued per query before it reached a terminal status",
};

pub const QUERY_OUTCOMES: MetricDef = MetricDef {
    name: "log_query.outcome",
    metric_type: MetricType::Counter,
    description: "Finished log queries. Tagged with status.",
};

pub const ENTRIES_WRITTEN: MetricDef = MetricDef {
    name: "log_entries.written",
    metric_type: MetricType::Counter,
    description: "Access log entries emitted by the write path",
};

pub const MEMORY_LINES: MetricDef = MetricDef {
    name: "log_memory.lines",
    metric_type: MetricType::Gauge,
    description: "Lines currently held by the in-memory log backend",
};

pub const ALL_METRICS: &[MetricDef] = &[
    QUERIES_SUBMITTED,
    QUERY_POLLS,
    QUERY_OUTCOMES,
    ENTRIES_WRITTEN,
    MEMORY_LINES,
];
