use shared::metrics_defs::{MetricDef, MetricType};

pub const OPERATIONS: MetricDef = MetricDef {
    name: "queue.operations",
    metric_type: MetricType::Counter,
    description: "Queue calls made. Tagged with operation.",
};

pub const MESSAGES_RECEIVED: MetricDef = MetricDef {
    name: "queue.messages.received",
    metric_type: MetricType::Counter,
    description: "Messages handed out by receive calls",
};

pub const ALL_METRICS: &[MetricDef] = &[OPERATIONS, MESSAGES_RECEIVED];
