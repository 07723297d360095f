use shared::metrics_defs::{MetricDef, MetricType};

pub const MESSAGES_PUBLISHED: MetricDef = MetricDef {
    name: "notify.messages.published",
    metric_type: MetricType::Counter,
    description: "Messages published to the topic",
};

pub const SUBSCRIPTION_CHANGES: MetricDef = MetricDef {
    name: "notify.subscriptions.changed",
    metric_type: MetricType::Counter,
    description: "Subscribe and unsubscribe calls. Tagged with action.",
};

pub const ALL_METRICS: &[MetricDef] = &[MESSAGES_PUBLISHED, SUBSCRIPTION_CHANGES];
