use shared::metrics_defs::{MetricDef, MetricType};

pub const ITEMS_WRITTEN: MetricDef = MetricDef {
    name: "todo.items.written",
    metric_type: MetricType::Counter,
    description: "Todo items created, updated or deleted. Tagged with operation.",
};

pub const ALL_METRICS: &[MetricDef] = &[ITEMS_WRITTEN];
