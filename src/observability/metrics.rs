use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounterVec,
    pub offers_submitted_total: IntCounter,
    pub transitions_total: IntCounterVec,
    pub oracle_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total = IntCounterVec::new(
            Opts::new("orders_created_total", "Orders created by category"),
            &["category"],
        )
        .expect("valid orders_created_total metric");

        let offers_submitted_total = IntCounter::new(
            "offers_submitted_total",
            "Total courier offers submitted",
        )
        .expect("valid offers_submitted_total metric");

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "transitions_total",
                "Lifecycle transitions by kind and outcome",
            ),
            &["transition", "outcome"],
        )
        .expect("valid transitions_total metric");

        let oracle_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "oracle_latency_seconds",
                "Latency of distance oracle calls in seconds",
            ),
            &["outcome"],
        )
        .expect("valid oracle_latency_seconds metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(offers_submitted_total.clone()))
            .expect("register offers_submitted_total");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(oracle_latency_seconds.clone()))
            .expect("register oracle_latency_seconds");

        Self {
            registry,
            orders_created_total,
            offers_submitted_total,
            transitions_total,
            oracle_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
