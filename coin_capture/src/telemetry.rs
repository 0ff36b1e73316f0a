use coin_classifier::Label;
use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;

const DURATION_BOUNDARIES_MS: [f64; 10] = [
    5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

pub struct Metrics {
    request_counter: Counter<u64>,
    classification_duration: Histogram<u64>,
    outcome_counter: Counter<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build prometheus exporter: {}", e))?;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("coin_capture");
        global::set_meter_provider(provider);

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        let classification_duration = meter
            .u64_histogram("classification_duration_ms")
            .with_boundaries(DURATION_BOUNDARIES_MS.to_vec())
            .with_description("Duration of capture-and-classify runs in milliseconds")
            .build();

        let outcome_counter = meter
            .u64_counter("classifications_total")
            .with_description("Classifications by outcome")
            .build();

        Ok(Metrics {
            request_counter,
            classification_duration,
            outcome_counter,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_classification(&self, duration_ms: u64, label: Label, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.classification_duration.record(duration_ms, &attributes);

        let attributes = vec![KeyValue::new("outcome", label.as_str())];
        self.outcome_counter.add(1, &attributes);
    }
}
