//! Prometheus metrics and tracing spans for catalog operations.
//!
//! Metrics are compiled in with the `metrics` feature, spans with the `tracing` feature.

#[cfg(feature = "metrics")]
pub use prometheus_metrics::{CatalogMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        metrics::{Counter, Histogram, MeterProvider as _},
        KeyValue,
    };
    use opentelemetry_prometheus::PrometheusExporter;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};

    pub static METRICS: Lazy<CatalogMetrics> = Lazy::new(CatalogMetrics::init);

    pub struct CatalogMetrics {
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub operations_total: Counter<u64>,
        pub integrity_violations_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub query_errors_total: Counter<u64>,
        pub connection_wait_duration: Histogram<f64>,
    }

    impl CatalogMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter: PrometheusExporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            let meter = provider.meter("partsguard");

            let operations_total = meter
                .u64_counter("partsguard_operations_total")
                .with_description("Catalog engine operations attempted")
                .build();

            let integrity_violations_total = meter
                .u64_counter("partsguard_integrity_violations_total")
                .with_description("Operations rejected by a catalog invariant")
                .build();

            let query_duration = meter
                .f64_histogram("partsguard_query_duration_seconds")
                .with_description("Duration of storage statements")
                .build();

            let query_errors_total = meter
                .u64_counter("partsguard_query_errors_total")
                .with_description("Storage statements that failed")
                .build();

            let connection_wait_duration = meter
                .f64_histogram("partsguard_connection_wait_seconds")
                .with_description("Time spent establishing database connections")
                .build();

            Self {
                registry,
                provider,
                operations_total,
                integrity_violations_total,
                query_duration,
                query_errors_total,
                connection_wait_duration,
            }
        }

        pub fn record_operation(&self, operation: &'static str) {
            self.operations_total
                .add(1, &[KeyValue::new("operation", operation)]);
        }

        pub fn record_violation(&self, operation: &'static str, kind: &'static str) {
            self.integrity_violations_total.add(
                1,
                &[
                    KeyValue::new("operation", operation),
                    KeyValue::new("kind", kind),
                ],
            );
        }

        pub fn record_query_duration(&self, elapsed: std::time::Duration) {
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_connection_wait(&self, elapsed: std::time::Duration) {
            self.connection_wait_duration
                .record(elapsed.as_secs_f64(), &[]);
        }

        /// Prometheus text exposition of everything recorded so far.
        pub fn render(&self) -> String {
            let mut buffer = Vec::new();
            let encoder = TextEncoder::new();
            if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
                log::warn!("failed to encode metrics: {e}");
                return String::new();
            }
            String::from_utf8_lossy(&buffer).into_owned()
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span covering one catalog engine operation (create category, link fitment, ...).
    pub fn catalog_operation_span(operation: &'static str) -> Span {
        info_span!("partsguard.operation", operation = operation)
    }

    /// Span covering a single SQL statement. Only the leading keyword is recorded.
    pub fn execute_query_span(query: &str) -> Span {
        let statement = query.split_whitespace().next().unwrap_or("");
        info_span!("partsguard.query", statement = statement)
    }

    pub fn acquire_connection_span() -> Span {
        info_span!("partsguard.connect")
    }
}

/// Runs one engine operation inside its span, counting it and any invariant it trips.
pub(crate) fn observed<T>(
    operation: &'static str,
    run: impl FnOnce() -> Result<T, crate::CatalogError>,
) -> Result<T, crate::CatalogError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::catalog_operation_span(operation).entered();
    #[cfg(feature = "metrics")]
    METRICS.record_operation(operation);

    let result = run();
    if let Err(err) = &result {
        #[cfg(feature = "metrics")]
        if err.kind() == crate::ErrorKind::IntegrityViolation {
            METRICS.record_violation(operation, err.variant_name());
        }
        log::debug!("{operation} rejected: {err}");
    }
    result
}
