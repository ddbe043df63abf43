//! OpenTelemetry metrics for the server engine
//!
//! Instruments are created on the global meter provider, so they record into
//! whatever `init_observability` installed (or into a no-op provider when
//! nothing was installed).

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Server-side instruments
pub struct ServerMetrics {
    /// HTTP-level requests handled
    pub requests_total: Counter<u64>,
    /// Time to produce a reply, in seconds
    pub request_duration: Histogram<f64>,
    /// Individual calls dispatched, by method and status
    pub calls_total: Counter<u64>,
    pub call_duration: Histogram<f64>,
    pub batch_size: Histogram<u64>,
    /// Refused calls and top-level failures, by error code
    pub errors_total: Counter<u64>,
    pub discovery_total: Counter<u64>,
}

impl ServerMetrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("jrpc.server.requests.total")
                .with_description("Total number of requests handled")
                .build(),
            request_duration: meter
                .f64_histogram("jrpc.server.request.duration")
                .with_description("Request handling duration in seconds")
                .build(),
            calls_total: meter
                .u64_counter("jrpc.server.calls.total")
                .with_description("Total number of calls dispatched")
                .build(),
            call_duration: meter
                .f64_histogram("jrpc.server.call.duration")
                .with_description("Call dispatch duration in seconds")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.server.batch.size")
                .with_description("Number of calls in batch requests")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.server.errors.total")
                .with_description("Total number of refused calls and failed requests")
                .build(),
            discovery_total: meter
                .u64_counter("jrpc.server.discovery.total")
                .with_description("Total number of service map requests")
                .build(),
        }
    }

    pub fn record_request(&self, kind: &str, duration_secs: f64) {
        let attributes = &[KeyValue::new("kind", kind.to_string())];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    pub fn record_call(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.calls_total.add(1, attributes);
        self.call_duration.record(duration_secs, attributes);
    }

    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }

    pub fn record_error(&self, code: i64) {
        let attributes = &[KeyValue::new("code", code)];
        self.errors_total.add(1, attributes);
    }

    pub fn record_discovery(&self) {
        self.discovery_total.add(1, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServerMetrics::new("test-server");

        metrics.record_request("single", 0.002);
        metrics.record_request("batch", 0.01);
        metrics.record_call("add", "success", 0.001);
        metrics.record_call("divide", "error", 0.001);
        metrics.record_batch(3);
        metrics.record_error(-32601);
        metrics.record_discovery();
    }
}
