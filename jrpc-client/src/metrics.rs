//! Client metrics definitions
//!
//! OpenTelemetry instruments for one client session, recorded into the
//! global meter provider.
//!
//! # Metrics Collected
//!
//! - **round_trips_total**: Round trips by kind (single, batch, notification) and status
//! - **round_trip_duration**: Round trip latency distribution
//! - **batch_size**: Entries per committed batch
//! - **errors_total**: Failed round trips by error kind
//! - **unmatched_total**: Batch response elements that matched no call
//!
//! # Examples
//!
//! ```rust
//! use jrpc_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("my-client");
//! metrics.record_round_trip("single", "success", 0.004);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    InstrumentationScope, KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    pub round_trips_total: Counter<u64>,
    /// Round trip duration in seconds
    pub round_trip_duration: Histogram<f64>,
    pub batch_size: Histogram<u64>,
    pub errors_total: Counter<u64>,
    pub unmatched_total: Counter<u64>,
}

impl ClientMetrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        let scope = InstrumentationScope::builder(service_name.into()).build();
        let meter = global::meter_with_scope(scope);
        Self::new_with_meter(&meter)
    }

    /// Create instruments on a specific meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            round_trips_total: meter
                .u64_counter("jrpc.client.round_trips.total")
                .with_description("Total number of round trips")
                .build(),
            round_trip_duration: meter
                .f64_histogram("jrpc.client.round_trip.duration")
                .with_description("Round trip duration in seconds")
                .build(),
            batch_size: meter
                .u64_histogram("jrpc.client.batch.size")
                .with_description("Number of entries in committed batches")
                .build(),
            errors_total: meter
                .u64_counter("jrpc.client.errors.total")
                .with_description("Total number of failed round trips")
                .build(),
            unmatched_total: meter
                .u64_counter("jrpc.client.unmatched.total")
                .with_description("Total number of responses matching no pending call")
                .build(),
        }
    }

    pub fn record_round_trip(&self, kind: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("kind", kind.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.round_trips_total.add(1, attributes);
        self.round_trip_duration.record(duration_secs, attributes);
    }

    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }

    /// Record a failed round trip
    pub fn record_error(&self, error_kind: &str) {
        let attributes = &[KeyValue::new("error_kind", error_kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    pub fn record_unmatched(&self, count: u64) {
        if count > 0 {
            self.unmatched_total.add(count, &[]);
        }
    }
}
