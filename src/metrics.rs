use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{global, KeyValue};
use std::sync::OnceLock;
use std::time::Instant;

/// OpenTelemetry metrics for client observability.
///
/// Singleton instance accessed via `Metrics::get()`. Without an installed
/// meter provider every instrument is a no-op.
pub struct Metrics {
    pub commands_sent: Counter<u64>,
    pub bytes_sent: Counter<u64>,
    pub send_duration: Histogram<f64>,
    pub replies_decoded: Counter<u64>,

    pub connects_total: Counter<u64>,
    pub send_retries_total: Counter<u64>,
    pub dropped_replies_total: Counter<u64>,
    pub errors_total: Counter<u64>,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    pub fn init() -> &'static Self {
        METRICS.get_or_init(|| {
            let meter = global::meter("redisio");

            Metrics {
                commands_sent: meter
                    .u64_counter("redisio_commands_sent_total")
                    .with_description("Commands written to the server")
                    .init(),

                bytes_sent: meter
                    .u64_counter("redisio_bytes_sent_total")
                    .with_description("Request bytes written to the server")
                    .init(),

                send_duration: meter
                    .f64_histogram("redisio_send_duration_seconds")
                    .with_description("Time spent writing a pipelined payload, retry included")
                    .init(),

                replies_decoded: meter
                    .u64_counter("redisio_replies_decoded_total")
                    .with_description("Top-level replies decoded")
                    .init(),

                connects_total: meter
                    .u64_counter("redisio_connects_total")
                    .with_description("Transport connections established")
                    .init(),

                send_retries_total: meter
                    .u64_counter("redisio_send_retries_total")
                    .with_description("Payloads replayed after a failed write")
                    .init(),

                dropped_replies_total: meter
                    .u64_counter("redisio_dropped_replies_total")
                    .with_description("Undelivered replies discarded when a connection was closed")
                    .init(),

                errors_total: meter
                    .u64_counter("redisio_errors_total")
                    .with_description("Errors surfaced to callers")
                    .init(),
            }
        })
    }

    pub fn get() -> &'static Self {
        Self::init()
    }

    pub fn record_send(&self, commands: usize, bytes: usize, duration: f64) {
        self.commands_sent.add(commands as u64, &[]);
        self.bytes_sent.add(bytes as u64, &[]);
        self.send_duration.record(duration, &[]);
    }

    pub fn record_reply(&self) {
        self.replies_decoded.add(1, &[]);
    }

    pub fn record_connect(&self, transport: &'static str) {
        self.connects_total
            .add(1, &[KeyValue::new("transport", transport)]);
    }

    pub fn record_retry(&self) {
        self.send_retries_total.add(1, &[]);
    }

    pub fn record_dropped_replies(&self, count: usize) {
        if count > 0 {
            self.dropped_replies_total.add(count as u64, &[]);
        }
    }

    pub fn record_error(&self, error: &crate::Error) {
        let kind = match error {
            crate::Error::Server(_) => "server",
            crate::Error::Protocol(_) => "protocol",
            crate::Error::InvalidCommand(_) => "invalid_command",
            crate::Error::Connection(_) => "connection",
            crate::Error::Handshake { .. } => "handshake",
            crate::Error::ConnectionClosed => "connection_closed",
            crate::Error::Io(_) => "io",
            crate::Error::Config(_) => "config",
        };
        self.errors_total
            .add(1, &[KeyValue::new("error_type", kind)]);
    }
}

// Timer utility for measuring durations
pub struct Timer {
    start: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
