use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

static METRICS: OnceLock<Metrics> = OnceLock::new();
// Serializes construction so only one registry is ever built.
static INIT_LOCK: Mutex<()> = Mutex::new(());

struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    magic_links_sent_total: IntCounterVec,
    magic_link_verifications_total: IntCounterVec,
}

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path", "status"],
        )?;
        let magic_links_sent_total = IntCounterVec::new(
            Opts::new(
                "magic_links_sent_total",
                "Magic link login attempts by outcome",
            ),
            &["outcome"],
        )?;
        let magic_link_verifications_total = IntCounterVec::new(
            Opts::new(
                "magic_link_verifications_total",
                "Magic link token verifications by outcome",
            ),
            &["outcome"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(magic_links_sent_total.clone()))?;
        registry.register(Box::new(magic_link_verifications_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            magic_links_sent_total,
            magic_link_verifications_total,
        })
    }
}

/// Create the global registry. Idempotent; recording before this is a no-op.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = Metrics::new().map_err(|e| {
        tracing::error!("Failed to initialize metrics: {}", e);
        e
    })?;
    METRICS.get_or_init(|| metrics);
    Ok(())
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    if let Some(metrics) = METRICS.get() {
        let status = status.to_string();
        let labels = [method, path, status.as_str()];
        metrics.http_requests_total.with_label_values(&labels).inc();
        metrics
            .http_request_duration_seconds
            .with_label_values(&labels)
            .observe(duration.as_secs_f64());
    }
}

pub fn record_magic_link_sent(outcome: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .magic_links_sent_total
            .with_label_values(&[outcome])
            .inc();
    }
}

pub fn record_verification(outcome: &str) {
    if let Some(metrics) = METRICS.get() {
        metrics
            .magic_link_verifications_total
            .with_label_values(&[outcome])
            .inc();
    }
}

pub fn get_metrics() -> String {
    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}
