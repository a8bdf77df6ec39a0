//! Metrics collection module for the market service
//!
//! This module provides functionality for collecting and exposing service metrics
//! using Prometheus.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, HistogramVec, IntGauge, Opts, Registry,
};
use std::time::Instant;

lazy_static! {
    /// Global Prometheus registry instance
    pub static ref REGISTRY_INSTANCE: Registry = Registry::new();

    /// Counter for tracking request counts by method
    pub static ref REQ_COUNTER_VEC: CounterVec =
        CounterVec::new(Opts::new("request_counter", "request counter"), &["method"]).unwrap();

    /// Histogram for tracking method execution times
    pub static ref METHOD_HISTOGRAM_VEC: HistogramVec = HistogramVec::new(
        HistogramOpts::new("method_cost", "method cost"),
        &["method"]
    )
    .unwrap();

    pub static ref TICK_GAUGE: IntGauge =
        IntGauge::new("market_tick", "last completed clearing cycle").unwrap();

    pub static ref TRANSACTION_COUNTER: Counter =
        Counter::new("market_transactions", "transactions emitted").unwrap();

    pub static ref ORDER_COUNTER_VEC: CounterVec =
        CounterVec::new(Opts::new("market_orders", "orders accepted"), &["side"]).unwrap();

    pub static ref REJECTED_ORDER_COUNTER: Counter =
        Counter::new("market_orders_rejected", "orders rejected at submission").unwrap();

    pub static ref EXPIRED_ORDER_COUNTER: Counter =
        Counter::new("market_orders_expired", "orders purged on expiration").unwrap();

    pub static ref SUBSCRIBER_GAUGE: IntGauge =
        IntGauge::new("market_subscribers", "registered transaction subscribers").unwrap();

    pub static ref DISCONNECTED_SUBSCRIBER_COUNTER: Counter = Counter::new(
        "market_subscribers_disconnected",
        "subscribers dropped for being closed or too slow"
    )
    .unwrap();

    pub static ref CYCLE_HISTOGRAM: Histogram = Histogram::with_opts(HistogramOpts::new(
        "market_cycle_cost",
        "clearing cycle duration including delivery"
    ))
    .unwrap();
}

/// Initializes the metrics registry
///
/// Registers all metric collectors with the global registry
pub fn init_registry() {
    let _ = REGISTRY_INSTANCE.register(Box::new(REQ_COUNTER_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(METHOD_HISTOGRAM_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(TICK_GAUGE.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(TRANSACTION_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(ORDER_COUNTER_VEC.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(REJECTED_ORDER_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(EXPIRED_ORDER_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(SUBSCRIBER_GAUGE.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(DISCONNECTED_SUBSCRIBER_COUNTER.clone()));
    let _ = REGISTRY_INSTANCE.register(Box::new(CYCLE_HISTOGRAM.clone()));
}

/// Records metrics for an async operation
///
/// This function:
/// 1. Records the start time
/// 2. Increments the request counter
/// 3. Executes the provided handler
/// 4. Records the execution time
///
/// # Arguments
///
/// * `method_name` - Name of the method being measured
/// * `handler` - Async function to execute and measure
///
/// # Returns
///
/// Returns the result of the handler function
pub async fn record_metrics<F, Fut, T>(
    method_name: &'static str,
    handler: F,
) -> Result<T, tonic::Status>
where
    F: FnOnce() -> Fut + Send,
    Fut: std::future::Future<Output = Result<T, tonic::Status>> + Send,
{
    let start = Instant::now();
    REQ_COUNTER_VEC.with_label_values(&[method_name]).inc();
    let result = handler().await;

    let elapsed = start.elapsed();
    METHOD_HISTOGRAM_VEC
        .with_label_values(&[method_name])
        .observe(elapsed.as_secs_f64());

    result
}
