//! Metric names and the strategy instruments

use std::time::Instant;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram};

pub const STRATEGY_REQUEST_COUNT: &str = "ponder.strategy.request.count";
pub const STRATEGY_REQUEST_DURATION: &str = "ponder.strategy.request.duration";
pub const STRATEGY_CANDIDATE_COUNT: &str = "ponder.strategy.candidate.count";
pub const STRATEGY_COMPLETION_TOKENS: &str = "ponder.strategy.completion_tokens";

fn record_duration(histogram: &Histogram<f64>, start: Instant, attributes: &[KeyValue]) {
    histogram.record(start.elapsed().as_secs_f64(), attributes);
}

/// Instruments recorded around each strategy invocation
///
/// Bound to the global meter provider, so they are no-ops until
/// [`crate::init`] installs an exporter.
#[derive(Clone)]
pub struct StrategyMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
    candidates: Histogram<u64>,
    completion_tokens: Histogram<u64>,
}

impl StrategyMetrics {
    pub fn new() -> Self {
        let meter = global::meter("ponder");

        Self {
            requests: meter
                .u64_counter(STRATEGY_REQUEST_COUNT)
                .with_description("Strategy invocations by approach and outcome")
                .build(),
            duration: meter
                .f64_histogram(STRATEGY_REQUEST_DURATION)
                .with_description("Strategy invocation latency")
                .with_unit("s")
                .build(),
            candidates: meter
                .u64_histogram(STRATEGY_CANDIDATE_COUNT)
                .with_description("Candidates returned per successful invocation")
                .build(),
            completion_tokens: meter
                .u64_histogram(STRATEGY_COMPLETION_TOKENS)
                .with_description("Backend tokens generated per invocation")
                .with_unit("{token}")
                .build(),
        }
    }

    /// Record one finished invocation
    ///
    /// `completion_tokens` is what the backend reported generating across
    /// every call the strategy made, including calls before a failure.
    pub fn record(&self, approach: &str, outcome: &'static str, start: Instant, candidates: usize, completion_tokens: u64) {
        let attributes = [
            KeyValue::new("approach", approach.to_owned()),
            KeyValue::new("outcome", outcome),
        ];

        self.requests.add(1, &attributes);
        record_duration(&self.duration, start, &attributes);

        if candidates > 0 {
            self.candidates.record(candidates as u64, &attributes[..1]);
        }

        self.completion_tokens.record(completion_tokens, &attributes);
    }
}

impl Default for StrategyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StrategyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyMetrics").finish_non_exhaustive()
    }
}
