//! Telemetry for Ponder
//!
//! Sets up `tracing` output and, when an exporter is configured, OTLP
//! export of traces and metrics.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod metadata;
pub mod metrics;

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use ponder_config::TelemetryConfig;
use ponder_config::telemetry::exporters::{ExportProtocol, ExporterConfig};

pub use metrics::StrategyMetrics;

/// Guard that flushes and shuts down exporters on drop
pub struct TelemetryGuard {
    meter_provider: Option<SdkMeterProvider>,
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.meter_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown meter provider: {e}");
        }
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

/// Initialize telemetry from configuration
///
/// Installs the global `tracing` subscriber filtered by `log_filter`. The
/// returned guard must be held for the lifetime of the process.
pub fn init(config: Option<&TelemetryConfig>, log_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let mut guard = TelemetryGuard {
        meter_provider: None,
        tracer_provider: None,
    };

    match config {
        Some(telemetry_config) if telemetry_config.has_exporter() => {
            let resource = metadata::build_resource(telemetry_config);

            if let Some(exporter) = telemetry_config.metrics_exporter() {
                let meter_provider = init_metrics(exporter, resource.clone())?;
                global::set_meter_provider(meter_provider.clone());
                guard.meter_provider = Some(meter_provider);
            }

            let otel_layer = match telemetry_config.trace_exporter() {
                Some(exporter) => {
                    let tracer_provider = init_tracer(telemetry_config, exporter, resource)?;
                    let tracer = tracer_provider.tracer("ponder");
                    global::set_tracer_provider(tracer_provider.clone());
                    guard.tracer_provider = Some(tracer_provider);
                    Some(tracing_opentelemetry::layer().with_tracer(tracer))
                }
                None => None,
            };

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(otel_layer)
                .init();
        }
        _ => {
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }

    Ok(guard)
}

/// Initialize OTLP metrics export
fn init_metrics(exporter_config: &ExporterConfig, resource: opentelemetry_sdk::Resource) -> anyhow::Result<SdkMeterProvider> {
    use opentelemetry_otlp::MetricExporter;
    use opentelemetry_sdk::metrics::PeriodicReader;

    let exporter = match exporter_config.protocol {
        ExportProtocol::Grpc => MetricExporter::builder()
            .with_tonic()
            .with_endpoint(exporter_config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build gRPC metrics exporter: {e}"))?,
        ExportProtocol::HttpProto => MetricExporter::builder()
            .with_http()
            .with_endpoint(exporter_config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP metrics exporter: {e}"))?,
    };

    let reader = PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(exporter_config.interval_seconds))
        .build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

/// Initialize OTLP trace export
fn init_tracer(
    config: &TelemetryConfig,
    exporter_config: &ExporterConfig,
    resource: opentelemetry_sdk::Resource,
) -> anyhow::Result<SdkTracerProvider> {
    use opentelemetry_otlp::SpanExporter;
    use opentelemetry_sdk::trace::Sampler;

    let exporter = match exporter_config.protocol {
        ExportProtocol::Grpc => SpanExporter::builder()
            .with_tonic()
            .with_endpoint(exporter_config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build gRPC span exporter: {e}"))?,
        ExportProtocol::HttpProto => SpanExporter::builder()
            .with_http()
            .with_endpoint(exporter_config.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP span exporter: {e}"))?,
    };

    let sampling_rate = config.tracing.as_ref().map_or(1.0, |t| t.sampling_rate);

    let sampler = if sampling_rate >= 1.0 {
        Sampler::AlwaysOn
    } else if sampling_rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(sampling_rate)
    };

    let sampler = if config.tracing.as_ref().is_none_or(|t| t.parent_based) {
        Sampler::ParentBased(Box::new(sampler))
    } else {
        sampler
    };

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(sampler)
        .with_batch_exporter(exporter)
        .build())
}
