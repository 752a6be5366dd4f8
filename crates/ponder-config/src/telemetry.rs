pub mod exporters;
pub mod tracing;

use indexmap::IndexMap;
use serde::Deserialize;

use self::{exporters::ExporterConfig, tracing::TracingConfig};

/// Telemetry configuration
///
/// Without an exporter only local `tracing` output is produced.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name for telemetry metadata
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Additional resource attributes, in declaration order
    #[serde(default)]
    pub resource_attributes: IndexMap<String, String>,
    /// Default exporter shared by traces and metrics
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    /// Tracing-specific configuration
    #[serde(default)]
    pub tracing: Option<TracingConfig>,
    /// Metrics exporter override
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Override the default exporter for metrics
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
}

impl TelemetryConfig {
    /// Whether any OTLP exporter is configured
    pub fn has_exporter(&self) -> bool {
        self.exporter.is_some()
            || self.tracing.as_ref().is_some_and(|t| t.exporter.is_some())
            || self.metrics.as_ref().is_some_and(|m| m.exporter.is_some())
    }

    /// Exporter for traces, falling back to the shared exporter
    pub fn trace_exporter(&self) -> Option<&ExporterConfig> {
        self.tracing
            .as_ref()
            .and_then(|t| t.exporter.as_ref())
            .or(self.exporter.as_ref())
    }

    /// Exporter for metrics, falling back to the shared exporter
    pub fn metrics_exporter(&self) -> Option<&ExporterConfig> {
        self.metrics
            .as_ref()
            .and_then(|m| m.exporter.as_ref())
            .or(self.exporter.as_ref())
    }
}

fn default_service_name() -> String {
    "ponder".to_string()
}
