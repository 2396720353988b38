//! Logging and optional OpenTelemetry export
//!
//! Logs always go to stderr so `--format json` output on stdout stays parseable.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "aegis=warn";

/// Initialize tracing
///
/// # Environment Variables
///
/// - `RUST_LOG`: filter directives (default: `aegis=warn`)
/// - `AEGIS_LOG_FORMAT`: `json` for structured logs, anything else for pretty
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (needs the `telemetry` feature)
/// - `OTEL_SERVICE_NAME`: Service name (default: aegis)
pub fn init() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    let json = std::env::var("AEGIS_LOG_FORMAT").is_ok_and(|f| f == "json");

    let fmt_layer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().pretty().with_writer(std::io::stderr).boxed()
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_err() {
        registry.try_init()?;
        tracing::debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)");
        return Ok(());
    }

    #[cfg(feature = "telemetry")]
    {
        registry.with(otel::layer()?).try_init()?;
        tracing::info!("OpenTelemetry initialized successfully");
    }

    #[cfg(not(feature = "telemetry"))]
    {
        registry.try_init()?;
        tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
        tracing::warn!("Rebuild with: cargo build --features telemetry");
    }

    Ok(())
}

#[cfg(feature = "telemetry")]
mod otel {
    use anyhow::Result;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Tracer, TracerProvider};
    use opentelemetry_sdk::Resource;
    use tracing_opentelemetry::OpenTelemetryLayer;

    pub fn layer<S>() -> Result<OpenTelemetryLayer<S, Tracer>>
    where
        S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
    {
        let service_name =
            std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "aegis".to_string());
        let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")?;

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build()?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                service_name,
            )]))
            .build();

        let tracer = provider.tracer("aegis");
        opentelemetry::global::set_tracer_provider(provider);

        Ok(tracing_opentelemetry::layer().with_tracer(tracer))
    }
}
