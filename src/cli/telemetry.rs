//! Logging and optional OTLP span export.
//!
//! Logs always go to stderr through `tracing-subscriber`. Spans are also exported over
//! OTLP/gRPC when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_otlp::{Compression, SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{SdkTracerProvider, Tracer},
};
use std::{env::var, time::Duration};
use tonic::{
    metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};
use ulid::Ulid;

const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

/// Exporter settings taken from the standard `OTEL_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OtlpSettings {
    endpoint: String,
    headers: Vec<(String, String)>,
    instance_id: String,
}

impl OtlpSettings {
    /// `None` when no endpoint is configured, which disables export.
    fn from_env() -> Option<Self> {
        let endpoint = var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())?;

        if let Ok(protocol) = var("OTEL_EXPORTER_OTLP_PROTOCOL")
            && protocol != "grpc"
        {
            debug!("OTEL_EXPORTER_OTLP_PROTOCOL={protocol} ignored, exporting over grpc");
        }

        Some(Self {
            endpoint: with_scheme(&endpoint),
            headers: var("OTEL_EXPORTER_OTLP_HEADERS")
                .map(|value| parse_header_pairs(&value))
                .unwrap_or_default(),
            instance_id: var("OTEL_SERVICE_INSTANCE_ID")
                .unwrap_or_else(|_| Ulid::new().to_string()),
        })
    }

    /// Host to verify the collector certificate against, for `https` endpoints.
    fn tls_domain(&self) -> Option<&str> {
        let authority = self.endpoint.strip_prefix("https://")?.split('/').next()?;
        authority.split(':').next().filter(|host| !host.is_empty())
    }

    fn metadata(&self) -> Result<MetadataMap> {
        let mut metadata = MetadataMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let key = MetadataKey::<Ascii>::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("invalid OTLP header name {name}: {e}"))?;
            let value: MetadataValue<Ascii> = value
                .parse()
                .map_err(|e| anyhow!("invalid OTLP header value for {name}: {e}"))?;
            metadata.insert(key, value);
        }
        Ok(metadata)
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes([
                KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                KeyValue::new("service.instance.id", self.instance_id.clone()),
            ])
            .build()
    }
}

// `k1=v1,k2=v2`; names are lowercased, pairs without `=` or a name are skipped.
fn parse_header_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim().to_ascii_lowercase();
            (!name.is_empty()).then(|| (name, value.trim().to_string()))
        })
        .collect()
}

// gRPC needs a scheme; assume TLS when none is given.
fn with_scheme(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    }
}

fn build_tracer(settings: &OtlpSettings) -> Result<Tracer> {
    let mut exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.endpoint)
        .with_compression(Compression::Gzip)
        .with_timeout(EXPORT_TIMEOUT);

    if let Some(domain) = settings.tls_domain() {
        exporter = exporter.with_tls_config(
            ClientTlsConfig::new()
                .domain_name(domain.to_string())
                .with_native_roots(),
        );
    }

    if !settings.headers.is_empty() {
        exporter = exporter.with_metadata(settings.metadata()?);
    }

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(
            exporter
                .build()
                .context("Failed to build OTLP span exporter")?,
        )
        .with_resource(settings.resource())
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    debug!("Exporting spans to {}", settings.endpoint);
    Ok(provider.tracer(env!("CARGO_PKG_NAME")))
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity level.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built or a subscriber is already installed.
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.unwrap_or(Level::ERROR).into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("hyper_util=error".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .pretty();

    let otel_layer = OtlpSettings::from_env()
        .map(|settings| build_tracer(&settings))
        .transpose()?
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    // `Option<Layer>` is a no-op layer when export is disabled.
    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(otel_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush and stop the span exporter, if one was started.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        debug!("shutting down tracer provider");
        if let Err(err) = provider.shutdown() {
            debug!("tracer provider shutdown failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(endpoint: &str) -> OtlpSettings {
        OtlpSettings {
            endpoint: with_scheme(endpoint),
            headers: Vec::new(),
            instance_id: "test".to_string(),
        }
    }

    #[test]
    fn parse_header_pairs_skips_malformed() {
        assert!(parse_header_pairs("").is_empty());
        assert_eq!(
            parse_header_pairs("Authorization = Basic dXNlcj1wYXNz , broken, =x, x-team=ops"),
            vec![
                ("authorization".to_string(), "Basic dXNlcj1wYXNz".to_string()),
                ("x-team".to_string(), "ops".to_string()),
            ]
        );
    }

    #[test]
    fn with_scheme_defaults_to_https() {
        assert_eq!(with_scheme("http://localhost:4317"), "http://localhost:4317");
        assert_eq!(with_scheme("localhost:4317"), "https://localhost:4317");
        assert_eq!(
            with_scheme("otel.example.com:4317/"),
            "https://otel.example.com:4317"
        );
    }

    #[test]
    fn tls_domain_only_for_https() {
        assert_eq!(
            settings("otel.example.com:4317").tls_domain(),
            Some("otel.example.com")
        );
        assert_eq!(settings("http://localhost:4317").tls_domain(), None);
    }

    #[test]
    fn metadata_rejects_invalid_names() -> Result<()> {
        let mut settings = settings("localhost:4317");
        settings.headers = parse_header_pairs("authorization=Bearer abc");
        let metadata = settings.metadata()?;
        assert!(metadata.get("authorization").is_some());

        settings.headers = vec![("bad name".to_string(), "v".to_string())];
        assert!(settings.metadata().is_err());
        Ok(())
    }

    #[test]
    fn from_env_requires_endpoint() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", None::<&str>),
                ("OTEL_EXPORTER_OTLP_HEADERS", None),
            ],
            || assert_eq!(OtlpSettings::from_env(), None),
        );

        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("collector:4317")),
                ("OTEL_EXPORTER_OTLP_HEADERS", Some("x-team=ops")),
                ("OTEL_SERVICE_INSTANCE_ID", Some("node-1")),
            ],
            || {
                assert_eq!(
                    OtlpSettings::from_env(),
                    Some(OtlpSettings {
                        endpoint: "https://collector:4317".to_string(),
                        headers: vec![("x-team".to_string(), "ops".to_string())],
                        instance_id: "node-1".to_string(),
                    })
                );
            },
        );
    }

    #[test]
    fn shutdown_without_provider_is_noop() {
        shutdown_tracer();
    }
}
