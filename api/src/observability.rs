use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::runtime::Tokio;
use opentelemetry_sdk::trace::TracerProvider;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LogFormat};
use crate::metrics;

pub struct Observability {
    pub registry: Registry,
    tracer_provider: Option<TracerProvider>,
}

impl Observability {
    pub fn init(config: &Config) -> Result<Self> {
        let registry = Registry::new_custom(Some("users".into()), None)?;
        metrics::register_all(&registry)?;

        let tracer_provider = match &config.otel_endpoint {
            Some(endpoint) => {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_tonic()
                    .with_endpoint(endpoint)
                    .build()?;

                Some(
                    TracerProvider::builder()
                        .with_batch_exporter(exporter, Tokio)
                        .with_resource(opentelemetry_sdk::Resource::new(vec![
                            KeyValue::new("service.name", "user-records-api"),
                        ]))
                        .build(),
                )
            }
            None => None,
        };

        let otel_layer = tracer_provider
            .as_ref()
            .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("user-records-api")));

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if config.is_production() {
                "api=info,tower_http=info".into()
            } else {
                "api=debug,tower_http=debug".into()
            }
        });

        let (json_layer, pretty_layer) = match config.log_format {
            LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
            LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .with(pretty_layer)
            .with(otel_layer)
            .init();

        match &config.otel_endpoint {
            Some(endpoint) => tracing::info!("Observability stack initialized (Prometheus + OTel → {})", endpoint),
            None => tracing::info!("Observability stack initialized (Prometheus, OTel export disabled)"),
        }

        Ok(Self {
            registry,
            tracer_provider,
        })
    }

    /// Flush pending spans before exit
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "failed to shut down tracer provider");
            }
        }
    }
}
