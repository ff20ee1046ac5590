//! Logging initialization and the optional OTLP trace exporter.
//!
//! Every log record is emitted through `tracing`. Request bindings travel as
//! span fields (see `stratum_core::binding`), so the JSON formatter includes
//! them via the span list. The exporter is an injectable layer: `None` by
//! default, an OpenTelemetry layer when the `otel` feature is compiled in and
//! enabled in settings.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::Settings;

/// Keeps the request binding spans alive under target-scoped `RUST_LOG`
/// values such as `stratum_server=debug`.
const BINDING_SPANS: &str = "stratum_core::binding=error";

/// A trace export backend plugged in beneath the log formatters.
pub type ExportLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps exporter resources alive; flushes pending spans on drop.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    otel_active: bool,
}

impl TelemetryGuard {
    #[must_use]
    pub fn otel_active(&self) -> bool {
        self.otel_active
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "otel")]
        if self.otel_active {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Initializes logging and, when configured, the trace exporter.
///
/// Exporter failures are logged as warnings and the service continues
/// without export.
///
/// # Errors
///
/// Returns an error if the log filter is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(settings: &Settings) -> anyhow::Result<TelemetryGuard> {
    let (export, export_error) = match export_layer(settings) {
        Ok(layer) => (layer, None),
        Err(err) => (None, Some(err)),
    };
    let otel_active = export.is_some();

    init_tracing_with(settings, export)?;

    if let Some(err) = export_error {
        tracing::warn!(
            error = %err,
            endpoint = %settings.otel_endpoint,
            "trace exporter unavailable, continuing without it"
        );
    }

    tracing::info!(
        app = %settings.app_name,
        environment = %settings.environment,
        otel_enabled = otel_active,
        "logging initialized"
    );

    Ok(TelemetryGuard { otel_active })
}

/// Installs the global subscriber with an explicit export layer.
///
/// `RUST_LOG` overrides the level from settings; the request binding spans
/// stay enabled whatever it says. Output is JSON (with the span list carrying
/// request bindings) unless debug mode is on.
///
/// # Errors
///
/// Returns an error if the log filter is invalid or a global subscriber is
/// already installed.
pub fn init_tracing_with(settings: &Settings, export: Option<ExportLayer>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.effective_log_level()))?
        .add_directive(BINDING_SPANS.parse()?);

    let (json, human) = if settings.json_logs() {
        let json = fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(true);
        (Some(json), None)
    } else {
        (None, Some(fmt::layer().with_target(false)))
    };

    tracing_subscriber::registry()
        .with(export)
        .with(filter)
        .with(json)
        .with(human)
        .try_init()?;
    Ok(())
}

#[cfg(not(feature = "otel"))]
fn export_layer(settings: &Settings) -> anyhow::Result<Option<ExportLayer>> {
    if settings.otel_enabled {
        anyhow::bail!("OTEL_ENABLED is set but the binary was built without the `otel` feature");
    }
    Ok(None)
}

#[cfg(feature = "otel")]
fn export_layer(settings: &Settings) -> anyhow::Result<Option<ExportLayer>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::{global, KeyValue};
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Config, TracerProvider};
    use opentelemetry_sdk::Resource;

    if !settings.otel_enabled {
        return Ok(None);
    }

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(&settings.otel_endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("failed to create OTLP exporter: {e}"))?;

    let resource = Resource::new(vec![
        KeyValue::new("service.name", settings.otel_service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", settings.environment.as_str()),
    ]);

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_config(Config::default().with_resource(resource))
        .build();
    let tracer = provider.tracer("stratum-server");
    global::set_tracer_provider(provider);

    Ok(Some(tracing_opentelemetry::layer().with_tracer(tracer).boxed()))
}
