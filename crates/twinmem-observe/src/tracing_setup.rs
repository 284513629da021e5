//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! Logs always go to stderr so command output on stdout stays parseable.
//!
//! ```no_run
//! use twinmem_observe::tracing_setup::{init_tracing, LogFormat, TracingOptions};
//!
//! init_tracing(&TracingOptions::default()).unwrap();
//!
//! // JSON lines plus OpenTelemetry spans on stdout
//! init_tracing(&TracingOptions {
//!     format: LogFormat::Json,
//!     enable_otel: true,
//!     ..Default::default()
//! })
//! .unwrap();
//! ```

use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Instrumentation scope name reported on exported spans.
pub const TRACER_NAME: &str = "twinmem";

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,twinmem=info";

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Shape of log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// Fallback filter directive; `RUST_LOG` wins when set.
    pub default_filter: String,
    pub format: LogFormat,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub enable_otel: bool,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
            enable_otel: false,
        }
    }
}

impl TracingOptions {
    /// Filter for a CLI verbosity count: 0 quiet-ish, 1 debug, 2+ trace.
    pub fn for_verbosity(verbose: u8) -> Self {
        let default_filter = match verbose {
            0 => DEFAULT_FILTER.to_string(),
            1 => "warn,twinmem=debug".to_string(),
            _ => "info,twinmem=trace".to_string(),
        };
        Self {
            default_filter,
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Build the env filter: `RUST_LOG` if present, else `fallback`.
pub fn build_filter(fallback: &str) -> Result<EnvFilter, TracingError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(directives).map_err(|e| TracingError::Filter(e.to_string()))
        }
        _ => EnvFilter::try_new(fallback).map_err(|e| TracingError::Filter(e.to_string())),
    }
}

/// Initialize the global tracing subscriber.
///
/// - Always installs an `fmt` layer on stderr with span close timing.
/// - With `enable_otel`, also bridges spans to OpenTelemetry using a stdout
///   exporter.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(options: &TracingOptions) -> Result<(), TracingError> {
    let env_filter = build_filter(&options.default_filter)?;

    let fmt_layer = match options.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    let result = if options.enable_otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer(TRACER_NAME);
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        registry.with(otel_layer).try_init()
    } else {
        registry.try_init()
    };

    result.map_err(|e| TracingError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(format = ?options.format, otel = options.enable_otel, "Tracing initialized");
    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
