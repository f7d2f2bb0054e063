//! # Logging & Tracing
//!
//! `tracing` based logging for the playback core:
//! - Pretty, JSON or compact output
//! - Per-crate filtering through `EnvFilter`
//! - Forwarding to host logging via `LoggerSink`
//! - Redaction of source and artwork references
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::time::LogLevel;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug),
//! )?;
//! ```
//!
//! ## LoggerSink integration
//!
//! With a sink configured, every event that passes the filter is also turned
//! into a [`LogEntry`] and handed to the host (Logcat, os_log). When PII
//! redaction is on, fields that carry references (`url`, `uri`, `art_url`,
//! `reference`, `path`) are scrubbed before they leave the process.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_async::runtime;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::error::{Error, Result};

/// Crates whose logs follow the configured level by default.
const WORKSPACE_TARGETS: &[&str] = &[
    "hires_playback",
    "core_runtime",
    "core_playback",
    "core_service",
    "bridge_desktop",
];

/// Noisy dependencies held at `warn` unless a custom filter is given.
const QUIET_TARGETS: &[&str] = &["h2", "hyper", "hyper_util", "reqwest", "rustls"];

/// Substrings of field names whose values must never reach a host log.
const CREDENTIAL_MARKERS: &[&str] = &[
    "token",
    "signature",
    "password",
    "secret",
    "authorization",
    "cookie",
    "credential",
];

/// Field names whose values are source or artwork references.
const REFERENCE_FIELDS: &[&str] = &["url", "uri", "art_url", "reference", "path", "source"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    Pretty,
    /// One JSON object per line.
    Json,
    /// Single-line.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Scrub credentials and query strings from references forwarded to the sink.
    pub redact_pii: bool,
    /// Custom `EnvFilter` directive string, e.g. `"core_playback=trace"`.
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            redact_pii: true,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("redact_pii", &self.redact_pii)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.as_ref().map(|_| "LoggerSink"))
            .field("enable_spans", &self.enable_spans)
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_pii_redaction(mut self, redact: bool) -> Self {
        self.redact_pii = redact;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails when the filter string is invalid or a global subscriber is
/// already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let sink_layer = config
        .logger_sink
        .clone()
        .map(|sink| LoggerSinkLayer::new(sink, config.redact_pii));

    tracing_subscriber::registry()
        .with(build_fmt_layer(&config))
        .with(filter)
        .with(sink_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {e}")))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = level_name(config.level);
            WORKSPACE_TARGETS
                .iter()
                .map(|target| format!("{target}={level}"))
                .chain(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")))
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(directives).map_err(|e| Error::Config(format!("Invalid log filter: {e}")))
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

/// Console output goes to stderr so hosts that speak over stdout are not
/// disturbed.
fn build_fmt_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stderr);

    match config.format {
        LogFormat::Pretty => {
            let spans = if config.enable_spans {
                FmtSpan::ACTIVE
            } else {
                FmtSpan::NONE
            };
            layer.pretty().with_span_events(spans).boxed()
        }
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// Mirrors events into the host's [`LoggerSink`].
struct LoggerSinkLayer {
    sink: Arc<dyn LoggerSink>,
    redact: bool,
}

impl LoggerSinkLayer {
    fn new(sink: Arc<dyn LoggerSink>, redact: bool) -> Self {
        Self { sink, redact }
    }

    fn scrub(&self, key: &str, value: String) -> String {
        match self.redact {
            false => value,
            true if REFERENCE_FIELDS.contains(&key) => redact_url(&value),
            true => redact_if_sensitive(key, &value),
        }
    }
}

impl<S> Layer<S> for LoggerSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = sink_level(metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let message = fields
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);
        for (key, value) in fields.values {
            let value = self.scrub(&key, value);
            entry = entry.with_field(key, value);
        }
        if let Some(span) = ctx.lookup_current() {
            entry = entry.with_field("span", span.name());
        }

        deliver(Arc::clone(&self.sink), entry);
    }
}

/// Hand `entry` to the sink without blocking a runtime worker.
fn deliver(sink: Arc<dyn LoggerSink>, entry: LogEntry) {
    let forward = async move {
        if let Err(e) = sink.log(entry).await {
            eprintln!("logger sink rejected entry: {e}");
        }
    };

    match runtime::current() {
        Some(handle) => {
            handle.spawn(forward);
        }
        None => runtime::block_on(forward),
    }
}

/// Collects event fields as strings. Numbers and booleans reach
/// `record_debug` through the default `Visit` methods.
#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    values: BTreeMap<String, String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => {
                self.values.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

fn sink_level(level: &tracing::Level) -> LogLevel {
    if *level == tracing::Level::ERROR {
        LogLevel::Error
    } else if *level == tracing::Level::WARN {
        LogLevel::Warn
    } else if *level == tracing::Level::INFO {
        LogLevel::Info
    } else if *level == tracing::Level::DEBUG {
        LogLevel::Debug
    } else {
        LogLevel::Trace
    }
}

/// Replace the value of a credential-like field with `[REDACTED]`.
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let name = field_name.to_ascii_lowercase();
    if CREDENTIAL_MARKERS.iter().any(|marker| name.contains(marker)) {
        return "[REDACTED]".to_string();
    }
    value.to_string()
}

/// Scrub a source or artwork reference for logging.
///
/// Network references lose their userinfo, query string and fragment (signed
/// CDN URLs carry tokens there). Local references keep only the file name.
///
/// ```
/// use core_runtime::logging::redact_url;
///
/// assert_eq!(
///     redact_url("https://user:pw@cdn.example/a/track.flac?sig=abc"),
///     "https://cdn.example/a/track.flac"
/// );
/// assert_eq!(redact_url("file:///sdcard/Music/song.flac"), "file://song.flac");
/// ```
pub fn redact_url(reference: &str) -> String {
    if let Some(path) = reference.strip_prefix("file://") {
        return format!("file://{}", strip_path(path));
    }

    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    let trimmed = &reference[..end];

    let Some(scheme_end) = trimmed.find("://") else {
        return strip_path(trimmed).to_string();
    };
    let (scheme, rest) = trimmed.split_at(scheme_end + 3);
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);
    let host = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);

    format!("{scheme}{host}{path}")
}

/// Basename of a path.
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}
