//! # Playback Configuration
//!
//! Builder-based configuration for the playback core.
//!
//! ## Overview
//!
//! [`PlaybackConfig`] carries every host capability the core drives plus the
//! tunables for source resolution, network transport, notifications and the
//! artwork pipeline. The builder validates fail-fast: a missing required
//! capability yields [`Error::CapabilityMissing`] with an actionable message.
//!
//! ## Required Capabilities
//!
//! - `EngineFactory` - constructs the decoding/rendering engine
//! - `BackgroundHost` - keeps the process alive behind a notification
//!   (desktop default: `HeadlessHost`)
//!
//! ## Optional Capabilities
//!
//! - `MediaSessionFactory` - absent means sessions stay permanently degraded
//!   (desktop default: `InMemorySessionRegistry`)
//! - `ArtworkFetcher` - absent means notifications never show art
//!   (desktop default: `HttpArtworkFetcher`)
//! - `Clock` - defaults to the system clock
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::PlaybackConfig;
//! use std::sync::Arc;
//!
//! let config = PlaybackConfig::builder()
//!     .engine_factory(Arc::new(MyExoPlayerFactory))
//!     .background_host(Arc::new(MyForegroundService))
//!     .app_label("Iqbal Hires")
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::time::{Clock, SystemClock};
use bridge_traits::{
    ArtworkFetcher, BackgroundHost, EngineFactory, EngineOptions, HttpSourceConfig,
    MediaSessionFactory, RestartPolicy,
};

use crate::error::{Error, Result};

pub const DEFAULT_ARTWORK_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ARTWORK_CACHE_CAPACITY: usize = 16;

/// Notification channel and placeholder text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub channel_name: String,
    /// Shown as the placeholder title and as the media notification sub-text.
    pub app_label: String,
    /// Placeholder title override; falls back to `app_label` when `None`.
    pub placeholder_title: Option<String>,
    pub placeholder_text: String,
    /// Add previous/next buttons around play/pause.
    pub show_skip_actions: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_id: "hires_playback".to_string(),
            channel_name: "Music Playback".to_string(),
            app_label: "Hi-Res Player".to_string(),
            placeholder_title: None,
            placeholder_text: "Ready to play".to_string(),
            show_skip_actions: false,
        }
    }
}

impl NotificationConfig {
    pub fn placeholder_title(&self) -> &str {
        self.placeholder_title.as_deref().unwrap_or(&self.app_label)
    }
}

/// Classification rules for source references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverRules {
    pub local_scheme: String,
    /// Suffixes (with leading dot) that mark a manifest, compared case-insensitively.
    pub manifest_extensions: Vec<String>,
    /// Substrings that mark a manifest anywhere in the reference.
    pub manifest_markers: Vec<String>,
}

impl Default for ResolverRules {
    fn default() -> Self {
        Self {
            local_scheme: "file://".to_string(),
            manifest_extensions: vec![".mpd".to_string()],
            manifest_markers: vec!["manifest".to_string()],
        }
    }
}

/// Validated playback core configuration.
#[derive(Clone)]
pub struct PlaybackConfig {
    pub engine_factory: Arc<dyn EngineFactory>,
    pub background_host: Arc<dyn BackgroundHost>,
    pub session_factory: Option<Arc<dyn MediaSessionFactory>>,
    pub artwork_fetcher: Option<Arc<dyn ArtworkFetcher>>,
    pub clock: Arc<dyn Clock>,
    pub restart_policy: RestartPolicy,
    pub http: HttpSourceConfig,
    pub engine_options: EngineOptions,
    pub notification: NotificationConfig,
    pub resolver: ResolverRules,
    pub artwork_timeout: Duration,
    pub artwork_cache_capacity: usize,
}

impl std::fmt::Debug for PlaybackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackConfig")
            .field("engine_factory", &"EngineFactory { ... }")
            .field("background_host", &"BackgroundHost { ... }")
            .field(
                "session_factory",
                &self
                    .session_factory
                    .as_ref()
                    .map(|_| "MediaSessionFactory { ... }"),
            )
            .field(
                "artwork_fetcher",
                &self
                    .artwork_fetcher
                    .as_ref()
                    .map(|_| "ArtworkFetcher { ... }"),
            )
            .field("restart_policy", &self.restart_policy)
            .field("http", &self.http)
            .field("engine_options", &self.engine_options)
            .field("notification", &self.notification)
            .field("resolver", &self.resolver)
            .field("artwork_timeout", &self.artwork_timeout)
            .field("artwork_cache_capacity", &self.artwork_cache_capacity)
            .finish()
    }
}

impl PlaybackConfig {
    pub fn builder() -> PlaybackConfigBuilder {
        PlaybackConfigBuilder::default()
    }

    /// Checks value ranges.
    ///
    /// Capabilities are enforced by the builder; this covers everything a
    /// caller could have mutated afterwards.
    pub fn validate(&self) -> Result<()> {
        if self.notification.channel_id.trim().is_empty() {
            return Err(Error::Config(
                "Notification channel id cannot be empty".to_string(),
            ));
        }

        if self.http.connect_timeout.is_zero() || self.http.read_timeout.is_zero() {
            return Err(Error::Config(
                "HTTP connect/read timeouts must be greater than zero".to_string(),
            ));
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(Error::Config("HTTP user agent cannot be empty".to_string()));
        }

        if !self.engine_options.decoder_fallback {
            return Err(Error::Config(
                "Decoder fallback must stay enabled; hi-res streams rely on it".to_string(),
            ));
        }

        if self.artwork_timeout.is_zero() {
            return Err(Error::Config(
                "Artwork timeout must be greater than zero".to_string(),
            ));
        }

        if self.artwork_cache_capacity == 0 {
            return Err(Error::Config(
                "Artwork cache capacity must be greater than 0".to_string(),
            ));
        }

        if self.resolver.local_scheme.is_empty() {
            return Err(Error::Config("Local scheme cannot be empty".to_string()));
        }

        if self.resolver.manifest_extensions.is_empty()
            || self
                .resolver
                .manifest_extensions
                .iter()
                .any(|ext| ext.trim().is_empty())
        {
            return Err(Error::Config(
                "At least one non-empty manifest extension is required".to_string(),
            ));
        }

        if self.resolver.manifest_markers.is_empty()
            || self
                .resolver
                .manifest_markers
                .iter()
                .any(|marker| marker.trim().is_empty())
        {
            return Err(Error::Config(
                "At least one non-empty manifest marker is required".to_string(),
            ));
        }

        Ok(())
    }
}

fn engine_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "EngineFactory".to_string(),
        message: "An EngineFactory is required to construct the playback engine. \
                 Android: wrap ExoPlayer.Builder. iOS: wrap AVPlayer. \
                 Desktop: inject a GStreamer or rodio based engine."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn background_host_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "BackgroundHost".to_string(),
        message: "A BackgroundHost is required to keep playback alive behind a notification. \
                 Desktop: enable the 'desktop-shims' feature to use HeadlessHost. \
                 Android: inject the foreground playback service."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_background_host() -> Result<Arc<dyn BackgroundHost>> {
    use bridge_desktop::HeadlessHost;

    let host: Arc<dyn BackgroundHost> = Arc::new(HeadlessHost::new());
    Ok(host)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_background_host() -> Result<Arc<dyn BackgroundHost>> {
    Err(background_host_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_session_factory() -> Option<Arc<dyn MediaSessionFactory>> {
    use bridge_desktop::InMemorySessionRegistry;

    Some(Arc::new(InMemorySessionRegistry::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_session_factory() -> Option<Arc<dyn MediaSessionFactory>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_artwork_fetcher(
    timeout: Duration,
    http: &HttpSourceConfig,
) -> Result<Option<Arc<dyn ArtworkFetcher>>> {
    use bridge_desktop::HttpArtworkFetcher;

    let fetcher = HttpArtworkFetcher::new(timeout, &http.user_agent).map_err(|e| {
        Error::DefaultCapability {
            capability: "ArtworkFetcher",
            message: e.to_string(),
        }
    })?;
    Ok(Some(Arc::new(fetcher)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_artwork_fetcher(
    _timeout: Duration,
    _http: &HttpSourceConfig,
) -> Result<Option<Arc<dyn ArtworkFetcher>>> {
    Ok(None)
}

/// Builder for [`PlaybackConfig`].
#[derive(Default)]
pub struct PlaybackConfigBuilder {
    engine_factory: Option<Arc<dyn EngineFactory>>,
    background_host: Option<Arc<dyn BackgroundHost>>,
    session_factory: Option<Arc<dyn MediaSessionFactory>>,
    artwork_fetcher: Option<Arc<dyn ArtworkFetcher>>,
    clock: Option<Arc<dyn Clock>>,
    restart_policy: RestartPolicy,
    http: Option<HttpSourceConfig>,
    engine_options: Option<EngineOptions>,
    notification: Option<NotificationConfig>,
    resolver: Option<ResolverRules>,
    artwork_timeout: Option<Duration>,
    artwork_cache_capacity: Option<usize>,
    app_label: Option<String>,
}

impl PlaybackConfigBuilder {
    /// Sets the engine factory (required).
    pub fn engine_factory(mut self, factory: Arc<dyn EngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Sets the background host (required unless `desktop-shims` is enabled).
    pub fn background_host(mut self, host: Arc<dyn BackgroundHost>) -> Self {
        self.background_host = Some(host);
        self
    }

    pub fn session_factory(mut self, factory: Arc<dyn MediaSessionFactory>) -> Self {
        self.session_factory = Some(factory);
        self
    }

    pub fn artwork_fetcher(mut self, fetcher: Arc<dyn ArtworkFetcher>) -> Self {
        self.artwork_fetcher = Some(fetcher);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Restart behaviour reported to the host when it starts the service.
    ///
    /// Default: [`RestartPolicy::Sticky`].
    pub fn restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart_policy = policy;
        self
    }

    pub fn http(mut self, http: HttpSourceConfig) -> Self {
        self.http = Some(http);
        self
    }

    pub fn engine_options(mut self, options: EngineOptions) -> Self {
        self.engine_options = Some(options);
        self
    }

    pub fn notification(mut self, notification: NotificationConfig) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Shortcut for overriding only the app label of the notification config.
    pub fn app_label(mut self, label: impl Into<String>) -> Self {
        self.app_label = Some(label.into());
        self
    }

    pub fn resolver(mut self, rules: ResolverRules) -> Self {
        self.resolver = Some(rules);
        self
    }

    /// Upper bound for a single artwork fetch. Default: 10 s.
    pub fn artwork_timeout(mut self, timeout: Duration) -> Self {
        self.artwork_timeout = Some(timeout);
        self
    }

    /// Number of artworks kept in memory. Default: 16.
    pub fn artwork_cache_capacity(mut self, capacity: usize) -> Self {
        self.artwork_cache_capacity = Some(capacity);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// Fails with [`Error::CapabilityMissing`] when the engine factory or the
    /// background host is absent (the latter only without `desktop-shims`),
    /// and with [`Error::Config`] when a value is out of range.
    pub fn build(self) -> Result<PlaybackConfig> {
        let engine_factory = self
            .engine_factory
            .ok_or_else(engine_factory_missing_error)?;

        let background_host = match self.background_host {
            Some(host) => host,
            None => provide_default_background_host()?,
        };

        let http = self.http.unwrap_or_default();
        let artwork_timeout = self.artwork_timeout.unwrap_or(DEFAULT_ARTWORK_TIMEOUT);

        let session_factory = match self.session_factory {
            Some(factory) => Some(factory),
            None => provide_default_session_factory(),
        };

        let artwork_fetcher = match self.artwork_fetcher {
            Some(fetcher) => Some(fetcher),
            None => provide_default_artwork_fetcher(artwork_timeout, &http)?,
        };

        let mut notification = self.notification.unwrap_or_default();
        if let Some(label) = self.app_label {
            notification.app_label = label;
        }

        let config = PlaybackConfig {
            engine_factory,
            background_host,
            session_factory,
            artwork_fetcher,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            restart_policy: self.restart_policy,
            http,
            engine_options: self.engine_options.unwrap_or_default(),
            notification,
            resolver: self.resolver.unwrap_or_default(),
            artwork_timeout,
            artwork_cache_capacity: self
                .artwork_cache_capacity
                .unwrap_or(DEFAULT_ARTWORK_CACHE_CAPACITY),
        };

        config.validate()?;

        Ok(config)
    }
}
