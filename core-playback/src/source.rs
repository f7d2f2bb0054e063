//! # Source Resolver
//!
//! Classifies a source reference and builds the descriptor the engine
//! adapter attaches. Classification is a pure function of the string: no
//! network or filesystem access happens here.
//!
//! | Reference | Kind |
//! |-----------|------|
//! | `file:///sdcard/Music/a.flac` | [`SourceKind::Local`] |
//! | `https://cdn/x/stream.mpd` | [`SourceKind::Adaptive`] |
//! | `https://cdn/manifest?id=7` | [`SourceKind::Adaptive`] |
//! | `https://cdn/x/track.flac` | [`SourceKind::Progressive`] |

use bridge_traits::{DataSource, EngineMediaSource, EngineSourceKind, HttpSourceConfig};
use core_runtime::config::ResolverRules;

pub use core_runtime::events::SourceKind;

use crate::error::{PlaybackError, Result};
use crate::manifest::ManifestSummary;

/// Engine-ready description of one source.
///
/// Never mutated once built; attaching a manifest summary yields a new
/// descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSourceDescriptor {
    kind: SourceKind,
    uri: String,
    local_path: Option<String>,
    manifest: Option<ManifestSummary>,
}

impl MediaSourceDescriptor {
    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The reference as the caller supplied it (trimmed).
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Percent-decoded filesystem path of a local source.
    pub fn local_path(&self) -> Option<&str> {
        self.local_path.as_deref()
    }

    pub fn manifest(&self) -> Option<&ManifestSummary> {
        self.manifest.as_ref()
    }

    pub fn with_manifest(&self, manifest: Option<ManifestSummary>) -> Self {
        Self {
            manifest,
            ..self.clone()
        }
    }

    /// Engine-native source object for this descriptor.
    ///
    /// Local files are read through a file data source; everything else
    /// goes over HTTP with `http`'s timeouts and user agent.
    pub fn to_engine_source(&self, http: &HttpSourceConfig) -> EngineMediaSource {
        match self.kind {
            SourceKind::Local => EngineMediaSource {
                kind: EngineSourceKind::Progressive,
                uri: self
                    .local_path
                    .clone()
                    .unwrap_or_else(|| self.uri.clone()),
                data_source: DataSource::File,
            },
            SourceKind::Progressive => EngineMediaSource {
                kind: EngineSourceKind::Progressive,
                uri: self.uri.clone(),
                data_source: DataSource::Http(http.clone()),
            },
            SourceKind::Adaptive => EngineMediaSource {
                kind: EngineSourceKind::Adaptive,
                uri: self.uri.clone(),
                data_source: DataSource::Http(http.clone()),
            },
        }
    }
}

/// Classifies source references according to [`ResolverRules`].
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    rules: ResolverRules,
}

impl SourceResolver {
    pub fn new(rules: ResolverRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ResolverRules {
        &self.rules
    }

    /// Classify `reference` without building a descriptor.
    pub fn classify(&self, reference: &str) -> Result<SourceKind> {
        self.resolve(reference).map(|descriptor| descriptor.kind)
    }

    /// Classify `reference` and build its descriptor.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidSource`] when the reference is empty, contains
    /// whitespace or control characters, or is a local reference whose path
    /// is empty or not valid percent-encoded UTF-8.
    pub fn resolve(&self, reference: &str) -> Result<MediaSourceDescriptor> {
        let reference = validate_reference(reference)?;

        if let Some(path) = strip_prefix_ignore_case(reference, &self.rules.local_scheme) {
            let local_path = decode_local_path(path)?;
            return Ok(MediaSourceDescriptor {
                kind: SourceKind::Local,
                uri: reference.to_string(),
                local_path: Some(local_path),
                manifest: None,
            });
        }

        let kind = if self.is_manifest(reference) {
            SourceKind::Adaptive
        } else {
            SourceKind::Progressive
        };

        Ok(MediaSourceDescriptor {
            kind,
            uri: reference.to_string(),
            local_path: None,
            manifest: None,
        })
    }

    fn is_manifest(&self, reference: &str) -> bool {
        let lowered = reference.to_ascii_lowercase();
        let without_suffix = lowered
            .split(['?', '#'])
            .next()
            .unwrap_or(lowered.as_str());

        let has_extension = self
            .rules
            .manifest_extensions
            .iter()
            .any(|ext| without_suffix.ends_with(&ext.to_ascii_lowercase()));

        has_extension
            || self
                .rules
                .manifest_markers
                .iter()
                .any(|marker| lowered.contains(&marker.to_ascii_lowercase()))
    }
}

fn validate_reference(reference: &str) -> Result<&str> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(PlaybackError::InvalidSource(
            "source reference is empty".to_string(),
        ));
    }

    if let Some(bad) = trimmed
        .chars()
        .find(|c| c.is_control() || c.is_whitespace())
    {
        return Err(PlaybackError::InvalidSource(format!(
            "source reference contains invalid character {:?}",
            bad
        )));
    }

    Ok(trimmed)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

fn decode_local_path(path: &str) -> Result<String> {
    if path.is_empty() {
        return Err(PlaybackError::InvalidSource(
            "local source reference has an empty path".to_string(),
        ));
    }

    let decoded = urlencoding::decode(path).map_err(|e| {
        PlaybackError::InvalidSource(format!("local path is not valid UTF-8: {}", e))
    })?;

    Ok(decoded.into_owned())
}
