//! # Control Events
//!
//! The event vocabulary pushed to the UI layer and the single-consumer
//! dispatcher that delivers it.
//!
//! ## Overview
//!
//! - **[`ControlEvent`]**: tagged enum with one variant per UI event
//!   (`source_set`, `playback_state_changed`, `is_playing_changed`, ...)
//! - **[`EventDispatcher`]**: holds at most one consumer; events emitted while
//!   nobody is attached are dropped, never queued
//! - **[`EventStream`]**: the consumer side, usable with `.recv().await` or as
//!   a `futures::Stream`
//!
//! ## Wire format
//!
//! Every event flattens to a map with an `"event"` key naming it:
//!
//! ```rust
//! use core_runtime::events::ControlEvent;
//!
//! let payload = ControlEvent::IsPlayingChanged { is_playing: true }.to_payload();
//! assert_eq!(payload["event"], "is_playing_changed");
//! assert_eq!(payload["is_playing"], true);
//! ```
//!
//! ## Attaching
//!
//! ```rust
//! use core_runtime::events::{ControlEvent, EventDispatcher};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let dispatcher = EventDispatcher::new();
//! dispatcher.emit(ControlEvent::SkipNext); // dropped: nobody listening
//!
//! let mut stream = dispatcher.attach();
//! dispatcher.emit(ControlEvent::SkipPrevious);
//! assert_eq!(stream.recv().await, Some(ControlEvent::SkipPrevious));
//! # }
//! ```

use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bridge_traits::EnginePlaybackState;
use core_async::sync::mpsc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Streaming strategy picked for a source reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A file on the device.
    Local,
    /// A single file fetched sequentially over HTTP.
    Progressive,
    /// A manifest-described (DASH) stream.
    Adaptive,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Progressive => "progressive",
            SourceKind::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to the UI consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControlEvent {
    SourceSet {
        url: String,
        #[serde(rename = "type")]
        source_type: SourceKind,
    },
    PlaybackStateChanged {
        state: EnginePlaybackState,
    },
    IsPlayingChanged {
        is_playing: bool,
    },
    /// Track selection changed; carries the selected audio format when known.
    TracksChanged {
        #[serde(rename = "sampleRate", skip_serializing_if = "Option::is_none", default)]
        sample_rate: Option<u32>,
        #[serde(rename = "bitDepth", skip_serializing_if = "Option::is_none", default)]
        bit_depth: Option<u8>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        channels: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        codec: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        tier: Option<String>,
    },
    TimelineChanged {
        #[serde(rename = "windowCount")]
        window_count: usize,
        reason: u8,
    },
    SkipNext,
    SkipPrevious,
    Error {
        message: String,
    },
}

impl ControlEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ControlEvent::SourceSet { .. } => "source_set",
            ControlEvent::PlaybackStateChanged { .. } => "playback_state_changed",
            ControlEvent::IsPlayingChanged { .. } => "is_playing_changed",
            ControlEvent::TracksChanged { .. } => "tracks_changed",
            ControlEvent::TimelineChanged { .. } => "timeline_changed",
            ControlEvent::SkipNext => "skip_next",
            ControlEvent::SkipPrevious => "skip_previous",
            ControlEvent::Error { .. } => "error",
        }
    }

    /// Flat `{"event": name, ...fields}` map handed to the UI channel.
    ///
    /// Skip events also carry an `action` of `"next"` / `"previous"`.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        payload.insert("event".to_string(), Value::from(self.name()));

        match self {
            ControlEvent::SkipNext => {
                payload.insert("action".to_string(), Value::from("next"));
            }
            ControlEvent::SkipPrevious => {
                payload.insert("action".to_string(), Value::from("previous"));
            }
            _ => {}
        }

        payload
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ControlEvent::Error { .. })
    }
}

struct Consumer {
    id: u64,
    tx: mpsc::UnboundedSender<ControlEvent>,
}

/// Delivers [`ControlEvent`]s to at most one consumer, in emission order.
///
/// Attaching a new consumer replaces (and closes) the previous one. Nothing
/// is buffered while detached.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    consumer: Arc<Mutex<Option<Consumer>>>,
    next_id: Arc<AtomicU64>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the consumer, replacing any previous one.
    pub fn attach(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let previous = self.consumer.lock().replace(Consumer { id, tx });
        if previous.is_some() {
            tracing::debug!(consumer = id, "Replaced event consumer");
        }
        EventStream { receiver: rx }
    }

    /// Drop the current consumer. Its stream ends after draining what was
    /// already delivered.
    pub fn detach(&self) {
        if self.consumer.lock().take().is_some() {
            tracing::debug!("Event consumer detached");
        }
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer
            .lock()
            .as_ref()
            .map(|consumer| !consumer.tx.is_closed())
            .unwrap_or(false)
    }

    /// Deliver `event`. Returns `false` when it was dropped for lack of a
    /// consumer.
    pub fn emit(&self, event: ControlEvent) -> bool {
        let mut guard = self.consumer.lock();
        let Some(consumer) = guard.as_ref() else {
            tracing::trace!(event = event.name(), "No event consumer, dropping event");
            return false;
        };

        let consumer_id = consumer.id;
        match consumer.tx.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                tracing::debug!(
                    consumer = consumer_id,
                    event = event.name(),
                    "Event consumer went away, dropping event"
                );
                *guard = None;
                false
            }
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("has_consumer", &self.has_consumer())
            .finish()
    }
}

/// Consumer end of an [`EventDispatcher`].
pub struct EventStream {
    receiver: mpsc::UnboundedReceiver<ControlEvent>,
}

impl EventStream {
    /// Next event, or `None` once this consumer has been detached or replaced
    /// and everything delivered to it has been read.
    pub async fn recv(&mut self) -> Option<ControlEvent> {
        self.receiver.recv().await
    }

    /// Next already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<ControlEvent> {
        self.receiver.try_recv().ok()
    }
}

impl futures::Stream for EventStream {
    type Item = ControlEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").finish_non_exhaustive()
    }
}
