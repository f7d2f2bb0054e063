//! # Playback Service
//!
//! The single command context of the playback core.
//!
//! [`PlaybackService::spawn`] starts one task that owns the engine adapter,
//! the event bridge and the lifecycle manager. Everything that mutates
//! playback, session or notification state runs on that task:
//!
//! - requests from [`PlaybackHandle`]s arrive as [`Command`]s
//! - engine notifications arrive on a second channel and are dropped unless
//!   they come from the engine that is currently bound
//! - cover art is fetched on spawned tasks and posted back as
//!   [`Command::ArtworkFetched`]
//!
//! The task exits when every handle is dropped, on [`PlaybackHandle::shutdown`],
//! or when the host task is removed while playing.
//!
//! ```rust,ignore
//! let handle = PlaybackService::spawn(config)?;
//! let mut events = handle.events();
//!
//! handle.host_started().await?;
//! handle.set_source("https://cdn.example/album/stream.mpd").await?;
//! handle.play().await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.name());
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{
    ActionToken, Artwork, ArtworkFetcher, EngineNotification, PlaybackEngine, RestartPolicy,
};
use core_async::sync::{mpsc, oneshot};
use core_playback::{
    AudioQuality, EngineAdapter, EventBridge, ManifestSummary, MediaSourceDescriptor,
    SourceResolver,
};
use core_runtime::config::PlaybackConfig;
use core_runtime::events::{ControlEvent, EventDispatcher, EventStream};
use core_runtime::logging::redact_url;
use tracing::{debug, info};

use crate::artwork::fetch_artwork;
use crate::error::{Result, ServiceError};
use crate::notification::{
    ArtRequest, BindOutcome, LifecycleManager, LifecycleSnapshot, TrackMetadata,
};
use crate::router::ControlActionRouter;

type Reply<T> = oneshot::Sender<T>;

/// Requests processed by the command task.
pub enum Command {
    HostStarted {
        reply: Reply<RestartPolicy>,
    },
    SetSource {
        reference: String,
        reply: Reply<Result<MediaSourceDescriptor>>,
    },
    Play {
        reply: Reply<()>,
    },
    Pause {
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<()>,
    },
    SeekTo {
        position_ms: i64,
        reply: Reply<Result<()>>,
    },
    Position {
        reply: Reply<u64>,
    },
    Duration {
        reply: Reply<u64>,
    },
    ManifestInfo {
        reply: Reply<Option<ManifestSummary>>,
    },
    AudioQuality {
        reply: Reply<Option<AudioQuality>>,
    },
    UpdateMetadata {
        metadata: TrackMetadata,
        reply: Reply<()>,
    },
    Action {
        token: ActionToken,
        reply: Reply<()>,
    },
    AttachEngine {
        engine: Arc<dyn PlaybackEngine>,
        reply: Reply<BindOutcome>,
    },
    ArtworkFetched {
        generation: u64,
        reference: String,
        result: Result<Artwork>,
    },
    TaskRemoved {
        reply: Reply<bool>,
    },
    Snapshot {
        reply: Reply<LifecycleSnapshot>,
    },
    Shutdown {
        reply: Reply<()>,
    },
}

/// Cloneable handle to a running [`PlaybackService`].
///
/// Every method fails with [`ServiceError::ServiceStopped`] once the command
/// task has exited.
#[derive(Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<Command>,
    dispatcher: EventDispatcher,
}

impl PlaybackHandle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| ServiceError::ServiceStopped)?;
        rx.await.map_err(|_| ServiceError::ServiceStopped)
    }

    /// Attach the UI event consumer, replacing any previous one.
    pub fn events(&self) -> EventStream {
        self.dispatcher.attach()
    }

    pub fn detach_events(&self) {
        self.dispatcher.detach();
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// The host process started. Returns the restart policy to report back.
    pub async fn host_started(&self) -> Result<RestartPolicy> {
        self.request(|reply| Command::HostStarted { reply }).await
    }

    pub async fn set_source(&self, reference: impl Into<String>) -> Result<MediaSourceDescriptor> {
        let reference = reference.into();
        self.request(|reply| Command::SetSource { reference, reply })
            .await?
    }

    pub async fn play(&self) -> Result<()> {
        self.request(|reply| Command::Play { reply }).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn seek_to(&self, position_ms: i64) -> Result<()> {
        self.request(|reply| Command::SeekTo { position_ms, reply })
            .await?
    }

    pub async fn current_position(&self) -> Result<u64> {
        self.request(|reply| Command::Position { reply }).await
    }

    pub async fn duration(&self) -> Result<u64> {
        self.request(|reply| Command::Duration { reply }).await
    }

    pub async fn manifest_info(&self) -> Result<Option<ManifestSummary>> {
        self.request(|reply| Command::ManifestInfo { reply }).await
    }

    pub async fn audio_quality(&self) -> Result<Option<AudioQuality>> {
        self.request(|reply| Command::AudioQuality { reply }).await
    }

    pub async fn update_metadata(&self, metadata: TrackMetadata) -> Result<()> {
        self.request(|reply| Command::UpdateMetadata { metadata, reply })
            .await
    }

    /// Deliver a notification action.
    pub async fn dispatch_action(&self, token: ActionToken) -> Result<()> {
        self.request(|reply| Command::Action { token, reply }).await
    }

    /// Bind a host-supplied engine instead of one built by the factory.
    pub async fn attach_engine(&self, engine: Arc<dyn PlaybackEngine>) -> Result<BindOutcome> {
        self.request(|reply| Command::AttachEngine { engine, reply })
            .await
    }

    /// The host task was removed. Returns `true` if the service shut down.
    pub async fn task_removed(&self) -> Result<bool> {
        self.request(|reply| Command::TaskRemoved { reply }).await
    }

    pub async fn snapshot(&self) -> Result<LifecycleSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Tear everything down and stop the command task.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

pub struct PlaybackService {
    commands: mpsc::UnboundedReceiver<Command>,
    self_commands: mpsc::WeakUnboundedSender<Command>,
    engine_events: mpsc::UnboundedReceiver<EngineNotification>,
    resolver: SourceResolver,
    adapter: EngineAdapter,
    bridge: EventBridge,
    lifecycle: LifecycleManager,
    router: ControlActionRouter,
    artwork: Option<Arc<dyn ArtworkFetcher>>,
    artwork_timeout: Duration,
}

impl PlaybackService {
    /// Validate `config` and start the command task on the current runtime.
    pub fn spawn(config: PlaybackConfig) -> Result<PlaybackHandle> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let dispatcher = EventDispatcher::new();

        let service = Self {
            commands: command_rx,
            self_commands: command_tx.downgrade(),
            engine_events: engine_rx,
            resolver: SourceResolver::new(config.resolver.clone()),
            adapter: EngineAdapter::new(
                Arc::clone(&config.engine_factory),
                config.engine_options,
                config.http.clone(),
            ),
            bridge: EventBridge::new(dispatcher.clone()),
            lifecycle: LifecycleManager::new(&config, engine_tx),
            router: ControlActionRouter::new(),
            artwork: config.artwork_fetcher.clone(),
            artwork_timeout: config.artwork_timeout,
        };

        core_async::spawn(service.run());
        info!("Playback service spawned");

        Ok(PlaybackHandle {
            commands: command_tx,
            dispatcher,
        })
    }

    async fn run(mut self) {
        loop {
            core_async::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("All playback handles dropped");
                        break;
                    };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some(notification) = self.engine_events.recv() => {
                    self.handle_engine_notification(notification);
                }
            }
        }

        self.lifecycle.teardown();
        self.adapter.detach();
        info!("Playback service stopped");
    }

    /// Returns `false` when the loop should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::HostStarted { reply } => {
                let _ = reply.send(self.lifecycle.on_host_start());
            }
            Command::SetSource { reference, reply } => {
                let _ = reply.send(self.set_source(&reference));
            }
            Command::Play { reply } => {
                self.adapter.play();
                let _ = reply.send(());
            }
            Command::Pause { reply } => {
                self.adapter.pause();
                let _ = reply.send(());
            }
            Command::Stop { reply } => {
                self.adapter.stop();
                let _ = reply.send(());
            }
            Command::SeekTo { position_ms, reply } => {
                let _ = reply.send(self.adapter.seek_to(position_ms).map_err(Into::into));
            }
            Command::Position { reply } => {
                let _ = reply.send(self.adapter.current_position());
            }
            Command::Duration { reply } => {
                let _ = reply.send(self.adapter.duration());
            }
            Command::ManifestInfo { reply } => {
                let _ = reply.send(self.adapter.manifest_info());
            }
            Command::AudioQuality { reply } => {
                let _ = reply.send(self.adapter.audio_quality());
            }
            Command::UpdateMetadata { metadata, reply } => {
                debug!(title = %metadata.title, "Metadata update");
                if let Some(request) = self.lifecycle.update_metadata(metadata) {
                    self.spawn_art_fetch(request);
                }
                let _ = reply.send(());
            }
            Command::Action { token, reply } => {
                self.router.route(token, &self.adapter, &self.bridge);
                let _ = reply.send(());
            }
            Command::AttachEngine { engine, reply } => {
                let _ = reply.send(self.attach_engine(engine));
            }
            Command::ArtworkFetched {
                generation,
                reference,
                result,
            } => {
                self.lifecycle
                    .complete_art_fetch(generation, &reference, result);
            }
            Command::TaskRemoved { reply } => {
                let shut_down = self.lifecycle.on_task_removed();
                if shut_down {
                    self.adapter.detach();
                    self.bridge.on_engine_replaced();
                }
                let _ = reply.send(shut_down);
                return !shut_down;
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.lifecycle.snapshot());
            }
            Command::Shutdown { reply } => {
                self.lifecycle.teardown();
                self.adapter.detach();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn set_source(&mut self, reference: &str) -> Result<MediaSourceDescriptor> {
        let descriptor = self.resolver.resolve(reference)?;
        let previous_engine = self.adapter.engine_id();

        self.adapter
            .set_source(descriptor.clone(), &mut self.lifecycle)?;

        if self.adapter.engine_id() != previous_engine {
            if let Some(is_playing) = self.bridge.on_engine_replaced() {
                self.lifecycle.on_is_playing_changed(is_playing);
            }
        }
        self.bridge.on_source_changed();
        self.bridge.emit(ControlEvent::SourceSet {
            url: descriptor.uri().to_string(),
            source_type: descriptor.kind(),
        });
        Ok(descriptor)
    }

    fn attach_engine(&mut self, engine: Arc<dyn PlaybackEngine>) -> BindOutcome {
        let same_engine = self.lifecycle.bound_engine_id() == Some(engine.id());
        let outcome = self.lifecycle.set_player(Arc::clone(&engine));
        if !same_engine {
            self.adapter.attach(&engine);
            if let Some(is_playing) = self.bridge.on_engine_replaced() {
                self.lifecycle.on_is_playing_changed(is_playing);
            }
        }
        outcome
    }

    fn handle_engine_notification(&mut self, notification: EngineNotification) {
        if self.lifecycle.bound_engine_id() != Some(notification.engine) {
            debug!(engine = %notification.engine, "Dropping event from unbound engine");
            return;
        }

        if let Some(is_playing) = self.bridge.handle(notification.event, &mut self.adapter) {
            self.lifecycle.on_is_playing_changed(is_playing);
        }
    }

    fn spawn_art_fetch(&self, request: ArtRequest) {
        let ArtRequest {
            generation,
            reference,
        } = request;
        let commands = self.self_commands.clone();

        let Some(fetcher) = self.artwork.clone() else {
            debug!("No artwork fetcher configured");
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(Command::ArtworkFetched {
                    generation,
                    reference,
                    result: Err(ServiceError::ImageFetch(
                        "no artwork fetcher configured".to_string(),
                    )),
                });
            }
            return;
        };

        let limit = self.artwork_timeout;
        core_async::spawn(async move {
            let result = fetch_artwork(fetcher, reference.clone(), limit).await;
            match commands.upgrade() {
                Some(commands) => {
                    let _ = commands.send(Command::ArtworkFetched {
                        generation,
                        reference,
                        result,
                    });
                }
                None => {
                    debug!(
                        art_url = %redact_url(&reference),
                        "Playback service gone before cover art arrived"
                    );
                }
            }
        });
    }
}
