//! Routes notification actions back into the engine and the UI stream.
//!
//! Play and pause go to the engine; the resulting state change reaches the
//! UI through the event bridge like any other. Skips have no engine-side
//! meaning (there is no queue here) and go straight to the UI.

use bridge_traits::ActionToken;
use core_playback::{EngineAdapter, EventBridge};
use core_runtime::events::ControlEvent;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ControlActionRouter;

impl ControlActionRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, token: ActionToken, adapter: &EngineAdapter, bridge: &EventBridge) {
        debug!(action = %token, "Routing notification action");
        match token {
            ActionToken::Play => adapter.play(),
            ActionToken::Pause => adapter.pause(),
            ActionToken::SkipNext => bridge.emit(ControlEvent::SkipNext),
            ActionToken::SkipPrevious => bridge.emit(ControlEvent::SkipPrevious),
        }
    }
}
