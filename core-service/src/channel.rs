//! Method-call control channel.
//!
//! UI layers that talk in `(method, arguments)` pairs go through
//! [`PlaybackHandle::handle_method_call`]. Argument names and error codes
//! match what Flutter-style platform channels expect.
//!
//! | Method | Arguments | Success value |
//! |--------|-----------|---------------|
//! | `setDashSource` / `setSource` | `url` | `null` |
//! | `play` / `pause` / `stop` | | `null` |
//! | `seekTo` | `positionMs` | `null` |
//! | `getCurrentPosition` / `getDuration` | | milliseconds |
//! | `getManifestInfo` | | summary map or `null` |
//! | `getAudioQuality` | | quality map or `null` |
//! | `updateMetadata` | `title`, `artist`, `albumCover` | `null` |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ServiceError;
use crate::notification::TrackMetadata;
use crate::service::PlaybackHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(Value::as_str)
    }

    fn i64_arg(&self, name: &str) -> Option<i64> {
        self.arguments.get(name).and_then(Value::as_i64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResponse {
    fn ok() -> Self {
        MethodResponse::Success(Value::Null)
    }

    fn invalid_argument(message: &str) -> Self {
        MethodResponse::Error {
            code: "INVALID_ARGUMENT".to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success(_))
    }
}

impl From<ServiceError> for MethodResponse {
    fn from(error: ServiceError) -> Self {
        MethodResponse::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

fn respond<T: Serialize>(result: crate::Result<T>) -> MethodResponse {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(value) => MethodResponse::Success(value),
            Err(e) => MethodResponse::Error {
                code: "INTERNAL".to_string(),
                message: e.to_string(),
            },
        },
        Err(e) => e.into(),
    }
}

impl PlaybackHandle {
    pub async fn handle_method_call(&self, call: MethodCall) -> MethodResponse {
        debug!(method = %call.method, "Method call");

        match call.method.as_str() {
            "setDashSource" | "setSource" => match call.str_arg("url") {
                Some(url) => respond(self.set_source(url).await.map(|_| ())),
                None => MethodResponse::invalid_argument("URL cannot be null"),
            },
            "play" => respond(self.play().await),
            "pause" => respond(self.pause().await),
            "stop" => respond(self.stop().await),
            "seekTo" => match call.i64_arg("positionMs") {
                Some(position_ms) => respond(self.seek_to(position_ms).await),
                None => MethodResponse::invalid_argument("positionMs must be an integer"),
            },
            "getCurrentPosition" => respond(self.current_position().await),
            "getDuration" => respond(self.duration().await),
            "getManifestInfo" => respond(self.manifest_info().await),
            "getAudioQuality" => respond(self.audio_quality().await),
            "updateMetadata" => {
                let metadata = TrackMetadata::new(
                    call.str_arg("title").unwrap_or_default(),
                    call.str_arg("artist").unwrap_or_default(),
                    call.str_arg("albumCover").map(str::to_string),
                );
                respond(self.update_metadata(metadata).await)
            }
            other => {
                debug!(method = other, "Unknown method");
                MethodResponse::NotImplemented
            }
        }
    }
}
