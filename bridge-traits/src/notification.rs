//! Notification view model.
//!
//! The core decides *what* the background-host notification shows; hosts turn
//! a [`NotificationView`] into their native representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::artwork::Artwork;
use crate::error::BridgeError;
use crate::session::SessionToken;

/// Control action carried by a notification button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionToken {
    Play,
    Pause,
    SkipNext,
    SkipPrevious,
}

impl ActionToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionToken::Play => "play",
            ActionToken::Pause => "pause",
            ActionToken::SkipNext => "skip-next",
            ActionToken::SkipPrevious => "skip-previous",
        }
    }
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionToken {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(ActionToken::Play),
            "pause" => Ok(ActionToken::Pause),
            "skip-next" | "skip_next" | "next" => Ok(ActionToken::SkipNext),
            "skip-previous" | "skip_previous" | "previous" => Ok(ActionToken::SkipPrevious),
            other => Err(BridgeError::OperationFailed(format!(
                "unknown notification action: {other}"
            ))),
        }
    }
}

/// Platform-neutral icon identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionIcon {
    Play,
    Pause,
    SkipNext,
    SkipPrevious,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub token: ActionToken,
    pub label: String,
    pub icon: ActionIcon,
}

impl NotificationAction {
    pub fn for_token(token: ActionToken) -> Self {
        let (label, icon) = match token {
            ActionToken::Play => ("Play", ActionIcon::Play),
            ActionToken::Pause => ("Pause", ActionIcon::Pause),
            ActionToken::SkipNext => ("Next", ActionIcon::SkipNext),
            ActionToken::SkipPrevious => ("Previous", ActionIcon::SkipPrevious),
        };
        Self {
            token,
            label: label.to_string(),
            icon,
        }
    }
}

/// Lock-screen visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Secret,
}

/// Fully resolved notification content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub channel_id: String,
    pub title: String,
    pub text: String,
    pub sub_text: Option<String>,
    pub large_icon: Option<Artwork>,
    pub actions: Vec<NotificationAction>,
    /// Indices into `actions` shown in the collapsed media layout.
    pub compact_actions: Vec<usize>,
    /// Present when the view is media-styled and bound to a platform session.
    pub session: Option<SessionToken>,
    /// A persistent (non-dismissible) notification.
    pub ongoing: bool,
    pub visibility: Visibility,
    pub only_alert_once: bool,
    /// Tapping the notification body brings the UI back.
    pub reactivate_ui_on_tap: bool,
}

impl NotificationView {
    /// Action currently offered for the play/pause slot, if any.
    pub fn play_pause_action(&self) -> Option<ActionToken> {
        self.actions
            .iter()
            .map(|action| action.token)
            .find(|token| matches!(token, ActionToken::Play | ActionToken::Pause))
    }

    pub fn has_art(&self) -> bool {
        self.large_icon.is_some()
    }
}
