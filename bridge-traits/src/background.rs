//! Background execution host.
//!
//! Keeps the process alive while a user-visible notification is shown:
//! - **Android**: foreground `Service` with a media-playback type
//! - **iOS**: audio background mode plus Now Playing info
//! - **Desktop**: usually nothing to do; see `bridge-desktop::HeadlessHost`

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::notification::NotificationView;

/// Whether the platform should resurrect a killed background process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Restart the host after it is reclaimed.
    #[default]
    Sticky,
    /// Leave it dead until the UI starts it again.
    NotSticky,
}

/// Background execution capability.
///
/// Calls are made from the core's command context and must not block.
pub trait BackgroundHost: Send + Sync {
    /// Show `view` and promote the process to foreground execution.
    /// Calling this again replaces the shown notification.
    fn promote_to_foreground(&self, view: &NotificationView) -> Result<()>;

    /// Update the shown notification without changing execution priority.
    fn post_notification(&self, view: &NotificationView) -> Result<()>;

    /// Drop foreground priority, optionally removing the notification.
    fn demote(&self, remove_notification: bool) -> Result<()>;

    fn remove_notification(&self) -> Result<()>;

    /// Terminate the background process.
    fn terminate(&self) -> Result<()>;
}
