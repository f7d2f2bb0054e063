//! Background host for desktop and headless processes.
//!
//! Desktop processes are never reclaimed in the background, so there is
//! nothing to promote. [`HeadlessHost`] records what it was asked to show
//! so tools and tests can inspect it.

use bridge_traits::{
    background::BackgroundHost,
    error::{BridgeError, Result},
    notification::NotificationView,
};
use parking_lot::Mutex;
use tracing::{debug, info};

/// One call made on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Promoted { title: String, ongoing: bool },
    Posted { title: String, ongoing: bool },
    Demoted { notification_removed: bool },
    NotificationRemoved,
    Terminated,
}

#[derive(Default)]
struct HostInner {
    foreground: bool,
    view: Option<NotificationView>,
    terminated: bool,
    events: Vec<HostEvent>,
}

#[derive(Default)]
pub struct HeadlessHost {
    inner: Mutex<HostInner>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_foreground(&self) -> bool {
        self.inner.lock().foreground
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock().terminated
    }

    /// The notification currently on screen.
    pub fn current_view(&self) -> Option<NotificationView> {
        self.inner.lock().view.clone()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.inner.lock().events.clone()
    }

    fn with_live<T>(&self, f: impl FnOnce(&mut HostInner) -> T) -> Result<T> {
        let mut inner = self.inner.lock();
        if inner.terminated {
            return Err(BridgeError::NotAvailable("host terminated".to_string()));
        }
        Ok(f(&mut inner))
    }
}

impl BackgroundHost for HeadlessHost {
    fn promote_to_foreground(&self, view: &NotificationView) -> Result<()> {
        self.with_live(|inner| {
            if !inner.foreground {
                debug!(title = %view.title, "Entering foreground");
            }
            inner.foreground = true;
            inner.view = Some(view.clone());
            inner.events.push(HostEvent::Promoted {
                title: view.title.clone(),
                ongoing: view.ongoing,
            });
        })
    }

    fn post_notification(&self, view: &NotificationView) -> Result<()> {
        self.with_live(|inner| {
            inner.view = Some(view.clone());
            inner.events.push(HostEvent::Posted {
                title: view.title.clone(),
                ongoing: view.ongoing,
            });
        })
    }

    fn demote(&self, remove_notification: bool) -> Result<()> {
        self.with_live(|inner| {
            inner.foreground = false;
            if remove_notification {
                inner.view = None;
            }
            inner.events.push(HostEvent::Demoted {
                notification_removed: remove_notification,
            });
        })
    }

    fn remove_notification(&self) -> Result<()> {
        self.with_live(|inner| {
            inner.view = None;
            inner.events.push(HostEvent::NotificationRemoved);
        })
    }

    fn terminate(&self) -> Result<()> {
        self.with_live(|inner| {
            inner.foreground = false;
            inner.view = None;
            inner.terminated = true;
            inner.events.push(HostEvent::Terminated);
        })?;
        info!("Headless host terminated");
        Ok(())
    }
}
