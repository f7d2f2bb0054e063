//! Runtime entry points.
//!
//! Synchronous callers (tests, host glue running outside an executor) use
//! [`block_on`] to drive a future to completion on a throwaway
//! current-thread runtime.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be constructed (no timer/IO driver could be
/// created), which only happens when the process is out of resources.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Returns the handle of the runtime driving the current task, if any.
pub fn current() -> Option<Handle> {
    Handle::try_current().ok()
}
