//! Task spawning.
//!
//! `spawn` is for async work that must not block the command loop (artwork
//! fetches, actor loops). `spawn_blocking` is for work that would stall an
//! executor thread, such as decoding a bitmap.

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

/// Spawns a future onto the current runtime.
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 7 });
/// assert_eq!(handle.await.unwrap(), 7);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for awaited task handles.
pub type Result<T> = std::result::Result<T, JoinError>;
