//! Async runtime shim for the playback core.
//!
//! Every core crate goes through this crate instead of naming Tokio
//! directly, so the executor choice lives in one place:
//!
//! - `task`: spawning futures and blocking work
//! - `time`: sleeps, timeouts and instants
//! - `sync`: channels and async-aware locks
//! - `runtime`: entry points for synchronous callers
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

// Entry-point/test macros so downstream crates never need a direct Tokio
// dependency for `#[tokio::test]`.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

/// Waits on multiple branches and runs the first one that completes.
///
/// The command loops in `core-service` use this to multiplex their request
/// channel with engine notifications on a single task.
pub use tokio::select;
