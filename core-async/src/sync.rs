//! Synchronization primitives.
//!
//! The playback core serializes all state mutation on one command task, so
//! the primitives used most are channels: `mpsc` for commands and engine
//! notifications, `oneshot` for replies. Async locks are re-exported for the
//! few shared caches that live outside that task.

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard, Semaphore,
};

pub use tokio_util::sync::CancellationToken;
