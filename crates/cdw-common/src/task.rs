//! Background tasks of the widget core
//!
//! The debounced quote timer and the wallet listener are the only detached tasks. Natively
//! they go to the tokio runtime; embedded in a page on wasm there is only the browser's
//! single-threaded event loop, so they are queued with `spawn_local` and need not be `Send`.

use std::future::Future;

use tokio::task::JoinHandle;

/// Spawn a detached task on the tokio runtime
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}

/// Spawn a detached task on the page's event loop
#[cfg(target_arch = "wasm32")]
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    tokio::task::spawn_local(future)
}
