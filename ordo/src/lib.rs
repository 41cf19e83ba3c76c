//! # Ordo
//!
//! **Ordo** serializes asynchronous work. It provides two small, independent
//! primitives for components that must apply mutations to shared in-memory
//! state in order and never concurrently, such as a record collection whose
//! writes may each span several awaits:
//!
//! - A **task queue** that runs submitted operations one at a time, in
//!   submission order, and reports each operation's outcome on its own
//!   completion handle.
//! - A **hand-off mutex** that runs critical sections one at a time and
//!   passes ownership straight from each holder to the next waiter.
//!
//! Neither primitive holds or inspects the data it protects. Callers are
//! responsible for routing every mutation through `submit` or `lock`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ordo::TaskQueue;
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue = TaskQueue::builder().name("records").build().unwrap();
//!
//!     let first = queue.submit(|| async {
//!         tokio::time::sleep(std::time::Duration::from_millis(10)).await;
//!         Ok::<_, std::io::Error>("first")
//!     });
//!     let second = queue.submit(|| async { Ok::<_, std::io::Error>("second") });
//!
//!     // `second` only starts once `first` has settled.
//!     assert_eq!(first.await.unwrap(), "first");
//!     assert_eq!(second.await.unwrap(), "second");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`queue`] — FIFO task queue, completion handles and the spawner seam
//! - [`sync`] — Hand-off mutex and its scoped guard
//! - [`error`] — Task and configuration errors
//!
//! ## Features
//!
//! - `tokio` (default) — run queued operations on the ambient tokio runtime.
//!   Without it, every queue needs an explicit [`Spawner`].

pub mod error;
pub mod queue;
pub mod sync;

pub use error::{BuildError, TaskError};
pub use queue::{CompletionHandle, Spawner, TaskId, TaskQueue, TaskQueueBuilder};
pub use sync::{Mutex, MutexGuard, MutexState};
