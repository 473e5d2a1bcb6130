//! Request-lifecycle tracker for outbound adapters.
//!
//! Every provider adapter pairs an in-flight call with a cancellation token
//! and a timer, and must clean that pairing up exactly once. [`RequestTracker`]
//! owns that bookkeeping so adapters do not repeat it:
//!
//! ```rust
//! use guardrail_lifecycle::{LifecycleError, RequestTracker};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let tracker = RequestTracker::new("youtube-adapter");
//!
//! let result = tracker
//!     .run(Duration::from_secs(30), |token| async move {
//!         // hand `token` to the HTTP client so the upload stops when it fires
//!         let _ = token;
//!         Ok::<_, std::io::Error>("video-id")
//!     })
//!     .await;
//!
//! assert_eq!(result.unwrap(), "video-id");
//! assert!(tracker.is_empty());
//! # }
//! ```
//!
//! On shutdown, [`RequestTracker::cancel_all`] fires every token and empties
//! the registry.

mod error;
mod events;
mod tracker;

pub use error::LifecycleError;
pub use events::{LifecycleEvent, RequestOutcome};
pub use tracker::{RequestTracker, RequestTrackerBuilder, TrackedRequest};

pub use tokio_util::sync::CancellationToken;
pub use uuid::Uuid;
