//! Sync state tracking.
//!
//! Persists, per repository, when each source was last polled and when each
//! video's metadata, comments and captions were last fetched. The refresh
//! policy reads this history to decide what a sync pass must fetch again.

pub mod error;
pub mod lock;
pub mod policy;
pub mod store;
pub mod types;

pub use error::StateError;
pub use lock::StateLock;
pub use policy::DEFAULT_WINDOW_DAYS;
pub use store::{state_path, SyncStateStore};
pub use types::{SourceType, SubResource, VideoUpdate};
