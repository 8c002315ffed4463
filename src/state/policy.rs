//! Refresh policy for per-video sub-resources.
//!
//! Two clocks can force a refresh: content age (a video published within
//! the window is always refreshed) and observation age (a sub-resource not
//! fetched within the window is refreshed). A video with neither is skipped.

use chrono::{DateTime, Duration, Utc};

use super::store::SyncStateStore;
use super::types::{SubResource, VideoSyncRecord};

/// Window used when a command does not pass `--window-days`.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Decide whether `resource` of a video must be fetched again.
///
/// Rules, in order:
/// 1. No record, or the resource was never fetched: refresh.
/// 2. Published within `window_days` of `now`: refresh.
/// 3. Last fetch older than `window_days`: refresh.
///
/// An unknown publish time skips rule 2.
pub fn refresh_due(
    record: Option<&VideoSyncRecord>,
    resource: SubResource,
    window_days: u32,
    now: DateTime<Utc>,
) -> bool {
    let Some(record) = record else {
        return true;
    };
    let Some(last_fetch) = record.last_fetch(resource) else {
        return true;
    };

    let window = Duration::days(i64::from(window_days));

    if let Some(published) = record.published_at {
        if now - published <= window {
            return true;
        }
    }

    now - last_fetch > window
}

impl SyncStateStore {
    pub fn should_update_comments(&self, video_id: &str, window_days: u32) -> bool {
        self.should_update_at(video_id, SubResource::Comments, window_days, Utc::now())
    }

    pub fn should_update_captions(&self, video_id: &str, window_days: u32) -> bool {
        self.should_update_at(video_id, SubResource::Captions, window_days, Utc::now())
    }

    /// Policy decision for any sub-resource at an explicit time.
    pub fn should_update_at(
        &self,
        video_id: &str,
        resource: SubResource,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> bool {
        let due = refresh_due(
            self.state().videos.get(video_id),
            resource,
            window_days,
            now,
        );
        tracing::debug!(
            video_id = %video_id,
            resource = resource.as_str(),
            window_days,
            due,
            "Refresh decision"
        );
        due
    }
}
