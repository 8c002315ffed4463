//! Types for the sync state module.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of source a video was discovered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Channel,
    Playlist,
}

impl SourceType {
    /// Convert to the string stored in the state file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Playlist => "playlist",
        }
    }

    /// Parse from the string stored in the state file.
    #[allow(dead_code)] // Symmetric with as_str; serde handles parsing
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "channel" => Some(Self::Channel),
            "playlist" => Some(Self::Playlist),
            _ => None,
        }
    }
}

/// Per-video sub-resource with its own refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SubResource {
    Metadata,
    Comments,
    Captions,
}

impl SubResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Comments => "comments",
            Self::Captions => "captions",
        }
    }
}

/// Poll history for one channel or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSyncRecord {
    pub source_url: String,
    pub source_type: SourceType,
    /// Last time the source was asked for new videos.
    #[serde(default)]
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Publish time of the newest video seen from this source.
    #[serde(default)]
    pub last_video_published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub videos_tracked_count: u64,
}

impl SourceSyncRecord {
    /// Create a record for a source that has never been polled.
    pub fn new(source_url: String, source_type: SourceType) -> Self {
        Self {
            source_url,
            source_type,
            last_sync_time: None,
            last_video_published: None,
            videos_tracked_count: 0,
        }
    }
}

/// Fetch history and last observed counters for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSyncRecord {
    pub video_id: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_metadata_fetch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_comments_fetch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_captions_fetch: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment_count_last: u64,
    #[serde(default)]
    pub view_count_last: u64,
    #[serde(default)]
    pub like_count_last: u64,
}

impl VideoSyncRecord {
    /// Create a record for a video observed for the first time.
    pub fn new(video_id: String) -> Self {
        Self {
            video_id,
            published_at: None,
            last_metadata_fetch: None,
            last_comments_fetch: None,
            last_captions_fetch: None,
            comment_count_last: 0,
            view_count_last: 0,
            like_count_last: 0,
        }
    }

    /// Last fetch time of the given sub-resource.
    pub fn last_fetch(&self, resource: SubResource) -> Option<DateTime<Utc>> {
        match resource {
            SubResource::Metadata => self.last_metadata_fetch,
            SubResource::Comments => self.last_comments_fetch,
            SubResource::Captions => self.last_captions_fetch,
        }
    }

    /// Stamp a sub-resource as fetched at `now`.
    ///
    /// The stored time never moves backwards, even if the wall clock does.
    pub(crate) fn stamp_fetch(&mut self, resource: SubResource, now: DateTime<Utc>) {
        let slot = match resource {
            SubResource::Metadata => &mut self.last_metadata_fetch,
            SubResource::Comments => &mut self.last_comments_fetch,
            SubResource::Captions => &mut self.last_captions_fetch,
        };
        *slot = Some(match *slot {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }
}

/// Partial update for a video. `None` fields leave the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoUpdate {
    pub published_at: Option<DateTime<Utc>>,
    pub comment_count: Option<u64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub metadata_fetched: bool,
    pub comments_fetched: bool,
    pub captions_fetched: bool,
}

/// The whole persisted aggregate: both maps, saved and loaded as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSyncRecord>,
    #[serde(default)]
    pub videos: BTreeMap<String, VideoSyncRecord>,
}

/// Summary of the current sync state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSummary {
    pub sources: u64,
    pub videos: u64,
    pub with_metadata: u64,
    pub with_comments: u64,
    pub with_captions: u64,
    /// Most recent poll across all sources.
    pub last_source_sync: Option<DateTime<Utc>>,
}
