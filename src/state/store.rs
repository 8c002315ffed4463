//! JSON-backed sync state store.
//!
//! The whole aggregate is read and written as one document. There is no
//! per-record persistence: callers mutate the in-memory maps and call
//! [`SyncStateStore::save`] after each logical batch.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::error::StateError;
use super::types::{
    SourceSyncRecord, SourceType, StateSummary, SubResource, SyncState, VideoSyncRecord,
    VideoUpdate,
};

/// Directory inside the repository that holds tool state.
pub const STATE_DIR: &str = ".annextube";

/// File name of the sync state document.
pub const STATE_FILE: &str = "sync_state.json";

/// Location of the sync state document for a repository root.
pub fn state_path(repo: &Path) -> PathBuf {
    repo.join(STATE_DIR).join(STATE_FILE)
}

/// Owner of the sync state aggregate.
///
/// Lookups hand out clones; mutation only happens through the update
/// methods, so a record obtained before a save never aliases live state.
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    path: PathBuf,
    state: SyncState,
}

impl SyncStateStore {
    /// Create an empty store that will be saved to `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            state: SyncState::default(),
        }
    }

    /// Load the store, falling back to empty state on any problem.
    ///
    /// A missing file is a normal first run. A corrupt or unreadable file is
    /// logged and discarded: sync bookkeeping can always be rebuilt by
    /// polling the sources again.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Sync state unusable, starting fresh"
                );
                Self::new(path)
            }
        }
    }

    /// Load the store, reporting read and parse failures to the caller.
    ///
    /// A missing file still yields an empty store.
    pub fn try_load(path: &Path) -> Result<Self, StateError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No sync state yet");
                return Ok(Self::new(path));
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let state: SyncState =
            serde_json::from_str(&contents).map_err(|source| StateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(
            path = %path.display(),
            sources = state.sources.len(),
            videos = state.videos.len(),
            "Loaded sync state"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Write both maps to disk.
    ///
    /// The document is written to a sibling temp file and renamed into
    /// place. On failure the in-memory state is left as is; the next
    /// successful save will persist it.
    pub fn save(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StateError::write(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| StateError::write(&tmp_path, e))?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(StateError::write(&self.path, e));
        }

        tracing::info!(
            path = %self.path.display(),
            sources = self.state.sources.len(),
            videos = self.state.videos.len(),
            "Saved sync state"
        );
        Ok(())
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only view of the whole aggregate.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn get_source_state(&self, url: &str) -> Option<SourceSyncRecord> {
        self.state.sources.get(url).cloned()
    }

    pub fn get_video_state(&self, video_id: &str) -> Option<VideoSyncRecord> {
        self.state.videos.get(video_id).cloned()
    }

    /// All known sources, ordered by URL.
    pub fn sources(&self) -> impl Iterator<Item = &SourceSyncRecord> {
        self.state.sources.values()
    }

    /// All known videos, ordered by id.
    pub fn videos(&self) -> impl Iterator<Item = &VideoSyncRecord> {
        self.state.videos.values()
    }

    /// Record a poll of a source.
    ///
    /// `last_sync_time` is always set to now. The other fields are only
    /// overwritten when a value is supplied.
    pub fn update_source_state(
        &mut self,
        url: &str,
        source_type: SourceType,
        last_video_published: Option<DateTime<Utc>>,
        videos_tracked: Option<u64>,
    ) -> SourceSyncRecord {
        self.update_source_state_at(
            url,
            source_type,
            last_video_published,
            videos_tracked,
            Utc::now(),
        )
    }

    pub(crate) fn update_source_state_at(
        &mut self,
        url: &str,
        source_type: SourceType,
        last_video_published: Option<DateTime<Utc>>,
        videos_tracked: Option<u64>,
        now: DateTime<Utc>,
    ) -> SourceSyncRecord {
        let record = self
            .state
            .sources
            .entry(url.to_string())
            .or_insert_with(|| {
                tracing::debug!(url = %url, "Tracking new source");
                SourceSyncRecord::new(url.to_string(), source_type)
            });

        record.source_type = source_type;
        record.last_sync_time = Some(now);
        if let Some(published) = last_video_published {
            record.last_video_published = Some(published);
        }
        if let Some(count) = videos_tracked {
            record.videos_tracked_count = count;
        }

        record.clone()
    }

    /// Record fresh data for a video, creating its record if needed.
    ///
    /// Each `*_fetched` flag stamps the matching fetch time; a false flag
    /// never clears an earlier stamp.
    pub fn update_video_state(&mut self, video_id: &str, update: &VideoUpdate) -> VideoSyncRecord {
        self.update_video_state_at(video_id, update, Utc::now())
    }

    pub(crate) fn update_video_state_at(
        &mut self,
        video_id: &str,
        update: &VideoUpdate,
        now: DateTime<Utc>,
    ) -> VideoSyncRecord {
        let record = self
            .state
            .videos
            .entry(video_id.to_string())
            .or_insert_with(|| VideoSyncRecord::new(video_id.to_string()));

        if let Some(published) = update.published_at {
            record.published_at = Some(published);
        }
        if let Some(count) = update.comment_count {
            record.comment_count_last = count;
        }
        if let Some(count) = update.view_count {
            record.view_count_last = count;
        }
        if let Some(count) = update.like_count {
            record.like_count_last = count;
        }

        for (fetched, resource) in [
            (update.metadata_fetched, SubResource::Metadata),
            (update.comments_fetched, SubResource::Comments),
            (update.captions_fetched, SubResource::Captions),
        ] {
            if fetched {
                record.stamp_fetch(resource, now);
            }
        }

        tracing::debug!(
            video_id = %video_id,
            metadata = update.metadata_fetched,
            comments = update.comments_fetched,
            captions = update.captions_fetched,
            "Updated video state"
        );

        record.clone()
    }

    /// Counts for status reporting.
    pub fn summary(&self) -> StateSummary {
        let mut summary = StateSummary {
            sources: self.state.sources.len() as u64,
            videos: self.state.videos.len() as u64,
            ..StateSummary::default()
        };
        for video in self.state.videos.values() {
            summary.with_metadata += u64::from(video.last_metadata_fetch.is_some());
            summary.with_comments += u64::from(video.last_comments_fetch.is_some());
            summary.with_captions += u64::from(video.last_captions_fetch.is_some());
        }
        summary.last_source_sync = self
            .state
            .sources
            .values()
            .filter_map(|s| s.last_sync_time)
            .max();
        summary
    }
}
