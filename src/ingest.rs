//! Reading per-video metadata documents produced by the downloader.
//!
//! Only the handful of fields the sync bookkeeping needs are extracted:
//! the id, the publish time and the engagement counters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::state::{SourceType, SyncStateStore, VideoUpdate};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read metadata file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid metadata in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Raw document layout. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct InfoDocument {
    id: String,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    release_timestamp: Option<i64>,
    #[serde(default)]
    upload_date: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
}

/// What the upstream source reported for one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoObservation {
    pub video_id: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
}

impl VideoObservation {
    /// Store update for this observation. Metadata is always stamped as
    /// fetched, since the observation is itself fresh metadata.
    pub fn to_update(&self, comments_fetched: bool, captions_fetched: bool) -> VideoUpdate {
        VideoUpdate {
            published_at: self.published_at,
            comment_count: self.comment_count,
            view_count: self.view_count,
            like_count: self.like_count,
            metadata_fetched: true,
            comments_fetched,
            captions_fetched,
        }
    }
}

/// Parse a metadata document. `origin` is only used in error messages.
pub fn parse_info(contents: &str, origin: &Path) -> Result<VideoObservation, IngestError> {
    let doc: InfoDocument = serde_json::from_str(contents).map_err(|source| IngestError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    let published_at = doc
        .timestamp
        .or(doc.release_timestamp)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .or_else(|| doc.upload_date.as_deref().and_then(parse_upload_date));

    if published_at.is_none() {
        tracing::debug!(video_id = %doc.id, "No publish time in metadata");
    }

    Ok(VideoObservation {
        video_id: doc.id,
        published_at,
        view_count: doc.view_count,
        like_count: doc.like_count,
        comment_count: doc.comment_count,
    })
}

/// Read and parse a metadata file from disk.
pub fn read_info_file(path: &Path) -> Result<VideoObservation, IngestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_info(&contents, path)
}

/// `YYYYMMDD` at midnight UTC.
fn parse_upload_date(s: &str) -> Option<DateTime<Utc>> {
    match NaiveDate::parse_from_str(s, "%Y%m%d") {
        Ok(date) => date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
        Err(_) => {
            tracing::warn!(upload_date = %s, "Ignoring malformed upload_date");
            None
        }
    }
}

/// Source a batch of metadata documents was listed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSource {
    pub url: String,
    pub source_type: SourceType,
}

/// Statistics for one ingest pass.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Number of documents recorded in the store.
    pub recorded: u64,
    /// Distinct video ids recorded.
    pub distinct_videos: u64,
    /// Documents that could not be read, with the reason.
    pub failed: Vec<(PathBuf, String)>,
    /// Newest publish time among recorded videos.
    pub newest_published: Option<DateTime<Utc>>,
    /// Whether the pass stopped early on cancellation.
    pub interrupted: bool,
}

/// Record a batch of metadata documents in `store`.
///
/// Cancellation is checked between files. When a source is given it is
/// marked as polled; the tracked-video count is only updated for a
/// complete pass, since an interrupted pass saw a partial listing.
pub fn ingest_files(
    store: &mut SyncStateStore,
    files: &[PathBuf],
    comments_fetched: bool,
    captions_fetched: bool,
    source: Option<&IngestSource>,
    cancel: &CancellationToken,
) -> IngestStats {
    let mut stats = IngestStats::default();
    let mut seen = BTreeSet::new();

    for path in files {
        if cancel.is_cancelled() {
            tracing::info!(recorded = stats.recorded, "Ingest interrupted");
            stats.interrupted = true;
            break;
        }

        let observation = match read_info_file(path) {
            Ok(obs) => obs,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping metadata file");
                stats.failed.push((path.clone(), e.to_string()));
                continue;
            }
        };

        store.update_video_state(
            &observation.video_id,
            &observation.to_update(comments_fetched, captions_fetched),
        );
        stats.recorded += 1;
        stats.newest_published = stats.newest_published.max(observation.published_at);
        seen.insert(observation.video_id);
    }
    stats.distinct_videos = seen.len() as u64;

    if let Some(source) = source {
        let previous = store
            .get_source_state(&source.url)
            .and_then(|s| s.last_video_published);
        let newest = previous.max(stats.newest_published);
        let tracked = (!stats.interrupted).then_some(stats.distinct_videos);
        let record =
            store.update_source_state(&source.url, source.source_type, newest, tracked);
        tracing::info!(
            url = %record.source_url,
            source_type = record.source_type.as_str(),
            videos = record.videos_tracked_count,
            "Recorded source poll"
        );
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("video.info.json")
    }

    #[test]
    fn test_parse_full_document() {
        let obs = parse_info(
            r#"{"id": "abc123", "title": "ignored", "timestamp": 1700000000,
                "upload_date": "20231114", "view_count": 1000,
                "like_count": 50, "comment_count": 7}"#,
            origin(),
        )
        .unwrap();
        assert_eq!(obs.video_id, "abc123");
        assert_eq!(obs.published_at, Utc.timestamp_opt(1_700_000_000, 0).single());
        assert_eq!(obs.view_count, Some(1000));
        assert_eq!(obs.like_count, Some(50));
        assert_eq!(obs.comment_count, Some(7));
    }

    #[test]
    fn test_upload_date_fallback() {
        let obs = parse_info(r#"{"id": "x", "upload_date": "20240102"}"#, origin()).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(obs.published_at, Some(expected));
    }

    #[test]
    fn test_release_timestamp_used_when_timestamp_missing() {
        let obs = parse_info(
            r#"{"id": "x", "timestamp": null, "release_timestamp": 1600000000}"#,
            origin(),
        )
        .unwrap();
        assert_eq!(obs.published_at, Utc.timestamp_opt(1_600_000_000, 0).single());
    }

    #[test]
    fn test_missing_fields_are_none() {
        let obs = parse_info(
            r#"{"id": "x", "upload_date": "garbage", "like_count": null}"#,
            origin(),
        )
        .unwrap();
        assert!(obs.published_at.is_none());
        assert!(obs.view_count.is_none());
        assert!(obs.like_count.is_none());
        assert!(obs.comment_count.is_none());
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let err = parse_info(r#"{"title": "no id"}"#, origin()).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
        assert!(err.to_string().contains("video.info.json"));
    }

    #[test]
    fn test_read_missing_file() {
        let path = std::env::temp_dir().join("annextube_ingest_tests_missing.info.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            read_info_file(&path),
            Err(IngestError::Read { .. })
        ));
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("annextube_ingest_tests").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_info(dir: &Path, id: &str, timestamp: i64, views: u64) -> PathBuf {
        let path = dir.join(format!("{}.info.json", id));
        std::fs::write(
            &path,
            format!(
                r#"{{"id": "{}", "timestamp": {}, "view_count": {}}}"#,
                id, timestamp, views
            ),
        )
        .unwrap();
        path
    }

    fn channel() -> IngestSource {
        IngestSource {
            url: "https://www.youtube.com/@example".to_string(),
            source_type: SourceType::Channel,
        }
    }

    #[test]
    fn test_ingest_records_videos_and_source() {
        let dir = test_dir("records");
        let files = vec![
            write_info(&dir, "aaa", 1_600_000_000, 10),
            write_info(&dir, "bbb", 1_700_000_000, 20),
            dir.join("broken.info.json"),
        ];
        std::fs::write(&files[2], "not json").unwrap();

        let mut store = SyncStateStore::new(&dir.join("state.json"));
        let stats = ingest_files(
            &mut store,
            &files,
            true,
            false,
            Some(&channel()),
            &CancellationToken::new(),
        );

        assert_eq!(stats.recorded, 2);
        assert_eq!(stats.distinct_videos, 2);
        assert_eq!(stats.failed.len(), 1);
        assert!(!stats.interrupted);

        let bbb = store.get_video_state("bbb").unwrap();
        assert_eq!(bbb.view_count_last, 20);
        assert!(bbb.last_metadata_fetch.is_some());
        assert!(bbb.last_comments_fetch.is_some());
        assert!(bbb.last_captions_fetch.is_none());

        let source = store.get_source_state(&channel().url).unwrap();
        assert_eq!(source.videos_tracked_count, 2);
        assert_eq!(
            source.last_video_published,
            Utc.timestamp_opt(1_700_000_000, 0).single()
        );
        assert!(source.last_sync_time.is_some());
    }

    #[test]
    fn test_ingest_keeps_newer_source_publish_time() {
        let dir = test_dir("newer_publish");
        let mut store = SyncStateStore::new(&dir.join("state.json"));
        let newest = Utc.timestamp_opt(1_800_000_000, 0).single();
        store.update_source_state(&channel().url, SourceType::Channel, newest, Some(5));

        let files = vec![write_info(&dir, "old", 1_500_000_000, 1)];
        ingest_files(
            &mut store,
            &files,
            false,
            false,
            Some(&channel()),
            &CancellationToken::new(),
        );

        let source = store.get_source_state(&channel().url).unwrap();
        assert_eq!(source.last_video_published, newest);
        assert_eq!(source.videos_tracked_count, 1);
    }

    #[test]
    fn test_cancelled_ingest_leaves_count_alone() {
        let dir = test_dir("cancelled");
        let mut store = SyncStateStore::new(&dir.join("state.json"));
        store.update_source_state(&channel().url, SourceType::Channel, None, Some(5));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let files = vec![write_info(&dir, "aaa", 1_600_000_000, 10)];
        let stats = ingest_files(&mut store, &files, false, false, Some(&channel()), &cancel);

        assert!(stats.interrupted);
        assert_eq!(stats.recorded, 0);
        assert!(store.get_video_state("aaa").is_none());
        assert_eq!(
            store.get_source_state(&channel().url).unwrap().videos_tracked_count,
            5
        );
    }

    #[test]
    fn test_to_update_stamps_metadata() {
        let obs = parse_info(r#"{"id": "x", "view_count": 3}"#, origin()).unwrap();
        let update = obs.to_update(true, false);
        assert!(update.metadata_fetched);
        assert!(update.comments_fetched);
        assert!(!update.captions_fetched);
        assert_eq!(update.view_count, Some(3));
        assert_eq!(update.comment_count, None);
    }
}
