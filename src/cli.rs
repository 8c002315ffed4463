use clap::{Args, Parser, Subcommand};

use crate::state::{SourceType, SubResource, DEFAULT_WINDOW_DAYS};
use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "annextube-rs",
    about = "Track sync state and content availability of a YouTube archive"
)]
pub struct Cli {
    /// Archive repository root
    #[arg(long, global = true, env = "ANNEXTUBE_REPO", default_value = ".")]
    pub repo: String,

    /// Log level (RUST_LOG overrides)
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show sync state summary and individual records
    Status(StatusArgs),

    /// Classify archived files as downloaded, tracked or metadata-only
    Verify(VerifyArgs),

    /// List videos whose comments or captions are due for a refresh
    Due(DueArgs),

    /// Record freshly fetched video metadata in the sync state
    Ingest(IngestArgs),

    /// Delete the sync state file
    ResetState(ResetStateArgs),
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show the record for this source URL
    #[arg(long = "source")]
    pub sources: Vec<String>,

    /// Show the record for this video id
    #[arg(long = "video")]
    pub videos: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Files or directories to check (default: <repo>/videos)
    pub paths: Vec<String>,

    /// Print the status of every entry
    #[arg(long)]
    pub list: bool,

    /// Exit with an error unless every entry has its content present
    #[arg(long)]
    pub require_content: bool,
}

#[derive(Args, Debug)]
pub struct DueArgs {
    /// Video ids to check (default: every known video)
    pub video_ids: Vec<String>,

    /// Days within which a refetch is unnecessary
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: u32,

    /// Sub-resource to check
    #[arg(long, value_enum, default_value = "comments")]
    pub resource: SubResource,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Metadata documents (*.info.json) to record
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Source the videos were discovered through
    #[arg(long, requires = "source_type")]
    pub source: Option<String>,

    /// Kind of source
    #[arg(long, value_enum, requires = "source")]
    pub source_type: Option<SourceType>,

    /// Comments were fetched along with the metadata
    #[arg(long)]
    pub comments: bool,

    /// Captions were fetched along with the metadata
    #[arg(long)]
    pub captions: bool,
}

#[derive(Args, Debug)]
pub struct ResetStateArgs {
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_defaults() {
        let cli = Cli::try_parse_from(["annextube-rs", "status"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);
        match cli.command {
            Command::Status(args) => {
                assert!(args.sources.is_empty());
                assert!(args.videos.is_empty());
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_repo_after_subcommand() {
        let cli = Cli::try_parse_from([
            "annextube-rs",
            "verify",
            "--repo",
            "/archive",
            "--list",
        ])
        .unwrap();
        assert_eq!(cli.repo, "/archive");
        assert!(matches!(cli.command, Command::Verify(VerifyArgs { list: true, .. })));
    }

    #[test]
    fn test_parse_due_window_and_resource() {
        let cli = Cli::try_parse_from([
            "annextube-rs",
            "due",
            "abc123",
            "--window-days",
            "14",
            "--resource",
            "captions",
        ])
        .unwrap();
        match cli.command {
            Command::Due(args) => {
                assert_eq!(args.video_ids, vec!["abc123".to_string()]);
                assert_eq!(args.window_days, 14);
                assert_eq!(args.resource, SubResource::Captions);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_due_default_window() {
        let cli = Cli::try_parse_from(["annextube-rs", "due"]).unwrap();
        match cli.command {
            Command::Due(args) => {
                assert_eq!(args.window_days, DEFAULT_WINDOW_DAYS);
                assert_eq!(args.resource, SubResource::Comments);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ingest_source_requires_type() {
        assert!(Cli::try_parse_from([
            "annextube-rs",
            "ingest",
            "a.info.json",
            "--source",
            "https://www.youtube.com/@example",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "annextube-rs",
            "ingest",
            "a.info.json",
            "--source",
            "https://www.youtube.com/@example",
            "--source-type",
            "channel",
            "--comments",
        ])
        .unwrap();
        match cli.command {
            Command::Ingest(args) => {
                assert_eq!(args.source_type, Some(SourceType::Channel));
                assert!(args.comments);
                assert!(!args.captions);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_ingest_source_type_requires_source() {
        assert!(Cli::try_parse_from([
            "annextube-rs",
            "ingest",
            "a.info.json",
            "--source-type",
            "playlist",
        ])
        .is_err());
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["annextube-rs", "ingest"]).is_err());
    }
}
