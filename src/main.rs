//! annextube-rs — sync bookkeeping for YouTube archives kept in git-annex.
//!
//! Tracks when every channel/playlist was last polled and when each video's
//! metadata, comments and captions were last fetched, decides which of
//! those are due for a refresh, and reports whether archived files have
//! their content present locally or only as annex references.

#![warn(clippy::all)]

mod cli;
mod config;
mod content;
mod ingest;
mod shutdown;
mod state;
mod types;

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::Command;
use config::Config;
use content::{ContentOracle, ContentStatus};
use state::{StateLock, SubResource, SyncStateStore};

fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Run the status command.
async fn run_status(config: Config, args: cli::StatusArgs) -> anyhow::Result<()> {
    if !config.state_path.exists() {
        println!("No sync state found at {}", config.state_path.display());
        println!("Ingest some metadata first to create it.");
        return Ok(());
    }

    let path = config.state_path.clone();
    let store = tokio::task::spawn_blocking(move || SyncStateStore::load(&path)).await?;
    let summary = store.summary();

    println!("Sync state: {}", store.path().display());
    println!();
    println!("Sources: {}", summary.sources);
    println!("Videos:  {}", summary.videos);
    println!("  Metadata fetched: {}", summary.with_metadata);
    println!("  Comments fetched: {}", summary.with_comments);
    println!("  Captions fetched: {}", summary.with_captions);
    println!();
    println!("Last source poll: {}", format_time(summary.last_source_sync));

    if args.sources.is_empty() {
        for source in store.sources() {
            println!(
                "  {:<9} {}  (polled {})",
                source.source_type.as_str(),
                source.source_url,
                format_time(source.last_sync_time)
            );
        }
    }

    for url in &args.sources {
        println!();
        match store.get_source_state(url) {
            Some(source) => {
                println!("Source {} ({})", source.source_url, source.source_type.as_str());
                println!("  Last polled:          {}", format_time(source.last_sync_time));
                println!(
                    "  Newest video:         {}",
                    format_time(source.last_video_published)
                );
                println!("  Videos tracked:       {}", source.videos_tracked_count);
            }
            None => println!("Source {} is not tracked", url),
        }
    }

    for id in &args.videos {
        println!();
        match store.get_video_state(id) {
            Some(video) => {
                println!("Video {}", video.video_id);
                println!("  Published:            {}", format_time(video.published_at));
                println!(
                    "  Metadata fetched:     {}",
                    format_time(video.last_metadata_fetch)
                );
                println!(
                    "  Comments fetched:     {}",
                    format_time(video.last_comments_fetch)
                );
                println!(
                    "  Captions fetched:     {}",
                    format_time(video.last_captions_fetch)
                );
                println!(
                    "  Views/likes/comments: {}/{}/{}",
                    video.view_count_last, video.like_count_last, video.comment_count_last
                );
            }
            None => println!("Video {} is not tracked", id),
        }
    }

    Ok(())
}

/// Run the verify command.
async fn run_verify(config: Config, args: cli::VerifyArgs) -> anyhow::Result<()> {
    let roots: Vec<PathBuf> = if args.paths.is_empty() {
        vec![config.videos_dir()]
    } else {
        args.paths.iter().map(|p| config::expand_tilde(p)).collect()
    };

    println!("Checking content under {} path(s)...", roots.len());

    let report =
        tokio::task::spawn_blocking(move || content::scan(&ContentOracle::new(), &roots)).await?;

    if args.list {
        for (path, status) in &report.entries {
            println!("{:<14} {}", status.as_str(), path.display());
        }
    }
    for (path, reason) in &report.errors {
        println!("ERROR: {} - {}", path.display(), reason);
    }

    println!();
    println!("Results:");
    for status in [
        ContentStatus::Materialized,
        ContentStatus::Referenced,
        ContentStatus::Absent,
    ] {
        println!("  {:<14} {}", status.as_str(), report.count(status));
    }
    if !report.errors.is_empty() {
        println!("  {:<14} {}", "errors", report.errors.len());
    }

    if !report.errors.is_empty() || (args.require_content && !report.all_materialized()) {
        std::process::exit(1);
    }

    Ok(())
}

/// Run the due command.
async fn run_due(config: Config, args: cli::DueArgs) -> anyhow::Result<()> {
    let path = config.state_path.clone();
    let store = tokio::task::spawn_blocking(move || SyncStateStore::load(&path)).await?;

    let ids: Vec<String> = if args.video_ids.is_empty() {
        store.videos().map(|v| v.video_id.clone()).collect()
    } else {
        args.video_ids
    };

    let now = Utc::now();
    let due: Vec<&String> = ids
        .iter()
        .filter(|id| match args.resource {
            SubResource::Comments => store.should_update_comments(id, args.window_days),
            SubResource::Captions => store.should_update_captions(id, args.window_days),
            SubResource::Metadata => {
                store.should_update_at(id, SubResource::Metadata, args.window_days, now)
            }
        })
        .collect();

    for id in &due {
        println!("{}", id);
    }
    tracing::info!(
        resource = args.resource.as_str(),
        window_days = args.window_days,
        due = due.len(),
        checked = ids.len(),
        "Refresh check complete"
    );

    Ok(())
}

/// Run the ingest command.
///
/// Holds the state lock for the whole load-modify-save cycle.
async fn run_ingest(
    config: Config,
    args: cli::IngestArgs,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    let files: Vec<PathBuf> = args.files.iter().map(|f| config::expand_tilde(f)).collect();
    let source = match (args.source, args.source_type) {
        (Some(url), Some(source_type)) => Some(ingest::IngestSource { url, source_type }),
        _ => None,
    };

    let state_path = config.state_path.clone();
    let (stats, saved) = tokio::task::spawn_blocking(move || {
        let _lock = StateLock::acquire(&state_path)?;
        let mut store = SyncStateStore::load(&state_path);

        let stats = ingest::ingest_files(
            &mut store,
            &files,
            args.comments,
            args.captions,
            source.as_ref(),
            &shutdown_token,
        );

        let saved = match store.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Sync state not saved; it will be rebuilt on the next poll"
                );
                false
            }
        };
        Ok::<_, anyhow::Error>((stats, saved))
    })
    .await??;

    println!("Recorded {} video(s)", stats.recorded);
    if stats.interrupted {
        println!("Interrupted before all files were processed");
    }
    if !saved {
        println!("WARNING: sync state could not be saved");
    }
    for (path, reason) in &stats.failed {
        println!("FAILED: {} - {}", path.display(), reason);
    }

    if !stats.failed.is_empty() {
        anyhow::bail!("{} metadata file(s) could not be ingested", stats.failed.len());
    }

    Ok(())
}

/// Run the reset-state command.
async fn run_reset_state(config: Config, args: cli::ResetStateArgs) -> anyhow::Result<()> {
    let state_path = config.state_path;

    if !state_path.exists() {
        println!("No sync state found at {}", state_path.display());
        return Ok(());
    }

    if !args.yes {
        println!("This will delete the sync state at:");
        println!("  {}", state_path.display());
        println!();
        print!("Are you sure? [y/N] ");
        use std::io::Write;
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let lock = StateLock::acquire(&state_path)?;
    tracing::debug!(lock = %lock.path().display(), "Deleting sync state");
    std::fs::remove_file(&state_path)
        .with_context(|| format!("Failed to delete {}", state_path.display()))?;
    println!("Sync state deleted.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = Config::from_cli(&cli);
    tracing::debug!(?config, "Resolved configuration");

    match cli.command {
        Command::Status(args) => run_status(config, args).await,
        Command::Verify(args) => run_verify(config, args).await,
        Command::Due(args) => run_due(config, args).await,
        Command::Ingest(args) => {
            let shutdown_token = shutdown::install_signal_handler();
            run_ingest(config, args, shutdown_token).await
        }
        Command::ResetState(args) => run_reset_state(config, args).await,
    }
}
