//! comment-harvest main entry point
//!
//! This is the command-line interface for the comment-harvest crawler.

use anyhow::Context;
use clap::Parser;
use comment_harvest::checkpoint::{open_checkpoint_store, CheckpointStore};
use comment_harvest::config::{load_config_with_hash, Config, DataPaths};
use comment_harvest::crawler::{
    listen_for_shutdown, register_uploads, resolve_channel, save_channel_playlists,
    CommentHarvester, CrawlDriver, SessionContext, StopSignal,
};
use comment_harvest::quota::QuotaBudget;
use comment_harvest::sink::{load_sink_stats, print_sink_stats, NdjsonSink};
use comment_harvest::YouTubeClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// comment-harvest: a quota-governed, resumable comment crawler
///
/// Harvests every comment and reply on a channel's uploaded videos under a
/// fixed per-session unit budget. Progress is checkpointed per video, so
/// running it again continues where the previous session stopped.
#[derive(Parser, Debug)]
#[command(name = "comment-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A quota-governed, resumable comment crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Use the small diagnostic unit budget instead of the session budget
    #[arg(long)]
    diagnostic: bool,

    /// Register every uploaded video of the channel and exit
    #[arg(long, conflicts_with_all = ["playlists", "add_video", "progress", "stats", "dry_run"])]
    discover: bool,

    /// Write the channel's playlists to a JSON file and exit
    #[arg(long, conflicts_with_all = ["discover", "add_video", "progress", "stats", "dry_run"])]
    playlists: bool,

    /// Replace an existing playlists file
    #[arg(long, requires = "playlists")]
    overwrite: bool,

    /// Register a single video id and exit
    #[arg(
        long,
        value_name = "VIDEO_ID",
        conflicts_with_all = ["discover", "playlists", "progress", "stats", "dry_run"]
    )]
    add_video: Option<String>,

    /// Show checkpoint progress and exit
    #[arg(long, conflicts_with_all = ["discover", "playlists", "add_video", "stats", "dry_run"])]
    progress: bool,

    /// Show checkpoint progress and record stream statistics and exit
    #[arg(long, conflicts_with_all = ["discover", "playlists", "add_video", "progress", "dry_run"])]
    stats: bool,

    /// Validate config and show what a session would do without calling the API
    #[arg(long, conflicts_with_all = ["discover", "playlists", "add_video", "progress", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let paths = DataPaths::from_config(&config);
    let units = config.quota.units_for(cli.diagnostic);

    if cli.dry_run {
        handle_dry_run(&config, &paths, units);
        return Ok(());
    }

    paths
        .ensure_dirs()
        .context("Failed to create data directories")?;
    let checkpoint_path = paths.checkpoint_path(config.output.checkpoint_backend);
    let mut store = open_checkpoint_store(config.output.checkpoint_backend, &checkpoint_path)
        .with_context(|| format!("Failed to open checkpoint {}", checkpoint_path.display()))?;

    if cli.progress {
        handle_progress(store.as_ref())
    } else if cli.stats {
        handle_progress(store.as_ref())?;
        handle_stats(&paths)
    } else if let Some(video_id) = &cli.add_video {
        handle_add_video(store.as_mut(), video_id)
    } else if cli.discover {
        handle_discover(&config, store.as_mut(), units).await
    } else if cli.playlists {
        handle_playlists(&config, &paths, units, cli.overwrite).await
    } else {
        handle_crawl(&config, &paths, store, units).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("comment_harvest=info,warn"),
            1 => EnvFilter::new("comment_harvest=debug,info"),
            2 => EnvFilter::new("comment_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what a session would do
fn handle_dry_run(config: &Config, paths: &DataPaths, units: u64) {
    println!("=== comment-harvest Dry Run ===\n");

    println!("Channel:");
    match (&config.channel.handle, &config.channel.id) {
        (Some(handle), _) => println!("  Handle: {} (resolved at 1 unit)", handle),
        (None, Some(id)) => println!("  Id: {}", id),
        (None, None) => println!("  (none)"),
    }

    println!("\nSession:");
    println!("  Unit budget: {}", units);
    println!("  Reply threshold: {}", config.crawler.reply_threshold);
    println!("  Report every: {} videos", config.crawler.report_every);
    println!(
        "  Page sizes: threads {}, replies {}, playlists {}",
        config.crawler.thread_page_size,
        config.crawler.reply_page_size,
        config.crawler.playlist_page_size
    );

    println!("\nAPI:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Key variable: {}", config.api.api_key_env);
    println!("  Request delay: {}ms", config.api.request_delay_ms);

    println!("\nOutput:");
    println!(
        "  Checkpoint ({:?}): {}",
        config.output.checkpoint_backend,
        paths
            .checkpoint_path(config.output.checkpoint_backend)
            .display()
    );
    println!("  Records: {}", paths.comments_path().display());
    println!("  Playlists: {}", paths.playlists_path().display());

    println!("\n✓ Configuration is valid");
}

/// Handles the --progress mode: counts videos by progress
fn handle_progress(store: &dyn CheckpointStore) -> anyhow::Result<()> {
    let progress = store.progress().context("Failed to read checkpoint")?;

    println!("Videos:");
    println!("  Total: {}", progress.total());
    println!("  Done: {}", progress.done);
    println!("  Half-way: {}", progress.half_way);
    println!("  Not started: {}", progress.undone);
    println!();

    Ok(())
}

/// Handles the --stats mode: reads every record stream of the channel
fn handle_stats(paths: &DataPaths) -> anyhow::Result<()> {
    let files = paths
        .list_comment_files()
        .context("Failed to list record streams")?;
    let stats = load_sink_stats(&files).context("Failed to read record streams")?;
    print_sink_stats(&stats);
    Ok(())
}

/// Handles the --add-video mode
fn handle_add_video(store: &mut dyn CheckpointStore, video_id: &str) -> anyhow::Result<()> {
    if store.register_video(video_id)? {
        println!("✓ Registered {}", video_id.trim());
    } else {
        println!("{} is already registered", video_id.trim());
    }
    store.persist()?;
    Ok(())
}

/// Handles the --discover mode: registers every upload as pending
async fn handle_discover(
    config: &Config,
    store: &mut dyn CheckpointStore,
    units: u64,
) -> anyhow::Result<()> {
    let client = YouTubeClient::from_config(config)?;
    let budget = QuotaBudget::new(units);
    let stop = StopSignal::new();
    tokio::spawn(listen_for_shutdown(stop.clone()));

    let channel_id = resolve_channel(&client, &budget, &config.channel).await?;
    let report = register_uploads(&client, store, &budget, &stop, &channel_id).await?;

    println!(
        "✓ {} uploads found, {} newly registered ({} units)",
        report.found, report.registered, report.units_used
    );
    if !report.complete {
        println!("  Listing incomplete; run --discover again to continue");
    }
    Ok(())
}

/// Handles the --playlists mode
async fn handle_playlists(
    config: &Config,
    paths: &DataPaths,
    units: u64,
    overwrite: bool,
) -> anyhow::Result<()> {
    let client = YouTubeClient::from_config(config)?;
    let budget = QuotaBudget::new(units);
    let stop = StopSignal::new();
    tokio::spawn(listen_for_shutdown(stop.clone()));

    let channel_id = resolve_channel(&client, &budget, &config.channel).await?;
    let path = paths.playlists_path();
    let count =
        save_channel_playlists(&client, &budget, &stop, &channel_id, &path, overwrite).await?;

    println!("✓ {} playlists written to {}", count, path.display());
    Ok(())
}

/// Handles the main crawl session
async fn handle_crawl(
    config: &Config,
    paths: &DataPaths,
    store: Box<dyn CheckpointStore>,
    units: u64,
) -> anyhow::Result<()> {
    let client = YouTubeClient::from_config(config)?;
    let budget = QuotaBudget::new(units);
    let stop = StopSignal::new();
    tokio::spawn(listen_for_shutdown(stop.clone()));

    let comments_path = paths.comments_path();
    let sink = NdjsonSink::open(&comments_path)
        .with_context(|| format!("Failed to open {}", comments_path.display()))?;
    tracing::info!("Writing records to {}", comments_path.display());

    let harvester = CommentHarvester::new(client, sink, budget, stop)
        .with_reply_threshold(config.crawler.reply_threshold);
    let context = SessionContext::new(config.channel.label());
    let mut driver = CrawlDriver::new(context, harvester, store, config.crawler.report_every);

    match driver.run().await {
        Ok(summary) => {
            println!(
                "✓ Session ended: {}. {} videos ({} finished), {} comments, {} replies, {} units",
                summary.stop_reason,
                summary.videos_processed,
                summary.videos_completed,
                summary.top_level_comments,
                summary.replies,
                summary.units_used
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Session failed: {}", e);
            Err(e.into())
        }
    }
}
