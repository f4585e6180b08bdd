#![forbid(unsafe_code)]

//! Command-line front end: exports the newest videos of one channel to CSV.
//!
//! Settings come from flags first, then the process environment, then `.env`.
//! Whatever rows were collected are always written, even when a later page or
//! batch failed; the process then exits non-zero with the reason.

use anyhow::{Context, Result, anyhow, bail};
use channel_exporter::config::{SettingsOverrides, resolve_settings};
use channel_exporter::csv_export::{default_output_name, write_csv};
use channel_exporter::pipeline::{ExportRequest, describe_channel, run_export};
use channel_exporter::progress::{ProgressSink, ProgressWriter, Stage, describe};
use channel_exporter::{ChannelRef, ExportError, YouTubeClient};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "export_channel")]
#[command(about = "Export YouTube channel video metadata to CSV")]
struct Cli {
    /// Channel id (UC...), @handle, name, or channel URL
    #[arg(short, long)]
    channel: String,

    /// YouTube Data API key (defaults to YOUTUBE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum number of recent videos to export (1-1000, default 50)
    #[arg(short = 'n', long)]
    max_videos: Option<usize>,

    /// Delay between API calls in seconds (0.1-10.0, default 1.0)
    #[arg(short, long)]
    delay: Option<f64>,

    /// Output CSV path (default: youtube_export_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write JSON progress snapshots to this file
    #[arg(long)]
    progress_file: Option<PathBuf>,

    /// Alternate .env file
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Skip the channel statistics lookup
    #[arg(long)]
    skip_channel_info: bool,
}

/// Logs every notification and mirrors it into the progress file when one
/// was requested.
struct CliProgress {
    file: Option<ProgressWriter>,
}

impl ProgressSink for CliProgress {
    fn report(&mut self, stage: Stage, current: usize, total: usize) {
        info!("{}", describe(stage, current, total));
        if let Some(file) = self.file.as_mut() {
            file.report(stage, current, total);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = resolve_settings(SettingsOverrides {
        api_key: cli.api_key.clone(),
        max_results: cli.max_videos,
        delay_seconds: cli.delay,
        env_path: cli.env_file.clone(),
    })?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_name(chrono::Local::now()));

    println!("===================================");
    println!("YouTube Channel Exporter");
    println!("===================================");
    println!("Channel: {}", cli.channel);
    println!("Max videos: {}", settings.max_results);
    println!("API delay: {:.1}s", settings.delay.as_secs_f64());
    println!("Output: {}", output.display());
    println!();

    let client = YouTubeClient::new(settings.api_key.clone());
    let request = ExportRequest {
        channel: ChannelRef::new(cli.channel.clone()),
        max_results: settings.max_results,
        delay: settings.delay,
    };
    let mut progress = CliProgress {
        file: cli.progress_file.clone().map(ProgressWriter::new),
    };

    let report = run_export(&client, &request, &mut progress)
        .map_err(|err| anyhow!(user_message(&err)))?;

    if !cli.skip_channel_info {
        match describe_channel(&client, &report.channel_id) {
            Ok(Some(channel)) => {
                println!("Channel title: {}", channel.title);
                println!("   Subscribers: {}", channel.subscriber_count);
                println!("   Videos: {}", channel.video_count);
                println!("   Views: {}", channel.view_count);
                println!();
            }
            Ok(None) => warn!("no channel details returned for {}", report.channel_id),
            Err(err) => warn!("could not load channel details: {err}"),
        }
    }

    if report.enumerated == 0 && report.is_complete() {
        bail!("no videos found for channel {}", report.channel_id);
    }

    progress.report(Stage::Write, 0, report.records.len());
    write_csv(&output, &report.records)
        .with_context(|| format!("writing {}", output.display()))?;
    progress.report(Stage::Write, report.records.len(), report.records.len());

    println!("Export completed! Saved to: {}", output.display());
    println!(
        "Exported {} of {} listed videos",
        report.records.len(),
        report.enumerated
    );

    if !report.is_complete() {
        for issue in &report.issues {
            eprintln!("  Warning: {}", user_message(issue));
        }
        bail!("export is incomplete; {} rows were written", report.records.len());
    }

    Ok(())
}

fn user_message(err: &ExportError) -> String {
    match err {
        ExportError::ChannelNotFound { reference } => format!(
            "channel not found: {reference:?}. Try the full channel id (starts with UC) or check that the channel is public."
        ),
        other if other.is_quota_exceeded() => {
            format!("YouTube API quota exhausted, try again after the daily reset ({other})")
        }
        other => other.to_string(),
    }
}
