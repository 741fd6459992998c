use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::{error, info};

use crate::batch::BatchFetcher;
use crate::config::{PER_VIDEO_DIR, VIDEO_RUN_PREFIX};
use crate::delay_manager::Pacer;
use crate::error::Result;
use crate::input_loader;
use crate::models::{VideoRecord, VideoRun, VideoTarget};
use crate::output::{self, file_timestamp, now_iso};
use crate::resume_manager::ProgressState;
use crate::scraper::MetadataSource;

#[derive(Debug, Clone)]
pub struct VideoRunOptions {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub with_comments: bool,
    pub write_per_video: bool,
    /// 0 means no cap.
    pub max_videos: usize,
    pub skip_existing: bool,
    pub dedupe: bool,
}

impl VideoRunOptions {
    pub fn per_video_dir(&self) -> PathBuf {
        self.out_dir.join(PER_VIDEO_DIR)
    }
}

/// Fetches every target, writing per-video files as results arrive when asked to.
pub fn enrich_videos<M, P>(
    source: &M,
    fetcher: &mut BatchFetcher<P>,
    targets: &[VideoTarget],
    opts: &VideoRunOptions,
    started: DateTime<Utc>,
) -> VideoRun
where
    M: MetadataSource,
    P: Pacer,
{
    let run_started_at = started.to_rfc3339();
    let per_video_dir = opts.per_video_dir();
    let progress = if opts.skip_existing {
        ProgressState::load(&per_video_dir)
    } else {
        ProgressState::default()
    };

    info!("Enriching {} videos (comments: {})", targets.len(), opts.with_comments);
    let outcome = fetcher.run_with_skip(
        targets,
        |target| {
            let info = source.video(&target.url, opts.with_comments)?;
            let record = VideoRecord {
                video_id: target.video_id.clone(),
                url: target.url.clone(),
                username: target.username.clone(),
                scraped_at: now_iso(),
                yt_dlp: info,
            };
            if opts.write_per_video {
                if let Err(e) = output::write_json(&per_video_dir, &record.video_id, &record) {
                    error!("Failed to write per-video file for {}: {}", record.video_id, e);
                }
            }
            Ok(record)
        },
        |target| progress.contains(&target.video_id),
    );

    VideoRun {
        run_finished_at: now_iso(),
        source_input: opts.input.display().to_string(),
        video_count_requested: targets.len(),
        video_count_succeeded: outcome.results.len(),
        video_count_failed: outcome.errors.len(),
        skipped_existing: outcome.skipped,
        attempted_comments: opts.with_comments,
        stopped_early: outcome.stopped_early,
        results: outcome.results,
        errors: outcome.errors,
        run_started_at,
    }
}

pub fn select_targets(targets: Vec<VideoTarget>, opts: &VideoRunOptions) -> Vec<VideoTarget> {
    let mut targets = if opts.dedupe { input_loader::dedupe_targets(targets) } else { targets };
    if opts.max_videos > 0 {
        targets.truncate(opts.max_videos);
    }
    targets
}

pub fn run_video_enrichment<M, P>(
    source: &M,
    fetcher: &mut BatchFetcher<P>,
    opts: &VideoRunOptions,
) -> Result<PathBuf>
where
    M: MetadataSource,
    P: Pacer,
{
    let targets = select_targets(input_loader::load_video_targets(&opts.input)?, opts);
    let started = Utc::now();
    let run = enrich_videos(source, fetcher, &targets, opts, started);

    let stem = format!("{}_{}", VIDEO_RUN_PREFIX, file_timestamp(started));
    let path = output::write_json(&opts.out_dir, &stem, &run)?;
    info!(
        "Videos: {} requested, {} succeeded, {} failed, {} skipped{}",
        run.video_count_requested,
        run.video_count_succeeded,
        run.video_count_failed,
        run.skipped_existing,
        if run.stopped_early { " (stopped early)" } else { "" }
    );
    if run.video_count_failed > 0 {
        info!(
            "TikTok often blocks comment and extra metadata access; \
             failed ids are listed under \"errors\"."
        );
    }
    Ok(path)
}
