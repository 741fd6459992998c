use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;

use crate::batch::BatchFetcher;
use crate::config::USER_RUN_PREFIX;
use crate::delay_manager::Pacer;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::input_loader;
use crate::models::{UserRecord, UserRun};
use crate::output::{self, file_timestamp, now_iso};
use crate::scraper::MetadataSource;

pub struct UserRunOptions {
    pub seed_file: PathBuf,
    pub out_dir: PathBuf,
    pub max_videos: usize,
}

/// Fetches every seed user and returns the finished run document. Writes nothing.
pub fn collect_users<M, P>(
    source: &M,
    fetcher: &mut BatchFetcher<P>,
    seed_file: &Path,
    usernames: &[String],
    max_videos: usize,
    started: DateTime<Utc>,
) -> UserRun
where
    M: MetadataSource,
    P: Pacer,
{
    let run_started_at = started.to_rfc3339();
    let seed_label = seed_file.display().to_string();
    let extractor = Extractor::new();

    info!("Collecting {} users (max {} videos each)", usernames.len(), max_videos);
    let outcome = fetcher.run(usernames, |username| {
        let playlist = source.profile(username, max_videos)?;
        Ok(UserRecord {
            username: username.clone(),
            seed_file: seed_label.clone(),
            run_started_at: run_started_at.clone(),
            scraped_at: now_iso(),
            source: "yt-dlp".to_string(),
            profile: extractor.extract_profile(username, &playlist),
            videos: extractor.extract_videos(username, &playlist, max_videos),
        })
    });

    UserRun {
        run_finished_at: now_iso(),
        seed_file: seed_label,
        requested_max_videos: max_videos,
        user_count_requested: usernames.len(),
        user_count_succeeded: outcome.results.len(),
        user_count_failed: outcome.errors.len(),
        stopped_early: outcome.stopped_early,
        results: outcome.results,
        errors: outcome.errors,
        run_started_at,
    }
}

pub fn run_user_collection<M, P>(
    source: &M,
    fetcher: &mut BatchFetcher<P>,
    opts: &UserRunOptions,
) -> Result<PathBuf>
where
    M: MetadataSource,
    P: Pacer,
{
    let usernames = input_loader::load_seeds(&opts.seed_file)?;
    let started = Utc::now();
    let run = collect_users(source, fetcher, &opts.seed_file, &usernames, opts.max_videos, started);

    let stem = format!("{}_{}", USER_RUN_PREFIX, file_timestamp(started));
    let path = output::write_json(&opts.out_dir, &stem, &run)?;
    info!(
        "Users: {} requested, {} succeeded, {} failed{}",
        run.user_count_requested,
        run.user_count_succeeded,
        run.user_count_failed,
        if run.stopped_early { " (stopped early)" } else { "" }
    );
    Ok(path)
}
