use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tiktok_scraper_lib::config::{
    parse_seconds, ErrorLimits, FetchSettings, PacingSettings, DEFAULT_JITTER_SECS,
    DEFAULT_MAX_VIDEOS_PER_USER, DEFAULT_SLEEP_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_YTDLP_BIN,
    USER_CSV_PREFIX, VIDEO_CSV_PREFIX,
};
use tiktok_scraper_lib::tabular::Layout;

#[derive(Parser)]
#[command(name = "tiktok-scraper")]
#[command(
    about = "Collect public TikTok user/video metadata via yt-dlp and flatten it to CSV",
    long_about = None
)]
#[command(version)]
pub(crate) struct Cli {
    /// Path to the yt-dlp executable
    #[arg(long = "yt-dlp", global = true, env = "YT_DLP_BIN", default_value = DEFAULT_YTDLP_BIN)]
    pub(crate) yt_dlp: PathBuf,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub(crate) quiet: u8,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch profile + recent videos for every username in a seed file.
    Users {
        /// Seed file: one username per line, '#' comments allowed
        #[arg(long)]
        seeds: PathBuf,
        /// Output directory for the run JSON
        #[arg(long, default_value = "outputs/raw")]
        out: PathBuf,
        /// Recent videos to keep per user (0 = all the tool returns)
        #[arg(long, default_value_t = DEFAULT_MAX_VIDEOS_PER_USER)]
        max_videos: usize,
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Enrich the videos of a previous `users` run with per-video metadata.
    Videos {
        /// User run JSON (the file with results[].videos[])
        #[arg(long)]
        input: PathBuf,
        /// Output directory
        #[arg(long, default_value = "outputs/enriched")]
        out: PathBuf,
        /// Do not attempt comment extraction
        #[arg(long)]
        no_comments: bool,
        /// Also write one JSON per video under <out>/per_video/
        #[arg(long)]
        write_per_video: bool,
        /// Cap on videos to enrich (0 = no cap)
        #[arg(long, default_value_t = 0)]
        max_videos: usize,
        /// Skip videos that already have a file in <out>/per_video/
        #[arg(long)]
        skip_existing: bool,
        /// Enrich each video id only once
        #[arg(long)]
        dedupe: bool,
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Flatten user run JSON into a CSV (one row per video).
    UsersCsv {
        /// User run JSON file, or a directory of them
        #[arg(long = "in")]
        input: PathBuf,
        /// Output directory for the CSV
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = USER_CSV_PREFIX)]
        prefix: String,
        #[arg(long, value_enum, default_value_t = Layout::Rows)]
        layout: Layout,
    },

    /// Flatten enriched video JSON (batch file or per-video folder) into a CSV.
    VideosCsv {
        /// Enriched batch JSON, a per-video JSON, or a folder of them
        #[arg(long = "in")]
        input: PathBuf,
        /// Output directory for the CSV
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = VIDEO_CSV_PREFIX)]
        prefix: String,
        #[arg(long, value_enum, default_value_t = Layout::Rows)]
        layout: Layout,
    },
}

/// Pacing, tool and early-stop flags shared by the fetching commands.
#[derive(Args)]
pub(crate) struct FetchArgs {
    /// Base seconds to wait between fetches
    #[arg(long, default_value_t = DEFAULT_SLEEP_SECS, value_parser = parse_seconds)]
    pub(crate) sleep: f64,
    /// Random extra seconds (0..jitter) added to each wait
    #[arg(long, default_value_t = DEFAULT_JITTER_SECS, value_parser = parse_seconds)]
    pub(crate) jitter: f64,
    /// yt-dlp timeout per call, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub(crate) timeout: u64,
    /// Custom User-Agent passed to yt-dlp
    #[arg(long)]
    pub(crate) user_agent: Option<String>,
    /// Proxy URL passed to yt-dlp (e.g. http://host:port)
    #[arg(long)]
    pub(crate) proxy: Option<String>,
    /// Stop after this many failed items in total (0 = never)
    #[arg(long, default_value_t = 0)]
    pub(crate) max_errors: usize,
    /// Stop after this many failures in a row (0 = never)
    #[arg(long, default_value_t = 0)]
    pub(crate) max_consecutive_errors: usize,
}

impl FetchArgs {
    pub(crate) fn fetch_settings(&self, binary: PathBuf) -> FetchSettings {
        FetchSettings {
            binary,
            timeout: Duration::from_secs(self.timeout),
            user_agent: self.user_agent.clone(),
            proxy: self.proxy.clone(),
        }
    }

    pub(crate) fn pacing(&self) -> Result<PacingSettings, String> {
        PacingSettings::from_secs(self.sleep, self.jitter)
    }

    pub(crate) fn limits(&self) -> ErrorLimits {
        ErrorLimits {
            max_errors: self.max_errors,
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_defaults() {
        let cli = Cli::try_parse_from(["tiktok-scraper", "users", "--seeds", "seeds.txt"]).unwrap();
        match cli.command {
            Command::Users { seeds, out, max_videos, fetch } => {
                assert_eq!(seeds, PathBuf::from("seeds.txt"));
                assert_eq!(out, PathBuf::from("outputs/raw"));
                assert_eq!(max_videos, DEFAULT_MAX_VIDEOS_PER_USER);
                assert_eq!(fetch.pacing().unwrap(), PacingSettings::default());
                assert_eq!(fetch.pacing().unwrap().base, Duration::from_secs(2));
                assert_eq!(fetch.limits(), ErrorLimits::default());
                assert_eq!(fetch.timeout, DEFAULT_TIMEOUT_SECS);
            }
            _ => panic!("expected users"),
        }
    }

    #[test]
    fn test_videos_flags() {
        let cli = Cli::try_parse_from([
            "tiktok-scraper",
            "-v",
            "videos",
            "--input",
            "run.json",
            "--no-comments",
            "--write-per-video",
            "--max-errors",
            "5",
            "--sleep",
            "0.5",
            "--jitter",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Videos { no_comments, write_per_video, fetch, .. } => {
                assert!(no_comments);
                assert!(write_per_video);
                assert_eq!(fetch.limits().max_errors, 5);
                let pacing = fetch.pacing().unwrap();
                assert_eq!(pacing.base, Duration::from_millis(500));
                assert_eq!(pacing.jitter, Duration::ZERO);
            }
            _ => panic!("expected videos"),
        }
    }

    #[test]
    fn test_negative_sleep_rejected() {
        let args = ["tiktok-scraper", "users", "--seeds", "s.txt", "--sleep", "-1"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_csv_layout() {
        let args =
            ["tiktok-scraper", "videos-csv", "--in", "d", "--out", "o", "--layout", "summary"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::VideosCsv { layout, prefix, .. } => {
                assert_eq!(layout, Layout::Summary);
                assert_eq!(prefix, VIDEO_CSV_PREFIX);
            }
            _ => panic!("expected videos-csv"),
        }
    }
}
