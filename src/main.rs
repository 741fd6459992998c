mod cli;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use tiktok_scraper_lib::user_collector::{run_user_collection, UserRunOptions};
use tiktok_scraper_lib::video_enricher::{run_video_enrichment, VideoRunOptions};
use tiktok_scraper_lib::{logger, user_csv, video_csv};
use tiktok_scraper_lib::{BatchFetcher, JitterDelay, YtDlp};

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let binary = cli.yt_dlp;

    match cli.command {
        Command::Users { seeds, out, max_videos, fetch } => {
            info!("Starting user collection from {:?}", seeds);
            let source = YtDlp::new(fetch.fetch_settings(binary));
            let mut fetcher = BatchFetcher::new(JitterDelay::new(fetch.pacing()?), fetch.limits());
            let opts = UserRunOptions { seed_file: seeds, out_dir: out, max_videos };
            let path = run_user_collection(&source, &mut fetcher, &opts)?;
            info!("Done. Wrote: {}", path.display());
        }
        Command::Videos {
            input,
            out,
            no_comments,
            write_per_video,
            max_videos,
            skip_existing,
            dedupe,
            fetch,
        } => {
            info!("Starting video enrichment from {:?}", input);
            let source = YtDlp::new(fetch.fetch_settings(binary));
            let mut fetcher = BatchFetcher::new(JitterDelay::new(fetch.pacing()?), fetch.limits());
            let opts = VideoRunOptions {
                input,
                out_dir: out,
                with_comments: !no_comments,
                write_per_video,
                max_videos,
                skip_existing,
                dedupe,
            };
            let path = run_video_enrichment(&source, &mut fetcher, &opts)?;
            info!("Done. Wrote: {}", path.display());
        }
        Command::UsersCsv { input, out, prefix, layout } => {
            user_csv::export_users(&input, &out, &prefix, layout)?;
        }
        Command::VideosCsv { input, out, prefix, layout } => {
            video_csv::export_videos(&input, &out, &prefix, layout)?;
        }
    }

    Ok(())
}
