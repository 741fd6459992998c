use chrono::Utc;
use log::{info, warn};

use crate::config::ErrorLimits;
use crate::delay_manager::Pacer;
use crate::models::{ErrorEntry, VideoTarget};
use crate::scraper::FetchError;

pub trait BatchItem {
    fn id(&self) -> &str;

    fn url(&self) -> Option<&str> {
        None
    }

    fn username(&self) -> Option<&str> {
        None
    }
}

impl BatchItem for String {
    fn id(&self) -> &str {
        self
    }

    fn username(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl BatchItem for VideoTarget {
    fn id(&self) -> &str {
        &self.video_id
    }

    fn url(&self) -> Option<&str> {
        Some(self.url.as_str())
    }

    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub results: Vec<T>,
    pub errors: Vec<ErrorEntry>,
    pub attempted: usize,
    pub skipped: usize,
    pub stopped_early: bool,
}

impl<T> BatchOutcome<T> {
    fn new() -> Self {
        BatchOutcome {
            results: Vec::new(),
            errors: Vec::new(),
            attempted: 0,
            skipped: 0,
            stopped_early: false,
        }
    }
}

pub struct BatchFetcher<P: Pacer> {
    pacer: P,
    limits: ErrorLimits,
}

impl<P: Pacer> BatchFetcher<P> {
    pub fn new(pacer: P, limits: ErrorLimits) -> Self {
        BatchFetcher { pacer, limits }
    }

    pub fn run<I, T, F>(&mut self, items: &[I], fetch: F) -> BatchOutcome<T>
    where
        I: BatchItem,
        F: FnMut(&I) -> Result<T, FetchError>,
    {
        self.run_with_skip(items, fetch, |_| false)
    }

    /// Like `run`, but items for which `skip` returns true are neither fetched nor paced.
    pub fn run_with_skip<I, T, F, S>(
        &mut self,
        items: &[I],
        mut fetch: F,
        mut skip: S,
    ) -> BatchOutcome<T>
    where
        I: BatchItem,
        F: FnMut(&I) -> Result<T, FetchError>,
        S: FnMut(&I) -> bool,
    {
        let mut outcome = BatchOutcome::new();
        let mut consecutive_errors = 0;
        let total = items.len();

        // Pause only between two fetches, never after the last one or an early stop.
        for (i, item) in items.iter().enumerate() {
            if skip(item) {
                info!("[{}/{}] {} already collected, skipping", i + 1, total, item.id());
                outcome.skipped += 1;
                continue;
            }

            if outcome.attempted > 0 {
                self.pacer.pause();
            }
            outcome.attempted += 1;

            match fetch(item) {
                Ok(result) => {
                    info!("[{}/{}] {} ... OK", i + 1, total, item.id());
                    consecutive_errors = 0;
                    outcome.results.push(result);
                }
                Err(e) => {
                    warn!("[{}/{}] {} ... ERROR: {}", i + 1, total, item.id(), e);
                    consecutive_errors += 1;
                    outcome.errors.push(ErrorEntry {
                        id: item.id().to_string(),
                        url: item.url().map(str::to_string),
                        username: item.username().map(str::to_string),
                        scraped_at: Utc::now().to_rfc3339(),
                        returncode: e.returncode(),
                        error: e.to_string(),
                    });

                    if self.limits.reached(outcome.errors.len(), consecutive_errors) {
                        if i + 1 < total {
                            warn!(
                                "Stopping early after {} errors ({} consecutive); \
                                 likely rate-limited or blocked.",
                                outcome.errors.len(),
                                consecutive_errors
                            );
                            outcome.stopped_early = true;
                        }
                        break;
                    }
                }
            }
        }

        outcome
    }
}
