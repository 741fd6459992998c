use std::thread;
use std::time::Duration;

use log::info;
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::config::PacingSettings;

pub trait Pacer {
    fn pause(&mut self);
}

/// Waits `base + uniform(0, jitter)` on every pause.
pub struct JitterDelay<R: Rng = ThreadRng> {
    settings: PacingSettings,
    rng: R,
}

impl JitterDelay<ThreadRng> {
    pub fn new(settings: PacingSettings) -> Self {
        JitterDelay::with_rng(settings, rand::thread_rng())
    }
}

impl<R: Rng> JitterDelay<R> {
    pub fn with_rng(settings: PacingSettings, rng: R) -> Self {
        JitterDelay { settings, rng }
    }

    pub fn next_delay(&mut self) -> Duration {
        let jitter = self.settings.jitter.as_secs_f64();
        let extra = if jitter > 0.0 { self.rng.gen_range(0.0..=jitter) } else { 0.0 };
        self.settings.base + Duration::from_secs_f64(extra)
    }
}

impl<R: Rng> Pacer for JitterDelay<R> {
    fn pause(&mut self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        info!("Waiting for {:.2} seconds...", delay.as_secs_f64());
        thread::sleep(delay);
    }
}
