use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
pub const DEFAULT_SLEEP_SECS: f64 = 2.0;
pub const DEFAULT_JITTER_SECS: f64 = 1.5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
pub const DEFAULT_MAX_VIDEOS_PER_USER: usize = 30;

pub const USER_RUN_PREFIX: &str = "tiktok_seed_users";
pub const VIDEO_RUN_PREFIX: &str = "videos_enriched";
pub const USER_CSV_PREFIX: &str = "user_videos";
pub const VIDEO_CSV_PREFIX: &str = "videos_enriched";
pub const PER_VIDEO_DIR: &str = "per_video";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub binary: PathBuf,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingSettings {
    pub base: Duration,
    pub jitter: Duration,
}

impl Default for PacingSettings {
    fn default() -> Self {
        PacingSettings {
            base: Duration::from_secs_f64(DEFAULT_SLEEP_SECS),
            jitter: Duration::from_secs_f64(DEFAULT_JITTER_SECS),
        }
    }
}

/// Early-stop thresholds for a batch. Zero disables a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorLimits {
    pub max_errors: usize,
    pub max_consecutive_errors: usize,
}

impl ErrorLimits {
    pub fn reached(&self, total: usize, consecutive: usize) -> bool {
        (self.max_errors > 0 && total >= self.max_errors)
            || (self.max_consecutive_errors > 0 && consecutive >= self.max_consecutive_errors)
    }
}

impl PacingSettings {
    pub fn from_secs(base: f64, jitter: f64) -> Result<Self, String> {
        Ok(PacingSettings { base: to_duration(base)?, jitter: to_duration(jitter)? })
    }
}

fn to_duration(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("'{}' must be a finite, non-negative number of seconds", secs))
}

/// Parses a CLI seconds value such as `2` or `1.5`.
pub fn parse_seconds(raw: &str) -> Result<f64, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", raw))?;
    to_duration(secs)?;
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("2").unwrap(), 2.0);
        assert_eq!(parse_seconds(" 1.5 ").unwrap(), 1.5);
        assert_eq!(parse_seconds("0").unwrap(), 0.0);
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("abc").is_err());
        assert!(parse_seconds("inf").is_err());
    }

    #[test]
    fn test_pacing_from_secs() {
        let pacing = PacingSettings::from_secs(DEFAULT_SLEEP_SECS, DEFAULT_JITTER_SECS).unwrap();
        assert_eq!(pacing, PacingSettings::default());
        assert_eq!(pacing.jitter, Duration::from_millis(1500));
        assert!(PacingSettings::from_secs(-1.0, 0.0).is_err());
    }

    #[test]
    fn test_error_limits() {
        let off = ErrorLimits::default();
        assert!(!off.reached(1000, 1000));

        let total = ErrorLimits { max_errors: 3, max_consecutive_errors: 0 };
        assert!(!total.reached(2, 2));
        assert!(total.reached(3, 1));

        let streak = ErrorLimits { max_errors: 0, max_consecutive_errors: 2 };
        assert!(!streak.reached(5, 1));
        assert!(streak.reached(2, 2));
    }
}
