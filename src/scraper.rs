use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_json::Value;
use thiserror::Error;

use crate::config::FetchSettings;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const MAX_STDERR_CHARS: usize = 2000;

/// Failure of a single external fetch. Recorded against the item, never fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout")]
    Timeout,
    #[error("{0} not found (is yt-dlp installed and on PATH?)")]
    NotInstalled(String),
    #[error("{stderr}")]
    Failed { code: i32, stderr: String },
    #[error("failed to parse yt-dlp JSON output: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("exception: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// Shell-style return code stored in the run's error list.
    pub fn returncode(&self) -> i32 {
        match self {
            FetchError::Timeout => 124,
            FetchError::NotInstalled(_) => 127,
            FetchError::Failed { code, .. } => *code,
            FetchError::Parse(_) => 2,
            FetchError::Io(_) => 1,
        }
    }
}

pub trait MetadataSource {
    /// Playlist-style JSON for a user's profile page, at most `max_videos` entries.
    fn profile(&self, username: &str, max_videos: usize) -> Result<Value, FetchError>;

    fn video(&self, url: &str, with_comments: bool) -> Result<Value, FetchError>;
}

pub fn profile_url(username: &str) -> String {
    format!("https://www.tiktok.com/@{}", username)
}

pub fn video_url(username: &str, video_id: &str) -> String {
    format!("https://www.tiktok.com/@{}/video/{}", username, video_id)
}

pub struct YtDlp {
    settings: FetchSettings,
}

impl YtDlp {
    pub fn new(settings: FetchSettings) -> Self {
        YtDlp { settings }
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--dump-single-json".to_string(), "--skip-download".to_string()];
        if let Some(ua) = &self.settings.user_agent {
            args.push("--user-agent".to_string());
            args.push(ua.clone());
        }
        if let Some(proxy) = &self.settings.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args
    }

    pub fn profile_args(&self, username: &str, max_videos: usize) -> Vec<String> {
        let mut args = vec!["--flat-playlist".to_string()];
        args.extend(self.common_args());
        if max_videos > 0 {
            args.push("--playlist-end".to_string());
            args.push(max_videos.to_string());
        }
        args.push(profile_url(username));
        args
    }

    pub fn video_args(&self, url: &str, with_comments: bool) -> Vec<String> {
        let mut args = self.common_args();
        if with_comments {
            args.push("--write-comments".to_string());
        }
        args.push(url.to_string());
        args
    }

    fn run(&self, args: Vec<String>) -> Result<Value, FetchError> {
        let binary = &self.settings.binary;
        debug!("Running {} {}", binary.display(), args.join(" "));

        let mut cmd = Command::new(binary);
        cmd.args(&args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        // Own process group, so a timeout takes down anything yt-dlp spawned too.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => FetchError::NotInstalled(binary.display().to_string()),
                _ => FetchError::Io(e),
            })?;

        // Drain both pipes while polling so a chatty child cannot block on a full pipe.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_reader = thread::spawn(move || drain(stdout));
        let err_reader = thread::spawn(move || drain(stderr));

        let deadline = Instant::now() + self.settings.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!("{} exceeded {:?}, killing it", binary.display(), self.settings.timeout);
                kill_process_tree(&mut child);
                let _ = out_reader.join();
                let _ = err_reader.join();
                return Err(FetchError::Timeout);
            }
            thread::sleep(POLL_INTERVAL);
        };

        let out = out_reader.join().unwrap_or_default();
        let err = err_reader.join().unwrap_or_default();

        if !status.success() {
            let text = String::from_utf8_lossy(&err);
            let trimmed = tail_chars(text.trim(), MAX_STDERR_CHARS);
            return Err(FetchError::Failed {
                code: status.code().unwrap_or(-1),
                stderr: if trimmed.is_empty() { "yt-dlp failed".to_string() } else { trimmed },
            });
        }

        Ok(serde_json::from_slice(&out)?)
    }
}

impl MetadataSource for YtDlp {
    fn profile(&self, username: &str, max_videos: usize) -> Result<Value, FetchError> {
        self.run(self.profile_args(username, max_videos))
    }

    fn video(&self, url: &str, with_comments: bool) -> Result<Value, FetchError> {
        self.run(self.video_args(url, with_comments))
    }
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}
