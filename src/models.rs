use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    #[serde(alias = "video_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub scraped_at: String,
    pub returncode: i32,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub profile_url: String,
    pub display_name: Option<String>,
    pub uploader_id: Option<String>,
    pub channel_id: Option<String>,
    pub follower_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub caption: Option<String>,
    pub timestamp: Option<i64>,
    pub upload_date: Option<String>,
    pub duration_sec: Option<f64>,
    pub uploader: Option<String>,
    pub uploader_id: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub repost_count: Option<u64>,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub seed_file: String,
    pub run_started_at: String,
    pub scraped_at: String,
    pub source: String,
    pub profile: Profile,
    pub videos: Vec<VideoSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRun {
    pub run_started_at: String,
    pub run_finished_at: String,
    pub seed_file: String,
    pub requested_max_videos: usize,
    pub user_count_requested: usize,
    pub user_count_succeeded: usize,
    pub user_count_failed: usize,
    pub stopped_early: bool,
    pub results: Vec<UserRecord>,
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub url: String,
    pub username: Option<String>,
    pub scraped_at: String,
    /// Raw yt-dlp info JSON, comments included when the extractor returned them.
    pub yt_dlp: Value,
}

impl VideoRecord {
    pub fn comments(&self) -> &[Value] {
        self.yt_dlp
            .get("comments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRun {
    pub run_started_at: String,
    pub run_finished_at: String,
    pub source_input: String,
    pub video_count_requested: usize,
    pub video_count_succeeded: usize,
    pub video_count_failed: usize,
    pub skipped_existing: usize,
    pub attempted_comments: bool,
    pub stopped_early: bool,
    pub results: Vec<VideoRecord>,
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTarget {
    pub video_id: String,
    pub url: String,
    pub username: Option<String>,
}
