use chrono::DateTime;
use regex::Regex;
use serde_json::Value;

use crate::models::{Profile, VideoSummary};
use crate::scraper::{profile_url, video_url};

pub struct Extractor {
    hashtag_regex: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            // TikTok tags: '#' followed by letters, digits, underscores (any script)
            hashtag_regex: Regex::new(r"#([\p{L}\p{N}_]+)").unwrap(),
        }
    }

    /// Hashtags in order of first appearance, lowercased, without '#'.
    pub fn extract_hashtags(&self, text: &str) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for cap in self.hashtag_regex.captures_iter(text) {
            let tag = cap[1].to_lowercase();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn extract_profile(&self, username: &str, playlist: &Value) -> Profile {
        Profile {
            username: username.to_string(),
            profile_url: profile_url(username),
            display_name: str_field(playlist, &["uploader", "channel", "title"]),
            uploader_id: str_field(playlist, &["uploader_id"]),
            channel_id: str_field(playlist, &["channel_id", "id"]),
            follower_count: u64_field(playlist, &["channel_follower_count"]),
        }
    }

    /// At most `max_videos` entries (0 means all), in playlist order.
    pub fn extract_videos(
        &self,
        username: &str,
        playlist: &Value,
        max_videos: usize,
    ) -> Vec<VideoSummary> {
        let entries = match playlist.get("entries").and_then(Value::as_array) {
            Some(entries) => entries,
            None => return Vec::new(),
        };
        let limit = if max_videos == 0 { usize::MAX } else { max_videos };

        entries
            .iter()
            .filter_map(|entry| self.extract_video(username, entry))
            .take(limit)
            .collect()
    }

    fn extract_video(&self, username: &str, entry: &Value) -> Option<VideoSummary> {
        let video_id = str_field(entry, &["id"])?;
        let caption = str_field(entry, &["description"]);
        let title = str_field(entry, &["title"]);
        let timestamp = i64_field(entry, &["timestamp"]);

        let hashtags = caption
            .as_deref()
            .or(title.as_deref())
            .map(|text| self.extract_hashtags(text))
            .unwrap_or_default();

        let upload_date = str_field(entry, &["upload_date"]).or_else(|| {
            timestamp
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.format("%Y%m%d").to_string())
        });

        let url = str_field(entry, &["webpage_url", "url"])
            .or_else(|| Some(video_url(username, &video_id)));

        Some(VideoSummary {
            url,
            title,
            caption,
            timestamp,
            upload_date,
            duration_sec: f64_field(entry, &["duration"]),
            uploader: str_field(entry, &["uploader"]),
            uploader_id: str_field(entry, &["uploader_id"]),
            view_count: u64_field(entry, &["view_count"]),
            like_count: u64_field(entry, &["like_count"]),
            comment_count: u64_field(entry, &["comment_count"]),
            repost_count: u64_field(entry, &["repost_count"]),
            hashtags,
            video_id,
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new()
    }
}

/// First key holding a non-empty string (numbers are stringified).
fn str_field(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match v.get(*k)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn u64_field(v: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| {
        let field = v.get(*k)?;
        field.as_u64().or_else(|| field.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
    })
}

fn i64_field(v: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| {
        let field = v.get(*k)?;
        field.as_i64().or_else(|| field.as_f64().map(|f| f as i64))
    })
}

fn f64_field(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| v.get(*k)?.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hashtags() {
        let ex = Extractor::new();
        assert_eq!(
            ex.extract_hashtags("Morning run #fitness #Run_Club #fitness and #café"),
            vec!["fitness", "run_club", "café"]
        );
        assert!(ex.extract_hashtags("no tags here # lonely").is_empty());
    }

    #[test]
    fn test_profile_from_playlist() {
        let ex = Extractor::new();
        let playlist = json!({
            "id": "MS4wLjABAAAA",
            "title": "alice",
            "uploader": "Alice A.",
            "uploader_id": "6800000000000000001",
            "channel_follower_count": 1234,
            "entries": []
        });
        let profile = ex.extract_profile("alice", &playlist);
        assert_eq!(profile.profile_url, "https://www.tiktok.com/@alice");
        assert_eq!(profile.display_name.as_deref(), Some("Alice A."));
        assert_eq!(profile.channel_id.as_deref(), Some("MS4wLjABAAAA"));
        assert_eq!(profile.follower_count, Some(1234));
    }

    #[test]
    fn test_videos_from_entries() {
        let ex = Extractor::new();
        let playlist = json!({
            "entries": [
                {
                    "id": "7300000000000000001",
                    "description": "first #dance",
                    "timestamp": 1_700_000_000,
                    "duration": 15.5,
                    "view_count": 100,
                    "like_count": 10
                },
                { "title": "entry without id is dropped" },
                {
                    "id": "7300000000000000002",
                    "url": "https://www.tiktok.com/@alice/video/7300000000000000002",
                    "title": "second #Cooking"
                },
                { "id": "7300000000000000003" }
            ]
        });

        let videos = ex.extract_videos("alice", &playlist, 2);
        assert_eq!(videos.len(), 2);

        let first = &videos[0];
        assert_eq!(first.video_id, "7300000000000000001");
        assert_eq!(
            first.url.as_deref(),
            Some("https://www.tiktok.com/@alice/video/7300000000000000001")
        );
        assert_eq!(first.upload_date.as_deref(), Some("20231114"));
        assert_eq!(first.hashtags, vec!["dance"]);
        assert_eq!(first.duration_sec, Some(15.5));
        assert_eq!(first.view_count, Some(100));

        assert_eq!(videos[1].hashtags, vec!["cooking"]);
        assert_eq!(ex.extract_videos("alice", &playlist, 0).len(), 3);
    }

    #[test]
    fn test_no_entries() {
        let ex = Extractor::new();
        assert!(ex.extract_videos("alice", &json!({"title": "alice"}), 10).is_empty());
    }
}
