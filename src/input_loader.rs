use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::{Result, ScrapeError};
use crate::models::VideoTarget;
use crate::scraper::video_url;

const MAX_USERNAME_LEN: usize = 24;

/// Reads a seed file: one username per line, blanks and `#` comments ignored.
pub fn load_seeds<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
    let path_ref = filename.as_ref();
    if !path_ref.exists() {
        return Err(ScrapeError::MissingInput(path_ref.to_path_buf()));
    }

    let content = fs::read_to_string(path_ref)?;
    let seeds = parse_seeds(&content);
    info!("Loaded {} seed usernames from {:?}", seeds.len(), path_ref);
    Ok(seeds)
}

pub fn parse_seeds(content: &str) -> Vec<String> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let username = normalize_username(line);
            if username.is_none() {
                debug!("Skipping malformed seed line {}: {:?}", idx + 1, line);
            }
            username
        })
        .collect()
}

/// Accepts `name`, `@name` or a profile URL; returns the bare username.
pub fn normalize_username(raw: &str) -> Option<String> {
    let mut name = raw.trim();
    if let Some(pos) = name.find("tiktok.com/@") {
        name = &name[pos + "tiktok.com/@".len()..];
        name = name.split(['/', '?', '#']).next().unwrap_or_default();
    }
    let name = name.strip_prefix('@').unwrap_or(name);

    let valid = !name.is_empty()
        && name.chars().count() <= MAX_USERNAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then(|| name.to_string())
}

/// Reads a user-run JSON and lists its videos for enrichment.
///
/// Anything that is not JSON, or has no `results` array, is fatal for the run.
pub fn load_video_targets<P: AsRef<Path>>(filename: P) -> Result<Vec<VideoTarget>> {
    let path_ref = filename.as_ref();
    if !path_ref.exists() {
        return Err(ScrapeError::MissingInput(path_ref.to_path_buf()));
    }

    let content = fs::read_to_string(path_ref)?;
    let run: Value = serde_json::from_str(&content).map_err(|e| ScrapeError::MalformedInput {
        path: path_ref.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !run.get("results").map_or(false, Value::is_array) {
        return Err(ScrapeError::MalformedInput {
            path: path_ref.to_path_buf(),
            reason: "expected an object with a \"results\" array".to_string(),
        });
    }

    let targets = extract_video_targets(&run);
    info!("Found {} videos to enrich in {:?}", targets.len(), path_ref);
    Ok(targets)
}

pub fn extract_video_targets(run: &Value) -> Vec<VideoTarget> {
    let mut targets = Vec::new();
    let results = run.get("results").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

    for result in results.iter().filter(|r| r.is_object()) {
        let username = result
            .pointer("/profile/username")
            .or_else(|| result.get("username"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty() && *s != "unknown")
            .map(str::to_string);

        let videos =
            result.get("videos").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
        for video in videos {
            let video_id = match video.get("video_id") {
                Some(Value::String(s)) if !s.is_empty() => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if !is_plain_id(&video_id) {
                warn!("Skipping video with unusable id {:?}", video_id);
                continue;
            }
            let url = video
                .get("url")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| username.as_deref().map(|u| video_url(u, &video_id)));

            if let Some(url) = url {
                targets.push(VideoTarget { video_id, url, username: username.clone() });
            }
        }
    }
    targets
}

/// Video ids double as per-video file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Drops repeated video ids, keeping the first occurrence.
pub fn dedupe_targets(targets: Vec<VideoTarget>) -> Vec<VideoTarget> {
    let mut seen = HashSet::new();
    targets.into_iter().filter(|t| seen.insert(t.video_id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_seed_comments_and_blanks() {
        let seeds = parse_seeds("alice\n# comment\n\n   \nbob\n");
        assert_eq!(seeds, vec!["alice", "bob"]);
    }

    #[test]
    fn test_seed_forms() {
        let seeds = parse_seeds(
            "@carol\nhttps://www.tiktok.com/@dave.d?lang=en\n  erin_1  \n\
             not valid\nbad!name\nabcdefghijklmnopqrstuvwxyz\n",
        );
        assert_eq!(seeds, vec!["carol", "dave.d", "erin_1"]);
    }

    #[test]
    fn test_seed_duplicates_kept() {
        assert_eq!(parse_seeds("alice\nalice\n"), vec!["alice", "alice"]);
    }

    #[test]
    fn test_load_seeds_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alice\n# comment\nbob").unwrap();
        assert_eq!(load_seeds(file.path()).unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_load_seeds_missing() {
        let err = load_seeds("/nonexistent/seeds.txt").unwrap_err();
        assert!(matches!(err, ScrapeError::MissingInput(_)));
    }

    #[test]
    fn test_targets_from_run() {
        let run = json!({
            "results": [
                {
                    "profile": {"username": "alice"},
                    "videos": [
                        {"video_id": "1", "url": "https://www.tiktok.com/@alice/video/1"},
                        {"video_id": "2"},
                        {"url": "https://no-id"}
                    ]
                },
                {
                    "profile": {"username": "unknown"},
                    "videos": [{"video_id": "3"}, {"video_id": 4, "url": "https://x/4"}]
                },
                "not an object"
            ]
        });
        let targets = extract_video_targets(&run);
        let ids: Vec<&str> = targets.iter().map(|t| t.video_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4"]);
        assert_eq!(targets[1].url, "https://www.tiktok.com/@alice/video/2");
        assert_eq!(targets[1].username.as_deref(), Some("alice"));
        assert_eq!(targets[2].username, None);
    }

    #[test]
    fn test_targets_with_path_like_ids_skipped() {
        let run = json!({
            "results": [{
                "profile": {"username": "alice"},
                "videos": [
                    {"video_id": "../../escaped"},
                    {"video_id": "a/b"},
                    {"video_id": "73_01-x"}
                ]
            }]
        });
        let ids: Vec<String> =
            extract_video_targets(&run).into_iter().map(|t| t.video_id).collect();
        assert_eq!(ids, vec!["73_01-x"]);
    }

    #[test]
    fn test_dedupe_targets() {
        let t = |id: &str| VideoTarget {
            video_id: id.into(),
            url: format!("u{}", id),
            username: None,
        };
        let deduped = dedupe_targets(vec![t("1"), t("2"), t("1"), t("3")]);
        let ids: Vec<&str> = deduped.iter().map(|t| t.video_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_malformed_run_is_fatal() {
        let mut not_json = tempfile::NamedTempFile::new().unwrap();
        write!(not_json, "{{ truncated").unwrap();
        assert!(matches!(
            load_video_targets(not_json.path()).unwrap_err(),
            ScrapeError::MalformedInput { .. }
        ));

        let mut no_results = tempfile::NamedTempFile::new().unwrap();
        write!(no_results, "[1, 2, 3]").unwrap();
        assert!(matches!(
            load_video_targets(no_results.path()).unwrap_err(),
            ScrapeError::MalformedInput { .. }
        ));
    }
}
