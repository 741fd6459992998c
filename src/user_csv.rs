use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::error::Result;
use crate::tabular::{self, cell, field, joined, objects, parse_iso, Layout, Table};

const RUN_COLUMNS: [&str; 7] = [
    "run_started_at",
    "run_finished_at",
    "seed_file",
    "requested_max_videos",
    "user_count_requested",
    "user_count_succeeded",
    "user_count_failed",
];

const USER_COLUMNS: [&str; 7] = [
    "user_scraped_at",
    "user_source",
    "username",
    "profile_url",
    "display_name",
    "follower_count",
    "video_count",
];

const VIDEO_COLUMNS: [&str; 14] = [
    "video_id",
    "url",
    "title",
    "caption",
    "timestamp",
    "upload_date",
    "duration_sec",
    "uploader",
    "uploader_id",
    "view_count",
    "like_count",
    "comment_count",
    "repost_count",
    "hashtags",
];

const SUMMARY_COLUMNS: [&str; 2] = ["total_view_count", "total_like_count"];

pub fn headers(layout: Layout) -> Vec<&'static str> {
    let mut headers: Vec<&'static str> =
        RUN_COLUMNS.iter().chain(USER_COLUMNS.iter()).copied().collect();
    match layout {
        Layout::Rows => headers.extend(VIDEO_COLUMNS),
        Layout::Summary => headers.extend(SUMMARY_COLUMNS),
    }
    headers
}

/// Adds the rows for one user-run document. A user with no videos still gets one row.
pub fn flatten_user_run(run: &Value, layout: Layout, table: &mut Table) {
    let run_cells: Vec<String> = RUN_COLUMNS.iter().map(|k| field(run, k)).collect();

    for result in objects(run.get("results")) {
        let profile = result.get("profile").filter(|p| p.is_object()).unwrap_or(&Value::Null);
        let videos = objects(result.get("videos"));

        let username = match field(profile, "username") {
            name if name.is_empty() => field(result, "username"),
            name => name,
        };

        let mut user_cells = run_cells.clone();
        user_cells.extend([
            field(result, "scraped_at"),
            field(result, "source"),
            username,
            field(profile, "profile_url"),
            field(profile, "display_name"),
            field(profile, "follower_count"),
            videos.len().to_string(),
        ]);

        match layout {
            Layout::Summary => {
                let mut row = user_cells;
                row.push(sum(&videos, "view_count").to_string());
                row.push(sum(&videos, "like_count").to_string());
                table.push(row);
            }
            Layout::Rows if videos.is_empty() => {
                let mut row = user_cells;
                row.extend(VIDEO_COLUMNS.iter().map(|_| String::new()));
                table.push(row);
            }
            Layout::Rows => {
                for video in videos {
                    let mut row = user_cells.clone();
                    row.extend(VIDEO_COLUMNS.iter().map(|k| match *k {
                        "hashtags" => joined(video.get("hashtags")),
                        _ => cell(video.get(*k)),
                    }));
                    table.push(row);
                }
            }
        }
    }
}

fn sum(videos: &[&Value], key: &str) -> u64 {
    videos.iter().filter_map(|v| v.get(key).and_then(Value::as_u64)).sum()
}

pub fn export_users(input: &Path, out_dir: &Path, prefix: &str, layout: Layout) -> Result<PathBuf> {
    let mut table = Table::new(headers(layout));
    let mut started = Vec::new();

    for (_, run) in tabular::read_json_inputs(input)? {
        if let Some(at) = parse_iso(run.get("run_started_at")) {
            started.push(at);
        }
        flatten_user_run(&run, layout, &mut table);
    }

    let at = started.into_iter().min().unwrap_or_else(Utc::now);
    tabular::write_csv(out_dir, prefix, at, &table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn sample_run() -> Value {
        json!({
            "run_started_at": "2026-02-02T03:11:32+00:00",
            "seed_file": "seeds/2026-02-02.txt",
            "requested_max_videos": 2,
            "results": [
                {
                    "scraped_at": "2026-02-02T03:11:40+00:00",
                    "source": "yt-dlp",
                    "profile": {
                        "username": "alice",
                        "profile_url": "https://www.tiktok.com/@alice"
                    },
                    "videos": [
                        {
                            "video_id": "1",
                            "view_count": 10,
                            "like_count": 1,
                            "hashtags": ["a", "b"]
                        },
                        {"video_id": "2", "view_count": 5}
                    ]
                },
                {
                    "username": "bob",
                    "profile": {"username": "bob"},
                    "videos": []
                },
                42
            ],
            "errors": [{"id": "carol", "error": "blocked"}]
        })
    }

    #[test]
    fn test_rows_layout() {
        let mut table = Table::new(headers(Layout::Rows));
        flatten_user_run(&sample_run(), Layout::Rows, &mut table);

        assert_eq!(table.rows.len(), 3);
        let user = table.column("username").unwrap();
        let vid = table.column("video_id").unwrap();
        let tags = table.column("hashtags").unwrap();
        let count = table.column("video_count").unwrap();

        assert_eq!(table.rows[0][user], "alice");
        assert_eq!(table.rows[0][vid], "1");
        assert_eq!(table.rows[0][tags], "a,b");
        assert_eq!(table.rows[1][vid], "2");
        assert_eq!(table.rows[0][table.column("seed_file").unwrap()], "seeds/2026-02-02.txt");

        // A user without videos keeps a row, with a zero count.
        assert_eq!(table.rows[2][user], "bob");
        assert_eq!(table.rows[2][vid], "");
        assert_eq!(table.rows[2][count], "0");
    }

    #[test]
    fn test_summary_layout() {
        let mut table = Table::new(headers(Layout::Summary));
        flatten_user_run(&sample_run(), Layout::Summary, &mut table);

        assert_eq!(table.rows.len(), 2);
        let count = table.column("video_count").unwrap();
        let views = table.column("total_view_count").unwrap();
        assert_eq!(table.rows[0][count], "2");
        assert_eq!(table.rows[0][views], "15");
        assert_eq!(table.rows[1][count], "0");
        assert_eq!(table.rows[1][views], "0");
        assert!(table.column("video_id").is_none());
    }

    #[test]
    fn test_export_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tiktok_seed_users_20260202_031132.json");
        fs::write(&input, serde_json::to_string(&sample_run()).unwrap()).unwrap();

        let out =
            export_users(&input, &dir.path().join("csv"), "user_videos", Layout::Rows).unwrap();
        let name = out.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("user_videos_2026020"));

        let mut reader = csv::Reader::from_path(&out).unwrap();
        assert_eq!(reader.headers().unwrap().len(), headers(Layout::Rows).len());
        assert_eq!(reader.records().count(), 3);
    }
}
