use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use serde_json::Value;

use crate::error::Result;
use crate::tabular::{self, field, field_any, joined, objects, parse_iso, Layout, Table};

const RUN_COLUMNS: [&str; 8] = [
    "run_started_at",
    "source_input",
    "video_count_requested",
    "video_count_succeeded",
    "video_count_failed",
    "attempted_comments",
    "skipped_existing",
    "source_file",
];

const RECORD_COLUMNS: [&str; 41] = [
    "video_id",
    "url",
    "username",
    "scraped_at",
    "yt_id",
    "title",
    "description",
    "timestamp",
    "duration",
    "view_count",
    "like_count",
    "comment_count",
    "repost_count",
    "save_count",
    "channel",
    "channel_id",
    "uploader",
    "uploader_id",
    "track",
    "album",
    "artists",
    "best_format_id",
    "best_ext",
    "best_vcodec",
    "best_acodec",
    "best_width",
    "best_height",
    "best_tbr",
    "best_filesize",
    "thumb_id",
    "thumb_url",
    "webpage_url",
    "original_url",
    "extractor",
    "extractor_key",
    "comments_collected",
    "comment_id",
    "comment_author",
    "comment_text",
    "comment_like_count",
    "comment_timestamp",
];

/// Comment columns sit at the end of `RECORD_COLUMNS` and only exist in the rows layout.
const COMMENT_COLUMNS: usize = 5;

pub fn headers(layout: Layout) -> Vec<&'static str> {
    let record = match layout {
        Layout::Rows => &RECORD_COLUMNS[..],
        Layout::Summary => &RECORD_COLUMNS[..RECORD_COLUMNS.len() - COMMENT_COLUMNS],
    };
    RUN_COLUMNS.iter().chain(record.iter()).copied().collect()
}

/// Highest height, then bitrate, then file size. Ties keep the earlier format.
pub fn pick_best_format(formats: Option<&Value>) -> Option<&Value> {
    let score = |f: &Value| {
        let num = |k: &str| f.get(k).and_then(Value::as_f64).unwrap_or(0.0);
        let size = match num("filesize") {
            s if s > 0.0 => s,
            _ => num("filesize_approx"),
        };
        (num("height"), num("tbr"), size)
    };

    let mut best: Option<(&Value, (f64, f64, f64))> = None;
    for f in objects(formats) {
        let s = score(f);
        let better = match &best {
            None => true,
            Some((_, b)) => s.partial_cmp(b) == Some(Ordering::Greater),
        };
        if better {
            best = Some((f, s));
        }
    }
    best.map(|(f, _)| f)
}

/// `cover`, `originCover`, `dynamicCover`, else the first thumbnail.
pub fn pick_thumbnail(thumbnails: Option<&Value>) -> Option<&Value> {
    let thumbs = objects(thumbnails);
    ["cover", "originCover", "dynamicCover"]
        .iter()
        .find_map(|id| {
            thumbs.iter().find(|t| t.get("id").and_then(Value::as_str) == Some(*id)).copied()
        })
        .or_else(|| thumbs.first().copied())
}

fn record_cells(item: &Value) -> Vec<String> {
    let yt = item.get("yt_dlp").filter(|v| v.is_object()).unwrap_or(&Value::Null);
    let best = pick_best_format(yt.get("formats")).unwrap_or(&Value::Null);
    let thumb = pick_thumbnail(yt.get("thumbnails")).unwrap_or(&Value::Null);
    let comments = objects(yt.get("comments"));

    let either = |item_key: &str, yt_keys: &[&str]| {
        let own = field(item, item_key);
        if own.is_empty() { field_any(yt, yt_keys) } else { own }
    };

    vec![
        either("video_id", &["id"]),
        either("url", &["webpage_url", "original_url"]),
        either("username", &["uploader"]),
        field(item, "scraped_at"),
        field(yt, "id"),
        field(yt, "title"),
        field(yt, "description"),
        field(yt, "timestamp"),
        field(yt, "duration"),
        field(yt, "view_count"),
        field(yt, "like_count"),
        field(yt, "comment_count"),
        field(yt, "repost_count"),
        field(yt, "save_count"),
        field(yt, "channel"),
        field(yt, "channel_id"),
        field(yt, "uploader"),
        field(yt, "uploader_id"),
        field(yt, "track"),
        field(yt, "album"),
        joined(yt.get("artists")),
        field(best, "format_id"),
        field(best, "ext"),
        field(best, "vcodec"),
        field(best, "acodec"),
        field(best, "width"),
        field(best, "height"),
        field(best, "tbr"),
        field_any(best, &["filesize", "filesize_approx"]),
        field(thumb, "id"),
        field(thumb, "url"),
        field(yt, "webpage_url"),
        field(yt, "original_url"),
        field(yt, "extractor"),
        field(yt, "extractor_key"),
        comments.len().to_string(),
    ]
}

fn comment_cells(comment: &Value) -> Vec<String> {
    vec![
        field(comment, "id"),
        field_any(comment, &["author", "author_id"]),
        field(comment, "text"),
        field(comment, "like_count"),
        field(comment, "timestamp"),
    ]
}

/// Adds rows for one video record under the given run columns.
pub fn flatten_video(item: &Value, run_cells: &[String], layout: Layout, table: &mut Table) {
    let mut base = run_cells.to_vec();
    base.extend(record_cells(item));

    if layout == Layout::Summary {
        table.push(base);
        return;
    }

    let comments = item
        .get("yt_dlp")
        .map(|yt| objects(yt.get("comments")))
        .unwrap_or_default();
    if comments.is_empty() {
        let mut row = base;
        row.extend((0..COMMENT_COLUMNS).map(|_| String::new()));
        table.push(row);
        return;
    }
    for comment in comments {
        let mut row = base.clone();
        row.extend(comment_cells(comment));
        table.push(row);
    }
}

/// Flattens an enriched batch file, a per-video file, or a directory of either.
pub fn export_videos(
    input: &Path,
    out_dir: &Path,
    prefix: &str,
    layout: Layout,
) -> Result<PathBuf> {
    let mut table = Table::new(headers(layout));
    let mut seen_times = Vec::new();

    for (path, data) in tabular::read_json_inputs(input)? {
        if !data.is_object() {
            warn!("Skipping {:?}: not a JSON object", path);
            continue;
        }

        if let Some(results) = data.get("results").filter(|r| r.is_array()) {
            seen_times.extend(parse_iso(data.get("run_started_at")));
            let mut run_cells: Vec<String> = RUN_COLUMNS.iter().map(|k| field(&data, k)).collect();
            // source_file is only filled for single-video files
            run_cells[RUN_COLUMNS.len() - 1] = String::new();
            for item in objects(Some(results)) {
                flatten_video(item, &run_cells, layout, &mut table);
            }
        } else {
            seen_times.extend(parse_iso(data.get("scraped_at")));
            let mut run_cells = vec![String::new(); RUN_COLUMNS.len()];
            run_cells[RUN_COLUMNS.len() - 1] = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            flatten_video(&data, &run_cells, layout, &mut table);
        }
    }

    let at = seen_times.into_iter().min().unwrap_or_else(Utc::now);
    tabular::write_csv(out_dir, prefix, at, &table)
}
