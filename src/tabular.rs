use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::{info, warn};
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{Result, ScrapeError};
use crate::output::{self, file_timestamp};

/// How nested lists (a user's videos, a video's comments) become rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// One row per nested item; the parent's columns are repeated.
    #[default]
    Rows,
    /// One row per record with a count column.
    Summary,
}

#[derive(Debug, Default)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Table { headers, rows: Vec::new() }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| *h == name)
    }
}

/// Renders a JSON value as a CSV cell. Missing and null become empty.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn field(v: &Value, key: &str) -> String {
    cell(v.get(key))
}

pub fn field_any(v: &Value, keys: &[&str]) -> String {
    keys.iter().map(|k| field(v, k)).find(|s| !s.is_empty()).unwrap_or_default()
}

/// String items of a list joined with `,`; empty when not a list.
pub fn joined(v: Option<&Value>) -> String {
    match v.and_then(Value::as_array) {
        Some(items) => items.iter().map(|i| cell(Some(i))).collect::<Vec<_>>().join(","),
        None => String::new(),
    }
}

pub fn objects(v: Option<&Value>) -> Vec<&Value> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().filter(|i| i.is_object()).collect())
        .unwrap_or_default()
}

pub fn parse_iso(v: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = v?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

/// A file, or every `*.json` below a directory sorted by path, parsed as JSON.
pub fn read_json_inputs(path: &Path) -> Result<Vec<(PathBuf, Value)>> {
    if !path.exists() {
        return Err(ScrapeError::MissingInput(path.to_path_buf()));
    }

    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry?;
            let is_json = entry.path().extension().map_or(false, |ext| ext == "json");
            if entry.file_type().is_file() && is_json {
                files.push(entry.into_path());
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        warn!("No JSON files found under {:?}", path);
    }

    files
        .into_iter()
        .map(|file| {
            let content = fs::read_to_string(&file)?;
            let value = serde_json::from_str(&content).map_err(|e| ScrapeError::MalformedInput {
                path: file.clone(),
                reason: e.to_string(),
            })?;
            Ok((file, value))
        })
        .collect()
}

/// Writes `<prefix>_<ts>.csv` into `out_dir` without touching existing files.
pub fn write_csv(
    out_dir: &Path,
    prefix: &str,
    at: DateTime<Utc>,
    table: &Table,
) -> Result<PathBuf> {
    let stem = format!("{}_{}", prefix, file_timestamp(at));
    let (file, path) = output::create_unique(out_dir, &stem, "csv")?;

    let mut csv_writer = csv::WriterBuilder::new().from_writer(file);
    csv_writer.write_record(&table.headers)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;

    info!("Wrote {:?} (rows={}, cols={})", path, table.rows.len(), table.headers.len());
    Ok(path)
}
