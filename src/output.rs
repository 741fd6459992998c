use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use log::info;
use serde::Serialize;

use crate::error::{Result, ScrapeError};

/// `YYYYmmdd_HHMMSS` in local time, as used in output file names.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y%m%d_%H%M%S").to_string()
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

pub fn is_safe_stem(stem: &str) -> bool {
    !stem.is_empty()
        && !stem.starts_with('.')
        && stem.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Creates `<dir>/<stem>.<ext>`, or `<stem>_1.<ext>`, `<stem>_2.<ext>`, ... if taken.
pub fn create_unique(dir: &Path, stem: &str, ext: &str) -> Result<(File, PathBuf)> {
    if !is_safe_stem(stem) {
        return Err(ScrapeError::UnsafeFileName(stem.to_string()));
    }
    fs::create_dir_all(dir)?;
    let mut n = 0u32;
    loop {
        let name = match n {
            0 => format!("{}.{}", stem, ext),
            _ => format!("{}_{}.{}", stem, n, ext),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

pub fn write_json<T: Serialize>(dir: &Path, stem: &str, payload: &T) -> Result<PathBuf> {
    let (file, path) = create_unique(dir, stem, "json")?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payload)?;
    writer.flush()?;
    info!("Wrote {:?}", path);
    Ok(path)
}
