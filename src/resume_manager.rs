use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{error, info};

#[derive(Debug, Default)]
pub struct ProgressState {
    pub collected_ids: HashSet<String>,
}

impl ProgressState {
    /// Scans `dir` for `<video_id>.json` (or `<video_id>_<n>.json`) files.
    pub fn load<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            info!("No per-video directory at {:?}. Starting fresh.", dir);
            return ProgressState::default();
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to read per-video directory {:?}: {}. Starting fresh.", dir, e);
                return ProgressState::default();
            }
        };

        let collected_ids: HashSet<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                stem.split('_').next().filter(|id| !id.is_empty()).map(str::to_string)
            })
            .collect();

        info!("Resumed previous session: {} videos already collected.", collected_ids.len());
        ProgressState { collected_ids }
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.collected_ids.contains(video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_scans_json_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("111.json"), "{}").unwrap();
        fs::write(dir.path().join("222_1.json"), "{}").unwrap();
        fs::write(dir.path().join("333.txt"), "").unwrap();

        let state = ProgressState::load(dir.path());
        assert!(state.contains("111"));
        assert!(state.contains("222"));
        assert!(!state.contains("333"));
        assert_eq!(state.collected_ids.len(), 2);
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let state = ProgressState::load("/nonexistent/per_video");
        assert!(state.collected_ids.is_empty());
    }
}
