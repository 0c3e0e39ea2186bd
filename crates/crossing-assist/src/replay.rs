//! Recorded track replay
//!
//! Reads tracker output saved as JSON lines, one frame per line:
//!
//! ```text
//! {"width": 1280, "height": 720, "timestamp_ms": 33, "tracks": [{"id": 1, "bbox": [10, 20, 50, 90], "class_id": 0}]}
//! ```

use crate::collaborators::Track;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Frame source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not open track recording {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read track recording: {0}")]
    Read(#[from] std::io::Error),
}

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub width: i64,
    pub height: i64,
    /// Capture time relative to the start of the recording
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Iterates the frames of a JSON-lines track recording.
///
/// Blank and malformed lines are logged and skipped.
pub struct TrackReplay {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    skipped: usize,
}

impl TrackReplay {
    /// Open a recording
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| SourceError::Open {
            path: path.clone(),
            source,
        })?;

        info!("Replaying tracks from {}", path.display());
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_no: 0,
            skipped: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for TrackReplay {
    type Item = Result<ReplayFrame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(SourceError::Read(e))),
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<ReplayFrame>(&line) {
                Ok(frame) => return Some(Ok(frame)),
                Err(e) => {
                    self.skipped += 1;
                    warn!(
                        "Skipping malformed frame at {}:{}: {}",
                        self.path.display(),
                        self.line_no,
                        e
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let err = TrackReplay::open("/nonexistent/tracks.jsonl").err().unwrap();
        assert!(matches!(err, SourceError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/tracks.jsonl"));
    }

    #[test]
    fn test_skips_bad_lines() {
        let path = std::env::temp_dir().join(format!("replay-skip-{}.jsonl", std::process::id()));
        std::fs::write(
            &path,
            concat!(
                "{\"width\": 640, \"height\": 480, \"tracks\": []}\n",
                "\n",
                "not json\n",
                "{\"width\": 640, \"height\": 480, \"timestamp_ms\": 66, \"tracks\": [{\"id\": 2, \"bbox\": [1, 2, 3, 4], \"class_id\": 0, \"confirmed\": false}]}\n",
            ),
        )
        .unwrap();

        let mut replay = TrackReplay::open(&path).unwrap();
        let frames: Vec<ReplayFrame> = replay.by_ref().map(|f| f.unwrap()).collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].timestamp_ms, None);
        assert_eq!(frames[1].timestamp_ms, Some(66));
        assert!(!frames[1].tracks[0].confirmed);
        assert_eq!(replay.skipped(), 1);
    }
}
