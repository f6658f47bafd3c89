use super::LandmarkFrame;
use crate::error::AnalyzerError;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info};

/// Source of per-frame facial landmarks.
///
/// Implementations return `AnalyzerError::Capture` when a frame is not
/// available this cycle and `AnalyzerError::StreamEnded` once no further
/// frames will arrive.
#[async_trait]
pub trait LandmarkProvider: Send {
    async fn next_frame(&mut self) -> Result<LandmarkFrame, AnalyzerError>;

    fn name(&self) -> &str;
}

/// Replays landmark frames from a JSON-lines file, one `LandmarkFrame` per line.
///
/// Points may be written as `{"x":..,"y":..}` or `[x, y]`.
pub struct ReplayProvider {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: u64,
}

impl ReplayProvider {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalyzerError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|e| AnalyzerError::Replay {
                details: format!("{}: {}", path.display(), e),
            })?;

        info!("Replaying landmark frames from {}", path.display());

        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    pub fn frames_read(&self) -> u64 {
        self.line_number
    }
}

#[async_trait]
impl LandmarkProvider for ReplayProvider {
    async fn next_frame(&mut self) -> Result<LandmarkFrame, AnalyzerError> {
        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| AnalyzerError::Replay {
                details: format!("{}: {}", self.path.display(), e),
            })?;

        let Some(line) = line else {
            debug!("Replay file {} exhausted", self.path.display());
            return Err(AnalyzerError::StreamEnded);
        };
        self.line_number += 1;

        if line.trim().is_empty() {
            return Err(AnalyzerError::Capture {
                details: format!("empty frame at line {}", self.line_number),
            });
        }

        serde_json::from_str(&line).map_err(|e| AnalyzerError::Capture {
            details: format!("malformed frame at line {}: {}", self.line_number, e),
        })
    }

    fn name(&self) -> &str {
        "replay"
    }
}
