//! High score persisted as a one-line TOML file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wings_runner_presentation::HighScoreStore;

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    high_score: f32,
}

/// File-backed [`HighScoreStore`].
///
/// Saves are held in memory until [`TomlHighScoreStore::flush`].
#[derive(Clone, Debug)]
pub(crate) struct TomlHighScoreStore {
    path: PathBuf,
    unsaved: Option<f32>,
}

impl TomlHighScoreStore {
    /// Creates a store that reads and writes `path`.
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unsaved: None,
        }
    }

    /// Location of the backing file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the latest saved score to disk, if any arrived since the last
    /// flush.
    pub(crate) fn flush(&mut self) -> Result<()> {
        let Some(score) = self.unsaved else {
            return Ok(());
        };
        let contents = toml::to_string(&Record { high_score: score })
            .context("failed to encode high score")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write high score to {}", self.path.display()))?;
        self.unsaved = None;
        debug!(path = %self.path.display(), score, "high score written");
        Ok(())
    }
}

impl HighScoreStore for TomlHighScoreStore {
    fn load(&mut self) -> Result<f32> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored high score");
                return Ok(0.0);
            }
            Err(error) => {
                return Err(error).with_context(|| {
                    format!("failed to read high score at {}", self.path.display())
                })
            }
        };
        let record: Record = toml::from_str(&contents)
            .with_context(|| format!("failed to parse high score at {}", self.path.display()))?;
        if record.high_score.is_finite() {
            Ok(record.high_score.max(0.0))
        } else {
            Ok(0.0)
        }
    }

    fn save(&mut self, score: f32) -> Result<()> {
        self.unsaved = Some(score);
        Ok(())
    }
}
