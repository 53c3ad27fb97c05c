use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::scoring::{PointsTable, ScoringMode};
use crate::session::{SessionSettings, DEFAULT_ROUND_SIZE, DEFAULT_SECS_PER_QUESTION};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    /// one point per correct answer
    #[default]
    Flat,
    /// points depend on question difficulty
    Weighted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub round_size: usize,
    pub secs_per_question: u64,
    pub scoring: Scoring,
    pub points: PointsTable,
    pub bank_path: Option<PathBuf>,
    pub theme: Theme,
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round_size: DEFAULT_ROUND_SIZE,
            secs_per_question: DEFAULT_SECS_PER_QUESTION,
            scoring: Scoring::Flat,
            points: PointsTable::default(),
            bank_path: None,
            theme: Theme::Dark,
            sound: true,
        }
    }
}

impl Config {
    pub fn scoring_mode(&self) -> ScoringMode {
        match self.scoring {
            Scoring::Flat => ScoringMode::FlatPerCorrect,
            Scoring::Weighted => ScoringMode::WeightedByDifficulty(self.points),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            round_size: self.round_size,
            time_per_question: Duration::from_secs(self.secs_per_question),
            scoring: self.scoring_mode(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("kwiz_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable files fall back to defaults
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            warn!("ignoring unreadable config {}: {e}", self.path.display());
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
