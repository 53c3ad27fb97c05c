use serde::{Deserialize, Serialize};

use crate::bank::{Difficulty, Question};

/// Points awarded per difficulty in weighted mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTable {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub expert: u32,
}

impl Default for PointsTable {
    fn default() -> Self {
        Self {
            easy: 10,
            medium: 20,
            hard: 30,
            expert: 40,
        }
    }
}

impl PointsTable {
    pub fn points(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
            Difficulty::Expert => self.expert,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// One point per correct answer, difficulty ignored
    #[default]
    FlatPerCorrect,
    WeightedByDifficulty(PointsTable),
}

impl ScoringMode {
    pub fn weighted() -> Self {
        ScoringMode::WeightedByDifficulty(PointsTable::default())
    }

    /// Value of a correct answer to `question`
    pub fn points_for(&self, question: &Question) -> u32 {
        match self {
            ScoringMode::FlatPerCorrect => 1,
            ScoringMode::WeightedByDifficulty(table) => table.points(question.difficulty),
        }
    }
}
