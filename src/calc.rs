use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{FitnessLevel, FitnessRecord};

/// 2-decimal round-half-up, matching the browser app's `toFixed(2)` on the
/// positive values BMI can take: `Int(100*x + 0.5) / 100`.
pub fn round_half_up_2(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// BMI from weight in kilograms and height in centimeters. Total over all
/// numeric inputs: anything non-positive or non-finite yields 0.
pub fn compute_bmi(weight: f64, height: f64) -> f64 {
    if !weight.is_finite() || !height.is_finite() || weight <= 0.0 || height <= 0.0 {
        return 0.0;
    }
    let meters = height / 100.0;
    round_half_up_2(weight / (meters * meters))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub const ALL: [BmiCategory; 4] = [
        BmiCategory::Underweight,
        BmiCategory::Normal,
        BmiCategory::Overweight,
        BmiCategory::Obese,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Half-open bands, lower bound inclusive. BMI of zero or below is
/// unclassified and excluded from every distribution.
pub fn classify_bmi(bmi: f64) -> Option<BmiCategory> {
    if !bmi.is_finite() || bmi <= 0.0 {
        return None;
    }
    Some(if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 23.0 {
        BmiCategory::Normal
    } else if bmi < 25.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    })
}

/// One classification band: scores at or above `min_score` (and below the
/// next band's bound) map to `level`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelBand {
    pub min_score: f64,
    pub level: FitnessLevel,
}

/// Swappable score-to-level mapping keyed by test-item id. There is no
/// domain-approved default: an empty table means levels stay exactly as the
/// teacher entered them, which matches the original application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable {
    bands: HashMap<String, Vec<LevelBand>>,
}

impl LevelTable {
    pub fn new(bands: HashMap<String, Vec<LevelBand>>) -> Self {
        let mut table = LevelTable { bands };
        for item_bands in table.bands.values_mut() {
            item_bands.sort_by(|a, b| a.min_score.total_cmp(&b.min_score));
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Maps a raw score to a level, or `None` when the table carries no
    /// bands for this item. Scores below every band take the lowest band's
    /// level as the floor.
    pub fn classify_score(&self, test_item_id: &str, score: f64) -> Option<FitnessLevel> {
        let bands = self.bands.get(test_item_id)?;
        let first = bands.first()?;
        let mut level = first.level;
        for band in bands {
            if score >= band.min_score {
                level = band.level;
            }
        }
        Some(level)
    }
}

/// Re-derives the stored BMI and, where the table has bands, each result's
/// level. Runs on every save so edited scores never carry stale levels.
pub fn apply_level_table(record: &mut FitnessRecord, table: &LevelTable) {
    record.bmi = compute_bmi(record.weight, record.height);
    for result in &mut record.results {
        if let Some(level) = table.classify_score(&result.test_item_id, result.score) {
            result.level = level;
        }
    }
}
