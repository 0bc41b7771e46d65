//! Nutrition totals and risk classification.
//!
//! Pure functions over per-frame counts; independently testable without a
//! detector or a frame.

use crate::detect::CandyCounts;
use crate::nutrition::NutritionTable;
use crate::Color;

/// Discrete risk tier for a frame's accumulated calories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskTier {
    Safe,
    Moderate,
    High,
    Excessive,
    Extreme,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Moderate => "Moderate",
            RiskTier::High => "High",
            RiskTier::Excessive => "Excessive",
            RiskTier::Extreme => "Extreme",
        }
    }
}

/// Risk tier plus the color the overlay renders it in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RiskLevel {
    pub tier: RiskTier,
    pub color: Color,
}

const GREEN: Color = [0, 255, 0];
const BLUE: Color = [0, 0, 255];
const YELLOW: Color = [255, 255, 0];
const ORANGE: Color = [255, 165, 0];
const RED: Color = [255, 0, 0];

/// Classify a calorie total into one of five ordered bands.
///
/// Each tier boundary is upper-bound inclusive: 100 is still Safe, 100.01 is
/// Moderate, and so on up to Extreme above 700. Total on [0, ∞).
pub fn classify_calories(total_calories: f64) -> RiskLevel {
    let (tier, color) = if total_calories <= 100.0 {
        (RiskTier::Safe, GREEN)
    } else if total_calories <= 200.0 {
        (RiskTier::Moderate, BLUE)
    } else if total_calories <= 400.0 {
        (RiskTier::High, YELLOW)
    } else if total_calories <= 700.0 {
        (RiskTier::Excessive, ORANGE)
    } else {
        (RiskTier::Extreme, RED)
    };
    RiskLevel { tier, color }
}

/// Everything the overlay and the logs need for one frame. Recomputed every
/// frame, never mutated after construction.
#[derive(Clone, Debug)]
pub struct FrameScore {
    pub counts: CandyCounts,
    pub total_calories: u32,
    pub total_sugar: u32,
    pub risk: RiskLevel,
}

/// Derive nutrition sums and risk from per-class counts.
///
/// Zero-count classes contribute zero; classes outside the table cannot
/// appear in `counts` by construction.
pub fn score(counts: CandyCounts, table: &NutritionTable) -> FrameScore {
    let mut total_calories = 0u32;
    let mut total_sugar = 0u32;
    for (label, count) in counts.iter() {
        if let Some(entry) = table.get(label) {
            total_calories += count * entry.calories;
            total_sugar += count * entry.sugar_grams;
        }
    }
    let risk = classify_calories(total_calories as f64);
    FrameScore {
        counts,
        total_calories,
        total_sugar,
        risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_upper_bound_inclusive() {
        assert_eq!(classify_calories(0.0).tier, RiskTier::Safe);
        assert_eq!(classify_calories(100.0).tier, RiskTier::Safe);
        assert_eq!(classify_calories(100.01).tier, RiskTier::Moderate);
        assert_eq!(classify_calories(200.0).tier, RiskTier::Moderate);
        assert_eq!(classify_calories(400.0).tier, RiskTier::High);
        assert_eq!(classify_calories(700.0).tier, RiskTier::Excessive);
        assert_eq!(classify_calories(700.01).tier, RiskTier::Extreme);
    }

    #[test]
    fn tier_colors_follow_the_display_palette() {
        assert_eq!(classify_calories(50.0).color, GREEN);
        assert_eq!(classify_calories(150.0).color, BLUE);
        assert_eq!(classify_calories(300.0).color, YELLOW);
        assert_eq!(classify_calories(500.0).color, ORANGE);
        assert_eq!(classify_calories(900.0).color, RED);
    }

    #[test]
    fn all_zero_counts_score_as_safe_zero() {
        let table = NutritionTable::builtin();
        let counts = CandyCounts::zeroed(&table);
        let score = score(counts, &table);
        assert_eq!(score.total_calories, 0);
        assert_eq!(score.total_sugar, 0);
        assert_eq!(score.risk.tier, RiskTier::Safe);
    }

    #[test]
    fn totals_sum_count_times_entry() {
        let table = NutritionTable::builtin();
        let mut counts = CandyCounts::zeroed(&table);
        counts.increment("Gems");
        counts.increment("Gems");
        counts.increment("Kit_Kat");
        let score = score(counts, &table);
        assert_eq!(score.total_calories, 50 * 2 + 106);
        assert_eq!(score.total_sugar, 9 * 2 + 11);
        // 206 clears the 200-calorie Moderate bound.
        assert_eq!(score.risk.tier, RiskTier::High);
    }
}
