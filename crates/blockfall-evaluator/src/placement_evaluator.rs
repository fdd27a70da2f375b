//! Placement evaluation: scoring the board a placement leaves behind.
//!
//! A [`PlacementEvaluator`] maps the [`BoardFeatures`] of a resulting board to a score
//! (higher is better). The turn evaluator only sees the trait, so any scoring function
//! can drive move selection.
//!
//! # Linear Penalty Sum
//!
//! [`LinearEvaluator`] computes:
//!
//! ```text
//! score = cleared_lines × cleared_line_reward
//!       + (max_height > height_threshold ? height_penalty : 0)
//!       + holes × hole_penalty
//!       + closed_holes × closed_hole_penalty
//!       + height_differences × height_difference_penalty
//! ```
//!
//! Penalties are conventionally negative. All coefficients live in [`PenaltyWeights`],
//! which is (de)serializable and can be swapped at any time with
//! [`LinearEvaluator::set_weights`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board_feature::BoardFeatures;

/// Scores a placement from the features of the board it produces.
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    /// Returns the placement score (higher is better).
    fn evaluate_placement(&self, features: &BoardFeatures) -> f32;
}

/// Named coefficients of the linear penalty sum.
///
/// Missing fields take their default when deserialized.
///
/// ```
/// use blockfall_evaluator::placement_evaluator::PenaltyWeights;
///
/// let weights: PenaltyWeights = serde_json::from_str(r#"{"hole_penalty": -3.0}"#).unwrap();
/// assert_eq!(weights.hole_penalty, -3.0);
/// assert_eq!(weights.closed_hole_penalty, -20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    pub hole_penalty: f32,
    pub closed_hole_penalty: f32,
    pub height_difference_penalty: f32,
    pub height_penalty: f32,
    /// Column height above which `height_penalty` applies.
    pub height_threshold: usize,
    pub cleared_line_reward: f32,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            hole_penalty: -10.0,
            closed_hole_penalty: -20.0,
            height_difference_penalty: -5.0,
            height_penalty: -100.0,
            height_threshold: 10,
            cleared_line_reward: 100.0,
        }
    }
}

impl PenaltyWeights {
    /// Evaluates the linear penalty sum for `features`.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn score(&self, features: &BoardFeatures) -> f32 {
        let height_penalty = if features.max_height > self.height_threshold {
            self.height_penalty
        } else {
            0.0
        };
        features.cleared_lines as f32 * self.cleared_line_reward
            + height_penalty
            + features.holes as f32 * self.hole_penalty
            + features.closed_holes as f32 * self.closed_hole_penalty
            + features.height_differences as f32 * self.height_difference_penalty
    }
}

/// Placement evaluator computing the linear penalty sum.
#[derive(Debug, Clone, Default)]
pub struct LinearEvaluator {
    weights: PenaltyWeights,
}

impl LinearEvaluator {
    #[must_use]
    pub fn new(weights: PenaltyWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &PenaltyWeights {
        &self.weights
    }

    /// Replaces the coefficients; subsequent evaluations use the new values.
    pub fn set_weights(&mut self, weights: PenaltyWeights) {
        self.weights = weights;
    }
}

impl PlacementEvaluator for LinearEvaluator {
    #[inline]
    fn evaluate_placement(&self, features: &BoardFeatures) -> f32 {
        self.weights.score(features)
    }
}
