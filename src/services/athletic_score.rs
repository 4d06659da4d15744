/// Athletic Score Aggregator
///
/// Normalizes kinematic and posture signals onto a common 0-100 scale.

use statrs::statistics::Statistics;
use tracing::debug;

use crate::models::{AthleticScoreVector, PostureLabel};

/// Linear min-max normalization clamped to [0, 100]
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// Fixed score per posture label
pub fn posture_score(label: PostureLabel) -> f64 {
    match label {
        PostureLabel::Crouching => 90.0,
        PostureLabel::Standing => 80.0,
        PostureLabel::Running | PostureLabel::Unknown => 50.0,
    }
}

/// Signals sampled from the session for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub foot_movements: usize,
    pub smoothed_speed: f64,
    pub recent_smoothed_acceleration: f64,
    pub ideal_head_angle_frames: u32,
    pub posture: PostureLabel,
}

pub fn compute_scores(inputs: &ScoreInputs) -> AthleticScoreVector {
    AthleticScoreVector {
        footwork: normalize(inputs.foot_movements as f64, 0.0, 100.0),
        speed: normalize(inputs.smoothed_speed, 0.0, 15.0),
        acceleration: normalize(inputs.recent_smoothed_acceleration, -5.0, 20.0),
        // Frame count, not an angle
        head_angle: normalize(inputs.ideal_head_angle_frames as f64, 45.0, 90.0),
        posture: posture_score(inputs.posture),
    }
}

/// Session-long list of valid score vectors
#[derive(Debug, Clone, Default)]
pub struct AthleticScoreAggregator {
    vectors: Vec<AthleticScoreVector>,
}

impl AthleticScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and store a vector. NaN vectors are dropped and `None` is returned.
    pub fn record(&mut self, inputs: &ScoreInputs) -> Option<AthleticScoreVector> {
        let scores = compute_scores(inputs);
        if scores.has_nan() {
            debug!("Discarding athletic score vector with NaN component");
            return None;
        }
        self.vectors.push(scores);
        Some(scores)
    }

    /// Last valid vector
    pub fn latest(&self) -> Option<&AthleticScoreVector> {
        self.vectors.last()
    }

    pub fn vectors(&self) -> &[AthleticScoreVector] {
        &self.vectors
    }

    /// Mean of the per-vector means; 0 when nothing was recorded
    pub fn average_score(&self) -> f64 {
        if self.vectors.is_empty() {
            return 0.0;
        }
        self.vectors
            .iter()
            .map(AthleticScoreVector::mean)
            .collect::<Vec<_>>()
            .mean()
    }
}
