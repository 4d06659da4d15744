use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{AnalysisError, AnalysisResult};

/// Smoothing factor of the speed EMA. Fixed; downstream scores assume it.
pub const SPEED_EMA_ALPHA: f64 = 0.5;

/// Thresholds and window sizes used by the analysis pipeline.
///
/// `Default` is the canonical constant set. Values are normalized landmark
/// units unless the field name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum overlap with the locked box to keep tracking
    pub overlap_threshold: f64,
    /// Hip displacement below this is treated as jitter
    pub noise_floor: f64,
    /// Frame gaps above this (seconds) are treated as stale
    pub max_frame_gap_secs: f64,
    /// Lower bound on the time step used for speed
    pub min_time_step_secs: f64,
    /// Acceleration and deceleration below this magnitude are dropped
    pub acceleration_threshold: f64,
    /// Ankle rise needed to record a jump
    pub jump_height_baseline: f64,
    /// Ankle displacement at or below this records a zero stride
    pub stride_noise_floor: f64,
    /// Foot separation needed to count a step
    pub step_separation_threshold: f64,
    /// Change in foot separation needed to count a step
    pub step_change_threshold: f64,
    /// Ankle displacement that starts the drill
    pub drill_start_threshold: f64,
    /// Frames kept in the landmark history
    pub history_capacity: usize,
    /// Ideal head angle range (degrees, inclusive)
    pub head_angle_min: f64,
    pub head_angle_max: f64,
    /// Head angles below this do not count as a measured frame
    pub head_angle_count_min: f64,
    /// Moving-average window for acceleration smoothing
    pub acceleration_window: usize,
    /// Per-frame ankle change that counts as a footwork movement
    pub footwork_movement_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.5,
            noise_floor: 0.1,
            max_frame_gap_secs: 1.0,
            min_time_step_secs: 0.05,
            acceleration_threshold: 0.5,
            jump_height_baseline: 0.03,
            stride_noise_floor: 0.01,
            step_separation_threshold: 0.05,
            step_change_threshold: 0.02,
            drill_start_threshold: 0.18,
            history_capacity: 100,
            head_angle_min: 40.0,
            head_angle_max: 120.0,
            head_angle_count_min: 5.0,
            acceleration_window: 10,
            footwork_movement_threshold: 0.01,
        }
    }
}

impl AnalysisConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> AnalysisResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AnalysisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Apply `DRILL_*` environment variables on top of this configuration
    pub fn with_env_overrides(self) -> AnalysisResult<Self> {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides<F>(self, lookup: F) -> AnalysisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self;

        if let Some(value) = lookup("DRILL_JUMP_HEIGHT_BASELINE") {
            config.jump_height_baseline = parse_var("DRILL_JUMP_HEIGHT_BASELINE", &value)?;
        }
        if let Some(value) = lookup("DRILL_START_THRESHOLD") {
            config.drill_start_threshold = parse_var("DRILL_START_THRESHOLD", &value)?;
        }
        if let Some(value) = lookup("DRILL_HISTORY_CAPACITY") {
            config.history_capacity = parse_var("DRILL_HISTORY_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("DRILL_HEAD_ANGLE_MIN") {
            config.head_angle_min = parse_var("DRILL_HEAD_ANGLE_MIN", &value)?;
        }
        if let Some(value) = lookup("DRILL_HEAD_ANGLE_MAX") {
            config.head_angle_max = parse_var("DRILL_HEAD_ANGLE_MAX", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.history_capacity < 2 {
            return Err(AnalysisError::InvalidConfig(
                "history_capacity must be at least 2".to_string(),
            ));
        }
        if self.acceleration_window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "acceleration_window must be positive".to_string(),
            ));
        }
        if self.head_angle_min > self.head_angle_max {
            return Err(AnalysisError::InvalidConfig(format!(
                "head_angle_min ({}) exceeds head_angle_max ({})",
                self.head_angle_min, self.head_angle_max
            )));
        }
        if !(self.max_frame_gap_secs > 0.0 && self.min_time_step_secs > 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "frame gap and time step bounds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> AnalysisResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AnalysisError::InvalidConfig(format!("{} has invalid value '{}'", key, value)))
}
