// Metric records handed to downstream consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discrete posture classification for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostureLabel {
    Running,
    Standing,
    Crouching,
    /// Angles could not be computed (missing landmarks)
    Unknown,
}

impl std::fmt::Display for PostureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostureLabel::Running => write!(f, "Running"),
            PostureLabel::Standing => write!(f, "Upright Standing"),
            PostureLabel::Crouching => write!(f, "Crouching"),
            PostureLabel::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Five independent athletic scores, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AthleticScoreVector {
    pub footwork: f64,
    pub speed: f64,
    pub acceleration: f64,
    pub head_angle: f64,
    pub posture: f64,
}

impl AthleticScoreVector {
    pub fn components(&self) -> [f64; 5] {
        [
            self.footwork,
            self.speed,
            self.acceleration,
            self.head_angle,
            self.posture,
        ]
    }

    pub fn has_nan(&self) -> bool {
        self.components().iter().any(|c| c.is_nan())
    }

    /// Mean of the five components
    pub fn mean(&self) -> f64 {
        self.components().iter().sum::<f64>() / 5.0
    }
}

/// A detected jump (or zero-height placeholder) at a video second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpEvent {
    pub time: u32,
    pub height: f64,
}

/// Ankle-midpoint displacement recorded at a video second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrideSample {
    pub time: u32,
    pub length: f64,
}

/// Flat record emitted once per advanced video second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerSecondRecord {
    pub second: u32,
    pub head_angle: Option<f64>,
    pub speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    pub stride_length: f64,
    pub jump_height: f64,
    pub top_speed: f64,
    pub total_distance: f64,
    pub total_distance_meters: f64,
    pub step_count: u32,
    pub athletic_score: Option<AthleticScoreVector>,
}

/// Share of frames per known posture, in whole percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PosturePercentages {
    pub running: u32,
    pub standing: u32,
    pub crouching: u32,
}

/// End-of-session analytics payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub ideal_head_percentage: u32,
    pub average_athletic_score: f64,
    pub top_speed: f64,
    pub total_distance: f64,
    pub total_distance_meters: f64,
    pub average_jump_height: f64,
    pub average_stride_length: f64,
    pub peak_acceleration: f64,
    pub peak_deceleration: f64,
    pub step_count: u32,
    pub posture_percentages: PosturePercentages,
    pub reaction_times_secs: Vec<f64>,
    pub drill_time_secs: Option<f64>,
    pub frames_processed: u64,
    pub frames_rejected: u64,
}
