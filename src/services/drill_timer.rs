/// Drill Timer
///
/// Idle until the ankles move sharply, Active until an explicit end signal.
/// A session runs one Idle -> Active -> Ended cycle.

use serde::Serialize;
use tracing::info;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{LandmarkFrame, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DrillPhase {
    #[default]
    Idle,
    Active,
    Ended,
}

/// Emitted when the drill starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrillStarted {
    pub start_timestamp_ms: f64,
    /// Time from the operator's cue to the first movement
    pub reaction_time_ms: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct DrillTimer {
    phase: DrillPhase,
    start_threshold: f64,
    previous_ankle_midpoint: Option<Point>,
    cue_timestamp_ms: Option<f64>,
    start_timestamp_ms: Option<f64>,
    reaction_times_ms: Vec<f64>,
    total_time_secs: Option<f64>,
}

impl DrillTimer {
    pub fn new(start_threshold: f64) -> Self {
        Self {
            phase: DrillPhase::Idle,
            start_threshold,
            previous_ankle_midpoint: None,
            cue_timestamp_ms: None,
            start_timestamp_ms: None,
            reaction_times_ms: Vec::new(),
            total_time_secs: None,
        }
    }

    pub fn phase(&self) -> DrillPhase {
        self.phase
    }

    /// Record the operator's "go" signal
    pub fn cue(&mut self, timestamp_ms: f64) {
        self.cue_timestamp_ms = Some(timestamp_ms);
    }

    /// Watch for the start movement. Returns the start event on activation.
    pub fn update(&mut self, frame: &LandmarkFrame) -> Option<DrillStarted> {
        let midpoint = frame.ankle_midpoint()?;
        let previous = self.previous_ankle_midpoint.replace(midpoint)?;

        if self.phase != DrillPhase::Idle
            || midpoint.distance_to(&previous) <= self.start_threshold
        {
            return None;
        }

        let now = frame.timestamp_ms;
        self.phase = DrillPhase::Active;
        self.start_timestamp_ms = Some(now);

        let reaction_time_ms = self.cue_timestamp_ms.map(|cue| now - cue);
        if let Some(reaction) = reaction_time_ms {
            self.reaction_times_ms.push(reaction);
        }
        info!("Drill started at frame {}", frame.frame_number);

        Some(DrillStarted {
            start_timestamp_ms: now,
            reaction_time_ms,
        })
    }

    /// Stop the drill and return the total time in seconds
    pub fn end(&mut self, timestamp_ms: f64) -> AnalysisResult<f64> {
        let start = match (self.phase, self.start_timestamp_ms) {
            (DrillPhase::Active, Some(start)) => start,
            _ => return Err(AnalysisError::DrillNotActive),
        };

        let total = (timestamp_ms - start) / 1000.0;
        self.phase = DrillPhase::Ended;
        self.total_time_secs = Some(total);
        info!("Drill time: {:.2}s", total);
        Ok(total)
    }

    pub fn reaction_times_ms(&self) -> &[f64] {
        &self.reaction_times_ms
    }

    pub fn total_time_secs(&self) -> Option<f64> {
        self.total_time_secs
    }
}
