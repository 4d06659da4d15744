/// Head Angle Tracker
///
/// Head tilt is the direction from the eye midpoint to the shoulder
/// midpoint, in degrees. Frames inside the ideal range are counted so the
/// session can report how often the athlete kept their head up.

use tracing::debug;

use crate::models::{LandmarkFrame, PoseLandmark};

pub fn head_angle(frame: &LandmarkFrame) -> Option<f64> {
    let eyes = frame.midpoint(PoseLandmark::LeftEyeOuter, PoseLandmark::RightEyeOuter)?;
    let shoulders = frame.midpoint(PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder)?;
    Some((shoulders.y - eyes.y).atan2(shoulders.x - eyes.x).to_degrees())
}

#[derive(Debug, Clone)]
pub struct HeadAngleTracker {
    ideal_min: f64,
    ideal_max: f64,
    count_min: f64,
    ideal_frames: u32,
    total_frames: u32,
    latest: Option<f64>,
}

impl HeadAngleTracker {
    pub fn new(ideal_min: f64, ideal_max: f64, count_min: f64) -> Self {
        Self {
            ideal_min,
            ideal_max,
            count_min,
            ideal_frames: 0,
            total_frames: 0,
            latest: None,
        }
    }

    /// Measure one frame and update the counters
    pub fn update(&mut self, frame: &LandmarkFrame) -> Option<f64> {
        let Some(angle) = head_angle(frame) else {
            debug!("Head landmarks missing at frame {}", frame.frame_number);
            return None;
        };

        if angle >= self.count_min {
            self.total_frames += 1;
        }
        if angle >= self.ideal_min && angle <= self.ideal_max {
            self.ideal_frames += 1;
        }
        self.latest = Some(angle);
        Some(angle)
    }

    pub fn latest(&self) -> Option<f64> {
        self.latest
    }

    pub fn ideal_frames(&self) -> u32 {
        self.ideal_frames
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Whole-percent share of ideal frames; 0 before any frame was counted
    pub fn ideal_percentage(&self) -> u32 {
        if self.total_frames == 0 {
            return 0;
        }
        (self.ideal_frames as f64 / self.total_frames as f64 * 100.0).round() as u32
    }
}
