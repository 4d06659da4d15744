/// Kinematics Engine
///
/// Converts the accepted landmark stream into motion metrics:
/// - Hip-midpoint displacement, speed (EMA smoothed) and top speed
/// - Acceleration and deceleration (thresholded, moving-average smoothed)
/// - Jump height from ankle rise, stride length, step counting
///
/// The motion part needs a valid scale factor and both hips. The ankle part
/// runs on every accepted frame that has both ankles. A missing landmark only
/// skips the step that needs it.

use serde::Serialize;
use tracing::debug;

use crate::config::{AnalysisConfig, SPEED_EMA_ALPHA};
use crate::models::{JumpEvent, LandmarkFrame, Point, PoseLandmark, StrideSample};
use crate::services::calibration::ScaleFactor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MotionPhase {
    #[default]
    Uninitialized,
    Streaming,
}

/// Session-long motion accumulators
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MotionState {
    pub phase: MotionPhase,
    /// Hip midpoint at the last accepted motion update
    pub previous_position: Option<Point>,
    /// Timestamp of the last accepted motion update
    pub previous_frame_timestamp_ms: Option<f64>,
    /// Timestamp of the last frame the engine saw; gates the frame gap
    pub last_frame_timestamp_ms: Option<f64>,
    /// Accumulated displacement in normalized units
    pub total_distance: f64,
    /// Accumulated displacement scaled to meters
    pub total_distance_meters: f64,
    pub speed_samples: Vec<f64>,
    pub smoothed_speed: f64,
    pub top_speed: f64,
    pub acceleration_samples: Vec<f64>,
    pub deceleration_samples: Vec<f64>,
    pub previous_ankle_y: Option<f64>,
    pub previous_ankle_midpoint: Option<Point>,
    pub jump_events: Vec<JumpEvent>,
    pub stride_samples: Vec<StrideSample>,
    pub step_count: u32,
    pub last_foot_separation: f64,
}

/// Why a motion update did not happen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionSkip {
    InvalidScale,
    MissingLandmarks,
    InvalidTimeGap { dt: f64 },
    BelowNoiseFloor { distance: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutcome {
    /// First usable frame; only the baseline was recorded
    Baseline,
    Moved { distance: f64, speed: f64 },
    Skipped(MotionSkip),
}

/// Per-frame result of the ankle-based metrics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnkleOutcome {
    pub jump_height: Option<f64>,
    pub stride_length: Option<f64>,
    pub step_counted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsUpdate {
    pub motion: MotionOutcome,
    pub ankles: AnkleOutcome,
}

#[derive(Debug, Clone)]
pub struct KinematicsEngine {
    config: AnalysisConfig,
    state: MotionState,
}

impl KinematicsEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            state: MotionState::default(),
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    /// Run all kinematic steps for one accepted frame
    pub fn update(
        &mut self,
        frame: &LandmarkFrame,
        scale: ScaleFactor,
        current_second: u32,
    ) -> KinematicsUpdate {
        let motion = self.update_motion(frame, scale);
        let ankles = self.update_ankles(frame, current_second);
        KinematicsUpdate { motion, ankles }
    }

    fn update_motion(&mut self, frame: &LandmarkFrame, scale: ScaleFactor) -> MotionOutcome {
        let now = frame.timestamp_ms;
        let last_seen = self.state.last_frame_timestamp_ms.replace(now);

        let Some(scale) = scale.value() else {
            return MotionOutcome::Skipped(MotionSkip::InvalidScale);
        };
        let Some(current_position) = frame.hip_midpoint() else {
            debug!("Required landmarks not found for distance calculation");
            return MotionOutcome::Skipped(MotionSkip::MissingLandmarks);
        };

        let previous_position = match (self.state.phase, self.state.previous_position) {
            (MotionPhase::Streaming, Some(previous)) => previous,
            _ => {
                self.state.phase = MotionPhase::Streaming;
                self.state.previous_position = Some(current_position);
                self.state.previous_frame_timestamp_ms = Some(now);
                self.state.total_distance = 0.0;
                self.state.total_distance_meters = 0.0;
                self.state.smoothed_speed = 0.0;
                self.state.top_speed = 0.0;
                return MotionOutcome::Baseline;
            }
        };

        let previous_timestamp = self.state.previous_frame_timestamp_ms.unwrap_or(now);

        // The gap gate uses the frame clock; rates use the time since the last accepted move
        let dt = (now - last_seen.unwrap_or(previous_timestamp)) / 1000.0;
        if dt <= 0.0 || dt > self.config.max_frame_gap_secs {
            debug!("Discarding frame {} with time gap {:.3}s", frame.frame_number, dt);
            return MotionOutcome::Skipped(MotionSkip::InvalidTimeGap { dt });
        }

        let distance = current_position.distance_to(&previous_position);
        if distance < self.config.noise_floor {
            return MotionOutcome::Skipped(MotionSkip::BelowNoiseFloor { distance });
        }

        let elapsed = (now - previous_timestamp) / 1000.0;

        self.state.total_distance += distance;
        self.state.total_distance_meters += distance * scale;
        self.state.previous_position = Some(current_position);
        self.state.previous_frame_timestamp_ms = Some(now);

        let time_step = elapsed.max(self.config.min_time_step_secs);
        let speed = distance / time_step;

        self.state.speed_samples.push(speed);
        self.state.smoothed_speed =
            SPEED_EMA_ALPHA * speed + (1.0 - SPEED_EMA_ALPHA) * self.state.smoothed_speed;
        self.state.top_speed = self.state.top_speed.max(speed);

        let acceleration = rate_of_change(&self.state.speed_samples, elapsed);
        if acceleration.abs() > self.config.acceleration_threshold {
            self.state.acceleration_samples.push(acceleration);
        }
        let deceleration = -acceleration;
        if deceleration.abs() > self.config.acceleration_threshold {
            self.state.deceleration_samples.push(deceleration);
        }

        debug!(
            "Speed: {:.3} units/s, top speed: {:.3}, distance: {:.3}",
            speed, self.state.top_speed, self.state.total_distance
        );

        MotionOutcome::Moved { distance, speed }
    }

    fn update_ankles(&mut self, frame: &LandmarkFrame, current_second: u32) -> AnkleOutcome {
        let (Some(left), Some(right)) = (
            frame.get(PoseLandmark::LeftAnkle),
            frame.get(PoseLandmark::RightAnkle),
        ) else {
            return AnkleOutcome::default();
        };
        let midpoint = left.point().midpoint(&right.point());

        let mut outcome = AnkleOutcome::default();

        // Image Y grows downward, so a rising ankle has a smaller y
        if let Some(previous_y) = self.state.previous_ankle_y {
            let rise = previous_y - midpoint.y;
            let height = if rise > self.config.jump_height_baseline {
                rise
            } else {
                0.0
            };
            self.state.jump_events.push(JumpEvent {
                time: current_second,
                height,
            });
            outcome.jump_height = Some(height);
        }
        self.state.previous_ankle_y = Some(midpoint.y);

        if let Some(previous) = self.state.previous_ankle_midpoint {
            let displacement = midpoint.distance_to(&previous);
            let length = if displacement > self.config.stride_noise_floor {
                displacement
            } else {
                0.0
            };
            self.state.stride_samples.push(StrideSample {
                time: current_second,
                length,
            });
            outcome.stride_length = Some(length);
        }
        self.state.previous_ankle_midpoint = Some(midpoint);

        let separation = (left.y - right.y).abs();
        if separation > self.config.step_separation_threshold
            && (separation - self.state.last_foot_separation).abs()
                > self.config.step_change_threshold
        {
            self.state.step_count += 1;
            self.state.last_foot_separation = separation;
            outcome.step_counted = true;
        }

        outcome
    }

    /// Acceleration series smoothed with a centered moving average
    pub fn smoothed_acceleration(&self) -> Vec<f64> {
        moving_average(&self.state.acceleration_samples, self.config.acceleration_window)
    }

    pub fn smoothed_deceleration(&self) -> Vec<f64> {
        moving_average(&self.state.deceleration_samples, self.config.acceleration_window)
    }

    /// Mean of the most recent smoothed acceleration values (0 when none)
    pub fn recent_smoothed_acceleration(&self) -> f64 {
        let data = &self.state.acceleration_samples;
        let window = self.config.acceleration_window;
        let start = data.len().saturating_sub(window);
        if start == data.len() {
            return 0.0;
        }
        let total: f64 = (start..data.len())
            .map(|i| centered_mean(data, i, window / 2))
            .sum();
        total / (data.len() - start) as f64
    }

    pub fn latest_acceleration(&self) -> f64 {
        self.state.acceleration_samples.last().copied().unwrap_or(0.0)
    }

    pub fn latest_deceleration(&self) -> f64 {
        self.state.deceleration_samples.last().copied().unwrap_or(0.0)
    }

    pub fn latest_jump_height(&self) -> f64 {
        self.state.jump_events.last().map_or(0.0, |jump| jump.height)
    }

    pub fn latest_stride_length(&self) -> f64 {
        self.state.stride_samples.last().map_or(0.0, |stride| stride.length)
    }

    pub fn peak_acceleration(&self) -> f64 {
        peak(&self.state.acceleration_samples)
    }

    pub fn peak_deceleration(&self) -> f64 {
        peak(&self.state.deceleration_samples)
    }
}

/// Change between the last two samples over `dt`; 0 without two samples
fn rate_of_change(samples: &[f64], dt: f64) -> f64 {
    match samples {
        [.., previous, latest] if dt > 0.0 => (latest - previous) / dt,
        _ => 0.0,
    }
}

fn peak(samples: &[f64]) -> f64 {
    samples.iter().copied().fold(None, |max: Option<f64>, v| {
        Some(max.map_or(v, |m| m.max(v)))
    })
    .unwrap_or(0.0)
}

/// Centered moving average over `[i - window/2, i + window/2)`, clamped to the data
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    (0..data.len()).map(|i| centered_mean(data, i, half)).collect()
}

fn centered_mean(data: &[f64], i: usize, half: usize) -> f64 {
    let start = i.saturating_sub(half);
    let end = (i + half).min(data.len()).max(i + 1);
    let slice = &data[start..end];
    slice.iter().sum::<f64>() / slice.len() as f64
}
