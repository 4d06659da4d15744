use chrono::Utc;
use statrs::statistics::Statistics;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisResult, FrameRejection};
use crate::models::{LandmarkFrame, PerSecondRecord, PostureLabel, SessionSummary};
use crate::services::athletic_score::{AthleticScoreAggregator, ScoreInputs};
use crate::services::calibration::CalibrationState;
use crate::services::drill_timer::{DrillPhase, DrillStarted, DrillTimer};
use crate::services::head_angle::HeadAngleTracker;
use crate::services::kinematics::{KinematicsEngine, MotionState};
use crate::services::landmark_ingest::LandmarkHistory;
use crate::services::posture_classifier::{self, PostureHistogram};
use crate::services::subject_tracker::{SubjectLockTracker, TrackDecision, TrackState};

/// Result of feeding one frame to the session
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Rejected { reason: FrameRejection },
    /// `tick` is set when the frame advanced the video second,
    /// `drill_started` when the frame's movement started the drill
    Accepted {
        tick: Option<PerSecondRecord>,
        drill_started: Option<DrillStarted>,
    },
}

/// All state for the analysis of one video.
///
/// Frames are processed strictly one at a time; selecting a new video
/// replaces every component with a fresh one.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    session_id: Uuid,
    history: LandmarkHistory,
    tracker: SubjectLockTracker,
    calibration: CalibrationState,
    kinematics: KinematicsEngine,
    postures: PostureHistogram,
    last_posture: PostureLabel,
    scores: AthleticScoreAggregator,
    drill: DrillTimer,
    head: HeadAngleTracker,
    series: Vec<PerSecondRecord>,
    current_second: u32,
    frames_processed: u64,
    frames_rejected: u64,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            history: LandmarkHistory::with_capacity(config.history_capacity),
            tracker: SubjectLockTracker::with_threshold(config.overlap_threshold),
            calibration: CalibrationState::new(),
            kinematics: KinematicsEngine::new(config.clone()),
            postures: PostureHistogram::new(),
            last_posture: PostureLabel::Unknown,
            scores: AthleticScoreAggregator::new(),
            drill: DrillTimer::new(config.drill_start_threshold),
            head: HeadAngleTracker::new(
                config.head_angle_min,
                config.head_angle_max,
                config.head_angle_count_min,
            ),
            series: Vec::new(),
            current_second: 0,
            frames_processed: 0,
            frames_rejected: 0,
            config,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Store the athlete's height for this video
    pub fn calibrate(&mut self, athlete_height_meters: f64) -> AnalysisResult<()> {
        self.calibration.set_athlete_height(athlete_height_meters)?;
        info!(
            "Session {} calibrated with athlete height {:.2} m",
            self.session_id, athlete_height_meters
        );
        Ok(())
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    /// Tear down everything and start a new session
    pub fn on_video_selected(&mut self) {
        let previous = self.session_id;
        *self = Self::new(self.config.clone());
        info!("Session {} replaced by {}", previous, self.session_id);
    }

    pub fn on_drill_cue(&mut self, timestamp_ms: f64) {
        debug!("Drill cue at {:.0} ms", timestamp_ms);
        self.drill.cue(timestamp_ms);
    }

    /// End the drill; returns the drill time in seconds
    pub fn on_drill_end(&mut self, timestamp_ms: f64) -> AnalysisResult<f64> {
        self.drill.end(timestamp_ms)
    }

    pub fn drill_phase(&self) -> DrillPhase {
        self.drill.phase()
    }

    /// Run every stage for one frame
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> FrameOutcome {
        self.history.push(frame);

        if let TrackDecision::Rejected(reason) = self.tracker.evaluate(frame) {
            self.frames_rejected += 1;
            return FrameOutcome::Rejected { reason };
        }
        self.frames_processed += 1;

        let second = frame.video_time_secs.max(0.0).floor() as u32;
        let scale = self.calibration.scale_factor(frame);

        self.kinematics.update(frame, scale, second);

        let posture = posture_classifier::classify(frame);
        self.postures.record(posture);
        self.last_posture = posture;

        self.head.update(frame);
        let drill_started = self.drill.update(frame);

        self.scores.record(&ScoreInputs {
            foot_movements: self
                .history
                .count_foot_movements(self.config.footwork_movement_threshold),
            smoothed_speed: self.kinematics.state().smoothed_speed,
            recent_smoothed_acceleration: self.kinematics.recent_smoothed_acceleration(),
            ideal_head_angle_frames: self.head.ideal_frames(),
            posture,
        });

        let tick = (second > self.current_second).then(|| {
            self.current_second = second;
            let record = self.current_record();
            self.series.push(record.clone());
            record
        });

        FrameOutcome::Accepted {
            tick,
            drill_started,
        }
    }

    fn current_record(&self) -> PerSecondRecord {
        let motion = self.kinematics.state();
        PerSecondRecord {
            second: self.current_second,
            head_angle: self.head.latest(),
            speed: motion.smoothed_speed,
            acceleration: self.kinematics.latest_acceleration(),
            deceleration: self.kinematics.latest_deceleration(),
            stride_length: self.kinematics.latest_stride_length(),
            jump_height: self.kinematics.latest_jump_height(),
            top_speed: motion.top_speed,
            total_distance: motion.total_distance,
            total_distance_meters: motion.total_distance_meters,
            step_count: motion.step_count,
            athletic_score: self.scores.latest().copied(),
        }
    }

    pub fn per_second_series(&self) -> &[PerSecondRecord] {
        &self.series
    }

    pub fn motion_state(&self) -> &MotionState {
        self.kinematics.state()
    }

    pub fn track_state(&self) -> &TrackState {
        self.tracker.state()
    }

    pub fn last_posture(&self) -> PostureLabel {
        self.last_posture
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// Session analytics at this point in the video
    pub fn summary(&self) -> SessionSummary {
        let motion = self.kinematics.state();
        SessionSummary {
            session_id: self.session_id,
            analyzed_at: Utc::now(),
            ideal_head_percentage: self.head.ideal_percentage(),
            average_athletic_score: self.scores.average_score(),
            top_speed: motion.top_speed,
            total_distance: motion.total_distance,
            total_distance_meters: motion.total_distance_meters,
            average_jump_height: mean_or_zero(motion.jump_events.iter().map(|j| j.height)),
            average_stride_length: mean_or_zero(motion.stride_samples.iter().map(|s| s.length)),
            peak_acceleration: self.kinematics.peak_acceleration(),
            peak_deceleration: self.kinematics.peak_deceleration(),
            step_count: motion.step_count,
            posture_percentages: self.postures.percentages(),
            reaction_times_secs: self
                .drill
                .reaction_times_ms()
                .iter()
                .map(|ms| ms / 1000.0)
                .collect(),
            drill_time_secs: self.drill.total_time_secs(),
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
        }
    }
}

fn mean_or_zero(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        0.0
    } else {
        values.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::models::{Landmark, PoseLandmark, POSE_LANDMARK_COUNT};
    use assert_matches::assert_matches;

    fn frame(n: u32, hip_x: f64) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        landmarks[PoseLandmark::CALIBRATION_EYE.index()] = Landmark::new(0.5, 0.05);
        landmarks[PoseLandmark::LeftHip.index()] = Landmark::new(hip_x, 0.5);
        landmarks[PoseLandmark::RightHip.index()] = Landmark::new(hip_x, 0.5);
        landmarks[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.45, 0.95);
        landmarks[PoseLandmark::RightAnkle.index()] = Landmark::new(0.55, 0.95);
        let timestamp_ms = n as f64 * 100.0;
        LandmarkFrame::new(n, timestamp_ms, timestamp_ms / 1000.0, landmarks)
    }

    #[test]
    fn test_ticks_are_edge_triggered() {
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        session.calibrate(1.8).unwrap();

        let mut ticks = Vec::new();
        for n in 0..=25 {
            if let FrameOutcome::Accepted {
                tick: Some(record), ..
            } =
                session.process_frame(&frame(n, 0.0))
            {
                ticks.push(record.second);
            }
        }
        assert_eq!(ticks, vec![1, 2]);
        assert_eq!(session.per_second_series().len(), 2);
    }

    #[test]
    fn test_rejected_frames_are_counted() {
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        session.process_frame(&frame(0, 0.5));
        let outcome = session.process_frame(&LandmarkFrame::new(1, 100.0, 0.1, vec![]));
        assert_matches!(
            outcome,
            FrameOutcome::Rejected {
                reason: FrameRejection::NoLandmarks
            }
        );
        assert_eq!(session.frames_processed(), 1);
        assert_eq!(session.frames_rejected(), 1);
    }

    #[test]
    fn test_video_selected_resets_everything() {
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        let first_id = session.session_id();
        session.calibrate(1.8).unwrap();
        for n in 0..15 {
            session.process_frame(&frame(n, n as f64 * 0.15));
        }

        session.on_video_selected();

        assert_ne!(session.session_id(), first_id);
        assert!(!session.is_calibrated());
        assert_eq!(session.motion_state(), &MotionState::default());
        assert_eq!(session.track_state(), &TrackState::default());
        assert!(session.per_second_series().is_empty());
        assert_eq!(session.frames_processed(), 0);
    }

    #[test]
    fn test_drill_start_is_reported_once() {
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        session.calibrate(1.8).unwrap();
        session.on_drill_cue(50.0);

        let mut burst = frame(1, 0.0);
        burst.landmarks[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.45, 0.7);
        burst.landmarks[PoseLandmark::RightAnkle.index()] = Landmark::new(0.55, 0.7);

        session.process_frame(&frame(0, 0.0));
        let started = session.process_frame(&burst);
        assert_matches!(
            started,
            FrameOutcome::Accepted {
                drill_started: Some(DrillStarted {
                    reaction_time_ms: Some(reaction),
                    ..
                }),
                ..
            } if (reaction - 50.0).abs() < 1e-9
        );
        assert_eq!(session.drill_phase(), DrillPhase::Active);

        let later = session.process_frame(&frame(2, 0.0));
        assert_matches!(later, FrameOutcome::Accepted { drill_started: None, .. });
        assert!((session.on_drill_end(1100.0).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_drill_end_before_start_fails() {
        let mut session = AnalysisSession::new(AnalysisConfig::default());
        assert_matches!(session.on_drill_end(1000.0), Err(AnalysisError::DrillNotActive));
    }

    #[test]
    fn test_empty_summary() {
        let session = AnalysisSession::new(AnalysisConfig::default());
        let summary = session.summary();
        assert_eq!(summary.session_id, session.session_id());
        assert_eq!(summary.average_jump_height, 0.0);
        assert_eq!(summary.average_athletic_score, 0.0);
        assert_eq!(summary.drill_time_secs, None);
    }
}
