// Analysis pipeline services

pub mod analysis_session;
pub mod athletic_score;
pub mod calibration;
pub mod drill_timer;
pub mod frame_sequencer;
pub mod head_angle;
pub mod kinematics;
pub mod landmark_ingest;
pub mod posture_classifier;
pub mod subject_tracker;

pub use analysis_session::{AnalysisSession, FrameOutcome};
pub use athletic_score::AthleticScoreAggregator;
pub use calibration::{CalibrationState, ScaleFactor};
pub use drill_timer::{DrillPhase, DrillStarted, DrillTimer};
pub use frame_sequencer::{FrameSequencer, HeightEstimator, MetricSink, PoseEstimator, SessionEvent};
pub use head_angle::HeadAngleTracker;
pub use kinematics::{KinematicsEngine, MotionState};
pub use landmark_ingest::LandmarkHistory;
pub use posture_classifier::PostureHistogram;
pub use subject_tracker::{SubjectLockTracker, TrackDecision, TrackState};
