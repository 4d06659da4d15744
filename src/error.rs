use thiserror::Error;

/// Session-level errors raised by the analysis pipeline.
///
/// Frame-local problems (missing landmarks, invalid time gaps, noise) never
/// surface here; they are absorbed by skipping the affected metric.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Height estimation failed: {0}")]
    Calibration(String),
    #[error("Invalid athlete height: {0} m")]
    InvalidAthleteHeight(f64),
    #[error("Drill is not active")]
    DrillNotActive,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Pose estimator error: {0}")]
    Estimator(#[source] anyhow::Error),
}

/// Why a frame was dropped before metric computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRejection {
    /// The frame had no usable landmarks to form a bounding box
    NoLandmarks,
    /// The detection did not overlap the locked subject enough
    TrackingLost { overlap_ratio: f64 },
}

impl std::fmt::Display for FrameRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameRejection::NoLandmarks => write!(f, "no landmarks"),
            FrameRejection::TrackingLost { overlap_ratio } => {
                write!(f, "lost track of athlete (overlap {:.3})", overlap_ratio)
            }
        }
    }
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
