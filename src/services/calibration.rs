/// Calibration
///
/// Maps normalized landmark units to meters using the athlete's real height.
/// The scale factor is recomputed for every frame because the athlete's
/// apparent height changes with distance from the camera.

use tracing::{debug, error};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{LandmarkFrame, PoseLandmark};

/// Meters per normalized landmark unit for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleFactor {
    Valid(f64),
    Invalid,
}

impl ScaleFactor {
    pub fn value(&self) -> Option<f64> {
        match self {
            ScaleFactor::Valid(scale) => Some(*scale),
            ScaleFactor::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ScaleFactor::Valid(_))
    }
}

/// In-frame athlete height: eye (index 1) to left ankle
pub fn pixel_height(frame: &LandmarkFrame) -> Option<f64> {
    let eye = frame.get(PoseLandmark::CALIBRATION_EYE)?;
    let ankle = frame.get(PoseLandmark::LeftAnkle)?;
    Some(eye.distance_to(ankle))
}

/// Compute the scale factor for a frame.
///
/// Invalid when the height is unknown, a landmark is missing, or the in-frame
/// height is not positive (athlete partly out of view).
pub fn scale_factor(frame: &LandmarkFrame, athlete_height_meters: Option<f64>) -> ScaleFactor {
    let Some(height) = athlete_height_meters else {
        return ScaleFactor::Invalid;
    };

    match pixel_height(frame) {
        Some(pixels) if pixels > 0.0 => ScaleFactor::Valid(height / pixels),
        Some(_) => {
            debug!(
                "Invalid frame height at frame {}, scale factor skipped",
                frame.frame_number
            );
            ScaleFactor::Invalid
        }
        None => ScaleFactor::Invalid,
    }
}

/// Athlete height supplied once per session by the height estimator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationState {
    athlete_height_meters: Option<f64>,
}

impl CalibrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the estimated height; non-positive or non-finite heights are fatal
    pub fn set_athlete_height(&mut self, height_meters: f64) -> AnalysisResult<()> {
        if !height_meters.is_finite() || height_meters <= 0.0 {
            error!("Height estimation returned {} m", height_meters);
            return Err(AnalysisError::InvalidAthleteHeight(height_meters));
        }
        self.athlete_height_meters = Some(height_meters);
        Ok(())
    }

    pub fn athlete_height_meters(&self) -> Option<f64> {
        self.athlete_height_meters
    }

    pub fn is_calibrated(&self) -> bool {
        self.athlete_height_meters.is_some()
    }

    pub fn scale_factor(&self, frame: &LandmarkFrame) -> ScaleFactor {
        scale_factor(frame, self.athlete_height_meters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Landmark, POSE_LANDMARK_COUNT};

    fn frame_with_height(eye_y: f64, ankle_y: f64) -> LandmarkFrame {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        landmarks[PoseLandmark::CALIBRATION_EYE.index()] = Landmark::new(0.5, eye_y);
        landmarks[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.5, ankle_y);
        LandmarkFrame::new(0, 0.0, 0.0, landmarks)
    }

    #[test]
    fn test_scale_factor() {
        let frame = frame_with_height(0.05, 0.95);
        let scale = scale_factor(&frame, Some(1.8));
        assert!((scale.value().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_pixel_height_is_invalid() {
        let frame = frame_with_height(0.5, 0.5);
        assert_eq!(scale_factor(&frame, Some(1.8)), ScaleFactor::Invalid);
    }

    #[test]
    fn test_missing_height_is_invalid() {
        let frame = frame_with_height(0.05, 0.95);
        assert_eq!(scale_factor(&frame, None), ScaleFactor::Invalid);
    }

    #[test]
    fn test_missing_ankle_is_invalid() {
        let frame = LandmarkFrame::new(0, 0.0, 0.0, vec![Landmark::new(0.5, 0.1); 20]);
        assert_eq!(scale_factor(&frame, Some(1.8)), ScaleFactor::Invalid);
    }

    #[test]
    fn test_scale_recomputed_per_frame() {
        let mut calibration = CalibrationState::new();
        calibration.set_athlete_height(1.8).unwrap();

        let near = calibration.scale_factor(&frame_with_height(0.05, 0.95));
        let far = calibration.scale_factor(&frame_with_height(0.35, 0.80));
        assert!((near.value().unwrap() - 2.0).abs() < 1e-9);
        assert!((far.value().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_height() {
        let mut calibration = CalibrationState::new();
        assert!(matches!(
            calibration.set_athlete_height(0.0),
            Err(AnalysisError::InvalidAthleteHeight(_))
        ));
        assert!(calibration.set_athlete_height(f64::NAN).is_err());
        assert!(!calibration.is_calibrated());
    }
}
