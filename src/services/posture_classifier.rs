/// Posture/Gait Classifier
///
/// Computes knee, hip and torso angles from a frame and maps them to a
/// discrete posture label. Rule order matters: the first matching range wins.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{LandmarkFrame, Point, PoseLandmark, PostureLabel, PosturePercentages};

/// Joint angles in degrees, averaged across both sides when available
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JointAngles {
    pub knee: f64,
    pub hip: f64,
    pub torso: f64,
}

/// Inclusive angle range in degrees
#[derive(Debug, Clone, Copy)]
struct AngleRange(f64, f64);

impl AngleRange {
    fn contains(&self, angle: f64) -> bool {
        angle >= self.0 && angle <= self.1
    }
}

const CROUCH_KNEE: AngleRange = AngleRange(30.0, 45.0);
const CROUCH_HIP: AngleRange = AngleRange(20.0, 30.0);
const CROUCH_TORSO: AngleRange = AngleRange(10.0, 20.0);
const RUN_KNEE: AngleRange = AngleRange(20.0, 30.0);
const RUN_HIP: AngleRange = AngleRange(15.0, 25.0);
const RUN_TORSO: AngleRange = AngleRange(5.0, 15.0);
const STAND_KNEE: AngleRange = AngleRange(10.0, 25.0);
const STAND_TORSO: AngleRange = AngleRange(75.0, 90.0);

/// Angle at vertex `b` between b→a and b→c, in degrees.
///
/// Returns `None` when either vector has zero length.
pub fn angle(a: Point, b: Point, c: Point) -> Option<f64> {
    let (ba_x, ba_y) = (a.x - b.x, a.y - b.y);
    let (bc_x, bc_y) = (c.x - b.x, c.y - b.y);

    let dot_product = ba_x * bc_x + ba_y * bc_y;
    let mag_ba = ba_x.hypot(ba_y);
    let mag_bc = bc_x.hypot(bc_y);

    if mag_ba == 0.0 || mag_bc == 0.0 {
        return None;
    }

    let cos_angle = dot_product / (mag_ba * mag_bc);
    Some(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Angle for one body side from three landmarks
fn side_angle(
    frame: &LandmarkFrame,
    a: PoseLandmark,
    b: PoseLandmark,
    c: PoseLandmark,
) -> Option<f64> {
    angle(frame.get(a)?.point(), frame.get(b)?.point(), frame.get(c)?.point())
}

/// Torso lean: hip-shoulder line against the vertical through the shoulder
fn torso_angle(frame: &LandmarkFrame, hip: PoseLandmark, shoulder: PoseLandmark) -> Option<f64> {
    let shoulder = frame.get(shoulder)?.point();
    let vertical = Point::new(shoulder.x, shoulder.y - 1.0);
    angle(frame.get(hip)?.point(), shoulder, vertical)
}

fn average_sides(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (side, None) | (None, side) => side,
    }
}

/// Compute knee, hip and torso angles. `None` when any of them is unavailable.
pub fn compute_angles(frame: &LandmarkFrame) -> Option<JointAngles> {
    use PoseLandmark::*;

    let knee = average_sides(
        side_angle(frame, LeftHip, LeftKnee, LeftAnkle),
        side_angle(frame, RightHip, RightKnee, RightAnkle),
    )?;
    let hip = average_sides(
        side_angle(frame, LeftShoulder, LeftHip, LeftKnee),
        side_angle(frame, RightShoulder, RightHip, RightKnee),
    )?;
    let torso = average_sides(
        torso_angle(frame, LeftHip, LeftShoulder),
        torso_angle(frame, RightHip, RightShoulder),
    )?;

    Some(JointAngles { knee, hip, torso })
}

/// Map joint angles to a posture label
pub fn classify_angles(angles: &JointAngles) -> PostureLabel {
    if CROUCH_KNEE.contains(angles.knee)
        && CROUCH_HIP.contains(angles.hip)
        && CROUCH_TORSO.contains(angles.torso)
    {
        PostureLabel::Crouching
    } else if RUN_KNEE.contains(angles.knee)
        && RUN_HIP.contains(angles.hip)
        && RUN_TORSO.contains(angles.torso)
    {
        PostureLabel::Running
    } else if STAND_KNEE.contains(angles.knee) && STAND_TORSO.contains(angles.torso) {
        PostureLabel::Standing
    } else {
        // Anything in motion that matched no stance
        PostureLabel::Running
    }
}

pub fn classify(frame: &LandmarkFrame) -> PostureLabel {
    compute_angles(frame)
        .map(|angles| classify_angles(&angles))
        .unwrap_or(PostureLabel::Unknown)
}

/// Running tally of known posture labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostureHistogram {
    counts: HashMap<PostureLabel, u32>,
}

impl PostureHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: PostureLabel) {
        if label != PostureLabel::Unknown {
            *self.counts.entry(label).or_insert(0) += 1;
        }
    }

    pub fn count(&self, label: PostureLabel) -> u32 {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Whole-percent share of each known label; all zero when nothing was recorded
    pub fn percentages(&self) -> PosturePercentages {
        let total = self.total();
        if total == 0 {
            return PosturePercentages::default();
        }
        let percent = |label| (self.count(label) as f64 / total as f64 * 100.0).round() as u32;
        PosturePercentages {
            running: percent(PostureLabel::Running),
            standing: percent(PostureLabel::Standing),
            crouching: percent(PostureLabel::Crouching),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Landmark, POSE_LANDMARK_COUNT};

    #[test]
    fn test_right_angle() {
        let result = angle(Point::new(0.0, 1.0), Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((result.unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_angle() {
        let result = angle(Point::new(0.0, 0.0), Point::new(0.5, 0.0), Point::new(1.0, 0.0));
        assert!((result.unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_vector() {
        let p = Point::new(0.3, 0.3);
        assert_eq!(angle(p, p, Point::new(1.0, 1.0)), None);
    }

    #[test]
    fn test_crouching_takes_priority() {
        let angles = JointAngles {
            knee: 35.0,
            hip: 25.0,
            torso: 15.0,
        };
        assert_eq!(classify_angles(&angles), PostureLabel::Crouching);
    }

    #[test]
    fn test_running_ranges() {
        let angles = JointAngles {
            knee: 25.0,
            hip: 20.0,
            torso: 10.0,
        };
        assert_eq!(classify_angles(&angles), PostureLabel::Running);
    }

    #[test]
    fn test_standing_ignores_hip() {
        let angles = JointAngles {
            knee: 15.0,
            hip: 170.0,
            torso: 80.0,
        };
        assert_eq!(classify_angles(&angles), PostureLabel::Standing);
    }

    #[test]
    fn test_fallback_is_running() {
        let angles = JointAngles {
            knee: 170.0,
            hip: 170.0,
            torso: 170.0,
        };
        assert_eq!(classify_angles(&angles), PostureLabel::Running);
    }

    #[test]
    fn test_missing_landmarks_are_unknown() {
        let frame = LandmarkFrame::new(0, 0.0, 0.0, vec![Landmark::new(0.5, 0.5); 12]);
        assert_eq!(classify(&frame), PostureLabel::Unknown);
    }

    #[test]
    fn test_one_sided_angles() {
        let mut landmarks = vec![Landmark::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        landmarks[PoseLandmark::LeftShoulder.index()] = Landmark::new(0.5, 0.2);
        landmarks[PoseLandmark::LeftHip.index()] = Landmark::new(0.5, 0.5);
        landmarks[PoseLandmark::LeftKnee.index()] = Landmark::new(0.5, 0.7);
        landmarks[PoseLandmark::LeftAnkle.index()] = Landmark::new(0.5, 0.9);
        // Right side collapsed onto a single point
        for side in [
            PoseLandmark::RightShoulder,
            PoseLandmark::RightHip,
            PoseLandmark::RightKnee,
            PoseLandmark::RightAnkle,
        ] {
            landmarks[side.index()] = Landmark::new(0.7, 0.5);
        }
        let frame = LandmarkFrame::new(0, 0.0, 0.0, landmarks);

        let angles = compute_angles(&frame).unwrap();
        assert!((angles.knee - 180.0).abs() < 1e-9);
        assert!((angles.hip - 180.0).abs() < 1e-9);
        // Hip straight below the shoulder, vertical reference straight above
        assert!((angles.torso - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_histogram_ignores_unknown() {
        let mut histogram = PostureHistogram::new();
        histogram.record(PostureLabel::Running);
        histogram.record(PostureLabel::Running);
        histogram.record(PostureLabel::Crouching);
        histogram.record(PostureLabel::Unknown);

        assert_eq!(histogram.total(), 3);
        assert_eq!(
            histogram.percentages(),
            PosturePercentages {
                running: 67,
                standing: 0,
                crouching: 33,
            }
        );
    }

    #[test]
    fn test_empty_histogram_percentages() {
        assert_eq!(PostureHistogram::new().percentages(), PosturePercentages::default());
    }
}
