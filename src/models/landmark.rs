/// Landmark models and data structures
///
/// This module provides the normalized landmark representation produced by the
/// external pose estimator, the 33-point body topology used to address it, and
/// the bounding box derived from a frame's point extents.

use serde::{Deserialize, Serialize};

/// A single body landmark in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate (normalized 0-1, relative to frame width)
    pub x: f64,
    /// Y coordinate (normalized 0-1, relative to frame height; grows downward)
    pub y: f64,
    /// Visibility / confidence reported by the estimator, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    /// Create a new landmark without a visibility score
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    /// Create a new landmark with a visibility score
    pub fn with_visibility(x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Calculate Euclidean distance to another landmark
    pub fn distance_to(&self, other: &Landmark) -> f64 {
        self.point().distance_to(&other.point())
    }

    /// Check if both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A plain 2-D point in normalized units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// MediaPipe pose landmark indices (33-point topology)
///
/// The numbering must match the estimator's output exactly; the core only
/// addresses landmarks through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

/// Number of landmarks in a full pose
pub const POSE_LANDMARK_COUNT: usize = 33;

impl PoseLandmark {
    /// Index used for calibration's head reference point.
    ///
    /// Index 1 is the landmark the height calibration has always measured
    /// from; keep it even though MediaPipe labels it the inner eye corner.
    pub const CALIBRATION_EYE: PoseLandmark = PoseLandmark::LeftEyeInner;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Get landmark name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }

    /// Landmarks every core stage reads at least once
    pub fn core() -> [Self; 12] {
        [
            Self::LeftEyeInner,
            Self::LeftEyeOuter,
            Self::RightEyeOuter,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
            Self::Nose,
        ]
    }
}

/// One processed video frame worth of landmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Frame number in sequence
    pub frame_number: u32,
    /// Wall-clock time the frame was processed, in milliseconds
    pub timestamp_ms: f64,
    /// Video playback position in seconds
    pub video_time_secs: f64,
    /// Landmarks in `PoseLandmark` order
    pub landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Create a new landmark frame
    pub fn new(
        frame_number: u32,
        timestamp_ms: f64,
        video_time_secs: f64,
        landmarks: Vec<Landmark>,
    ) -> Self {
        Self {
            frame_number,
            timestamp_ms,
            video_time_secs,
            landmarks,
        }
    }

    /// Get a landmark by topology index; `None` when missing or non-finite
    pub fn get(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        self.landmarks
            .get(landmark.index())
            .filter(|lm| lm.is_finite())
    }

    /// Midpoint of two landmarks when both are present
    pub fn midpoint(&self, a: PoseLandmark, b: PoseLandmark) -> Option<Point> {
        Some(self.get(a)?.point().midpoint(&self.get(b)?.point()))
    }

    pub fn hip_midpoint(&self) -> Option<Point> {
        self.midpoint(PoseLandmark::LeftHip, PoseLandmark::RightHip)
    }

    pub fn ankle_midpoint(&self) -> Option<Point> {
        self.midpoint(PoseLandmark::LeftAnkle, PoseLandmark::RightAnkle)
    }

    /// Check whether every landmark the core reads is present
    pub fn is_complete(&self) -> bool {
        PoseLandmark::core().iter().all(|lm| self.get(*lm).is_some())
    }

    /// Bounding box enclosing all finite landmarks
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_landmarks(&self.landmarks)
    }
}

/// Axis-aligned rectangle enclosing a detected person
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Compute the extents of a landmark set; `None` when there is no finite point
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        let mut points = landmarks.iter().filter(|lm| lm.is_finite());
        let first = points.next()?;
        let init = Self::new(first.x, first.x, first.y, first.y);

        Some(points.fold(init, |bbox, lm| Self {
            min_x: bbox.min_x.min(lm.x),
            max_x: bbox.max_x.max(lm.x),
            min_y: bbox.min_y.min(lm.y),
            max_y: bbox.max_y.max(lm.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Area of the intersection with another box (0 when disjoint)
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let overlap_x = (self.max_x.min(other.max_x) - self.min_x.max(other.min_x)).max(0.0);
        let overlap_y = (self.max_y.min(other.max_y) - self.min_y.max(other.min_y)).max(0.0);
        overlap_x * overlap_y
    }

    /// Intersection area normalized by this box's own area.
    ///
    /// Unlike IoU, the candidate's size does not enter the denominator. A
    /// degenerate reference box yields 0.
    pub fn overlap_ratio(&self, candidate: &BoundingBox) -> f64 {
        let area = self.area();
        if area > 0.0 {
            self.intersection_area(candidate) / area
        } else {
            0.0
        }
    }
}
