use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A decoded video frame waiting for pose estimation
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub frame_number: u32,
    /// Wall-clock time the frame was captured for processing, in milliseconds
    pub timestamp_ms: f64,
    /// Video playback position in seconds
    pub video_time_secs: f64,
    /// Encoded image handed to the pose estimator
    pub image: Bytes,
}

impl VideoFrame {
    pub fn new(frame_number: u32, timestamp_ms: f64, video_time_secs: f64, image: Bytes) -> Self {
        Self {
            frame_number,
            timestamp_ms,
            video_time_secs,
            image,
        }
    }
}

/// The selected video, as sent to the height estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    /// File name reported to remote services
    pub name: String,
    #[serde(skip)]
    pub data: Bytes,
}

impl VideoSource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}
