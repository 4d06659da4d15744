/// Landmark Ingest
///
/// Keeps a bounded, drop-oldest history of landmark frames for windowed
/// movement analysis. Ingest never rejects a frame; that is the tracker's job.

use std::collections::VecDeque;

use crate::models::{LandmarkFrame, PoseLandmark};

/// Default number of frames retained
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Ring buffer of recent landmark frames
#[derive(Debug, Clone)]
pub struct LandmarkHistory {
    frames: VecDeque<LandmarkFrame>,
    capacity: usize,
}

impl LandmarkHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame, dropping the oldest entries beyond capacity
    pub fn push(&mut self, frame: &LandmarkFrame) {
        self.frames.push_back(frame.clone());
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&LandmarkFrame> {
        self.frames.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LandmarkFrame> {
        self.frames.iter()
    }

    /// Count significant foot movements across consecutive frames.
    ///
    /// Each (frame pair, ankle) whose x or y changes by more than `threshold`
    /// counts once. Pairs where an ankle is missing in either frame are skipped.
    pub fn count_foot_movements(&self, threshold: f64) -> usize {
        const FEET: [PoseLandmark; 2] = [PoseLandmark::LeftAnkle, PoseLandmark::RightAnkle];

        self.frames
            .iter()
            .zip(self.frames.iter().skip(1))
            .map(|(prev, curr)| {
                FEET.iter()
                    .filter(|foot| match (prev.get(**foot), curr.get(**foot)) {
                        (Some(p), Some(c)) => {
                            (c.x - p.x).abs() > threshold || (c.y - p.y).abs() > threshold
                        }
                        _ => {
                            tracing::debug!(
                                "Skipping {} between frames {} and {}: missing landmark",
                                foot.name(),
                                prev.frame_number,
                                curr.frame_number
                            );
                            false
                        }
                    })
                    .count()
            })
            .sum()
    }
}

impl Default for LandmarkHistory {
    fn default() -> Self {
        Self::new()
    }
}
