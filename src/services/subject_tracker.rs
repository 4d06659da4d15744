/// Subject Lock Tracker
///
/// The first detected person becomes the athlete. Every later frame must
/// overlap the previously accepted bounding box by at least the threshold,
/// measured against the stored box's own area. The lock follows the subject:
/// on accept the stored box is replaced by the candidate. There is no
/// re-acquisition after a loss; frames are rejected until one overlaps again.

use tracing::{debug, info, warn};

use crate::error::FrameRejection;
use crate::models::{BoundingBox, LandmarkFrame};

/// Default minimum overlap ratio
pub const OVERLAP_THRESHOLD: f64 = 0.5;

/// Tracker state for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackState {
    pub locked: bool,
    pub bounding_box: Option<BoundingBox>,
}

/// Outcome of evaluating one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackDecision {
    /// First detection; the subject is now locked
    Locked { bounding_box: BoundingBox },
    /// Frame overlaps the locked subject
    Accepted {
        bounding_box: BoundingBox,
        overlap_ratio: f64,
    },
    /// Frame does not belong to the locked subject
    Rejected(FrameRejection),
}

impl TrackDecision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, TrackDecision::Rejected(_))
    }
}

#[derive(Debug, Clone)]
pub struct SubjectLockTracker {
    state: TrackState,
    overlap_threshold: f64,
}

impl SubjectLockTracker {
    pub fn new() -> Self {
        Self::with_threshold(OVERLAP_THRESHOLD)
    }

    pub fn with_threshold(overlap_threshold: f64) -> Self {
        Self {
            state: TrackState::default(),
            overlap_threshold,
        }
    }

    pub fn state(&self) -> &TrackState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked
    }

    /// Accept or reject a frame against the current lock
    pub fn evaluate(&mut self, frame: &LandmarkFrame) -> TrackDecision {
        let Some(candidate) = frame.bounding_box() else {
            debug!("Frame {} has no landmarks to track", frame.frame_number);
            return TrackDecision::Rejected(FrameRejection::NoLandmarks);
        };

        let stored = match self.state.bounding_box {
            Some(stored) if self.state.locked => stored,
            _ => {
                self.state = TrackState {
                    locked: true,
                    bounding_box: Some(candidate),
                };
                info!("Locked onto athlete at frame {}", frame.frame_number);
                return TrackDecision::Locked {
                    bounding_box: candidate,
                };
            }
        };

        let overlap_ratio = stored.overlap_ratio(&candidate);
        if overlap_ratio >= self.overlap_threshold {
            self.state.bounding_box = Some(candidate);
            TrackDecision::Accepted {
                bounding_box: candidate,
                overlap_ratio,
            }
        } else {
            warn!(
                "Lost track of the athlete at frame {} (overlap {:.3}), ignoring this frame",
                frame.frame_number, overlap_ratio
            );
            TrackDecision::Rejected(FrameRejection::TrackingLost { overlap_ratio })
        }
    }
}

impl Default for SubjectLockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Landmark;

    /// A frame whose landmarks span exactly the given box
    fn box_frame(n: u32, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> LandmarkFrame {
        LandmarkFrame::new(
            n,
            n as f64 * 100.0,
            0.0,
            vec![Landmark::new(min_x, min_y), Landmark::new(max_x, max_y)],
        )
    }

    #[test]
    fn test_first_frame_locks() {
        let mut tracker = SubjectLockTracker::new();
        assert!(!tracker.is_locked());

        let decision = tracker.evaluate(&box_frame(0, 0.0, 0.5, 0.0, 1.0));
        assert!(matches!(decision, TrackDecision::Locked { .. }));
        assert!(tracker.is_locked());
        assert_eq!(
            tracker.state().bounding_box,
            Some(BoundingBox::new(0.0, 0.5, 0.0, 1.0))
        );
    }

    #[test]
    fn test_exact_threshold_is_accepted() {
        let mut tracker = SubjectLockTracker::new();
        tracker.evaluate(&box_frame(0, 0.0, 0.5, 0.0, 1.0));

        // Intersection 0.25 over stored area 0.5
        let decision = tracker.evaluate(&box_frame(1, 0.25, 0.75, 0.0, 1.0));
        match decision {
            TrackDecision::Accepted { overlap_ratio, .. } => assert_eq!(overlap_ratio, 0.5),
            other => panic!("expected accept, got {:?}", other),
        }
        assert_eq!(
            tracker.state().bounding_box,
            Some(BoundingBox::new(0.25, 0.75, 0.0, 1.0))
        );
    }

    #[test]
    fn test_just_below_threshold_is_rejected() {
        let mut tracker = SubjectLockTracker::new();
        tracker.evaluate(&box_frame(0, 0.0, 0.5, 0.0, 1.0));

        let decision = tracker.evaluate(&box_frame(1, 0.2505, 0.7505, 0.0, 1.0));
        assert!(matches!(
            decision,
            TrackDecision::Rejected(FrameRejection::TrackingLost { overlap_ratio }) if overlap_ratio < 0.5
        ));
        assert_eq!(
            tracker.state().bounding_box,
            Some(BoundingBox::new(0.0, 0.5, 0.0, 1.0))
        );
    }

    #[test]
    fn test_tracking_is_sequential() {
        let mut tracker = SubjectLockTracker::new();
        tracker.evaluate(&box_frame(0, 0.0, 0.4, 0.0, 1.0));
        // Each step keeps 75% overlap with the previous box
        assert!(tracker.evaluate(&box_frame(1, 0.1, 0.5, 0.0, 1.0)).is_accepted());
        assert!(tracker.evaluate(&box_frame(2, 0.2, 0.6, 0.0, 1.0)).is_accepted());
        assert!(tracker.evaluate(&box_frame(3, 0.3, 0.7, 0.0, 1.0)).is_accepted());
        // Zero overlap with the original box, but 75% with the previous one
        assert!(tracker.evaluate(&box_frame(4, 0.4, 0.8, 0.0, 1.0)).is_accepted());
    }

    #[test]
    fn test_no_relock_after_loss() {
        let mut tracker = SubjectLockTracker::new();
        tracker.evaluate(&box_frame(0, 0.0, 0.2, 0.0, 0.2));
        for n in 1..5 {
            let decision = tracker.evaluate(&box_frame(n, 0.6, 0.8, 0.6, 0.8));
            assert!(!decision.is_accepted());
        }
        assert!(tracker.is_locked());
        // Returning to the original place resumes tracking
        assert!(tracker.evaluate(&box_frame(5, 0.0, 0.2, 0.0, 0.2)).is_accepted());
    }

    #[test]
    fn test_empty_frame_rejected_without_locking() {
        let mut tracker = SubjectLockTracker::new();
        let decision = tracker.evaluate(&LandmarkFrame::new(0, 0.0, 0.0, vec![]));
        assert_eq!(decision, TrackDecision::Rejected(FrameRejection::NoLandmarks));
        assert!(!tracker.is_locked());
    }
}
