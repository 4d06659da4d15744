//! Recorded landmark streams.
//!
//! A recording is JSON Lines: one landmark frame per line, optionally
//! interleaved with drill control lines such as
//! `{"event":"cue","timestamp_ms":1200.0}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use drill_analytics::models::{Landmark, LandmarkFrame, VideoFrame};
use drill_analytics::services::{PoseEstimator, SessionEvent};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ControlLine {
    Cue { timestamp_ms: f64 },
    End { timestamp_ms: f64 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Control(ControlLine),
    Frame(LandmarkFrame),
}

#[derive(Debug, Clone)]
pub enum ReplayItem {
    Frame(LandmarkFrame),
    Control(ControlLine),
}

#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub items: Vec<ReplayItem>,
}

impl Recording {
    pub fn parse(contents: &str) -> Result<Self> {
        let items = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let parsed: ReplayLine = serde_json::from_str(line)
                    .with_context(|| format!("Invalid recording line {}", index + 1))?;
                Ok(match parsed {
                    ReplayLine::Control(control) => ReplayItem::Control(control),
                    ReplayLine::Frame(frame) => ReplayItem::Frame(frame),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { items })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        Self::parse(&contents)
    }

    pub fn frame_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, ReplayItem::Frame(_)))
            .count()
    }

    /// Estimator that answers with the recorded landmarks
    pub fn pose_estimator(&self) -> RecordedPoseEstimator {
        let landmarks = self
            .items
            .iter()
            .filter_map(|item| match item {
                ReplayItem::Frame(frame) => Some((frame.frame_number, frame.landmarks.clone())),
                ReplayItem::Control(_) => None,
            })
            .collect();
        RecordedPoseEstimator { landmarks }
    }

    /// Events in recording order; frames carry no image data
    pub fn events(&self) -> Vec<SessionEvent> {
        self.items
            .iter()
            .map(|item| match item {
                ReplayItem::Frame(frame) => SessionEvent::Frame(VideoFrame::new(
                    frame.frame_number,
                    frame.timestamp_ms,
                    frame.video_time_secs,
                    Bytes::new(),
                )),
                ReplayItem::Control(ControlLine::Cue { timestamp_ms }) => SessionEvent::DrillCue {
                    timestamp_ms: *timestamp_ms,
                },
                ReplayItem::Control(ControlLine::End { timestamp_ms }) => SessionEvent::DrillEnd {
                    timestamp_ms: *timestamp_ms,
                },
            })
            .collect()
    }
}

/// Replays landmarks keyed by frame number
#[derive(Debug, Clone, Default)]
pub struct RecordedPoseEstimator {
    landmarks: HashMap<u32, Vec<Landmark>>,
}

#[async_trait]
impl PoseEstimator for RecordedPoseEstimator {
    async fn estimate(&self, frame: &VideoFrame) -> Result<Option<Vec<Landmark>>> {
        Ok(self
            .landmarks
            .get(&frame.frame_number)
            .filter(|landmarks| !landmarks.is_empty())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORDING: &str = r#"
{"event":"cue","timestamp_ms":50.0}
{"frame_number":0,"timestamp_ms":100.0,"video_time_secs":0.0,"landmarks":[{"x":0.1,"y":0.2,"visibility":0.9}]}
{"frame_number":1,"timestamp_ms":200.0,"video_time_secs":0.1,"landmarks":[]}
{"event":"end","timestamp_ms":900.0}
"#;

    #[test]
    fn test_parse_frames_and_controls() {
        let recording = Recording::parse(RECORDING).unwrap();
        assert_eq!(recording.items.len(), 4);
        assert_eq!(recording.frame_count(), 2);
        assert!(matches!(
            recording.items[0],
            ReplayItem::Control(ControlLine::Cue { timestamp_ms }) if timestamp_ms == 50.0
        ));

        let events = recording.events();
        assert!(matches!(events[1], SessionEvent::Frame(ref frame) if frame.frame_number == 0));
        assert!(matches!(events[3], SessionEvent::DrillEnd { .. }));
    }

    #[test]
    fn test_invalid_line_reports_position() {
        let err = Recording::parse("{\"frame_number\":0}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[tokio::test]
    async fn test_recorded_estimator() {
        let estimator = Recording::parse(RECORDING).unwrap().pose_estimator();

        let found = estimator
            .estimate(&VideoFrame::new(0, 100.0, 0.0, Bytes::new()))
            .await
            .unwrap();
        assert_eq!(found.map(|l| l.len()), Some(1));

        // Empty landmark lists mean nobody was detected
        let empty = estimator
            .estimate(&VideoFrame::new(1, 200.0, 0.1, Bytes::new()))
            .await
            .unwrap();
        assert!(empty.is_none());

        let missing = estimator
            .estimate(&VideoFrame::new(7, 700.0, 0.7, Bytes::new()))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
