/// Frame Sequencer
///
/// Single consumer of the session's event channel. Height estimation is
/// awaited before the first frame is taken off the channel, and each frame
/// is fully processed before the next event is received, so the bounded
/// channel provides back-pressure to the producer.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Landmark, LandmarkFrame, PerSecondRecord, SessionSummary, VideoFrame, VideoSource};
use crate::services::analysis_session::{AnalysisSession, FrameOutcome};

/// Produces landmarks for a video frame; `Ok(None)` when no person is found
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    async fn estimate(&self, frame: &VideoFrame) -> anyhow::Result<Option<Vec<Landmark>>>;
}

/// Estimates the athlete's real height in meters from the whole video
#[async_trait]
pub trait HeightEstimator: Send + Sync {
    async fn estimate_height(&self, source: &VideoSource) -> anyhow::Result<f64>;
}

/// Receives one record per advanced video second
pub trait MetricSink: Send {
    fn publish(&mut self, record: &PerSecondRecord);
}

impl MetricSink for Vec<PerSecondRecord> {
    fn publish(&mut self, record: &PerSecondRecord) {
        self.push(record.clone());
    }
}

impl MetricSink for mpsc::UnboundedSender<PerSecondRecord> {
    fn publish(&mut self, record: &PerSecondRecord) {
        if self.send(record.clone()).is_err() {
            debug!("Metric receiver dropped, record for second {} discarded", record.second);
        }
    }
}

/// Inputs to the sequencer, in arrival order
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Frame(VideoFrame),
    DrillCue { timestamp_ms: f64 },
    DrillEnd { timestamp_ms: f64 },
    VideoSelected(VideoSource),
}

pub struct FrameSequencer<P, H> {
    pose_estimator: P,
    height_estimator: H,
    session: AnalysisSession,
}

impl<P, H> FrameSequencer<P, H>
where
    P: PoseEstimator,
    H: HeightEstimator,
{
    pub fn new(config: AnalysisConfig, pose_estimator: P, height_estimator: H) -> Self {
        Self {
            pose_estimator,
            height_estimator,
            session: AnalysisSession::new(config),
        }
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Analyze a video until the event channel closes
    #[instrument(skip_all, fields(video = %source.name))]
    pub async fn run<S>(
        &mut self,
        source: VideoSource,
        mut events: mpsc::Receiver<SessionEvent>,
        sink: &mut S,
    ) -> AnalysisResult<SessionSummary>
    where
        S: MetricSink,
    {
        self.start(&source).await?;

        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Frame(frame) => match self.process_frame(&frame).await {
                    Ok(Some(FrameOutcome::Accepted {
                        tick,
                        drill_started,
                    })) => {
                        if let Some(started) = drill_started {
                            match started.reaction_time_ms {
                                Some(reaction) => info!("Reaction time: {:.0} ms", reaction),
                                None => debug!("Drill started without a cue"),
                            }
                        }
                        if let Some(record) = tick {
                            sink.publish(&record);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping frame {}: {:#}", frame.frame_number, e),
                },
                SessionEvent::DrillCue { timestamp_ms } => self.session.on_drill_cue(timestamp_ms),
                SessionEvent::DrillEnd { timestamp_ms } => {
                    if let Err(e) = self.session.on_drill_end(timestamp_ms) {
                        warn!("Ignoring drill end at {:.0} ms: {}", timestamp_ms, e);
                    }
                }
                SessionEvent::VideoSelected(next) => {
                    info!("New video selected: {}", next.name);
                    self.start(&next).await?;
                }
            }
        }

        let summary = self.session.summary();
        info!(
            "Session {} finished: {} frames processed, {} rejected",
            summary.session_id, summary.frames_processed, summary.frames_rejected
        );
        Ok(summary)
    }

    /// Reset the session and calibrate it for `source`
    pub async fn start(&mut self, source: &VideoSource) -> AnalysisResult<()> {
        self.session.on_video_selected();

        let height = self
            .height_estimator
            .estimate_height(source)
            .await
            .map_err(|e| {
                error!("Height estimation failed for {}: {:#}", source.name, e);
                AnalysisError::Calibration(format!("{:#}", e))
            })?;

        if !height.is_finite() || height <= 0.0 {
            error!("Height estimator returned {} m for {}", height, source.name);
            return Err(AnalysisError::Calibration(format!(
                "estimated height must be positive, got {}",
                height
            )));
        }

        self.session.calibrate(height)
    }

    /// Estimate landmarks for one frame and run it through the session.
    ///
    /// Returns `Ok(None)` when the estimator found nobody in the frame.
    pub async fn process_frame(&mut self, frame: &VideoFrame) -> AnalysisResult<Option<FrameOutcome>> {
        let landmarks = self
            .pose_estimator
            .estimate(frame)
            .await
            .map_err(AnalysisError::Estimator)?;

        let Some(landmarks) = landmarks else {
            debug!("No landmarks detected in frame {}", frame.frame_number);
            return Ok(None);
        };

        let landmark_frame = LandmarkFrame::new(
            frame.frame_number,
            frame.timestamp_ms,
            frame.video_time_secs,
            landmarks,
        );
        let outcome = self.session.process_frame(&landmark_frame);
        if let FrameOutcome::Rejected { reason } = &outcome {
            debug!("Frame {} rejected: {}", frame.frame_number, reason);
        }
        Ok(Some(outcome))
    }
}
