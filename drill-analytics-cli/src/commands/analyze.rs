use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{ArgGroup, Args};
use console::Term;
use drill_analytics::models::{PerSecondRecord, VideoSource};
use drill_analytics::services::{FrameSequencer, SessionEvent};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::api::{HeightSource, HttpHeightEstimator};
use crate::config::Config;
use crate::replay::Recording;
use crate::report;

/// Frames buffered between the replay task and the analysis loop
const EVENT_BUFFER: usize = 16;

#[derive(Args)]
#[command(group(ArgGroup::new("height_source").required(true).args(["height", "video"])))]
pub struct AnalyzeCommand {
    /// Recorded landmark stream (JSON Lines)
    #[arg(short, long)]
    landmarks: PathBuf,

    /// Athlete height in meters
    #[arg(long)]
    height: Option<f64>,

    /// Video to send to the height estimation service
    #[arg(long)]
    video: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl AnalyzeCommand {
    pub async fn execute(self, config: &Config) -> Result<()> {
        let analysis = config.analysis_config()?;
        let recording = Recording::load(&self.landmarks)?;

        let source = match &self.video {
            Some(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read video {}", path.display()))?;
                VideoSource::new(file_name(path), data)
            }
            None => VideoSource::new(file_name(&self.landmarks), Bytes::new()),
        };

        let heights = match self.height {
            Some(height) => HeightSource::Fixed(height),
            None => HeightSource::Remote(HttpHeightEstimator::new(&config.api)?),
        };

        if !config.display.color || !Term::stdout().features().colors_supported() {
            colored::control::set_override(false);
        }

        let progress = if self.json || self.no_progress {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(recording.frame_count() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} frames")?
                    .progress_chars("=> "),
            );
            bar
        };

        tracing::info!(
            "Analyzing {} frames from {}",
            recording.frame_count(),
            self.landmarks.display()
        );

        let mut sequencer = FrameSequencer::new(analysis, recording.pose_estimator(), heights);
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let events = recording.events();
        let replay_progress = progress.clone();
        let replay = tokio::spawn(async move {
            for event in events {
                let is_frame = matches!(event, SessionEvent::Frame(_));
                if tx.send(event).await.is_err() {
                    break;
                }
                if is_frame {
                    replay_progress.inc(1);
                }
            }
        });

        let mut records: Vec<PerSecondRecord> = Vec::new();
        let result = sequencer.run(source, rx, &mut records).await;
        replay.await.context("Replay task failed")?;
        progress.finish_and_clear();

        let summary = result.context("Analysis failed")?;

        if self.json {
            report::print_json(&records, &summary)?;
        } else {
            report::print_records(&records, config.display.units);
            report::print_summary(&summary, config.display.units);
        }

        Ok(())
    }
}
