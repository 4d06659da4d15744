use anyhow::Result;
use colored::Colorize;
use drill_analytics::models::{PerSecondRecord, SessionSummary};
use serde::Serialize;

use crate::config::DistanceUnit;

/// Everything `analyze --json` prints
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub records: &'a [PerSecondRecord],
    pub summary: &'a SessionSummary,
}

pub fn print_json(records: &[PerSecondRecord], summary: &SessionSummary) -> Result<()> {
    let report = AnalysisReport { records, summary };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

pub fn print_records(records: &[PerSecondRecord], units: DistanceUnit) {
    println!("{}", "Per-second metrics".bold());
    println!("────────────────────────────────────────────────────────────────────────");
    println!(
        "{:>4}  {:>6}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {:>9}  {:>5}  {:>5}",
        "sec", "head°", "speed", "accel", "decel", "stride", "jump", "distance", "steps", "score"
    );

    for record in records {
        let score = record.athletic_score.map(|score| score.mean());
        println!(
            "{:>4}  {:>6}  {:>7.2}  {:>7.2}  {:>7.2}  {:>7.3}  {:>7.3}  {:>6.2} {:<2}  {:>5}  {:>5}",
            record.second,
            format_optional(record.head_angle, 0),
            record.speed,
            record.acceleration,
            record.deceleration,
            record.stride_length,
            record.jump_height,
            units.convert(record.total_distance_meters),
            units.suffix(),
            record.step_count,
            format_optional(score, 0),
        );
    }
    println!();
}

pub fn print_summary(summary: &SessionSummary, units: DistanceUnit) {
    println!("{}", "Session summary".bold());
    println!("────────────────────────────────");
    println!("Session:              {}", summary.session_id.to_string().dimmed());
    println!(
        "Frames:               {} processed, {} rejected",
        summary.frames_processed, summary.frames_rejected
    );
    println!(
        "Ideal head angle:     {}",
        format!("{}%", summary.ideal_head_percentage).cyan()
    );
    println!(
        "Athletic score:       {}",
        format!("{:.0}%", summary.average_athletic_score).green().bold()
    );
    println!(
        "Total distance:       {:.2} {}",
        units.convert(summary.total_distance_meters),
        units.suffix()
    );
    println!("Top speed:            {:.2}", summary.top_speed);
    println!("Avg jump height:      {:.3}", summary.average_jump_height);
    println!("Avg stride length:    {:.3}", summary.average_stride_length);
    println!("Peak acceleration:    {:.2}", summary.peak_acceleration);
    println!("Peak deceleration:    {:.2}", summary.peak_deceleration);
    println!("Steps:                {}", summary.step_count);

    let posture = summary.posture_percentages;
    println!(
        "Posture:              {}% running, {}% standing, {}% crouching",
        posture.running, posture.standing, posture.crouching
    );

    match summary.drill_time_secs {
        Some(secs) => println!("Drill time:           {:.2} SECS", secs),
        None => println!("Drill time:           {}", "not completed".yellow()),
    }
    for (index, reaction) in summary.reaction_times_secs.iter().enumerate() {
        println!("Reaction time #{}:     {:.3} SECS", index + 1, reaction);
    }
}
