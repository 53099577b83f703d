//! `msftrack` CLI: run the highway scenario through the tracker and log CSVs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sim::{HighwayScenario, SensorSimConfig, SensorSimulator};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracker_core::metrics::TrackingMetrics;
use tracker_core::{Detection, Tracker, TrackerConfig};

/// Gate used by the demo run; a little looser than χ²(0.99, 2).
const DEMO_GATE: f64 = 16.0;
const DEMO_RADAR_ANGLE_STD: f64 = 0.02;

#[derive(Parser)]
#[command(name = "msftrack", about = "Multi-sensor fusion tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the highway scenario and write ground truth, detections and tracks as CSV.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Number of simulated objects
    #[arg(long, default_value_t = 5)]
    objects: usize,
    /// Number of simulation steps
    #[arg(long, default_value_t = 300)]
    steps: usize,
    /// Time step (s)
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Tracker configuration (JSON, missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for the CSV logs
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Output the metrics summary to a JSON file
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Max track-to-truth distance (m) counted as a match in metrics
    #[arg(long, default_value_t = 5.0)]
    match_distance: f64,
}

#[derive(Serialize)]
struct GroundTruthRow {
    time: f64,
    obj_id: u64,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

#[derive(Serialize)]
struct DetectionRow {
    time: f64,
    sensor: String,
    x: f64,
    y: f64,
    z2: f64,
}

#[derive(Serialize)]
struct TrackRow {
    time: f64,
    track_id: u64,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    confirmed: u8,
    missed: u32,
}

#[derive(Serialize)]
struct RunSummary {
    objects: usize,
    steps: usize,
    dt: f64,
    seed: u64,
    elapsed_s: f64,
    detections: usize,
    births: usize,
    deletions: usize,
    final_tracks: usize,
    confirmed_tracks: usize,
    rmse_position: f64,
    rmse_velocity: f64,
    precision: f64,
    recall: f64,
    id_switches: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(&args)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TrackerConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading tracker config {}", p.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing tracker config {}", p.display()))
        }
        None => {
            let mut config = TrackerConfig::default();
            config.max_association_maha_dist = DEMO_GATE;
            config.sensors.radar_angle_noise_std = DEMO_RADAR_ANGLE_STD;
            Ok(config)
        }
    }
}

fn detection_row(time: f64, d: &Detection) -> DetectionRow {
    let at = |i: usize| d.z.get(i).copied().unwrap_or(0.0);
    DetectionRow {
        time,
        sensor: d.sensor.to_string(),
        x: at(0),
        y: at(1),
        z2: at(2),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    info!(?config, "tracker configuration");

    let mut scenario = HighwayScenario::new(args.objects, args.dt, args.seed);
    let mut sensor_sim = SensorSimulator::new(SensorSimConfig::default(), args.seed);
    let mut tracker = Tracker::new(config);
    let mut metrics = TrackingMetrics::default();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let mut gt_csv = csv::Writer::from_path(args.out_dir.join("ground_truth.csv"))?;
    let mut det_csv = csv::Writer::from_path(args.out_dir.join("detections.csv"))?;
    let mut track_csv = csv::Writer::from_path(args.out_dir.join("tracks.csv"))?;

    info!(
        objects = args.objects,
        steps = args.steps,
        dt = args.dt,
        seed = args.seed,
        "running simulation"
    );

    let start = std::time::Instant::now();
    let mut n_detections = 0usize;
    let mut births = 0usize;
    let mut deletions = 0usize;

    for step in 0..args.steps {
        scenario.step();
        let t = scenario.time();

        for obj in scenario.objects() {
            gt_csv.serialize(GroundTruthRow {
                time: t,
                obj_id: obj.id,
                x: obj.x,
                y: obj.y,
                vx: obj.vx,
                vy: obj.vy,
            })?;
        }

        let detections = sensor_sim.generate(scenario.objects(), t);
        for d in &detections {
            det_csv.serialize(detection_row(t, d))?;
        }
        n_detections += detections.len();

        let report = tracker
            .step(t, &detections)
            .with_context(|| format!("tracker update at step {step}"))?;
        births += report.births;
        deletions += report.deletions;
        debug!(
            step,
            time = t,
            detections = detections.len(),
            matched = report.matches.len(),
            tracks = tracker.tracks().len(),
            "step"
        );

        for tr in tracker.tracks() {
            let (x, y) = tr.position_2d();
            let (vx, vy) = tr.velocity_2d();
            track_csv.serialize(TrackRow {
                time: t,
                track_id: tr.id.0,
                x,
                y,
                vx,
                vy,
                confirmed: u8::from(tr.confirmed),
                missed: tr.missed,
            })?;
        }
        metrics.evaluate_frame(
            &tracker.snapshot(),
            &scenario.ground_truth(),
            args.match_distance,
        );
    }

    gt_csv.flush()?;
    det_csv.flush()?;
    track_csv.flush()?;

    let elapsed = start.elapsed();
    let summary = RunSummary {
        objects: args.objects,
        steps: args.steps,
        dt: args.dt,
        seed: args.seed,
        elapsed_s: elapsed.as_secs_f64(),
        detections: n_detections,
        births,
        deletions,
        final_tracks: tracker.tracks().len(),
        confirmed_tracks: tracker.tracks().iter().filter(|t| t.confirmed).count(),
        rmse_position: metrics.rmse_position(),
        rmse_velocity: metrics.rmse_velocity(),
        precision: metrics.precision(),
        recall: metrics.recall(),
        id_switches: metrics.id_switches,
    };
    info!(elapsed_s = summary.elapsed_s, "simulation finished");

    let json = serde_json::to_string_pretty(&summary)?;
    println!("{json}");
    println!(
        "Generated files: ground_truth.csv, tracks.csv, detections.csv in {}",
        args.out_dir.display()
    );

    if let Some(path) = &args.summary {
        std::fs::write(path, json)?;
        println!("Metrics saved to {}", path.display());
    }

    Ok(())
}
