//! Offline IPD estimation over a recorded landmark session.

use anyhow::Result;
use clap::Parser;
use ipd_estimation::config::Config;
use ipd_estimation::detector::ReplaySource;
use ipd_estimation::metrics::TrackingStatus;
use ipd_estimation::persistence::{CalibrationStore, StoredCalibration, YamlCalibrationStore};
use ipd_estimation::session::IpdSession;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded landmark session to process (JSON)
    #[arg(short, long)]
    replay: String,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Calibration store file for loading/saving constants
    #[arg(short, long)]
    store: Option<String>,

    /// Run a calibration procedure before estimating (focal, iris, full)
    #[arg(long)]
    calibrate: Option<String>,

    /// Report the reference distance instead of estimating it
    #[arg(long)]
    fixed_distance: bool,

    /// Discard stored calibration constants before running
    #[arg(long)]
    reset: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("IPD Estimation");

    // Load configuration if provided
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    // Resume persisted calibration constants when a store is given
    let store = args.store.as_ref().map(YamlCalibrationStore::new);
    let mut session = match store.as_ref().and_then(|s| s.load().transpose()) {
        Some(Ok(stored)) => {
            info!("Resuming stored calibration");
            IpdSession::with_constants(config, stored.into())?
        }
        Some(Err(e)) => {
            warn!("Failed to load calibration store: {e}. Starting uncalibrated.");
            IpdSession::new(config)?
        }
        None => IpdSession::new(config)?,
    };
    session.set_fixed_distance(args.fixed_distance);

    if args.reset {
        session.reset();
        persist(store.as_ref(), &session);
    }

    let mut source = ReplaySource::from_file(&args.replay)?;

    // Run requested calibration procedures against the start of the replay.
    // A failed procedure leaves the constants unchanged and estimation
    // continues with whatever was available before.
    if let Some(kind) = args.calibrate.as_deref() {
        if !matches!(kind, "focal" | "iris" | "full") {
            anyhow::bail!("Unknown calibration procedure: {kind}");
        }
        if matches!(kind, "focal" | "full") {
            match session.calibrate_focal_length(&mut source) {
                Ok(focal) => {
                    println!("Calibrated focal length: {focal:.1} px");
                    persist(store.as_ref(), &session);
                }
                Err(e) => warn!("Focal-length calibration failed: {e}"),
            }
        }
        if matches!(kind, "iris" | "full") {
            match session.calibrate_iris_diameter(&mut source) {
                Ok(iris_cm) => {
                    println!("Calibrated iris diameter: {iris_cm:.3} cm");
                    persist(store.as_ref(), &session);
                }
                Err(e) => warn!("Iris-size calibration failed: {e}"),
            }
        }
    }

    // Estimate over the remaining frames
    let mut frames = 0usize;
    let mut tracked = 0usize;
    while !source.is_exhausted() {
        let report = session.process_frame(&mut source)?;
        frames += 1;

        match report.status {
            TrackingStatus::NoFace => println!("frame {frames}: no face"),
            TrackingStatus::Tracking => {
                tracked += 1;
                let distance = format_cm(report.metrics.distance_cm);
                let ipd = format_cm(report.metrics.ipd_cm);
                let flag = if report.metrics.warning.is_some() { " [off-axis]" } else { "" };
                println!("frame {frames}: distance {distance}, ipd {ipd}{flag}");
            }
        }
    }

    info!("Processed {frames} frames ({tracked} with a face)");
    Ok(())
}

fn format_cm(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2} cm"),
        None => "unavailable".to_string(),
    }
}

fn persist(store: Option<&YamlCalibrationStore>, session: &IpdSession) {
    if let Some(store) = store {
        if let Err(e) = store.save(&StoredCalibration::from(session.constants())) {
            warn!("Failed to save calibration: {e}");
        }
    }
}
