// src/main.rs
use clap::Parser;
use simple_sim::export::save_json;
use simple_sim::render::legend;
use simple_sim::{CameraParameters, CsvRenderer, SimulationConfig, SimulationRun, Theme};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "simple_sim_main")]
#[command(about = "Simulate a UAV camera pursuing a ground target")]
struct Args {
    /// JSON configuration file (defaults are used for missing fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of time steps
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Camera angle from the horizontal axis in degrees (0, 90]
    #[arg(long)]
    angle: Option<f64>,

    /// Radius of the ground field of view
    #[arg(long)]
    radius: Option<f64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Color theme
    #[arg(long, value_enum, default_value = "light")]
    theme: Theme,

    /// Write the run data as JSON to this path
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    // 日志写到 stderr，stdout 留给 CSV
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("simple_sim=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config: SimulationConfig = match &args.config {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => SimulationConfig::default(),
    };
    if let Some(steps) = args.steps {
        config.step_count = steps;
    }
    if args.angle.is_some() || args.radius.is_some() {
        config.camera = CameraParameters::new(
            args.angle.unwrap_or(config.camera.angle_degrees()),
            args.radius.unwrap_or(config.camera.fov_radius()),
        )?;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let mut run = SimulationRun::new(config);
    let data = run.run()?;
    info!(
        "Run complete: {} steps, target in view for {} steps",
        data.step_count(),
        data.hit_count()
    );

    for entry in legend(args.theme) {
        info!("Legend: {} ({})", entry.label, entry.color);
    }

    if let Some(path) = &args.export {
        save_json(data, path)?;
    }

    run.render(&mut CsvRenderer::new(io::stdout().lock()))?;
    Ok(())
}
