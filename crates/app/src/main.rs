use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use curve_ribbon_core::{AppConfig, EmissionMode, FrameLoop, ParameterUpdate};
use tracing_subscriber::EnvFilter;

fn main() -> curve_ribbon_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            preset,
            frames,
            set,
            continuous,
        } => run(preset.as_deref(), frames, &set, continuous),
        Commands::Export { output, preset } => export(&output, preset.as_deref()),
    }
}

fn load_config(preset: Option<&Path>) -> curve_ribbon_core::Result<AppConfig> {
    match preset {
        Some(path) => {
            tracing::info!(?path, "loading preset");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn run(
    preset: Option<&Path>,
    frames: u32,
    set: &[ParameterUpdate],
    continuous: bool,
) -> curve_ribbon_core::Result<()> {
    let mut config = load_config(preset)?;
    if continuous {
        config.emission = EmissionMode::ContinuousWithBreaks;
    }
    tracing::info!(
        samples = config.sample_count,
        emission = ?config.emission,
        frames,
        "starting headless render loop"
    );

    let mut frame_loop = FrameLoop::new(&config)?;
    let editor = frame_loop.parameters();

    for frame in 0..frames {
        // Scripted edits land after the first frame, like a panel change.
        if frame == 1 && !set.is_empty() {
            editor.apply(set)?;
        }

        let report = frame_loop.run_frame()?;
        if let Some(err) = &report.error {
            tracing::warn!(frame = report.frame, %err, "frame drawn with previous buffers");
        }
        if report.recomputed {
            tracing::info!(
                frame = report.frame,
                vertices = report.stats.vertices,
                segments = report.stats.segments,
                uploads = report.stats.uploads,
                "buffers updated"
            );
        }
    }

    Ok(())
}

fn export(output: &Path, preset: Option<&Path>) -> curve_ribbon_core::Result<()> {
    let config = load_config(preset)?;
    let frame_loop = FrameLoop::new(&config)?;
    let snapshot = frame_loop.export()?;

    std::fs::write(output, snapshot.to_json()?)?;
    tracing::info!(?output, "exported configuration snapshot");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Parametric ribbon tube generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the frame loop headlessly and report buffer updates.
    Run {
        /// JSON override merged over the default configuration.
        #[arg(short, long)]
        preset: Option<PathBuf>,
        /// Number of frames to run.
        #[arg(short, long, default_value_t = 3)]
        frames: u32,
        /// Parameter edit applied after the first frame, e.g. `size=0.4`.
        #[arg(short, long = "set")]
        set: Vec<ParameterUpdate>,
        /// Emit one polyline with gap vertices instead of discrete edges.
        #[arg(long)]
        continuous: bool,
    },
    /// Write the current parameters and camera pose as a replayable snapshot.
    Export {
        /// Destination of the JSON snapshot.
        #[arg(short, long)]
        output: PathBuf,
        /// JSON override merged over the default configuration.
        #[arg(short, long)]
        preset: Option<PathBuf>,
    },
}
