//! toolpost CLI - toolchanger G-code post-processor
//!
//! Thin wrapper around the core crates: parses and validates arguments,
//! reads the input file, hands the lines to [`PostJob`], and writes the
//! result. All planning decisions live in `toolpost-planner`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use toolpost::{PauseConfig, PostJob, PreheatConfig, DEFAULT_PAUSE_CODE};

#[derive(Parser)]
#[command(name = "toolpost")]
#[command(version = toolpost::VERSION)]
#[command(about = "Toolchanger G-code post-processor for RRF/Duet machines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Write the result here instead of rewriting the input in place
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inject automatic tool preheats ahead of each tool change
    Preheat {
        /// Approximate seconds to allow for preheat
        #[arg(long, default_value_t = toolpost::DEFAULT_LEAD_TIME_SECS)]
        sec: f64,
        /// G-code file to process
        gcode: PathBuf,
    },
    /// Inject automatic pauses based on extruded mass or length
    Pause {
        /// Tool to apply pauses to; defaults to the first tool used
        #[arg(long)]
        tool: Option<i32>,
        /// Filament diameter in mm; defaults to slicer metadata or 1.75
        #[arg(long)]
        diameter: Option<f64>,
        /// Filament density in g/cm³; defaults to slicer metadata or 1.24
        #[arg(long)]
        density: Option<f64>,
        /// Pause at these masses in grams (comma-separated)
        #[arg(long)]
        mass: Option<String>,
        /// Pause at these lengths in mm (comma-separated)
        #[arg(long)]
        length: Option<String>,
        /// G-code text to inject at each pause
        #[arg(long, default_value = DEFAULT_PAUSE_CODE)]
        pausecode: String,
        /// G-code file to process
        gcode: PathBuf,
    },
    /// Repair wipe-tower retract ordering around tool changes
    WipeFix {
        /// G-code file to process
        gcode: PathBuf,
    },
}

fn main() -> Result<()> {
    toolpost::init_logging()?;
    let cli = Cli::parse();

    // Configuration is resolved and validated before the file is opened
    let (job, input) = match cli.command {
        Commands::Preheat { sec, gcode } => (
            PostJob {
                preheat: Some(PreheatConfig {
                    lead_time_secs: sec,
                }),
                ..Default::default()
            },
            gcode,
        ),
        Commands::Pause {
            tool,
            diameter,
            density,
            mass,
            length,
            pausecode,
            gcode,
        } => {
            let mode = toolpost::resolve_threshold_mode(length.as_deref(), mass.as_deref())?;
            let mut config = PauseConfig::new(mode);
            config.tool = tool;
            config.diameter_mm = diameter;
            config.density_g_cm3 = density;
            config.pause_code = pausecode;
            (
                PostJob {
                    pause: Some(config),
                    ..Default::default()
                },
                gcode,
            )
        }
        Commands::WipeFix { gcode } => (
            PostJob {
                wipe_fix: true,
                ..Default::default()
            },
            gcode,
        ),
    };
    job.validate()?;

    let lines = toolpost::read_lines(&input)?;
    let edited = job.run(&lines)?;

    let target = cli.output.as_deref().unwrap_or(&input);
    toolpost::write_lines(target, &edited)?;
    tracing::info!(
        file = %target.display(),
        lines_in = lines.len(),
        lines_out = edited.len(),
        "done"
    );

    Ok(())
}
