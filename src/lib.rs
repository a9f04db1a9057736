//! # Toolpost
//!
//! Post-processor for toolchanger G-code (RRF/Duet dialect). Reads a
//! sliced file, reconstructs elapsed time, extruded length/mass and tool
//! state from the text alone, and rewrites the stream to:
//!
//! - issue tool warmups early enough that each tool is at working
//!   temperature the instant it is selected (`preheat`)
//! - insert pause instructions when cumulative extruded length or mass
//!   crosses configured thresholds (`pause`)
//! - repair the retract/travel/unretract ordering defect some slicers
//!   emit around wipe-tower tool changes (`wipe-fix`)
//!
//! ## Architecture
//!
//! The workspace has two core crates plus this thin binary:
//!
//! 1. **toolpost-gcode** - line model, tolerant parser, motion simulation
//! 2. **toolpost-planner** - tool-change scanning, planners, edit applier
//! 3. **toolpost** - CLI, file I/O, logging setup
//!
//! Unmodified lines round-trip byte-for-byte; configuration errors are
//! detected before any line is read.

pub use toolpost_gcode::{
    parse_line, parse_program, simulate, Command, FilamentHints, Instruction, KinematicState,
    LineState, Timeline, ToolTemps,
};
pub use toolpost_planner::{
    apply_edits, plan_pauses, plan_preheats, scan_tool_changes, scan_wipe_defects, ConfigError,
    EditKind, EditRequest, PauseConfig, PostError, PostJob, PreheatConfig, Result, ThresholdMode,
    ToolChangeEvent, DEFAULT_LEAD_TIME_SECS, DEFAULT_PAUSE_CODE,
};

use std::fs;
use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Structured logging to stderr with RUST_LOG support, so log output
/// never mixes with anything a shell pipeline might capture.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

/// Read a G-code file into lines
///
/// Line terminators are normalized away; the core never sees them and the
/// writer puts plain newlines back.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Write the edited stream back out
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut text = lines.join("\n");
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Parse a comma-separated threshold list
///
/// Empty segments are tolerated (`"250,,950"`); anything non-numeric is a
/// configuration error, raised before any input is read.
pub fn parse_threshold_list(text: &str) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for token in text.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                return Err(ConfigError::UnparseableThreshold {
                    text: token.to_string(),
                }
                .into())
            }
        }
    }
    Ok(values)
}

/// Turn the CLI's `--length`/`--mass` options into a threshold mode
///
/// Supplying both (or neither) is a configuration error; the tagged
/// variant makes the conflict unrepresentable past this point.
pub fn resolve_threshold_mode(length: Option<&str>, mass: Option<&str>) -> Result<ThresholdMode> {
    match (length, mass) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingThresholdModes.into()),
        (Some(list), None) => Ok(ThresholdMode::Length(parse_threshold_list(list)?)),
        (None, Some(list)) => Ok(ThresholdMode::Mass(parse_threshold_list(list)?)),
        (None, None) => Err(ConfigError::MissingThresholds.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_list_parsing() {
        assert_eq!(parse_threshold_list("250,950").unwrap(), vec![250.0, 950.0]);
        assert_eq!(
            parse_threshold_list(" 250 , ,950 ").unwrap(),
            vec![250.0, 950.0]
        );
        assert!(matches!(
            parse_threshold_list("250,abc"),
            Err(PostError::Config(ConfigError::UnparseableThreshold { .. }))
        ));
    }

    #[test]
    fn test_mode_resolution_rejects_both_and_neither() {
        assert!(matches!(
            resolve_threshold_mode(Some("100"), Some("250")),
            Err(PostError::Config(ConfigError::ConflictingThresholdModes))
        ));
        assert!(matches!(
            resolve_threshold_mode(None, None),
            Err(PostError::Config(ConfigError::MissingThresholds))
        ));
        assert_eq!(
            resolve_threshold_mode(None, Some("250,950")).unwrap(),
            ThresholdMode::Mass(vec![250.0, 950.0])
        );
        assert_eq!(
            resolve_threshold_mode(Some("500"), None).unwrap(),
            ThresholdMode::Length(vec![500.0])
        );
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.gcode");
        std::fs::write(&path, "T0\nG1 X10 E5 F3000\n").unwrap();

        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec!["T0", "G1 X10 E5 F3000"]);

        write_lines(&path, &lines).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "T0\nG1 X10 E5 F3000\n"
        );
    }
}
