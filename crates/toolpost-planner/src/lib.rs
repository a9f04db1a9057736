//! # Toolpost Planner
//!
//! The planning half of the post-processor: tool-change scanning, preheat
//! and pause planning, the wipe-tower retract fix, and the edit applier
//! that merges everything back into a line stream.
//!
//! [`PostJob`] is the single entry point. It validates the configuration
//! before any line is parsed (the only fatal path), then runs each enabled
//! planner over the shared, already-finalized timeline and applies the
//! combined edit requests in one deterministic pass. Planners only read
//! the timeline and write their own request lists; nothing is mutated
//! until every planner has finished.

pub mod config;
pub mod edit;
pub mod error;
pub mod events;
pub mod pause;
pub mod preheat;
pub mod wipe;

pub use config::{
    PauseConfig, PreheatConfig, ThresholdMode, DEFAULT_LEAD_TIME_SECS, DEFAULT_PAUSE_CODE,
};
pub use edit::{apply_edits, EditKind, EditRequest, Placement};
pub use error::{ConfigError, PostError, Result};
pub use events::{scan_tool_changes, ToolChangeEvent};
pub use pause::plan_pauses;
pub use preheat::plan_preheats;
pub use wipe::scan_wipe_defects;

use toolpost_gcode::{parse_program, simulate};

/// One post-processing invocation over one file
///
/// Enable any combination of the three transforms; disabled ones plan
/// nothing. Unmodified lines pass through byte-for-byte.
#[derive(Debug, Clone, Default)]
pub struct PostJob {
    /// Inject tool warmups ahead of tool changes
    pub preheat: Option<PreheatConfig>,
    /// Inject pauses at extrusion thresholds
    pub pause: Option<PauseConfig>,
    /// Repair the wipe-tower retract ordering defect
    pub wipe_fix: bool,
}

impl PostJob {
    /// Check every enabled configuration; nothing is processed when any
    /// part is invalid
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(preheat) = &self.preheat {
            preheat.validate()?;
        }
        if let Some(pause) = &self.pause {
            pause.validate()?;
        }
        Ok(())
    }

    /// Run the pipeline over the input lines and produce the edited stream
    pub fn run(&self, lines: &[String]) -> Result<Vec<String>> {
        self.validate()?;

        let (instructions, hints) = parse_program(lines);
        let timeline = simulate(&instructions);
        let events = scan_tool_changes(&instructions, &timeline);
        tracing::debug!(
            lines = instructions.len(),
            tool_changes = events.len(),
            estimated_secs = timeline.final_state.elapsed_secs,
            "simulated input stream"
        );

        let mut requests = Vec::new();
        if self.wipe_fix {
            requests.extend(scan_wipe_defects(&instructions, &events));
        }
        if let Some(preheat) = &self.preheat {
            requests.extend(plan_preheats(&timeline, &events, preheat));
        }
        if let Some(pause) = &self.pause {
            requests.extend(plan_pauses(&instructions, &timeline, &hints, pause));
        }

        Ok(apply_edits(&instructions, requests))
    }
}
