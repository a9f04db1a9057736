//! Motion/extrusion state tracking
//!
//! One forward pass over the parsed stream reconstructs the physical
//! quantities the planners need: per-line duration and cumulative elapsed
//! time, the active tool, and extruded length. Move duration is the largest
//! per-axis displacement divided by the effective feed rate, a deliberate
//! approximation with no acceleration ramps. Downstream insertion points
//! are derived from this model; do not replace it with a full kinematic
//! planner without revisiting every planner test.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::instruction::{Command, Instruction};

/// RRF default feed rate when a stream never sets one, mm/min
pub const DEFAULT_FEED_MM_MIN: f64 = 3000.0;
/// Fallback filament diameter, mm
pub const DEFAULT_FILAMENT_DIAMETER_MM: f64 = 1.75;
/// Fallback filament density (PLA), g/cm³
pub const DEFAULT_FILAMENT_DENSITY_G_CM3: f64 = 1.24;

/// Kinematic state of the machine at a point in the stream
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KinematicState {
    /// Current XYZ position, mm
    pub position: [f64; 3],
    /// Effective feed rate, mm/s
    pub feed_mm_s: f64,
    /// Elapsed time since stream start, seconds
    pub elapsed_secs: f64,
}

impl Default for KinematicState {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            feed_mm_s: DEFAULT_FEED_MM_MIN / 60.0,
            elapsed_secs: 0.0,
        }
    }
}

/// Declared temperatures for one tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolTemps {
    /// Active (working) temperature, °C
    pub active: Option<f64>,
    /// Standby (holding) temperature, °C
    pub standby: Option<f64>,
}

/// Last-declared temperatures per tool, last-write-wins by line order
#[derive(Debug, Clone, Default)]
pub struct TemperatureProfile {
    tools: BTreeMap<u32, ToolTemps>,
}

impl TemperatureProfile {
    /// Record a `G10 P.. S.. R..` declaration; absent registers keep their
    /// previous value
    pub fn observe(&mut self, tool: u32, active: Option<f64>, standby: Option<f64>) {
        let entry = self.tools.entry(tool).or_default();
        if active.is_some() {
            entry.active = active;
        }
        if standby.is_some() {
            entry.standby = standby;
        }
    }

    /// Temperatures declared for a tool so far, if any
    pub fn get(&self, tool: u32) -> Option<ToolTemps> {
        self.tools.get(&tool).copied()
    }

    /// Snapshot of the whole profile
    pub fn snapshot(&self) -> BTreeMap<u32, ToolTemps> {
        self.tools.clone()
    }
}

/// Physical state as of just after one line executes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineState {
    /// Time this line itself takes, seconds
    pub duration_secs: f64,
    /// Cumulative elapsed time after this line, seconds
    pub elapsed_secs: f64,
    /// Active tool after this line, `None` before any selection
    pub tool: Option<i32>,
    /// Extrusion axis delta on this line, mm (negative for retracts)
    pub extruded_mm: f64,
}

/// Filament cross-section parameters for mass derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilamentParams {
    /// Filament diameter, mm
    pub diameter_mm: f64,
    /// Filament density, g/cm³
    pub density_g_cm3: f64,
}

impl FilamentParams {
    /// Grams of filament per extruded millimeter
    pub fn mass_per_mm(&self) -> f64 {
        let radius = self.diameter_mm / 2.0;
        std::f64::consts::PI * radius * radius * self.density_g_cm3 * 0.001
    }
}

/// The time-annotated stream: one [`LineState`] per input line plus the
/// tool-selection snapshots the scanners consume
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Per-line state, parallel to the instruction list
    pub states: Vec<LineState>,
    /// Tools selected at least once, in first-use order (negatives excluded)
    pub used_tools: Vec<i32>,
    /// Kinematic state captured just *before* each tool-selection line,
    /// keyed by line index
    pub tool_snapshots: Vec<(usize, KinematicState)>,
    /// State after the last line
    pub final_state: KinematicState,
}

/// Run the simulation over a parsed stream
pub fn simulate(instructions: &[Instruction]) -> Timeline {
    let mut kin = KinematicState::default();
    let mut tool: Option<i32> = None;
    let mut used_tools: Vec<i32> = Vec::new();
    let mut tool_snapshots = Vec::new();
    let mut states = Vec::with_capacity(instructions.len());

    for inst in instructions {
        let mut duration = 0.0;
        let mut extruded = 0.0;

        match inst.command {
            Command::Move { .. } => {
                if let Some(f) = inst.arg('F') {
                    kin.feed_mm_s = f / 60.0;
                }
                let mut longest = 0.0f64;
                for (axis, letter) in ['X', 'Y', 'Z'].into_iter().enumerate() {
                    if let Some(target) = inst.arg(letter) {
                        longest = longest.max((target - kin.position[axis]).abs());
                        kin.position[axis] = target;
                    }
                }
                if longest > 0.0 {
                    if kin.feed_mm_s > 0.0 {
                        duration = longest / kin.feed_mm_s;
                    } else {
                        tracing::warn!(
                            line = inst.index,
                            "move with zero feed rate contributes no time"
                        );
                    }
                }
                if let Some(e) = inst.arg('E') {
                    extruded = e;
                }
            }
            Command::ToolSelect { tool: selected } => {
                tool_snapshots.push((inst.index, kin));
                tool = Some(selected);
                if selected >= 0 && !used_tools.contains(&selected) {
                    used_tools.push(selected);
                }
            }
            // Temperature declarations, retracts without E words, and
            // passthrough lines advance no time
            _ => {}
        }

        kin.elapsed_secs += duration;
        states.push(LineState {
            duration_secs: duration,
            elapsed_secs: kin.elapsed_secs,
            tool,
            extruded_mm: extruded,
        });
    }

    Timeline {
        states,
        used_tools,
        tool_snapshots,
        final_state: kin,
    }
}
