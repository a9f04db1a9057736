//! Tool-change scanning
//!
//! Walks the parsed stream and produces one [`ToolChangeEvent`] per `T`
//! instruction, repeats of the same tool included, since the firmware
//! runs its change macros on every explicit selection. Each event carries
//! the kinematic snapshot taken before the selection line executes and the
//! temperature profile as declared up to that line.

use std::collections::BTreeMap;

use toolpost_gcode::{
    Command, Instruction, KinematicState, TemperatureProfile, Timeline, ToolTemps,
};

/// One tool selection in the stream
#[derive(Debug, Clone)]
pub struct ToolChangeEvent {
    /// Line index of the `T` instruction in the original stream
    pub line: usize,
    /// Newly selected tool; negative for deselects
    pub tool: i32,
    /// Tool that was active before this event, if any
    pub previous: Option<i32>,
    /// Kinematic state just before the selection line
    pub state: KinematicState,
    /// Temperatures declared before this line, per tool
    pub profile: BTreeMap<u32, ToolTemps>,
}

/// Produce the ordered tool-change event list
pub fn scan_tool_changes(instructions: &[Instruction], timeline: &Timeline) -> Vec<ToolChangeEvent> {
    let mut profile = TemperatureProfile::default();
    let mut previous: Option<i32> = None;
    let mut snapshots = timeline.tool_snapshots.iter().copied();
    let mut events = Vec::new();

    for inst in instructions {
        match inst.command {
            Command::SetToolTemps {
                tool,
                active,
                standby,
            } => profile.observe(tool, active, standby),
            Command::ToolSelect { tool } => {
                // The simulator records exactly one snapshot per selection,
                // in stream order
                let state = match snapshots.next() {
                    Some((line, state)) => {
                        debug_assert_eq!(line, inst.index);
                        state
                    }
                    None => timeline.final_state,
                };
                events.push(ToolChangeEvent {
                    line: inst.index,
                    tool,
                    previous,
                    state,
                    profile: profile.snapshot(),
                });
                previous = Some(tool);
            }
            _ => {}
        }
    }

    events
}
