//! Wipe-tower retract fix
//!
//! Some slicers emit the travel to the wipe tower *before* the tool-change
//! instruction: the firmware's change macros then run at the tower with
//! the filament already swapped, wasting the move and smearing the prime.
//! The defect shows up as a fixed instruction sequence immediately before
//! a tool change (retract, travel to the tower, optionally unretract)
//! which this scanner matches with a small state machine over the typed
//! stream and relocates to just after the change. Purge moves that follow
//! are left untouched, and already-fixed streams contain no matching
//! window.

use crate::edit::{EditKind, EditRequest};
use crate::events::ToolChangeEvent;
use toolpost_gcode::{Command, Instruction};

/// How many lines before a tool change the matcher will look at
const WINDOW_LINES: usize = 12;

/// Matcher progress, built up while walking backward from the change
#[derive(Debug, Default)]
struct WindowMatch {
    unretract: Option<usize>,
    travel: Option<usize>,
    retract: Option<usize>,
}

impl WindowMatch {
    /// Feed the next instruction (walking backward); returns false when
    /// the window cannot match anymore
    fn feed(&mut self, index: usize, inst: &Instruction) -> bool {
        // Comments, blanks and feed-only moves sit between the interesting
        // lines in real slicer output; they never break the pattern
        if matches!(inst.command, Command::Passthrough) || inst.is_feed_only() {
            return true;
        }
        if self.travel.is_none() && self.unretract.is_none() && inst.is_unretract() {
            self.unretract = Some(index);
            return true;
        }
        if self.travel.is_none() && inst.is_travel_xy() {
            self.travel = Some(index);
            return true;
        }
        if self.travel.is_some() && inst.is_retract() {
            self.retract = Some(index);
        }
        false
    }
}

/// Scan for the defect pattern around every tool-change event
pub fn scan_wipe_defects(
    instructions: &[Instruction],
    events: &[ToolChangeEvent],
) -> Vec<EditRequest> {
    let mut requests = Vec::new();

    for event in events {
        if event.tool < 0 {
            continue;
        }
        let window_start = event.line.saturating_sub(WINDOW_LINES);
        let mut matcher = WindowMatch::default();
        for index in (window_start..event.line).rev() {
            if !matcher.feed(index, &instructions[index]) {
                break;
            }
        }
        let (Some(travel), Some(retract)) = (matcher.travel, matcher.retract) else {
            continue;
        };

        let mut remove = vec![retract, travel];
        let mut insert_after = vec![
            instructions[retract].raw.clone(),
            instructions[travel].raw.clone(),
        ];
        if let Some(unretract) = matcher.unretract {
            remove.push(unretract);
            insert_after.push(instructions[unretract].raw.clone());
        }
        tracing::info!(
            line = event.line,
            tool = event.tool,
            "relocating wipe-tower approach to after the tool change"
        );
        requests.push(EditRequest {
            line: event.line,
            kind: EditKind::WipeRestructure {
                remove,
                insert_after,
            },
        });
    }

    requests
}
