//! Preheat planning
//!
//! For each tool change, walks backward through the time-annotated stream
//! to find the latest line at least the configured lead time ahead of the
//! change, and requests a warmup directive there. The warmup raises the
//! pending tool through its standby register (`G10 P<t> R<temp>`): the
//! tool is not selected yet, so the standby register is the one the
//! firmware heats it by. A matching restore directive drops the outgoing
//! tool back to its declared standby temperature at the change itself.

use crate::config::PreheatConfig;
use crate::edit::{EditKind, EditRequest, Placement};
use crate::events::ToolChangeEvent;
use toolpost_gcode::Timeline;

/// Plan warmup/restore insertions for every tool-change event
pub fn plan_preheats(
    timeline: &Timeline,
    events: &[ToolChangeEvent],
    config: &PreheatConfig,
) -> Vec<EditRequest> {
    let mut requests = Vec::new();

    for (position, event) in events.iter().enumerate() {
        // Tool returns (T-1) deselect only; nothing heats up for them
        if event.tool < 0 {
            continue;
        }

        let active = event
            .profile
            .get(&(event.tool as u32))
            .and_then(|temps| temps.active);
        let Some(active) = active else {
            tracing::warn!(
                line = event.line,
                tool = event.tool,
                "no active temperature declared before this tool change, preheat skipped"
            );
            continue;
        };

        let warmup = format!(
            "G10 P{} R{} ; warmup T{}",
            event.tool, active, event.tool
        );

        // Lookback stops at the previous tool-change event: inserting any
        // earlier would heat during the previous tool's working window
        let boundary = position.checked_sub(1).map(|p| events[p].line);
        let first_candidate = boundary.map_or(0, |b| b + 1);

        let mut accumulated = 0.0;
        let mut placed = false;
        for line in (first_candidate..event.line).rev() {
            accumulated += timeline.states[line].duration_secs;
            if accumulated >= config.lead_time_secs {
                requests.push(EditRequest {
                    line,
                    kind: EditKind::PreheatInsert {
                        placement: Placement::Before,
                        text: warmup.clone(),
                    },
                });
                placed = true;
                break;
            }
        }

        if !placed {
            // The lead time is unreachable inside this window; degrade to
            // the earliest legal insertion point
            let (line, placement) = match boundary {
                Some(previous_change) => (previous_change, Placement::After),
                None => (0, Placement::Before),
            };
            tracing::info!(
                line = event.line,
                tool = event.tool,
                available_secs = accumulated,
                requested_secs = config.lead_time_secs,
                "lead time unreachable, warmup placed at window start"
            );
            requests.push(EditRequest {
                line,
                kind: EditKind::PreheatInsert {
                    placement,
                    text: warmup,
                },
            });
        }

        // Send the outgoing tool back to standby at the change itself
        if let Some(previous) = event.previous.filter(|&t| t >= 0) {
            if let Some(standby) = event
                .profile
                .get(&(previous as u32))
                .and_then(|temps| temps.standby)
            {
                requests.push(EditRequest {
                    line: event.line,
                    kind: EditKind::PreheatInsert {
                        placement: Placement::Before,
                        text: format!("G10 P{} R{} ; standby T{}", previous, standby, previous),
                    },
                });
            }
        }
    }

    requests
}
