//! Edit requests and their application
//!
//! Planners never touch the stream; they emit [`EditRequest`]s anchored to
//! line indices in the original numbering. [`apply_edits`] is the single
//! place where indices become output positions: it merges all requests in
//! one deterministic pass over the original instruction list, so no planner
//! ever observes another planner's index shifts.

use std::collections::{BTreeMap, HashSet};

use toolpost_gcode::Instruction;

/// Which side of the target line an insertion lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Insert immediately before the target line
    Before,
    /// Insert immediately after the target line
    After,
}

/// What an edit request does
#[derive(Debug, Clone, PartialEq)]
pub enum EditKind {
    /// Relocate a retract/travel/unretract group to after the tool change
    /// at the target line
    WipeRestructure {
        /// Original line indices to remove
        remove: Vec<usize>,
        /// Replacement text inserted after the tool-change line, in order
        insert_after: Vec<String>,
    },
    /// Inject a temperature directive around the target line
    PreheatInsert {
        /// Side of the target line
        placement: Placement,
        /// Directive text
        text: String,
    },
    /// Inject the pause payload after the target line
    PauseInsert {
        /// Payload lines, in order
        lines: Vec<String>,
    },
}

/// One requested edit against the original stream
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// Target line index in the original numbering
    pub line: usize,
    /// The edit to perform
    pub kind: EditKind,
}

impl EditRequest {
    /// Tie-break order for requests targeting the same line: restructures
    /// first, then preheats, then pauses
    fn priority(&self) -> u8 {
        match self.kind {
            EditKind::WipeRestructure { .. } => 0,
            EditKind::PreheatInsert { .. } => 1,
            EditKind::PauseInsert { .. } => 2,
        }
    }
}

/// Materialize the final line sequence
///
/// Pure merge over the original instructions: stable-sorts requests by
/// (line, priority), collects removals and per-line insertion lists, then
/// walks the stream once. Insertions whose target line was removed by a
/// restructure are superseded and dropped with a warning; they are never
/// silently lost. Repeated runs on identical input produce identical
/// output.
pub fn apply_edits(instructions: &[Instruction], mut requests: Vec<EditRequest>) -> Vec<String> {
    requests.sort_by_key(|r| (r.line, r.priority()));

    let mut removed: HashSet<usize> = HashSet::new();
    let mut before: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut after: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    // Restructures first: their removals decide which insertions survive
    for request in &requests {
        if let EditKind::WipeRestructure {
            remove,
            insert_after,
        } = &request.kind
        {
            if request.line >= instructions.len() {
                tracing::warn!(line = request.line, "restructure target outside stream, skipped");
                continue;
            }
            for &index in remove {
                if index < instructions.len() {
                    removed.insert(index);
                } else {
                    tracing::warn!(line = index, "restructure removal outside stream, skipped");
                }
            }
            after
                .entry(request.line)
                .or_default()
                .extend(insert_after.iter().cloned());
        }
    }

    for request in &requests {
        let (placement, lines): (Placement, Vec<String>) = match &request.kind {
            EditKind::WipeRestructure { .. } => continue,
            EditKind::PreheatInsert { placement, text } => (*placement, vec![text.clone()]),
            EditKind::PauseInsert { lines } => (Placement::After, lines.clone()),
        };
        if request.line >= instructions.len() {
            tracing::warn!(line = request.line, "insertion target outside stream, skipped");
            continue;
        }
        if removed.contains(&request.line) {
            tracing::warn!(
                line = request.line,
                "insertion superseded by restructure at the same line"
            );
            continue;
        }
        let side = match placement {
            Placement::Before => &mut before,
            Placement::After => &mut after,
        };
        side.entry(request.line).or_default().extend(lines);
    }

    let mut output = Vec::with_capacity(instructions.len() + requests.len());
    for inst in instructions {
        if let Some(lines) = before.get(&inst.index) {
            output.extend(lines.iter().cloned());
        }
        if !removed.contains(&inst.index) {
            output.push(inst.raw.clone());
        }
        if let Some(lines) = after.get(&inst.index) {
            output.extend(lines.iter().cloned());
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolpost_gcode::parse_line;

    fn program(texts: &[&str]) -> Vec<Instruction> {
        texts
            .iter()
            .enumerate()
            .map(|(i, s)| parse_line(i, s))
            .collect()
    }

    fn preheat(line: usize, placement: Placement, text: &str) -> EditRequest {
        EditRequest {
            line,
            kind: EditKind::PreheatInsert {
                placement,
                text: text.to_string(),
            },
        }
    }

    #[test]
    fn test_before_and_after_insertions() {
        let prog = program(&["a", "b", "c"]);
        let out = apply_edits(
            &prog,
            vec![
                preheat(1, Placement::Before, "pre"),
                preheat(1, Placement::After, "post"),
            ],
        );
        assert_eq!(out, vec!["a", "pre", "b", "post", "c"]);
    }

    #[test]
    fn test_same_index_priority_order() {
        let prog = program(&["a", "T1", "c"]);
        let out = apply_edits(
            &prog,
            vec![
                EditRequest {
                    line: 1,
                    kind: EditKind::PauseInsert {
                        lines: vec!["M226".to_string()],
                    },
                },
                preheat(1, Placement::After, "G10 P0 R160"),
                EditRequest {
                    line: 1,
                    kind: EditKind::WipeRestructure {
                        remove: vec![0],
                        insert_after: vec!["moved".to_string()],
                    },
                },
            ],
        );
        // Wipe insertions first, then preheat, then pause
        assert_eq!(out, vec!["T1", "moved", "G10 P0 R160", "M226", "c"]);
    }

    #[test]
    fn test_superseded_insertion_is_dropped() {
        let prog = program(&["a", "b", "T1"]);
        let out = apply_edits(
            &prog,
            vec![
                preheat(1, Placement::Before, "never"),
                EditRequest {
                    line: 2,
                    kind: EditKind::WipeRestructure {
                        remove: vec![1],
                        insert_after: vec!["b".to_string()],
                    },
                },
            ],
        );
        assert_eq!(out, vec!["a", "T1", "b"]);
    }

    #[test]
    fn test_out_of_range_targets_are_skipped() {
        let prog = program(&["a"]);
        let out = apply_edits(&prog, vec![preheat(5, Placement::After, "x")]);
        assert_eq!(out, vec!["a"]);
    }

    #[test]
    fn test_deterministic_under_request_order() {
        let prog = program(&["a", "b"]);
        let forward = vec![
            preheat(0, Placement::After, "one"),
            preheat(1, Placement::Before, "two"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(
            apply_edits(&prog, forward),
            apply_edits(&prog, reversed)
        );
    }
}
