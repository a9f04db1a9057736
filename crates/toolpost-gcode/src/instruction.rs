//! Typed G-code line model
//!
//! Every input line becomes exactly one [`Instruction`]. The original text
//! and source line index are preserved so untouched lines round-trip
//! byte-for-byte and planners can anchor edits to stable positions in the
//! original stream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parsed command code of a G-code line
///
/// Only the commands the post-processor reasons about get their own
/// variant; everything else is `Passthrough` and is never modified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// `G0` (rapid) or `G1` (linear) move
    Move {
        /// True for `G0`
        rapid: bool,
    },
    /// `T<n>` tool selection; negative numbers deselect (`T-1`)
    ToolSelect {
        /// Selected tool number
        tool: i32,
    },
    /// `G10 P<tool> S<active> R<standby>` temperature declaration
    SetToolTemps {
        /// Addressed tool number
        tool: u32,
        /// Active (working) temperature, if given
        active: Option<f64>,
        /// Standby (holding) temperature, if given
        standby: Option<f64>,
    },
    /// Bare `G10` firmware retract
    Retract,
    /// `G11` firmware unretract
    Unretract,
    /// Anything the parser does not recognize: comments, blanks, other codes
    Passthrough,
}

/// One parsed line of the input stream
///
/// Immutable once constructed. `index` is the 0-based position in the
/// original line list and is the identity every planner uses; only the
/// edit applier translates indices into output positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// 0-based line index in the original stream
    pub index: usize,
    /// Original text, emitted verbatim when the line is not edited
    pub raw: String,
    /// Parsed command code
    pub command: Command,
    /// Letter-prefixed numeric words (X/Y/Z/E/F for moves)
    pub args: BTreeMap<char, f64>,
}

impl Instruction {
    /// Create a passthrough instruction for an unrecognized line
    pub fn passthrough(index: usize, raw: impl Into<String>) -> Self {
        Self {
            index,
            raw: raw.into(),
            command: Command::Passthrough,
            args: BTreeMap::new(),
        }
    }

    /// Look up an argument word by letter
    pub fn arg(&self, letter: char) -> Option<f64> {
        self.args.get(&letter.to_ascii_uppercase()).copied()
    }

    /// True for `G0`/`G1` moves
    pub fn is_move(&self) -> bool {
        matches!(self.command, Command::Move { .. })
    }

    /// True when this line retracts filament: bare `G10`, or a move whose
    /// only axis word is a negative `E`
    pub fn is_retract(&self) -> bool {
        match self.command {
            Command::Retract => true,
            Command::Move { .. } => {
                self.arg('X').is_none()
                    && self.arg('Y').is_none()
                    && self.arg('Z').is_none()
                    && self.arg('E').is_some_and(|e| e < 0.0)
            }
            _ => false,
        }
    }

    /// True when this line unretracts filament: `G11`, or a move whose only
    /// axis word is a positive `E`
    pub fn is_unretract(&self) -> bool {
        match self.command {
            Command::Unretract => true,
            Command::Move { .. } => {
                self.arg('X').is_none()
                    && self.arg('Y').is_none()
                    && self.arg('Z').is_none()
                    && self.arg('E').is_some_and(|e| e > 0.0)
            }
            _ => false,
        }
    }

    /// True for an XY travel move that does not extrude
    pub fn is_travel_xy(&self) -> bool {
        self.is_move()
            && (self.arg('X').is_some() || self.arg('Y').is_some())
            && self.arg('E').is_none()
    }

    /// True for a move that only sets the feed rate
    pub fn is_feed_only(&self) -> bool {
        self.is_move() && self.args.keys().all(|&k| k == 'F') && !self.args.is_empty()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.index, self.raw)
    }
}
