//! # Toolpost G-Code
//!
//! Line model, tolerant parser, and motion/extrusion simulation for the
//! toolpost post-processor. The parser turns raw text lines into typed
//! [`Instruction`]s without ever failing a run; the simulator walks the
//! parsed stream once and annotates every line with elapsed time, active
//! tool, and extruded length.

pub mod instruction;
pub mod parser;
pub mod simulate;

pub use instruction::{Command, Instruction};
pub use parser::{parse_line, parse_program, FilamentHints};
pub use simulate::{
    simulate, FilamentParams, KinematicState, LineState, TemperatureProfile, Timeline, ToolTemps,
    DEFAULT_FEED_MM_MIN, DEFAULT_FILAMENT_DENSITY_G_CM3, DEFAULT_FILAMENT_DIAMETER_MM,
};
