//! Pause planning
//!
//! Accumulates extruded length (or derived mass) for the target tool and
//! requests a pause after each line where the running total first reaches
//! the smallest unmet threshold. The accumulator resets after every
//! crossing, so a threshold list of [250, 950] pauses at 250 and then
//! after an *additional* 950. Retraction deltas are ignored so the
//! accumulator never decreases between resets.

use std::collections::BTreeMap;

use crate::config::{PauseConfig, ThresholdMode};
use crate::edit::{EditKind, EditRequest};
use toolpost_gcode::{
    FilamentHints, FilamentParams, Instruction, Timeline, DEFAULT_FILAMENT_DENSITY_G_CM3,
    DEFAULT_FILAMENT_DIAMETER_MM,
};

/// Resolve filament parameters for one tool slot: explicit configuration
/// wins, then the slicer metadata hint for that slot, then the documented
/// defaults (1.75 mm PLA)
fn resolve_filament(config: &PauseConfig, hints: &FilamentHints, slot: usize) -> FilamentParams {
    let diameter_mm = config
        .diameter_mm
        .or_else(|| hints.diameters.get(slot).copied())
        .unwrap_or(DEFAULT_FILAMENT_DIAMETER_MM);
    let density_g_cm3 = config
        .density_g_cm3
        .or_else(|| hints.densities.get(slot).copied())
        .unwrap_or(DEFAULT_FILAMENT_DENSITY_G_CM3);
    tracing::debug!(slot, diameter_mm, density_g_cm3, "resolved filament parameters");
    FilamentParams {
        diameter_mm,
        density_g_cm3,
    }
}

/// Plan pause insertions for the configured thresholds
///
/// The configuration must already be validated; planning itself cannot
/// fail. Once the threshold list is exhausted the totals keep
/// accumulating for the end-of-run report, but no further pauses are
/// requested.
pub fn plan_pauses(
    instructions: &[Instruction],
    timeline: &Timeline,
    hints: &FilamentHints,
    config: &PauseConfig,
) -> Vec<EditRequest> {
    let thresholds = config.sorted_thresholds();
    let target = config
        .tool
        .or_else(|| timeline.used_tools.first().copied())
        .unwrap_or(0);

    // Per-tool grams-per-mm, hints matched positionally to first use order
    let mass_mode = matches!(config.mode, ThresholdMode::Mass(_));
    let mut mass_factors: BTreeMap<i32, f64> = BTreeMap::new();
    if mass_mode {
        for (slot, &tool) in timeline.used_tools.iter().enumerate() {
            mass_factors.insert(tool, resolve_filament(config, hints, slot).mass_per_mm());
        }
        mass_factors
            .entry(target)
            .or_insert_with(|| resolve_filament(config, hints, 0).mass_per_mm());
    }

    let mut accumulator = 0.0;
    let mut next_threshold = 0usize;
    let mut length_totals: BTreeMap<i32, f64> = BTreeMap::new();
    let mut mass_totals: BTreeMap<i32, f64> = BTreeMap::new();
    let mut requests = Vec::new();

    for inst in instructions {
        if !inst.is_move() {
            continue;
        }
        let state = &timeline.states[inst.index];
        let delta_mm = state.extruded_mm;
        if delta_mm == 0.0 {
            continue;
        }
        // Extrusion before any selection belongs to tool 0
        let tool = state.tool.unwrap_or(0);

        *length_totals.entry(tool).or_default() += delta_mm;
        if mass_mode {
            let factor = mass_factors
                .get(&tool)
                .copied()
                .unwrap_or_else(|| resolve_filament(config, hints, 0).mass_per_mm());
            *mass_totals.entry(tool).or_default() += delta_mm * factor;
        }

        if tool != target {
            continue;
        }
        let delta = delta_mm.max(0.0);
        accumulator += match mass_factors.get(&target) {
            Some(factor) => delta * factor,
            None => delta,
        };

        if next_threshold < thresholds.len() && accumulator >= thresholds[next_threshold] {
            let amount = if mass_mode {
                format!("{:.0} g", accumulator)
            } else {
                format!("{:.2} mm", accumulator)
            };
            tracing::info!(
                line = inst.index,
                tool,
                threshold = thresholds[next_threshold],
                "inserting pause at {}",
                amount
            );
            requests.push(EditRequest {
                line: inst.index,
                kind: EditKind::PauseInsert {
                    lines: vec![
                        format!(";toolpost auto-pause for T{} at {}", tool, amount),
                        config.pause_code.clone(),
                    ],
                },
            });
            accumulator = 0.0;
            next_threshold += 1;
        }
    }

    for (&tool, &length_mm) in &length_totals {
        if mass_mode {
            let mass_g = mass_totals.get(&tool).copied().unwrap_or(0.0);
            tracing::info!(tool, length_mm, mass_g, "extrusion total");
        } else {
            tracing::info!(tool, length_mm, "extrusion total");
        }
    }

    requests
}
