//! Tolerant G-code line parser
//!
//! Recognizes the RRF/Duet subset the post-processor reasons about:
//! `G0`/`G1` moves, `G10 P.. S.. R..` temperature declarations, bare `G10`
//! retracts, `G11` unretracts, and `T<n>` tool selections. Everything
//! else (comments, blanks, unknown codes, malformed numbers) degrades to
//! a passthrough instruction. Parsing never fails a run.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::instruction::{Command, Instruction};

/// Filament parameters auto-detected from slicer metadata comments
///
/// PrusaSlicer emits `; filament_diameter = 1.75,1.75` style comments with
/// one value per extruder. Values are kept in declaration order and matched
/// positionally against the tools used in the stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilamentHints {
    /// Declared filament diameters, mm
    pub diameters: Vec<f64>,
    /// Declared filament densities, g/cm³
    pub densities: Vec<f64>,
}

/// Parse one raw line into an [`Instruction`]
///
/// The portion after the first `;` is treated as a comment for
/// classification, but `raw` always keeps the full original text.
pub fn parse_line(index: usize, raw: &str) -> Instruction {
    let code = raw.split(';').next().unwrap_or("");
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Instruction::passthrough(index, raw);
    }

    let mut tokens = trimmed.split_whitespace();
    let head = tokens.next().unwrap_or("").to_ascii_uppercase();

    match head.as_str() {
        "G0" | "G00" => parse_move(index, raw, tokens, true),
        "G1" | "G01" => parse_move(index, raw, tokens, false),
        "G10" => parse_g10(index, raw, tokens),
        "G11" => Instruction {
            index,
            raw: raw.to_string(),
            command: Command::Unretract,
            args: BTreeMap::new(),
        },
        _ if head.starts_with('T') => parse_tool_select(index, raw, &head),
        _ => Instruction::passthrough(index, raw),
    }
}

fn parse_move<'a>(
    index: usize,
    raw: &str,
    mut tokens: impl Iterator<Item = &'a str>,
    rapid: bool,
) -> Instruction {
    let mut args = BTreeMap::new();

    while let Some(tok) = tokens.next() {
        let mut chars = tok.chars();
        let letter = match chars.next() {
            Some(c) => c.to_ascii_uppercase(),
            None => continue,
        };
        if !matches!(letter, 'X' | 'Y' | 'Z' | 'E' | 'F') {
            // Unknown words (checksums, S power, ...) are tolerated
            continue;
        }
        let rest = chars.as_str();
        // Accept both "X10.5" and the spaced "X 10.5" form
        let text = if rest.is_empty() {
            match tokens.next() {
                Some(t) => t,
                None => return Instruction::passthrough(index, raw),
            }
        } else {
            rest
        };
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                args.insert(letter, v);
            }
            _ => return Instruction::passthrough(index, raw),
        }
    }

    Instruction {
        index,
        raw: raw.to_string(),
        command: Command::Move { rapid },
        args,
    }
}

fn parse_g10<'a>(index: usize, raw: &str, tokens: impl Iterator<Item = &'a str>) -> Instruction {
    let mut tool: Option<u32> = None;
    let mut active: Option<f64> = None;
    let mut standby: Option<f64> = None;
    let mut saw_word = false;

    for tok in tokens {
        let mut chars = tok.chars();
        let letter = match chars.next() {
            Some(c) => c.to_ascii_uppercase(),
            None => continue,
        };
        let rest = chars.as_str();
        match letter {
            'P' => match rest.parse::<u32>() {
                Ok(t) => {
                    tool = Some(t);
                    saw_word = true;
                }
                Err(_) => return Instruction::passthrough(index, raw),
            },
            'S' => match rest.parse::<f64>() {
                Ok(v) if v.is_finite() => {
                    active = Some(v);
                    saw_word = true;
                }
                _ => return Instruction::passthrough(index, raw),
            },
            'R' => match rest.parse::<f64>() {
                Ok(v) if v.is_finite() => {
                    standby = Some(v);
                    saw_word = true;
                }
                _ => return Instruction::passthrough(index, raw),
            },
            _ => {}
        }
    }

    match (tool, active.is_some() || standby.is_some()) {
        (Some(tool), true) => Instruction {
            index,
            raw: raw.to_string(),
            command: Command::SetToolTemps {
                tool,
                active,
                standby,
            },
            args: BTreeMap::new(),
        },
        // A bare G10 is a firmware retract; G10 with an incomplete
        // temperature word set is some other G10 use we leave alone
        _ if !saw_word => Instruction {
            index,
            raw: raw.to_string(),
            command: Command::Retract,
            args: BTreeMap::new(),
        },
        _ => Instruction::passthrough(index, raw),
    }
}

fn parse_tool_select(index: usize, raw: &str, head: &str) -> Instruction {
    let digits: String = head[1..]
        .chars()
        .take_while(|c| *c == '-' || c.is_ascii_digit())
        .collect();
    match digits.parse::<i32>() {
        Ok(tool) => Instruction {
            index,
            raw: raw.to_string(),
            command: Command::ToolSelect { tool },
            args: BTreeMap::new(),
        },
        Err(_) => {
            tracing::warn!(line = index, text = raw, "unparseable T command, passing through");
            Instruction::passthrough(index, raw)
        }
    }
}

/// Parse a whole program, collecting filament metadata hints on the way
///
/// Metadata comments stay in the stream as passthrough lines; the hints are
/// side information for mass-based pause planning.
pub fn parse_program(lines: &[String]) -> (Vec<Instruction>, FilamentHints) {
    static META_RE: OnceLock<Regex> = OnceLock::new();
    let meta = META_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*;\s*filament_(diameter|density)\s*=\s*(.+)$")
            .expect("invalid regex pattern")
    });

    let mut hints = FilamentHints::default();
    let mut instructions = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        if let Some(caps) = meta.captures(line) {
            let values = caps[2].split(',').filter_map(|v| v.trim().parse::<f64>().ok());
            match &caps[1].to_ascii_lowercase()[..] {
                "diameter" => hints.diameters.extend(values),
                _ => hints.densities.extend(values),
            }
        }
        instructions.push(parse_line(index, line));
    }

    (instructions, hints)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_move_words() {
        let i = parse_line(0, "G1 X10.5 Y-3 E0.42 F3000");
        assert_eq!(i.command, Command::Move { rapid: false });
        assert_eq!(i.arg('X'), Some(10.5));
        assert_eq!(i.arg('Y'), Some(-3.0));
        assert_eq!(i.arg('E'), Some(0.42));
        assert_eq!(i.arg('F'), Some(3000.0));
    }

    #[test]
    fn test_move_spaced_words_and_case() {
        let i = parse_line(0, "g0 x 12 y24");
        assert_eq!(i.command, Command::Move { rapid: true });
        assert_eq!(i.arg('X'), Some(12.0));
        assert_eq!(i.arg('Y'), Some(24.0));
    }

    #[test]
    fn test_move_trailing_comment() {
        let i = parse_line(0, "G1 X5 ; lift Y99");
        assert_eq!(i.arg('X'), Some(5.0));
        assert_eq!(i.arg('Y'), None);
    }

    #[test]
    fn test_malformed_number_degrades_to_passthrough() {
        let i = parse_line(3, "G1 X1.2.3 Y5");
        assert_eq!(i.command, Command::Passthrough);
        assert_eq!(i.raw, "G1 X1.2.3 Y5");
    }

    #[test]
    fn test_g10_temperature_declaration() {
        let i = parse_line(0, "G10 P1 S215 R175");
        assert_eq!(
            i.command,
            Command::SetToolTemps {
                tool: 1,
                active: Some(215.0),
                standby: Some(175.0)
            }
        );
    }

    #[test]
    fn test_g10_standby_only() {
        let i = parse_line(0, "G10 P0 R160");
        assert_eq!(
            i.command,
            Command::SetToolTemps {
                tool: 0,
                active: None,
                standby: Some(160.0)
            }
        );
    }

    #[test]
    fn test_bare_g10_is_retract() {
        assert_eq!(parse_line(0, "G10").command, Command::Retract);
        assert_eq!(parse_line(0, "G10 ; retract").command, Command::Retract);
        // Incomplete temperature word set is not ours to interpret
        assert_eq!(parse_line(0, "G10 P2").command, Command::Passthrough);
        assert_eq!(parse_line(0, "G11").command, Command::Unretract);
    }

    #[test]
    fn test_tool_select() {
        assert_eq!(parse_line(0, "T0").command, Command::ToolSelect { tool: 0 });
        assert_eq!(parse_line(0, "t3").command, Command::ToolSelect { tool: 3 });
        assert_eq!(
            parse_line(0, "T-1 ; park").command,
            Command::ToolSelect { tool: -1 }
        );
        assert_eq!(parse_line(0, "TOOLCHANGE").command, Command::Passthrough);
        assert_eq!(parse_line(0, "T").command, Command::Passthrough);
    }

    #[test]
    fn test_comments_and_blanks_pass_through() {
        assert_eq!(parse_line(0, "").command, Command::Passthrough);
        assert_eq!(parse_line(0, "; CP TOOLCHANGE START").command, Command::Passthrough);
        assert_eq!(parse_line(0, "M104 S200").command, Command::Passthrough);
    }

    #[test]
    fn test_program_hints() {
        let (instructions, hints) = parse_program(&lines(&[
            "; filament_diameter = 1.75,2.85",
            "; filament_density = 1.24",
            "G1 X5",
        ]));
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].command, Command::Passthrough);
        assert_eq!(hints.diameters, vec![1.75, 2.85]);
        assert_eq!(hints.densities, vec![1.24]);
    }
}
