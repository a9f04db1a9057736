//! End-to-end pipeline scenarios: whole files in, whole files out

use toolpost_planner::{PauseConfig, PostJob, PreheatConfig, ThresholdMode};

fn lines(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|s| s.to_string()).collect()
}

fn preheat_job(lead_time_secs: f64) -> PostJob {
    PostJob {
        preheat: Some(PreheatConfig { lead_time_secs }),
        ..Default::default()
    }
}

/// A two-tool file: temps declared up front, T0 prints 1000 mm at
/// 3000 mm/min (20 s), then changes to T1
fn two_tool_file() -> Vec<String> {
    let mut texts = vec![
        "; generated by a slicer".to_string(),
        "G10 P0 S210 R160".to_string(),
        "G10 P1 S215 R175".to_string(),
        "T0".to_string(),
    ];
    for i in 1..=20 {
        texts.push(format!("G1 X{} E10 F3000", i * 50));
    }
    texts.push("T1".to_string());
    texts
}

#[test]
fn passthrough_lines_survive_in_order() {
    let input = lines(&[
        "; header comment",
        "M104 S0",
        "",
        "G28 ; home",
        "T0",
        "G1 X10 E5 F3000",
        "M400",
    ]);
    let job = PostJob {
        pause: Some(PauseConfig::new(ThresholdMode::Length(vec![2.0]))),
        wipe_fix: true,
        ..Default::default()
    };
    let output = job.run(&input).unwrap();

    // Every original line is still present, byte-for-byte, in order
    let mut cursor = output.iter();
    for original in &input {
        assert!(
            cursor.any(|line| line == original),
            "line {:?} missing or out of order",
            original
        );
    }
}

#[test]
fn preheat_lands_mid_stream_for_ten_second_lead() {
    // 20 s of travel before the change; with a 10 s lead the warmup lands
    // where cumulative remaining time first drops to 10 s - the middle,
    // not the start and not the change itself
    let output = preheat_job(10.0).run(&two_tool_file()).unwrap();

    let warmup = output
        .iter()
        .position(|l| l.contains("G10 P1 R215"))
        .expect("warmup directive missing");
    // Ten 1-second moves remain between the warmup and the T1 line
    let change = output.iter().position(|l| l == "T1").unwrap();
    let moves_between = output[warmup..change]
        .iter()
        .filter(|l| l.starts_with("G1 "))
        .count();
    assert_eq!(moves_between, 10);
    // And the outgoing tool is sent back to standby at the change
    assert_eq!(output[change - 1], "G10 P0 R160 ; standby T0");
}

#[test]
fn unreachable_lead_time_lands_at_file_start() {
    // 600 s requested, 20 s available: insertion at the very start of the
    // window, never before line 0
    let input = lines(&[
        "G10 P0 S210",
        "G1 X100 F3000",
        "G1 X200 F3000",
        "T0",
    ]);
    let output = preheat_job(600.0).run(&input).unwrap();
    assert!(output[0].contains("G10 P0 R210"));
    assert_eq!(output.len(), input.len() + 1);
}

#[test]
fn mass_pauses_reset_between_thresholds() {
    // 1.75 mm / 1.24 g/cm3 filament: 2.982e-3 g/mm. Each move extrudes
    // 20 000 mm = 59.6 g. 250 g crosses on move 5; after the reset, an
    // *additional* 950 g crosses 16 moves later on move 21.
    let mut texts = vec!["T0".to_string()];
    for i in 1..=22 {
        texts.push(format!("G1 X{} E20000 F3000", i * 10));
    }
    let mut config = PauseConfig::new(ThresholdMode::Mass(vec![250.0, 950.0]));
    config.diameter_mm = Some(1.75);
    config.density_g_cm3 = Some(1.24);
    let job = PostJob {
        pause: Some(config),
        ..Default::default()
    };
    let output = job.run(&texts).unwrap();

    let pauses: Vec<usize> = output
        .iter()
        .enumerate()
        .filter(|(_, l)| *l == "M226")
        .map(|(i, _)| i)
        .collect();
    assert_eq!(pauses.len(), 2);

    // First pause directly after the 5th move, second after the 21st
    let move_index = |line: usize| {
        output[..line]
            .iter()
            .filter(|l| l.starts_with("G1 "))
            .count()
    };
    assert_eq!(move_index(pauses[0]), 5);
    assert_eq!(move_index(pauses[1]), 21);
}

#[test]
fn invalid_pause_config_fails_before_processing() {
    let job = PostJob {
        pause: Some(PauseConfig::new(ThresholdMode::Length(vec![]))),
        ..Default::default()
    };
    assert!(job.run(&lines(&["G1 X10 E5 F3000"])).is_err());
}

#[test]
fn wipe_fix_moves_tower_approach_after_the_change() {
    let input = lines(&[
        "G1 X10 Y10 E5 F1800",
        "G10 ; retract",
        "G1 X170 Y200 F8400",
        "G11 ; unretract",
        "T1",
        "; CP TOOLCHANGE WIPE",
        "G1 X175 Y200 E4 F1200",
    ]);
    let job = PostJob {
        wipe_fix: true,
        ..Default::default()
    };
    let output = job.run(&input).unwrap();

    assert_eq!(
        output,
        lines(&[
            "G1 X10 Y10 E5 F1800",
            "T1",
            "G10 ; retract",
            "G1 X170 Y200 F8400",
            "G11 ; unretract",
            "; CP TOOLCHANGE WIPE",
            "G1 X175 Y200 E4 F1200",
        ])
    );
}

#[test]
fn wipe_fix_is_idempotent() {
    let input = lines(&[
        "G1 X10 Y10 E5 F1800",
        "G10",
        "G1 X170 Y200 F8400",
        "G11",
        "T1",
        "G1 X175 Y200 E4 F1200",
    ]);
    let job = PostJob {
        wipe_fix: true,
        ..Default::default()
    };
    let fixed = job.run(&input).unwrap();
    let fixed_again = job.run(&fixed).unwrap();
    assert_eq!(fixed, fixed_again);
}

#[test]
fn combined_run_is_deterministic() {
    let mut input = two_tool_file();
    let change = input.len() - 1;
    input.insert(change, "G10 ; retract".to_string());
    input.insert(change + 1, "G1 X170 Y200 F8400".to_string());
    input.insert(change + 2, "G11".to_string());

    let mut pause = PauseConfig::new(ThresholdMode::Length(vec![100.0]));
    pause.tool = Some(0);
    let job = PostJob {
        preheat: Some(PreheatConfig {
            lead_time_secs: 5.0,
        }),
        pause: Some(pause),
        wipe_fix: true,
    };
    let first = job.run(&input).unwrap();
    let second = job.run(&input).unwrap();
    assert_eq!(first, second);
    assert_ne!(first, input);
}
