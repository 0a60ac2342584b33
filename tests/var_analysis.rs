use std::fs;
use std::path::PathBuf;

use match_state_study::config::StudyConfig;
use match_state_study::match_state::GameState;
use match_state_study::season::{
    Event, EventKind, Match, Round, Season, Side, build_match_lookup, parse_season_json,
};
use match_state_study::var_analysis::{
    AnalysisRow, Group, build_var_analysis, cumulative_curve, minute_histogram, run_var_study,
    state_interaction, time_to_goal_summary,
};
use match_state_study::var_matching::{ControlMatcher, extract_treatment_cases};

fn fixture_season() -> Season {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures/season_sample.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_season_json(&raw).expect("fixture should parse")
}

fn single_match_season(events: Vec<Event>) -> Season {
    Season {
        season_id: "synthetic".to_string(),
        rounds: vec![Round {
            matches: vec![Match {
                id: "s1".to_string(),
                date_time: "2021-03-01T20:00:00".to_string(),
                result: (0, 1),
                events,
                home_lineup: Vec::new(),
                away_lineup: Vec::new(),
            }],
        }],
        players: Vec::new(),
    }
}

fn analysis_row(group: Group, state: GameState, t_event: u16, occurred: u8) -> AnalysisRow {
    AnalysisRow {
        group,
        match_id: "m".to_string(),
        minute: 30,
        team: Side::Home,
        state,
        horizon: 15,
        t_event,
        event_occurred: occurred,
    }
}

#[test]
fn var_rows_measure_time_to_concede() {
    let season = single_match_season(vec![
        Event::new(20, EventKind::GoalDisallowedByVar, Side::Home),
        Event::new(27, EventKind::Goal, Side::Away),
        Event::new(85, EventKind::GoalDisallowedByVar, Side::Away),
        Event::new(10, EventKind::GoalDisallowedByVar, Side::Away),
    ]);
    let cfg = StudyConfig::default();
    let seasons = [season];
    let cases = extract_treatment_cases(&seasons, &cfg);
    assert_eq!(cases.len(), 3);

    let lookup = build_match_lookup(&seasons);
    let rows = build_var_analysis(&cases, &lookup, &cfg).expect("analysis");
    // Minute 10 is before the analysis window opens.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].minute, 20);
    assert_eq!(rows[0].horizon, 15);
    assert_eq!((rows[0].t_event, rows[0].event_occurred), (7, 1));
    assert_eq!(rows[1].minute, 85);
    assert_eq!(rows[1].horizon, 5);
    assert_eq!((rows[1].t_event, rows[1].event_occurred), (5, 0));
}

#[test]
fn cumulative_curve_counts_only_observed_goals() {
    let rows = vec![
        analysis_row(Group::Var, GameState::Drawing, 3, 1),
        analysis_row(Group::Var, GameState::Drawing, 10, 1),
        analysis_row(Group::Var, GameState::Drawing, 15, 0),
    ];
    let curve = cumulative_curve(&rows, 15).expect("curve");
    assert_eq!(curve.len(), 16);
    assert_eq!(curve[2].probability, 0.0);
    assert!((curve[3].probability - 1.0 / 3.0).abs() < 1e-9);
    assert!((curve[10].probability - 2.0 / 3.0).abs() < 1e-9);
    assert!((curve[15].probability - 2.0 / 3.0).abs() < 1e-9);
    assert!(cumulative_curve(Vec::<AnalysisRow>::new().iter(), 15).is_none());
}

#[test]
fn interaction_and_summary_by_group() {
    let rows = vec![
        analysis_row(Group::Var, GameState::Losing, 4, 1),
        analysis_row(Group::Var, GameState::Losing, 15, 0),
        analysis_row(Group::Control, GameState::Losing, 15, 0),
        analysis_row(Group::Control, GameState::Winning, 8, 1),
    ];
    let cells = state_interaction(&rows, 15);
    assert_eq!(cells.len(), 3);
    let var_losing = cells
        .iter()
        .find(|c| c.state == GameState::Losing && c.group == Group::Var)
        .expect("var losing cell");
    assert_eq!(var_losing.samples, 2);
    assert!((var_losing.probability - 0.5).abs() < 1e-9);

    let summary = time_to_goal_summary(&rows, 15);
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].group, Group::Var);
    assert_eq!(summary[0].summary.count, 1);
    assert_eq!(summary[0].summary.median, 4.0);
}

#[test]
fn histogram_bins_case_minutes() {
    let cfg = StudyConfig::default();
    let seasons = [single_match_season(vec![
        Event::new(3, EventKind::GoalDisallowedByVar, Side::Home),
        Event::new(7, EventKind::GoalDisallowedByVar, Side::Home),
        Event::new(12, EventKind::GoalDisallowedByVar, Side::Home),
    ])];
    let cases = extract_treatment_cases(&seasons, &cfg);
    let bins = minute_histogram(&cases, 5);
    let counts: Vec<(u16, u16, usize)> = bins.iter().map(|b| (b.start, b.end, b.count)).collect();
    assert_eq!(counts, vec![(0, 4, 1), (5, 9, 1), (10, 14, 1)]);
    assert!(minute_histogram(&[], 5).is_empty());
}

#[test]
fn full_study_on_fixture() {
    let cfg = StudyConfig::default();
    let matcher = ControlMatcher::new(&cfg);
    let study = run_var_study(&[fixture_season()], &matcher, &cfg).expect("study");

    assert_eq!(study.cases.len(), 2);
    assert_eq!(study.report.cases, 2);
    assert_eq!(study.report.matched_cases, 1);
    assert_eq!(study.report.dropped_cases, 1);
    assert_eq!(study.report.short_pools, 1);

    let control_minutes: Vec<(&str, u16)> = study
        .controls
        .iter()
        .map(|s| (s.candidate.match_id.as_str(), s.candidate.minute))
        .collect();
    assert_eq!(control_minutes, vec![("1002", 48), ("1002", 49)]);

    assert_eq!(study.analysis.len(), 4);
    assert!(study.analysis.iter().all(|r| r.event_occurred == 0));
    assert_eq!(study.curves.len(), 2);
    for curve in &study.curves {
        assert_eq!(curve.points.len(), 16);
        assert!(curve.points.iter().all(|p| p.probability == 0.0));
    }
}
