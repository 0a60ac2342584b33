use std::fs;
use std::path::PathBuf;

use match_state_study::season::{
    EventKind, Side, build_match_lookup, load_season, parse_season_json,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

#[test]
fn parses_season_fixture() {
    let raw = read_fixture("season_sample.json");
    let season = parse_season_json(&raw).expect("fixture should parse");
    assert_eq!(season.season_id, "2019-2020");
    assert_eq!(season.rounds.len(), 2);
    assert_eq!(season.players.len(), 16);

    let ids: Vec<&str> = season.matches().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1001", "1002", "1003", "1004"]);

    let first = season.matches().next().expect("first match");
    assert_eq!(first.result, (4, 0));
    assert_eq!(first.events.len(), 7);
    assert_eq!(first.events[2].kind, EventKind::PenaltyGoal);
    assert_eq!(first.events[6].kind, EventKind::Other);
    assert_eq!(first.lineup(Side::Home).len(), 8);
}

#[test]
fn numeric_match_ids_become_strings() {
    let season = parse_season_json(&read_fixture("season_sample.json")).expect("parse");
    let lookup = build_match_lookup(std::slice::from_ref(&season));
    assert_eq!(lookup.len(), 4);
    let m = lookup.get("1002").expect("numeric id should be found as a string");
    assert_eq!(m.events[1].kind, EventKind::GoalDisallowedByVar);
    assert!(lookup.get("9999").is_err());
}

#[test]
fn kickoff_formats_and_points() {
    let season = parse_season_json(&read_fixture("season_sample.json")).expect("parse");
    let kickoffs: Vec<String> = season
        .matches()
        .map(|m| m.kickoff().expect("kickoff").to_string())
        .collect();
    assert_eq!(kickoffs[0], "2019-08-16 19:00:00");
    assert_eq!(kickoffs[3], "2019-08-25 20:00:00");

    let first = season.matches().next().expect("first match");
    assert_eq!(first.points(Side::Home), 3);
    assert_eq!(first.points(Side::Away), 0);
    let draw = season.matches().nth(1).expect("second match");
    assert_eq!(draw.points(Side::Home), 1);
    assert_eq!(draw.points(Side::Away), 1);
}

#[test]
fn rejects_bad_kickoff() {
    let raw = r#"{
        "season_id": "bad",
        "rounds": [{"matches": [{"id": "1", "date_time": "16/08/2019", "result": [0, 0]}]}]
    }"#;
    assert!(parse_season_json(raw).is_err());
}

#[test]
fn load_season_reads_from_disk() {
    let season = load_season(&fixture_path("season_sample.json")).expect("load");
    assert_eq!(season.matches().count(), 4);
    let err = load_season(&fixture_path("missing.json")).expect_err("missing file");
    assert!(format!("{err:#}").contains("missing.json"));
}
