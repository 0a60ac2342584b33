use match_state_study::config::StudyConfig;
use match_state_study::match_state::abs_goal_diff;
use match_state_study::goleada::{GoleadaDetector, Interval, goleada_intervals, minute_in_goleada};
use match_state_study::season::{Event, EventKind, Side};

fn goal(minute: u16, team: Side) -> Event {
    Event::new(minute, EventKind::Goal, team)
}

#[test]
fn no_goals_no_intervals() {
    assert!(goleada_intervals(&[]).is_empty());
    let close = vec![goal(10, Side::Home), goal(20, Side::Away), goal(30, Side::Home)];
    assert!(goleada_intervals(&close).is_empty());
}

#[test]
fn third_goal_opens_interval_until_full_time() {
    let events = vec![
        goal(10, Side::Home),
        goal(50, Side::Home),
        goal(51, Side::Home),
    ];
    assert_eq!(goleada_intervals(&events), vec![Interval { start: 52, end: 90 }]);
}

#[test]
fn comeback_closes_interval() {
    let events = vec![
        goal(5, Side::Home),
        goal(10, Side::Home),
        goal(15, Side::Home),
        goal(40, Side::Away),
    ];
    assert_eq!(goleada_intervals(&events), vec![Interval { start: 16, end: 40 }]);
}

#[test]
fn interval_can_reopen() {
    let events = vec![
        goal(5, Side::Home),
        goal(10, Side::Home),
        goal(15, Side::Home),
        goal(40, Side::Away),
        goal(70, Side::Home),
    ];
    assert_eq!(
        goleada_intervals(&events),
        vec![Interval { start: 16, end: 40 }, Interval { start: 71, end: 90 }]
    );
}

#[test]
fn lopsided_from_kickoff_starts_at_first_minute() {
    let events = vec![goal(0, Side::Away), goal(0, Side::Away), goal(0, Side::Away)];
    assert_eq!(goleada_intervals(&events), vec![Interval { start: 1, end: 90 }]);
}

#[test]
fn late_third_goal_gives_single_minute_interval() {
    let events = vec![goal(88, Side::Home), goal(89, Side::Home), goal(90, Side::Home)];
    let intervals = goleada_intervals(&events);
    assert_eq!(intervals, vec![Interval { start: 90, end: 90 }]);
    assert_eq!(intervals[0].len(), 1);
    assert!(minute_in_goleada(93, &intervals, 90));
}

#[test]
fn threshold_comes_from_config() {
    let cfg = StudyConfig {
        goleada_threshold: 2,
        ..StudyConfig::default()
    };
    let detector = GoleadaDetector::from_config(&cfg);
    let events = vec![goal(10, Side::Home), goal(20, Side::Home)];
    let intervals = detector.intervals(&events);
    assert_eq!(intervals, vec![Interval { start: 21, end: 90 }]);
    assert!(detector.minute_in_goleada(21, &intervals));
    assert!(!detector.minute_in_goleada(20, &intervals));
}

#[test]
fn interval_covers_the_minute_a_lead_is_cut() {
    let events = vec![
        goal(10, Side::Home),
        goal(50, Side::Home),
        goal(51, Side::Home),
        goal(70, Side::Away),
    ];
    let intervals = goleada_intervals(&events);
    assert_eq!(intervals, vec![Interval { start: 52, end: 70 }]);
    // Minute 70 starts at 3-0; the away goal only counts from minute 71.
    assert_eq!(abs_goal_diff(&events, 70), 3);
    assert_eq!(abs_goal_diff(&events, 71), 2);
}
