use crate::season::{Event, EventKind, Side};

/// True when `e` is a goal against `team`: an opponent's goal, or `team`'s own goal.
pub fn is_conceded_by(e: &Event, team: Side) -> bool {
    match e.kind {
        EventKind::Goal | EventKind::PenaltyGoal => e.team != team,
        EventKind::OwnGoal => e.team == team,
        _ => false,
    }
}

/// Minutes until `team` next concedes within `t_max`, as `(t_event, occurred)`.
/// Right-censored observations come back as `(t_max, 0)`.
pub fn time_to_concede(
    events: &[Event],
    minute_event: u16,
    team: Side,
    t_max: u16,
    end_minute: u16,
) -> (u16, u8) {
    let first = events
        .iter()
        .filter(|e| e.minute > minute_event && e.minute <= end_minute)
        .filter(|e| is_conceded_by(e, team))
        .map(|e| e.minute)
        .min();

    match first {
        Some(minute) if minute - minute_event <= t_max => (minute - minute_event, 1),
        _ => (t_max, 0),
    }
}
