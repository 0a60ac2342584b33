use std::fmt;

use serde::{Deserialize, Serialize};

use crate::season::{Event, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Winning,
    Drawing,
    Losing,
}

impl GameState {
    pub const ALL: [GameState; 3] = [GameState::Winning, GameState::Drawing, GameState::Losing];

    pub fn from_goal_diff(diff: i32) -> Self {
        if diff > 0 {
            GameState::Winning
        } else if diff < 0 {
            GameState::Losing
        } else {
            GameState::Drawing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameState::Winning => "winning",
            GameState::Drawing => "drawing",
            GameState::Losing => "losing",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchStateSnapshot {
    pub home_goals: u16,
    pub away_goals: u16,
    pub home_on_field: u8,
    pub away_on_field: u8,
    pub team_players: u8,
    pub opp_players: u8,
    pub goal_diff: i32,
    pub state: GameState,
}

// Everything below reads the match "as of the start of `minute`": only events stamped
// strictly before it have happened.

pub fn score_at_minute(events: &[Event], minute: u16) -> (u16, u16) {
    let mut home_goals = 0u16;
    let mut away_goals = 0u16;
    for e in events.iter().filter(|e| e.minute < minute) {
        match e.scoring_side() {
            Some(Side::Home) => home_goals += 1,
            Some(Side::Away) => away_goals += 1,
            None => {}
        }
    }
    (home_goals, away_goals)
}

pub fn dismissals_before(events: &[Event], minute: u16) -> (u16, u16) {
    let mut home = 0u16;
    let mut away = 0u16;
    for e in events
        .iter()
        .filter(|e| e.minute < minute && e.kind.is_dismissal())
    {
        match e.team {
            Side::Home => home += 1,
            Side::Away => away += 1,
        }
    }
    (home, away)
}

/// On-field counts per side, clamped at zero.
pub fn players_on_field(events: &[Event], minute: u16, initial: u8) -> (u8, u8) {
    let (home_reds, away_reds) = dismissals_before(events, minute);
    (remaining(initial, home_reds), remaining(initial, away_reds))
}

pub fn match_state_at_minute(
    events: &[Event],
    minute: u16,
    side: Side,
    initial: u8,
) -> MatchStateSnapshot {
    let (home_goals, away_goals) = score_at_minute(events, minute);
    let (home_on_field, away_on_field) = players_on_field(events, minute, initial);

    let home_diff = i32::from(home_goals) - i32::from(away_goals);
    let (goal_diff, team_players, opp_players) = match side {
        Side::Home => (home_diff, home_on_field, away_on_field),
        Side::Away => (-home_diff, away_on_field, home_on_field),
    };

    MatchStateSnapshot {
        home_goals,
        away_goals,
        home_on_field,
        away_on_field,
        team_players,
        opp_players,
        goal_diff,
        state: GameState::from_goal_diff(goal_diff),
    }
}

pub fn abs_goal_diff(events: &[Event], minute: u16) -> u16 {
    let (home, away) = score_at_minute(events, minute);
    home.abs_diff(away)
}

fn remaining(initial: u8, dismissals: u16) -> u8 {
    let dismissals = u8::try_from(dismissals).unwrap_or(u8::MAX);
    initial.saturating_sub(dismissals)
}
