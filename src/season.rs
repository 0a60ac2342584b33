use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "Goal")]
    Goal,
    #[serde(rename = "Goal from penalty")]
    PenaltyGoal,
    #[serde(rename = "Own goal")]
    OwnGoal,
    #[serde(rename = "Yellow card")]
    YellowCard,
    #[serde(rename = "Red card")]
    RedCard,
    #[serde(rename = "2nd yellow card leads to red card")]
    SecondYellowRed,
    #[serde(rename = "Goal disallowed")]
    GoalDisallowed,
    #[serde(rename = "Goal disallowed by VAR")]
    GoalDisallowedByVar,
    #[serde(rename = "Missed penalty")]
    MissedPenalty,
    #[serde(rename = "Penalty saved")]
    PenaltySaved,
    #[serde(other)]
    Other,
}

impl EventKind {
    pub fn is_goal(self) -> bool {
        matches!(
            self,
            EventKind::Goal | EventKind::PenaltyGoal | EventKind::OwnGoal
        )
    }

    pub fn is_card(self) -> bool {
        matches!(
            self,
            EventKind::YellowCard | EventKind::RedCard | EventKind::SecondYellowRed
        )
    }

    pub fn is_dismissal(self) -> bool {
        matches!(self, EventKind::RedCard | EventKind::SecondYellowRed)
    }

    pub fn is_disallowed_goal(self) -> bool {
        matches!(
            self,
            EventKind::GoalDisallowed | EventKind::GoalDisallowedByVar
        )
    }

    /// Events that disqualify nearby minutes from serving as controls.
    pub fn is_confounder(self) -> bool {
        self.is_goal()
            || self.is_disallowed_goal()
            || self.is_dismissal()
            || matches!(self, EventKind::MissedPenalty | EventKind::PenaltySaved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub minute: u16,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub team: Side,
}

impl Event {
    pub fn new(minute: u16, kind: EventKind, team: Side) -> Self {
        Self { minute, kind, team }
    }

    // Own goals are tagged with the side whose player scored them.
    pub fn scoring_side(&self) -> Option<Side> {
        match self.kind {
            EventKind::Goal | EventKind::PenaltyGoal => Some(self.team),
            EventKind::OwnGoal => Some(self.team.opponent()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub date_time: String,
    pub result: (u16, u16),
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub home_lineup: Vec<String>,
    #[serde(default)]
    pub away_lineup: Vec<String>,
}

impl Match {
    pub fn kickoff(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.date_time)
            .with_context(|| format!("match {}: invalid date_time", self.id))
    }

    pub fn lineup(&self, side: Side) -> &[String] {
        match side {
            Side::Home => &self.home_lineup,
            Side::Away => &self.away_lineup,
        }
    }

    pub fn points(&self, side: Side) -> u8 {
        let (home, away) = self.result;
        let (own, opp) = match side {
            Side::Home => (home, away),
            Side::Away => (away, home),
        };
        if own > opp {
            3
        } else if own == opp {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub href: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub elo: Option<f64>,
}

impl Player {
    pub fn birth_date(&self) -> Option<Result<NaiveDateTime>> {
        let raw = self.dob.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some(parse_timestamp(raw).with_context(|| format!("player {}: invalid dob", self.href)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    #[serde(default)]
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub season_id: String,
    #[serde(default)]
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Season {
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.iter().flat_map(|round| round.matches.iter())
    }

    pub fn player_index(&self) -> HashMap<&str, &Player> {
        self.players
            .iter()
            .map(|player| (player.href.as_str(), player))
            .collect()
    }
}

pub struct MatchLookup<'a> {
    by_id: HashMap<&'a str, &'a Match>,
}

impl<'a> MatchLookup<'a> {
    pub fn get(&self, match_id: &str) -> Result<&'a Match> {
        self.by_id
            .get(match_id)
            .copied()
            .ok_or_else(|| anyhow!("match {match_id} not found in loaded seasons"))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

pub fn build_match_lookup(seasons: &[Season]) -> MatchLookup<'_> {
    let mut by_id = HashMap::new();
    for season in seasons {
        for m in season.matches() {
            by_id.insert(m.id.as_str(), m);
        }
    }
    MatchLookup { by_id }
}

pub fn parse_season_json(raw: &str) -> Result<Season> {
    let season: Season = serde_json::from_str(raw.trim()).context("invalid season json")?;
    for m in season.matches() {
        m.kickoff()?;
    }
    Ok(season)
}

pub fn load_season(path: &Path) -> Result<Season> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read season file {}", path.display()))?;
    let season =
        parse_season_json(&raw).with_context(|| format!("parse season file {}", path.display()))?;
    log::debug!(
        "loaded season {} ({} matches, {} players) from {}",
        season.season_id,
        season.matches().count(),
        season.players.len(),
        path.display()
    );
    Ok(season)
}

pub fn load_seasons<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Season>> {
    paths.iter().map(|p| load_season(p.as_ref())).collect()
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        // Wall-clock time of the fixture; the offset is irrelevant for ages in days.
        return Ok(dt.naive_local());
    }
    let stripped = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(stripped, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(stripped, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("unrecognized timestamp {raw:?}"))
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, parse_timestamp};

    #[test]
    fn parse_timestamp_variants() {
        let a = parse_timestamp("2019-08-16T19:00:00Z").expect("zulu");
        let b = parse_timestamp("2019-08-16T19:00:00").expect("naive");
        let c = parse_timestamp("2019-08-16T19:00:00+02:00").expect("offset");
        assert_eq!(a, b);
        assert_eq!(a, c);
        let d = parse_timestamp("1990-02-03").expect("date only");
        assert_eq!(d.to_string(), "1990-02-03 00:00:00");
        assert!(parse_timestamp("16/08/2019").is_err());
    }

    #[test]
    fn unknown_event_types_map_to_other() {
        let kind: EventKind = serde_json::from_str("\"Substitution\"").expect("other");
        assert_eq!(kind, EventKind::Other);
        let kind: EventKind = serde_json::from_str("\"Goal disallowed by VAR\"").expect("var");
        assert_eq!(kind, EventKind::GoalDisallowedByVar);
    }
}
