use std::collections::{BTreeMap, HashMap};
use std::fmt;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::StudyConfig;
use crate::season::{Match, Player, Season, Side};

const DAYS_PER_YEAR: f64 = 365.25;

const YOUNG_MAX_AGE: f64 = 26.0;
const YOUNG_MAX_AGE_DIFF: f64 = -0.75;
const EXPERIENCED_MIN_AGE: f64 = 26.5;

pub const BALANCED_RATING_THRESHOLD: f64 = 5.0;
pub const IMBALANCED_RATING_THRESHOLD: f64 = 7.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMatchRecord {
    pub season: String,
    pub match_id: String,
    pub team: Side,
    pub points: u8,
    pub age_mean: f64,
    pub rating_mean: f64,
    pub players_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperienceRow {
    pub season: String,
    pub match_id: String,
    pub team: Side,
    pub points: u8,
    pub age_mean: f64,
    pub rating_mean: f64,
    pub age_diff: f64,
    pub rating_diff: f64,
}

pub fn age_in_years(dob: NaiveDateTime, at: NaiveDateTime) -> f64 {
    (at - dob).num_days() as f64 / DAYS_PER_YEAR
}

/// Mean age and rating of one side's lineup. Players without a birth date or a rating
/// are skipped; `None` when too few usable players remain.
pub fn team_match_record(
    season_id: &str,
    m: &Match,
    side: Side,
    players: &HashMap<&str, &Player>,
    cfg: &StudyConfig,
) -> Result<Option<TeamMatchRecord>> {
    let kickoff = m.kickoff()?;
    let mut ages = Vec::new();
    let mut ratings = Vec::new();
    let mut unknown = 0usize;

    for href in m.lineup(side) {
        let Some(player) = players.get(href.as_str()) else {
            unknown += 1;
            continue;
        };
        let Some(rating) = player.elo else {
            continue;
        };
        let Some(dob) = player.birth_date() else {
            continue;
        };
        let dob = dob.with_context(|| format!("match {} lineup", m.id))?;
        ages.push(age_in_years(dob, kickoff));
        ratings.push(rating);
    }
    if unknown > 0 {
        log::warn!("match {} {side}: {unknown} lineup entries not in the player list", m.id);
    }

    if ages.len() < cfg.min_lineup_players || ages.is_empty() {
        log::debug!(
            "match {} {}: {} usable lineup players, record dropped",
            m.id,
            side,
            ages.len()
        );
        return Ok(None);
    }

    let n = ages.len() as f64;
    Ok(Some(TeamMatchRecord {
        season: season_id.to_string(),
        match_id: m.id.clone(),
        team: side,
        points: m.points(side),
        age_mean: ages.iter().sum::<f64>() / n,
        rating_mean: ratings.iter().sum::<f64>() / n,
        players_used: ages.len(),
    }))
}

fn paired_row(own: &TeamMatchRecord, opp: &TeamMatchRecord) -> ExperienceRow {
    ExperienceRow {
        season: own.season.clone(),
        match_id: own.match_id.clone(),
        team: own.team,
        points: own.points,
        age_mean: own.age_mean,
        rating_mean: own.rating_mean,
        age_diff: own.age_mean - opp.age_mean,
        rating_diff: own.rating_mean - opp.rating_mean,
    }
}

pub fn build_experience_table(seasons: &[Season], cfg: &StudyConfig) -> Result<Vec<ExperienceRow>> {
    let mut rows = Vec::new();
    for season in seasons {
        let players = season.player_index();
        let mut dropped = 0usize;
        for m in season.matches() {
            let home = team_match_record(&season.season_id, m, Side::Home, &players, cfg)?;
            let away = team_match_record(&season.season_id, m, Side::Away, &players, cfg)?;
            match (home, away) {
                (Some(home), Some(away)) => {
                    rows.push(paired_row(&home, &away));
                    rows.push(paired_row(&away, &home));
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            log::info!(
                "season {}: {dropped} matches without two usable lineups",
                season.season_id
            );
        }
    }
    Ok(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AgeGroup {
    Young,
    Experienced,
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeGroup::Young => f.write_str("Young"),
            AgeGroup::Experienced => f.write_str("Experienced"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RatingContext {
    Advantage,
    Disadvantage,
}

impl fmt::Display for RatingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingContext::Advantage => f.write_str("With advantage"),
            RatingContext::Disadvantage => f.write_str("With disadvantage"),
        }
    }
}

pub fn classify_age_group(row: &ExperienceRow) -> Option<AgeGroup> {
    if row.age_mean <= YOUNG_MAX_AGE && row.age_diff <= YOUNG_MAX_AGE_DIFF {
        Some(AgeGroup::Young)
    } else if row.age_mean > EXPERIENCED_MIN_AGE {
        Some(AgeGroup::Experienced)
    } else {
        None
    }
}

pub fn rating_context(row: &ExperienceRow) -> RatingContext {
    if row.rating_diff > 0.0 {
        RatingContext::Advantage
    } else {
        RatingContext::Disadvantage
    }
}

pub fn balanced(rows: &[ExperienceRow], threshold: f64) -> impl Iterator<Item = &ExperienceRow> {
    rows.iter().filter(move |r| r.rating_diff.abs() < threshold)
}

pub fn imbalanced(rows: &[ExperienceRow], threshold: f64) -> impl Iterator<Item = &ExperienceRow> {
    rows.iter().filter(move |r| r.rating_diff.abs() > threshold)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub context: Option<RatingContext>,
    pub group: AgeGroup,
    pub matches: usize,
}

pub fn balanced_group_counts(rows: &[ExperienceRow], threshold: f64) -> Vec<GroupCount> {
    let mut counts: BTreeMap<AgeGroup, usize> = BTreeMap::new();
    for group in balanced(rows, threshold).filter_map(classify_age_group) {
        *counts.entry(group).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(group, matches)| GroupCount {
            context: None,
            group,
            matches,
        })
        .collect()
}

pub fn imbalanced_group_counts(rows: &[ExperienceRow], threshold: f64) -> Vec<GroupCount> {
    let mut counts: BTreeMap<(RatingContext, AgeGroup), usize> = BTreeMap::new();
    for row in imbalanced(rows, threshold) {
        let Some(group) = classify_age_group(row) else {
            continue;
        };
        *counts.entry((rating_context(row), group)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((context, group), matches)| GroupCount {
            context: Some(context),
            group,
            matches,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsShare {
    pub group: AgeGroup,
    pub points: u8,
    pub count: usize,
    pub share: f64,
}

/// Share of 0/1/3-point results within each age group present in `rows`.
pub fn points_distribution<'a>(rows: impl IntoIterator<Item = &'a ExperienceRow>) -> Vec<PointsShare> {
    let mut counts: BTreeMap<AgeGroup, BTreeMap<u8, usize>> = BTreeMap::new();
    for row in rows {
        let Some(group) = classify_age_group(row) else {
            continue;
        };
        *counts.entry(group).or_default().entry(row.points).or_insert(0) += 1;
    }

    let mut out = Vec::new();
    for (group, by_points) in counts {
        let total: usize = by_points.values().sum();
        if total == 0 {
            continue;
        }
        for points in [0u8, 1, 3] {
            let count = by_points.get(&points).copied().unwrap_or(0);
            out.push(PointsShare {
                group,
                points,
                count,
                share: count as f64 / total as f64,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{AgeGroup, ExperienceRow, classify_age_group};
    use crate::season::Side;

    fn row(age_mean: f64, age_diff: f64) -> ExperienceRow {
        ExperienceRow {
            season: "s".to_string(),
            match_id: "m".to_string(),
            team: Side::Home,
            points: 3,
            age_mean,
            rating_mean: 70.0,
            age_diff,
            rating_diff: 0.0,
        }
    }

    #[test]
    fn age_groups_follow_thresholds() {
        assert_eq!(classify_age_group(&row(25.0, -1.0)), Some(AgeGroup::Young));
        assert_eq!(classify_age_group(&row(25.0, 0.0)), None);
        assert_eq!(classify_age_group(&row(26.4, 1.0)), None);
        assert_eq!(classify_age_group(&row(27.0, 0.2)), Some(AgeGroup::Experienced));
    }
}
