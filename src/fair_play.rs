use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::StudyConfig;
use crate::goleada::{GoleadaDetector, Interval};
use crate::match_state::abs_goal_diff;
use crate::season::{Event, EventKind, Season};
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CardKind {
    Yellow,
    Red,
    SecondYellowRed,
}

impl CardKind {
    pub const ALL: [CardKind; 3] = [CardKind::Yellow, CardKind::Red, CardKind::SecondYellowRed];

    pub fn from_event(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::YellowCard => Some(CardKind::Yellow),
            EventKind::RedCard => Some(CardKind::Red),
            EventKind::SecondYellowRed => Some(CardKind::SecondYellowRed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FairPlayAccumulator {
    pub minutes_by_diff: BTreeMap<u16, u32>,
    pub cards_by_diff: BTreeMap<CardKind, BTreeMap<u16, u32>>,
    pub minutes_outside: u32,
    pub cards_outside: BTreeMap<CardKind, u32>,
}

impl FairPlayAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards_at(&self, kind: CardKind, diff: u16) -> u32 {
        self.cards_by_diff
            .get(&kind)
            .and_then(|by_diff| by_diff.get(&diff))
            .copied()
            .unwrap_or(0)
    }

    pub fn outside_cards(&self, kind: CardKind) -> u32 {
        self.cards_outside.get(&kind).copied().unwrap_or(0)
    }

    pub fn goleada_minutes(&self) -> u32 {
        self.minutes_by_diff.values().sum()
    }
}

/// Runs the four accumulation passes over one match's events.
#[derive(Debug, Clone, Copy)]
pub struct FairPlayAggregator {
    detector: GoleadaDetector,
}

impl FairPlayAggregator {
    pub fn new(cfg: &StudyConfig) -> Self {
        Self {
            detector: GoleadaDetector::from_config(cfg),
        }
    }

    pub fn accumulate_minutes_by_diff(&self, events: &[Event], acc: &mut FairPlayAccumulator) {
        let intervals = self.detector.intervals(events);
        self.minutes_by_diff(events, &intervals, acc);
    }

    pub fn accumulate_cards_by_diff(&self, events: &[Event], acc: &mut FairPlayAccumulator) {
        let intervals = self.detector.intervals(events);
        self.cards_by_diff(events, &intervals, acc);
    }

    pub fn accumulate_minutes_outside(&self, events: &[Event], acc: &mut FairPlayAccumulator) {
        let intervals = self.detector.intervals(events);
        self.minutes_outside(events, &intervals, acc);
    }

    pub fn accumulate_cards_outside(&self, events: &[Event], acc: &mut FairPlayAccumulator) {
        let intervals = self.detector.intervals(events);
        self.cards_outside(events, &intervals, acc);
    }

    pub fn accumulate_match(&self, events: &[Event], acc: &mut FairPlayAccumulator) {
        let intervals = self.detector.intervals(events);
        self.minutes_by_diff(events, &intervals, acc);
        self.cards_by_diff(events, &intervals, acc);
        self.minutes_outside(events, &intervals, acc);
        self.cards_outside(events, &intervals, acc);
    }

    fn minutes_by_diff(&self, events: &[Event], intervals: &[Interval], acc: &mut FairPlayAccumulator) {
        for iv in intervals {
            for minute in iv.start..=iv.end {
                let diff = abs_goal_diff(events, minute);
                if !self.detector.is_lopsided(diff) {
                    continue;
                }
                *acc.minutes_by_diff.entry(diff).or_insert(0) += 1;
            }
        }
    }

    fn cards_by_diff(&self, events: &[Event], intervals: &[Interval], acc: &mut FairPlayAccumulator) {
        if intervals.is_empty() {
            return;
        }
        for e in events {
            let Some(card) = CardKind::from_event(e.kind) else {
                continue;
            };
            if !self.detector.minute_in_goleada(e.minute, intervals) {
                continue;
            }
            let diff = abs_goal_diff(events, e.minute);
            if !self.detector.is_lopsided(diff) {
                continue;
            }
            *acc.cards_by_diff
                .entry(card)
                .or_default()
                .entry(diff)
                .or_insert(0) += 1;
        }
    }

    fn minutes_outside(&self, events: &[Event], intervals: &[Interval], acc: &mut FairPlayAccumulator) {
        for minute in self.detector.start_minute..=self.detector.end_minute {
            if self.detector.minute_in_goleada(minute, intervals) {
                continue;
            }
            if !self.detector.is_lopsided(abs_goal_diff(events, minute)) {
                acc.minutes_outside += 1;
            }
        }
    }

    fn cards_outside(&self, events: &[Event], intervals: &[Interval], acc: &mut FairPlayAccumulator) {
        for e in events {
            let Some(card) = CardKind::from_event(e.kind) else {
                continue;
            };
            if self.detector.minute_in_goleada(e.minute, intervals) {
                continue;
            }
            if !self.detector.is_lopsided(abs_goal_diff(events, e.minute)) {
                *acc.cards_outside.entry(card).or_insert(0) += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiffBucket {
    Lopsided(u16),
    Outside,
}

impl fmt::Display for DiffBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffBucket::Lopsided(diff) => write!(f, "{diff}"),
            DiffBucket::Outside => f.write_str("outside"),
        }
    }
}

impl Serialize for DiffBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DiffBucket::Lopsided(diff) => serializer.serialize_u16(*diff),
            DiffBucket::Outside => serializer.serialize_str("outside"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FairPlayRow {
    pub season: String,
    pub diff: DiffBucket,
    pub minutes: u32,
    pub yellow: u32,
    pub red: u32,
    pub second_yellow_red: u32,
}

pub fn fair_play_rows(season_id: &str, acc: &FairPlayAccumulator, threshold: u16) -> Vec<FairPlayRow> {
    let mut rows = Vec::new();
    for (&diff, &minutes) in acc.minutes_by_diff.range(threshold..) {
        rows.push(FairPlayRow {
            season: season_id.to_string(),
            diff: DiffBucket::Lopsided(diff),
            minutes,
            yellow: acc.cards_at(CardKind::Yellow, diff),
            red: acc.cards_at(CardKind::Red, diff),
            second_yellow_red: acc.cards_at(CardKind::SecondYellowRed, diff),
        });
    }
    rows.push(FairPlayRow {
        season: season_id.to_string(),
        diff: DiffBucket::Outside,
        minutes: acc.minutes_outside,
        yellow: acc.outside_cards(CardKind::Yellow),
        red: acc.outside_cards(CardKind::Red),
        second_yellow_red: acc.outside_cards(CardKind::SecondYellowRed),
    });
    rows
}

pub fn accumulate_season(season: &Season, cfg: &StudyConfig) -> FairPlayAccumulator {
    let aggregator = FairPlayAggregator::new(cfg);
    let mut acc = FairPlayAccumulator::new();
    for m in season.matches() {
        aggregator.accumulate_match(&m.events, &mut acc);
    }
    acc
}

pub fn build_fair_play_table(seasons: &[Season], cfg: &StudyConfig) -> Vec<FairPlayRow> {
    let mut rows = Vec::new();
    for season in seasons {
        let acc = accumulate_season(season, cfg);
        log::debug!(
            "fair play {}: {} lopsided minutes across {} buckets, {} outside",
            season.season_id,
            acc.goleada_minutes(),
            acc.minutes_by_diff.len(),
            acc.minutes_outside
        );
        rows.extend(fair_play_rows(&season.season_id, &acc, cfg.goleada_threshold));
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonYellowRate {
    pub season: String,
    pub goleada_minutes: u32,
    pub goleada_yellows: u32,
    pub outside_minutes: u32,
    pub outside_yellows: u32,
    pub rate_goleada: f64,
    pub rate_outside: f64,
    pub ratio: Option<f64>,
    pub minutes_per_yellow_goleada: Option<f64>,
    pub minutes_per_yellow_outside: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct SeasonTotals {
    goleada_minutes: u32,
    goleada_yellows: u32,
    outside_minutes: u32,
    outside_yellows: u32,
}

fn totals_by_season(rows: &[FairPlayRow]) -> Vec<(String, SeasonTotals)> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: BTreeMap<String, SeasonTotals> = BTreeMap::new();
    for row in rows {
        if !totals.contains_key(&row.season) {
            order.push(row.season.clone());
        }
        let t = totals.entry(row.season.clone()).or_default();
        match row.diff {
            DiffBucket::Lopsided(_) => {
                t.goleada_minutes += row.minutes;
                t.goleada_yellows += row.yellow;
            }
            DiffBucket::Outside => {
                t.outside_minutes += row.minutes;
                t.outside_yellows += row.yellow;
            }
        }
    }
    order
        .into_iter()
        .filter_map(|season| {
            let t = totals.get(&season).copied()?;
            Some((season, t))
        })
        .collect()
}

/// Yellow-card rates inside vs outside lopsided play. Seasons without minutes on
/// either side are left out.
pub fn season_yellow_rates(rows: &[FairPlayRow]) -> Vec<SeasonYellowRate> {
    totals_by_season(rows)
        .into_iter()
        .filter(|(_, t)| t.goleada_minutes > 0 && t.outside_minutes > 0)
        .map(|(season, t)| {
            let rate_goleada = f64::from(t.goleada_yellows) / f64::from(t.goleada_minutes);
            let rate_outside = f64::from(t.outside_yellows) / f64::from(t.outside_minutes);
            SeasonYellowRate {
                season,
                goleada_minutes: t.goleada_minutes,
                goleada_yellows: t.goleada_yellows,
                outside_minutes: t.outside_minutes,
                outside_yellows: t.outside_yellows,
                rate_goleada,
                rate_outside,
                ratio: stats::checked_ratio(rate_goleada, rate_outside),
                minutes_per_yellow_goleada: stats::checked_ratio(
                    f64::from(t.goleada_minutes),
                    f64::from(t.goleada_yellows),
                ),
                minutes_per_yellow_outside: stats::checked_ratio(
                    f64::from(t.outside_minutes),
                    f64::from(t.outside_yellows),
                ),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonMetric {
    GoleadaMinutes,
    GoleadaYellows,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTotal {
    pub season: String,
    pub value: u32,
}

pub fn season_totals(rows: &[FairPlayRow], metric: SeasonMetric) -> Vec<SeasonTotal> {
    totals_by_season(rows)
        .into_iter()
        .map(|(season, t)| SeasonTotal {
            season,
            value: match metric {
                SeasonMetric::GoleadaMinutes => t.goleada_minutes,
                SeasonMetric::GoleadaYellows => t.goleada_yellows,
            },
        })
        .collect()
}

/// Seasons whose lopsided-play total falls outside the 1.5 IQR fences.
pub fn season_outliers(rows: &[FairPlayRow], metric: SeasonMetric) -> Vec<SeasonTotal> {
    let totals = season_totals(rows, metric);
    let values: Vec<f64> = totals.iter().map(|t| f64::from(t.value)).collect();
    let Some((lower, upper)) = stats::iqr_fences(&values) else {
        return Vec::new();
    };
    totals
        .into_iter()
        .filter(|t| {
            let v = f64::from(t.value);
            v < lower || v > upper
        })
        .collect()
}
