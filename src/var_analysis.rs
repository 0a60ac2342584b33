use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::StudyConfig;
use crate::match_state::GameState;
use crate::season::{MatchLookup, Season, Side, build_match_lookup};
use crate::stats::{self, FiveNumber};
use crate::time_to_event::time_to_concede;
use crate::var_matching::{
    ControlMatcher, MatchingReport, SampledControl, TreatmentCase, build_control_candidates,
    extract_treatment_cases,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Group {
    #[serde(rename = "VAR")]
    Var,
    #[serde(rename = "CONTROL")]
    Control,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Var, Group::Control];

    pub fn label(self) -> &'static str {
        match self {
            Group::Var => "VAR",
            Group::Control => "CONTROL",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub group: Group,
    pub match_id: String,
    pub minute: u16,
    pub team: Side,
    pub state: GameState,
    pub horizon: u16,
    pub t_event: u16,
    pub event_occurred: u8,
}

pub fn build_var_analysis(
    cases: &[TreatmentCase],
    lookup: &MatchLookup<'_>,
    cfg: &StudyConfig,
) -> Result<Vec<AnalysisRow>> {
    let mut rows = Vec::new();
    for case in cases {
        if case.minute < cfg.min_analysis_minute {
            continue;
        }
        let Some(horizon) = cfg.analysis_horizon(case.minute) else {
            continue;
        };
        let m = lookup.get(&case.match_id).context("treatment case")?;
        let (t_event, event_occurred) =
            time_to_concede(&m.events, case.minute, case.team, horizon, cfg.match_end_minute);
        rows.push(AnalysisRow {
            group: Group::Var,
            match_id: case.match_id.clone(),
            minute: case.minute,
            team: case.team,
            state: case.state,
            horizon,
            t_event,
            event_occurred,
        });
    }
    Ok(rows)
}

/// Controls share their case's horizon but are followed from their own minute.
pub fn build_control_analysis(
    controls: &[SampledControl],
    lookup: &MatchLookup<'_>,
    cfg: &StudyConfig,
) -> Result<Vec<AnalysisRow>> {
    let mut rows = Vec::new();
    for control in controls {
        if control.case_minute < cfg.min_analysis_minute {
            continue;
        }
        let Some(horizon) = cfg.analysis_horizon(control.case_minute) else {
            continue;
        };
        let c = &control.candidate;
        let m = lookup.get(&c.match_id).context("sampled control")?;
        let (t_event, event_occurred) =
            time_to_concede(&m.events, c.minute, c.team, horizon, cfg.match_end_minute);
        rows.push(AnalysisRow {
            group: Group::Control,
            match_id: c.match_id.clone(),
            minute: c.minute,
            team: c.team,
            state: c.state,
            horizon,
            t_event,
            event_occurred,
        });
    }
    Ok(rows)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub t: u16,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeCurve {
    pub group: Group,
    pub samples: usize,
    pub points: Vec<CurvePoint>,
}

/// Share of rows that conceded within `t` minutes, for every `t` in `0..=max_t`.
pub fn cumulative_curve<'a>(
    rows: impl IntoIterator<Item = &'a AnalysisRow>,
    max_t: u16,
) -> Option<Vec<CurvePoint>> {
    let rows: Vec<&AnalysisRow> = rows.into_iter().collect();
    if rows.is_empty() {
        return None;
    }
    let n = rows.len() as f64;
    let points = (0..=max_t)
        .map(|t| {
            let hits = rows
                .iter()
                .filter(|r| r.event_occurred == 1 && r.t_event <= t)
                .count();
            CurvePoint {
                t,
                probability: hits as f64 / n,
            }
        })
        .collect();
    Some(points)
}

pub fn build_cumulative_curves(rows: &[AnalysisRow], max_t: u16) -> Vec<CumulativeCurve> {
    Group::ALL
        .into_iter()
        .filter_map(|group| {
            let members = rows.iter().filter(|r| r.group == group);
            let samples = members.clone().count();
            let points = cumulative_curve(members, max_t)?;
            Some(CumulativeCurve {
                group,
                samples,
                points,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateInteraction {
    pub state: GameState,
    pub group: Group,
    pub samples: usize,
    pub probability: f64,
}

/// Probability of conceding within `horizon` per (state, group); empty cells are omitted.
pub fn state_interaction(rows: &[AnalysisRow], horizon: u16) -> Vec<StateInteraction> {
    let mut out = Vec::new();
    for state in GameState::ALL {
        for group in Group::ALL {
            let cell: Vec<&AnalysisRow> = rows
                .iter()
                .filter(|r| r.state == state && r.group == group)
                .collect();
            if cell.is_empty() {
                continue;
            }
            let hits = cell
                .iter()
                .filter(|r| r.event_occurred == 1 && r.t_event <= horizon)
                .count();
            out.push(StateInteraction {
                state,
                group,
                samples: cell.len(),
                probability: hits as f64 / cell.len() as f64,
            });
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteBin {
    pub start: u16,
    pub end: u16,
    pub count: usize,
}

pub fn minute_histogram(cases: &[TreatmentCase], bin_width: u16) -> Vec<MinuteBin> {
    let width = bin_width.max(1);
    let Some(last) = cases.iter().map(|c| c.minute).max() else {
        return Vec::new();
    };
    let mut bins = Vec::new();
    let mut start = 0u16;
    while start <= last {
        let end = start.saturating_add(width - 1);
        let count = cases
            .iter()
            .filter(|c| c.minute >= start && c.minute <= end)
            .count();
        bins.push(MinuteBin { start, end, count });
        start = start.saturating_add(width);
        if end == u16::MAX {
            break;
        }
    }
    bins
}

pub fn state_distribution(cases: &[TreatmentCase]) -> Vec<(GameState, usize)> {
    GameState::ALL
        .into_iter()
        .map(|state| (state, cases.iter().filter(|c| c.state == state).count()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTimeSummary {
    pub group: Group,
    pub summary: FiveNumber,
}

/// Spread of observed times-to-concede per group; censored rows are not counted.
pub fn time_to_goal_summary(rows: &[AnalysisRow], max_t: u16) -> Vec<GroupTimeSummary> {
    Group::ALL
        .into_iter()
        .filter_map(|group| {
            let times: Vec<f64> = rows
                .iter()
                .filter(|r| r.group == group && r.event_occurred == 1 && r.t_event <= max_t)
                .map(|r| f64::from(r.t_event))
                .collect();
            let summary = stats::five_number_summary(&times)?;
            Some(GroupTimeSummary { group, summary })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct VarStudy {
    pub cases: Vec<TreatmentCase>,
    pub candidates: usize,
    pub controls: Vec<SampledControl>,
    pub report: MatchingReport,
    pub analysis: Vec<AnalysisRow>,
    pub curves: Vec<CumulativeCurve>,
}

pub fn run_var_study(
    seasons: &[Season],
    matcher: &ControlMatcher,
    cfg: &StudyConfig,
) -> Result<VarStudy> {
    let lookup = build_match_lookup(seasons);
    let cases = extract_treatment_cases(seasons, cfg);
    let candidates = build_control_candidates(seasons, matcher.bin, cfg);
    let (controls, report) = matcher.match_controls(&cases, &candidates);

    let mut analysis = build_var_analysis(&cases, &lookup, cfg)?;
    analysis.extend(build_control_analysis(&controls, &lookup, cfg)?);
    let curves = build_cumulative_curves(&analysis, cfg.max_analysis_window);

    log::info!(
        "var study: {} cases, {} candidates, {} controls sampled, {} analysis rows",
        cases.len(),
        candidates.len(),
        controls.len(),
        analysis.len()
    );

    Ok(VarStudy {
        cases,
        candidates: candidates.len(),
        controls,
        report,
        analysis,
        curves,
    })
}
