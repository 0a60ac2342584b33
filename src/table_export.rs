use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::experience::{
    self, BALANCED_RATING_THRESHOLD, ExperienceRow, GroupCount, IMBALANCED_RATING_THRESHOLD,
};
use crate::fair_play::{self, FairPlayRow};
use crate::var_analysis::{AnalysisRow, VarStudy};
use crate::var_matching::{SampledControl, TreatmentCase};

#[derive(Debug, Clone, Default)]
pub struct StudyTables {
    pub fair_play: Vec<FairPlayRow>,
    pub experience: Vec<ExperienceRow>,
    pub var: Option<VarStudy>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub sheets: Vec<(String, usize)>,
}

impl ExportReport {
    pub fn rows_in(&self, sheet: &str) -> Option<usize> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, rows)| *rows)
    }
}

enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u16> for Cell {
    fn from(value: u16) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

type Sheet = (&'static str, Vec<Vec<Cell>>);

fn header(cols: &[&str]) -> Vec<Cell> {
    cols.iter().map(|c| Cell::from(*c)).collect()
}

pub fn export_tables(path: &Path, tables: &StudyTables) -> Result<ExportReport> {
    let mut sheets: Vec<Sheet> = Vec::new();

    if !tables.fair_play.is_empty() {
        sheets.push(("FairPlay", fair_play_sheet(&tables.fair_play)));
        sheets.push(("YellowRates", yellow_rate_sheet(&tables.fair_play)));
    }
    if !tables.experience.is_empty() {
        sheets.push(("Experience", experience_sheet(&tables.experience)));
        sheets.push(("AgeGroups", group_count_sheet(&tables.experience)));
    }
    if let Some(var) = tables.var.as_ref() {
        sheets.push(("VarCases", case_sheet(&var.cases)));
        sheets.push(("VarControls", control_sheet(&var.controls)));
        sheets.push(("VarAnalysis", analysis_sheet(&var.analysis)));
        sheets.push(("VarCurves", curve_sheet(var)));
        sheets.push(("Matching", matching_sheet(var)));
    }

    let mut workbook = Workbook::new();
    let mut report = ExportReport::default();
    for (name, rows) in &sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
        report
            .sheets
            .push((name.to_string(), rows.len().saturating_sub(1)));
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(report)
}

fn fair_play_sheet(rows: &[FairPlayRow]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&[
        "Season",
        "Diff",
        "Minutes",
        "Yellow",
        "Red",
        "Second Yellow Red",
    ])];
    for row in rows {
        out.push(vec![
            row.season.clone().into(),
            row.diff.to_string().into(),
            row.minutes.into(),
            row.yellow.into(),
            row.red.into(),
            row.second_yellow_red.into(),
        ]);
    }
    out
}

fn yellow_rate_sheet(rows: &[FairPlayRow]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&[
        "Season",
        "Goleada Minutes",
        "Goleada Yellows",
        "Outside Minutes",
        "Outside Yellows",
        "Rate Goleada",
        "Rate Outside",
        "Ratio",
        "Min/Yellow Goleada",
        "Min/Yellow Outside",
    ])];
    for rate in fair_play::season_yellow_rates(rows) {
        out.push(vec![
            rate.season.into(),
            rate.goleada_minutes.into(),
            rate.goleada_yellows.into(),
            rate.outside_minutes.into(),
            rate.outside_yellows.into(),
            rate.rate_goleada.into(),
            rate.rate_outside.into(),
            rate.ratio.into(),
            rate.minutes_per_yellow_goleada.into(),
            rate.minutes_per_yellow_outside.into(),
        ]);
    }
    out
}

fn experience_sheet(rows: &[ExperienceRow]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&[
        "Season",
        "Match ID",
        "Team",
        "Points",
        "Age Mean",
        "Rating Mean",
        "Age Diff",
        "Rating Diff",
    ])];
    for row in rows {
        out.push(vec![
            row.season.clone().into(),
            row.match_id.clone().into(),
            row.team.label().into(),
            row.points.into(),
            row.age_mean.into(),
            row.rating_mean.into(),
            row.age_diff.into(),
            row.rating_diff.into(),
        ]);
    }
    out
}

fn group_count_sheet(rows: &[ExperienceRow]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&["Subset", "Context", "Age Group", "Matches"])];
    let mut push = |subset: &str, counts: Vec<GroupCount>| {
        for c in counts {
            out.push(vec![
                subset.into(),
                c.context.map(|ctx| ctx.to_string()).unwrap_or_default().into(),
                c.group.to_string().into(),
                c.matches.into(),
            ]);
        }
    };
    push(
        "balanced",
        experience::balanced_group_counts(rows, BALANCED_RATING_THRESHOLD),
    );
    push(
        "imbalanced",
        experience::imbalanced_group_counts(rows, IMBALANCED_RATING_THRESHOLD),
    );
    out
}

fn case_sheet(cases: &[TreatmentCase]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&[
        "Season",
        "Match ID",
        "Minute",
        "Team",
        "Home Goals",
        "Away Goals",
        "Goal Diff",
        "State",
        "Team Players",
        "Opp Players",
    ])];
    for c in cases {
        out.push(vec![
            c.season.clone().into(),
            c.match_id.clone().into(),
            c.minute.into(),
            c.team.label().into(),
            c.home_goals.into(),
            c.away_goals.into(),
            c.goal_diff.into(),
            c.state.label().into(),
            c.team_players.into(),
            c.opp_players.into(),
        ]);
    }
    out
}

fn control_sheet(controls: &[SampledControl]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&[
        "Season",
        "Match ID",
        "Minute",
        "Team",
        "State",
        "Goal Diff",
        "Team Players",
        "Opp Players",
        "Case Minute",
    ])];
    for s in controls {
        let c = &s.candidate;
        out.push(vec![
            c.season.clone().into(),
            c.match_id.clone().into(),
            c.minute.into(),
            c.team.label().into(),
            c.state.label().into(),
            c.goal_diff.into(),
            c.team_players.into(),
            c.opp_players.into(),
            s.case_minute.into(),
        ]);
    }
    out
}

fn analysis_sheet(rows: &[AnalysisRow]) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&[
        "Group",
        "Match ID",
        "Minute",
        "Team",
        "State",
        "Horizon",
        "T Event",
        "Event Occurred",
    ])];
    for r in rows {
        out.push(vec![
            r.group.label().into(),
            r.match_id.clone().into(),
            r.minute.into(),
            r.team.label().into(),
            r.state.label().into(),
            r.horizon.into(),
            r.t_event.into(),
            r.event_occurred.into(),
        ]);
    }
    out
}

fn curve_sheet(var: &VarStudy) -> Vec<Vec<Cell>> {
    let mut out = vec![header(&["Group", "Samples", "T", "Cumulative Probability"])];
    for curve in &var.curves {
        for p in &curve.points {
            out.push(vec![
                curve.group.label().into(),
                curve.samples.into(),
                p.t.into(),
                p.probability.into(),
            ]);
        }
    }
    out
}

fn matching_sheet(var: &VarStudy) -> Vec<Vec<Cell>> {
    let r = &var.report;
    vec![
        header(&["Metric", "Value"]),
        vec!["cases".into(), r.cases.into()],
        vec!["matched_cases".into(), r.matched_cases.into()],
        vec!["dropped_cases".into(), r.dropped_cases.into()],
        vec!["short_pools".into(), r.short_pools.into()],
        vec!["controls".into(), r.controls.into()],
        vec!["candidates".into(), var.candidates.into()],
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match value {
                Cell::Text(text) => worksheet.write_string(r, c, text),
                Cell::Number(num) => worksheet.write_number(r, c, *num),
                Cell::Empty => continue,
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
