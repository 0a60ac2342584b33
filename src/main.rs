use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use match_state_study::config::StudyConfig;
use match_state_study::experience::{
    self, BALANCED_RATING_THRESHOLD, ExperienceRow, IMBALANCED_RATING_THRESHOLD,
};
use match_state_study::fair_play::{self, FairPlayRow, SeasonMetric};
use match_state_study::season::{self, Season};
use match_state_study::table_export::{self, StudyTables};
use match_state_study::var_analysis::{self, VarStudy};
use match_state_study::var_matching::ControlMatcher;

const VALUE_FLAGS: &[&str] = &["--out", "--bin", "--controls", "--seed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    FairPlay,
    Experience,
    Var,
    All,
}

impl Command {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "fairplay" => Some(Command::FairPlay),
            "experience" => Some(Command::Experience),
            "var" => Some(Command::Var),
            "all" => Some(Command::All),
            _ => None,
        }
    }

    fn runs(self, other: Command) -> bool {
        self == Command::All || self == other
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let positional = positional_args();
    let Some((command, paths)) = positional.split_first() else {
        return Err(anyhow!(usage()));
    };
    let command = Command::parse(command)
        .ok_or_else(|| anyhow!("unknown command {command:?}\n{}", usage()))?;
    if paths.is_empty() {
        return Err(anyhow!("no season files given\n{}", usage()));
    }

    let cfg = StudyConfig::from_env();
    let seasons = season::load_seasons(paths).context("load seasons")?;
    log::info!("loaded {} seasons", seasons.len());

    let mut tables = StudyTables::default();

    if command.runs(Command::FairPlay) {
        tables.fair_play = fair_play::build_fair_play_table(&seasons, &cfg);
        print_fair_play(&tables.fair_play);
    }
    if command.runs(Command::Experience) {
        tables.experience = experience::build_experience_table(&seasons, &cfg)?;
        print_experience(&tables.experience);
    }
    if command.runs(Command::Var) {
        let study = run_var(&seasons, &cfg)?;
        print_var(&study, &cfg);
        tables.var = Some(study);
    }

    if let Some(out) = parse_path_arg("--out") {
        let report = table_export::export_tables(&out, &tables)?;
        for (sheet, rows) in &report.sheets {
            log::info!("{sheet}: {rows} rows");
        }
        println!("Wrote {}", out.display());
    }

    Ok(())
}

fn run_var(seasons: &[Season], cfg: &StudyConfig) -> Result<VarStudy> {
    let mut matcher = ControlMatcher::new(cfg);
    if let Some(bin) = parse_u64_arg("--bin") {
        matcher = matcher.bin(u16::try_from(bin).context("--bin out of range")?);
    }
    if let Some(n) = parse_u64_arg("--controls") {
        matcher = matcher.n_controls(usize::try_from(n).context("--controls out of range")?);
    }
    if let Some(seed) = parse_u64_arg("--seed") {
        matcher = matcher.seed(seed);
    }
    var_analysis::run_var_study(seasons, &matcher, cfg)
}

fn print_fair_play(rows: &[FairPlayRow]) {
    println!("Fair play by goal difference:");
    for row in rows {
        println!(
            "  {:<12} diff={:<8} minutes={:<6} yellow={:<4} red={:<3} 2y={}",
            row.season, row.diff, row.minutes, row.yellow, row.red, row.second_yellow_red
        );
    }
    for rate in fair_play::season_yellow_rates(rows) {
        println!(
            "  {:<12} yellow/min goleada={:.4} outside={:.4} ratio={}",
            rate.season,
            rate.rate_goleada,
            rate.rate_outside,
            rate.ratio
                .map(|r| format!("{r:.2}"))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
    for metric in [SeasonMetric::GoleadaMinutes, SeasonMetric::GoleadaYellows] {
        for outlier in fair_play::season_outliers(rows, metric) {
            println!("  outlier {metric:?}: {} ({})", outlier.season, outlier.value);
        }
    }
}

fn print_experience(rows: &[ExperienceRow]) {
    println!("Experience rows: {}", rows.len());
    for c in experience::balanced_group_counts(rows, BALANCED_RATING_THRESHOLD) {
        println!("  balanced {}: {}", c.group, c.matches);
    }
    for c in experience::imbalanced_group_counts(rows, IMBALANCED_RATING_THRESHOLD) {
        let context = c.context.map(|ctx| ctx.to_string()).unwrap_or_default();
        println!("  imbalanced {context} {}: {}", c.group, c.matches);
    }
    let balanced = experience::balanced(rows, BALANCED_RATING_THRESHOLD);
    for share in experience::points_distribution(balanced) {
        println!(
            "  {} {} pts: {} ({:.1}%)",
            share.group,
            share.points,
            share.count,
            share.share * 100.0
        );
    }
}

fn print_var(study: &VarStudy, cfg: &StudyConfig) {
    let r = &study.report;
    println!(
        "VAR cases={} matched={} dropped={} short_pools={} controls={} candidates={}",
        r.cases, r.matched_cases, r.dropped_cases, r.short_pools, r.controls, study.candidates
    );
    for (state, count) in var_analysis::state_distribution(&study.cases) {
        println!("  {state}: {count} cases");
    }
    for cell in var_analysis::state_interaction(&study.analysis, cfg.max_analysis_window) {
        println!(
            "  {} {}: p={:.3} (n={})",
            cell.state, cell.group, cell.probability, cell.samples
        );
    }
    for s in var_analysis::time_to_goal_summary(&study.analysis, cfg.max_analysis_window) {
        println!(
            "  {} time to concede: n={} median={:.1} q1={:.1} q3={:.1}",
            s.group, s.summary.count, s.summary.median, s.summary.q1, s.summary.q3
        );
    }
    for curve in &study.curves {
        if let Some(last) = curve.points.last() {
            println!(
                "  {} P(concede within {}) = {:.3} (n={})",
                curve.group, last.t, last.probability, curve.samples
            );
        }
    }
}

fn usage() -> String {
    "usage: match_state_study <fairplay|experience|var|all> <season.json>... \
     [--out FILE.xlsx] [--bin N] [--controls N] [--seed N]"
        .to_string()
}

fn positional_args() -> Vec<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg);
    }
    out
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_u64_arg(name: &str) -> Option<u64> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<u64>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<u64>()
        {
            return Some(v);
        }
    }
    None
}
