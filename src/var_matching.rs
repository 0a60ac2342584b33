use std::collections::{BTreeSet, HashMap};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::StudyConfig;
use crate::match_state::{GameState, match_state_at_minute};
use crate::season::{Match, Season, Side};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentCase {
    pub season: String,
    pub match_id: String,
    pub minute: u16,
    pub team: Side,
    pub home_goals: u16,
    pub away_goals: u16,
    pub goal_diff: i32,
    pub state: GameState,
    pub team_players: u8,
    pub opp_players: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlCandidate {
    pub season: String,
    pub match_id: String,
    pub minute: u16,
    pub team: Side,
    pub state: GameState,
    pub goal_diff: i32,
    pub team_players: u8,
    pub opp_players: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledControl {
    #[serde(flatten)]
    pub candidate: ControlCandidate,
    pub case_minute: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchingReport {
    pub cases: usize,
    pub matched_cases: usize,
    pub dropped_cases: usize,
    pub short_pools: usize,
    pub controls: usize,
}

pub fn treatment_cases_for_match(
    season_id: &str,
    m: &Match,
    cfg: &StudyConfig,
) -> Vec<TreatmentCase> {
    m.events
        .iter()
        .filter(|e| e.kind == cfg.trigger_kind)
        .map(|e| {
            let snap = match_state_at_minute(&m.events, e.minute, e.team, cfg.initial_players);
            TreatmentCase {
                season: season_id.to_string(),
                match_id: m.id.clone(),
                minute: e.minute,
                team: e.team,
                home_goals: snap.home_goals,
                away_goals: snap.away_goals,
                goal_diff: snap.goal_diff,
                state: snap.state,
                team_players: snap.team_players,
                opp_players: snap.opp_players,
            }
        })
        .collect()
}

pub fn extract_treatment_cases(seasons: &[Season], cfg: &StudyConfig) -> Vec<TreatmentCase> {
    let mut out = Vec::new();
    for season in seasons {
        let before = out.len();
        for m in season.matches() {
            out.extend(treatment_cases_for_match(&season.season_id, m, cfg));
        }
        log::debug!(
            "season {}: {} {:?} events",
            season.season_id,
            out.len() - before,
            cfg.trigger_kind
        );
    }
    out
}

/// Candidate (minute, side) pairs with no confounding event in `[minute - bin, minute]`.
pub fn control_candidates_for_match(
    season_id: &str,
    m: &Match,
    bin: u16,
    cfg: &StudyConfig,
) -> Vec<ControlCandidate> {
    let confounded: BTreeSet<u16> = m
        .events
        .iter()
        .filter(|e| e.kind.is_confounder())
        .map(|e| e.minute)
        .collect();

    let mut out = Vec::new();
    for minute in cfg.match_start_minute..cfg.max_minute_iter {
        if confounded
            .range(minute.saturating_sub(bin)..=minute)
            .next()
            .is_some()
        {
            continue;
        }
        for side in Side::BOTH {
            let snap = match_state_at_minute(&m.events, minute, side, cfg.initial_players);
            out.push(ControlCandidate {
                season: season_id.to_string(),
                match_id: m.id.clone(),
                minute,
                team: side,
                state: snap.state,
                goal_diff: snap.goal_diff,
                team_players: snap.team_players,
                opp_players: snap.opp_players,
            });
        }
    }
    out
}

pub fn build_control_candidates(
    seasons: &[Season],
    bin: u16,
    cfg: &StudyConfig,
) -> Vec<ControlCandidate> {
    let mut out = Vec::new();
    for season in seasons {
        for m in season.matches() {
            out.extend(control_candidates_for_match(&season.season_id, m, bin, cfg));
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub struct ControlMatcher {
    pub bin: u16,
    pub n_controls: usize,
    pub seed: u64,
    pub full_strength: u8,
}

impl ControlMatcher {
    pub fn new(cfg: &StudyConfig) -> Self {
        Self {
            bin: cfg.default_bin,
            n_controls: cfg.default_n_controls,
            seed: cfg.control_seed,
            full_strength: cfg.initial_players,
        }
    }

    pub fn bin(mut self, bin: u16) -> Self {
        self.bin = bin;
        self
    }

    pub fn n_controls(mut self, n: usize) -> Self {
        self.n_controls = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn is_eligible(&self, case: &TreatmentCase, candidate: &ControlCandidate) -> bool {
        candidate.state == case.state
            && candidate.team == case.team
            && candidate.team_players == case.team_players
            && candidate.opp_players == case.opp_players
            && candidate.team_players == self.full_strength
            && candidate.opp_players == self.full_strength
            && candidate.minute.abs_diff(case.minute) <= self.bin
    }

    pub fn pool<'a>(
        &self,
        case: &TreatmentCase,
        candidates: impl IntoIterator<Item = &'a ControlCandidate>,
    ) -> Vec<&'a ControlCandidate> {
        candidates
            .into_iter()
            .filter(|c| self.is_eligible(case, c))
            .collect()
    }

    /// Draws up to `n_controls` pool members without replacement. The generator is
    /// reseeded for every case so a case's draw never depends on the cases before it.
    pub fn sample<'a>(&self, pool: &[&'a ControlCandidate]) -> Vec<&'a ControlCandidate> {
        let amount = self.n_controls.min(pool.len());
        if amount == 0 {
            return Vec::new();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut picked = rand::seq::index::sample(&mut rng, pool.len(), amount).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|idx| pool[idx]).collect()
    }

    pub fn match_controls(
        &self,
        cases: &[TreatmentCase],
        candidates: &[ControlCandidate],
    ) -> (Vec<SampledControl>, MatchingReport) {
        let mut by_key: HashMap<(Side, GameState), Vec<&ControlCandidate>> = HashMap::new();
        for c in candidates {
            by_key.entry((c.team, c.state)).or_default().push(c);
        }

        let mut report = MatchingReport {
            cases: cases.len(),
            ..MatchingReport::default()
        };
        let mut out = Vec::new();

        for case in cases {
            let pool = match by_key.get(&(case.team, case.state)) {
                Some(bucket) => self.pool(case, bucket.iter().copied()),
                None => Vec::new(),
            };
            if pool.is_empty() {
                report.dropped_cases += 1;
                log::debug!(
                    "no controls for match {} minute {} ({} {})",
                    case.match_id,
                    case.minute,
                    case.team,
                    case.state
                );
                continue;
            }
            if pool.len() < self.n_controls {
                report.short_pools += 1;
            }
            report.matched_cases += 1;
            for candidate in self.sample(&pool) {
                out.push(SampledControl {
                    candidate: candidate.clone(),
                    case_minute: case.minute,
                });
            }
        }

        report.controls = out.len();
        if report.dropped_cases > 0 {
            log::info!(
                "{} of {} cases dropped with an empty control pool",
                report.dropped_cases,
                report.cases
            );
        }
        (out, report)
    }
}

pub fn match_controls(
    cases: &[TreatmentCase],
    candidates: &[ControlCandidate],
    bin: u16,
    n_controls: usize,
    seed: u64,
    cfg: &StudyConfig,
) -> (Vec<SampledControl>, MatchingReport) {
    ControlMatcher::new(cfg)
        .bin(bin)
        .n_controls(n_controls)
        .seed(seed)
        .match_controls(cases, candidates)
}
