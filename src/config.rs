use std::str::FromStr;

use crate::season::EventKind;

#[derive(Debug, Clone, Copy)]
pub struct StudyConfig {
    pub initial_players: u8,
    pub match_start_minute: u16,
    pub match_end_minute: u16,
    // Exclusive upper bound for control candidate minutes (covers stoppage time).
    pub max_minute_iter: u16,
    pub goleada_threshold: u16,
    pub default_bin: u16,
    pub default_n_controls: usize,
    pub min_analysis_minute: u16,
    pub max_analysis_window: u16,
    pub control_seed: u64,
    pub min_lineup_players: usize,
    pub trigger_kind: EventKind,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            initial_players: 11,
            match_start_minute: 1,
            match_end_minute: 90,
            max_minute_iter: 97,
            goleada_threshold: 3,
            default_bin: 2,
            default_n_controls: 5,
            min_analysis_minute: 15,
            max_analysis_window: 15,
            control_seed: 42,
            min_lineup_players: 7,
            trigger_kind: EventKind::GoalDisallowedByVar,
        }
    }
}

impl StudyConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            initial_players: env_or("STUDY_INITIAL_PLAYERS", d.initial_players).max(1),
            match_start_minute: env_or("STUDY_MATCH_START_MINUTE", d.match_start_minute).max(1),
            match_end_minute: env_or("STUDY_MATCH_END_MINUTE", d.match_end_minute).max(1),
            max_minute_iter: env_or("STUDY_MAX_MINUTE_ITER", d.max_minute_iter),
            goleada_threshold: env_or("STUDY_GOLEADA_THRESHOLD", d.goleada_threshold).max(1),
            default_bin: env_or("STUDY_BIN", d.default_bin),
            default_n_controls: env_or("STUDY_N_CONTROLS", d.default_n_controls).max(1),
            min_analysis_minute: env_or("STUDY_MIN_ANALYSIS_MINUTE", d.min_analysis_minute),
            max_analysis_window: env_or("STUDY_MAX_ANALYSIS_WINDOW", d.max_analysis_window)
                .max(1),
            control_seed: env_or("STUDY_CONTROL_SEED", d.control_seed),
            min_lineup_players: env_or("STUDY_MIN_LINEUP_PLAYERS", d.min_lineup_players),
            trigger_kind: d.trigger_kind,
        }
    }

    /// Horizon for a time-to-concede observation anchored at `minute`, if any remains.
    pub fn analysis_horizon(&self, minute: u16) -> Option<u16> {
        let remaining = self.match_end_minute.checked_sub(minute)?;
        let horizon = self.max_analysis_window.min(remaining);
        (horizon > 0).then_some(horizon)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
        .unwrap_or(default)
}
