use serde::Serialize;

use crate::config::StudyConfig;
use crate::match_state::abs_goal_diff;
use crate::season::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: u16,
    pub end: u16,
}

impl Interval {
    pub fn contains(&self, minute: u16) -> bool {
        self.start <= minute && minute <= self.end
    }

    pub fn len(&self) -> u16 {
        if self.is_empty() {
            return 0;
        }
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Finds the spans of a match where one side leads by `threshold` goals or more.
#[derive(Debug, Clone, Copy)]
pub struct GoleadaDetector {
    pub threshold: u16,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl Default for GoleadaDetector {
    fn default() -> Self {
        Self::from_config(&StudyConfig::default())
    }
}

impl GoleadaDetector {
    pub fn from_config(cfg: &StudyConfig) -> Self {
        Self {
            threshold: cfg.goleada_threshold,
            start_minute: cfg.match_start_minute,
            end_minute: cfg.match_end_minute,
        }
    }

    pub fn is_lopsided(&self, abs_diff: u16) -> bool {
        abs_diff >= self.threshold
    }

    pub fn intervals(&self, events: &[Event]) -> Vec<Interval> {
        let mut out = Vec::new();
        let mut open: Option<u16> = None;

        // A goal stamped at minute m changes the state from minute m + 1 on, so each scan
        // step looks at the scoreline entering the next minute. The step before
        // `start_minute` picks up goals stamped at kickoff.
        for minute in self.start_minute.saturating_sub(1)..=self.end_minute {
            let lopsided = self.is_lopsided(abs_goal_diff(events, minute + 1));
            match (open, lopsided) {
                (None, true) => open = Some((minute + 1).min(self.end_minute)),
                // `minute` itself still started lopsided; the next one does not.
                (Some(start), false) => {
                    out.push(Interval { start, end: minute });
                    open = None;
                }
                _ => {}
            }
        }

        if let Some(start) = open
            && start <= self.end_minute
        {
            out.push(Interval {
                start,
                end: self.end_minute,
            });
        }
        out
    }

    pub fn minute_in_goleada(&self, minute: u16, intervals: &[Interval]) -> bool {
        minute_in_goleada(minute, intervals, self.end_minute)
    }
}

pub fn goleada_intervals(events: &[Event]) -> Vec<Interval> {
    GoleadaDetector::default().intervals(events)
}

/// Interval membership; minutes past `end_minute` count as inside an interval that
/// runs to the final whistle.
pub fn minute_in_goleada(minute: u16, intervals: &[Interval], end_minute: u16) -> bool {
    intervals
        .iter()
        .any(|iv| iv.contains(minute) || (minute > end_minute && iv.end == end_minute))
}
