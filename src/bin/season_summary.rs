use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use match_state_study::config::StudyConfig;
use match_state_study::goleada::GoleadaDetector;
use match_state_study::season;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = std::env::args().skip(1).collect::<Vec<_>>();
    if paths.is_empty() {
        return Err(anyhow!("usage: season_summary <season.json>..."));
    }

    let cfg = StudyConfig::from_env();
    let detector = GoleadaDetector::from_config(&cfg);

    for s in season::load_seasons(paths.as_slice())? {
        let mut matches = 0usize;
        let mut events = 0usize;
        let mut var_events = 0usize;
        let mut lopsided_matches = 0usize;
        for m in s.matches() {
            matches += 1;
            events += m.events.len();
            var_events += m
                .events
                .iter()
                .filter(|e| e.kind == cfg.trigger_kind)
                .count();
            if !detector.intervals(&m.events).is_empty() {
                lopsided_matches += 1;
            }
        }
        println!(
            "{}: rounds={} matches={} players={} events={} var={} lopsided={}",
            s.season_id,
            s.rounds.len(),
            matches,
            s.players.len(),
            events,
            var_events,
            lopsided_matches
        );
    }

    Ok(())
}
