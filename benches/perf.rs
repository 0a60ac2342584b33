use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use match_state_study::config::StudyConfig;
use match_state_study::fair_play::build_fair_play_table;
use match_state_study::goleada::goleada_intervals;
use match_state_study::season::{Event, EventKind, Match, Round, Season, Side, parse_season_json};
use match_state_study::var_matching::{
    ControlMatcher, build_control_candidates, extract_treatment_cases,
};

const EVENT_KINDS: [EventKind; 6] = [
    EventKind::Goal,
    EventKind::Goal,
    EventKind::YellowCard,
    EventKind::YellowCard,
    EventKind::RedCard,
    EventKind::GoalDisallowedByVar,
];

fn synthetic_season(matches: usize, seed: u64) -> Season {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rounds = (0..matches / 10)
        .map(|round| Round {
            matches: (0..10)
                .map(|idx| {
                    let mut events: Vec<Event> = (0..rng.gen_range(4..14))
                        .map(|_| {
                            let kind = EVENT_KINDS[rng.gen_range(0..EVENT_KINDS.len())];
                            let team = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
                            Event::new(rng.gen_range(1..95), kind, team)
                        })
                        .collect();
                    events.sort_by_key(|e| e.minute);
                    Match {
                        id: format!("{round}-{idx}"),
                        date_time: "2020-09-12T15:00:00".to_string(),
                        result: (0, 0),
                        events,
                        home_lineup: Vec::new(),
                        away_lineup: Vec::new(),
                    }
                })
                .collect(),
        })
        .collect();
    Season {
        season_id: "bench".to_string(),
        rounds,
        players: Vec::new(),
    }
}

fn bench_season_parse(c: &mut Criterion) {
    c.bench_function("season_parse", |b| {
        b.iter(|| {
            let season = parse_season_json(black_box(SEASON_JSON)).unwrap();
            black_box(season.rounds.len());
        })
    });
}

fn bench_goleada_intervals(c: &mut Criterion) {
    let season = synthetic_season(380, 7);
    c.bench_function("goleada_intervals", |b| {
        b.iter(|| {
            let total: usize = season
                .matches()
                .map(|m| goleada_intervals(black_box(&m.events)).len())
                .sum();
            black_box(total);
        })
    });
}

fn bench_fair_play_table(c: &mut Criterion) {
    let seasons = vec![synthetic_season(380, 11)];
    let cfg = StudyConfig::default();
    c.bench_function("fair_play_table", |b| {
        b.iter(|| {
            let rows = build_fair_play_table(black_box(&seasons), &cfg);
            black_box(rows.len());
        })
    });
}

fn bench_control_candidates(c: &mut Criterion) {
    let seasons = vec![synthetic_season(380, 13)];
    let cfg = StudyConfig::default();
    c.bench_function("control_candidates", |b| {
        b.iter(|| {
            let candidates = build_control_candidates(black_box(&seasons), cfg.default_bin, &cfg);
            black_box(candidates.len());
        })
    });
}

fn bench_match_controls(c: &mut Criterion) {
    let seasons = vec![synthetic_season(380, 17)];
    let cfg = StudyConfig::default();
    let matcher = ControlMatcher::new(&cfg);
    let cases = extract_treatment_cases(&seasons, &cfg);
    let candidates = build_control_candidates(&seasons, matcher.bin, &cfg);
    c.bench_function("match_controls", |b| {
        b.iter(|| {
            let (controls, _) = matcher.match_controls(black_box(&cases), black_box(&candidates));
            black_box(controls.len());
        })
    });
}

criterion_group!(
    perf,
    bench_season_parse,
    bench_goleada_intervals,
    bench_fair_play_table,
    bench_control_candidates,
    bench_match_controls
);
criterion_main!(perf);

static SEASON_JSON: &str = include_str!("../tests/fixtures/season_sample.json");
