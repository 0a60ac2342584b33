pub mod config;
pub mod experience;
pub mod fair_play;
pub mod goleada;
pub mod match_state;
pub mod season;
pub mod stats;
pub mod table_export;
pub mod time_to_event;
pub mod var_analysis;
pub mod var_matching;
