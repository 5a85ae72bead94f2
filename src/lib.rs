pub mod composite;
pub mod elo;
pub mod error;
pub mod export;
pub mod game_table;
pub mod matchup;
pub mod metrics;
pub mod pipeline;
pub mod rankings;
