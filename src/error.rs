use thiserror::Error;

/// Domain errors for the rating pipeline.
///
/// Numeric degeneracy (zero possessions, zero denominators, constant columns)
/// is intentionally absent: those conditions produce NaN and are filtered out
/// of downstream reductions rather than raised.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// Malformed game pairing, self-play, or a win flag outside {0, 1}.
    /// Always fatal for the run: the table is rejected before any computation.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Weight/metric mismatch or an invalid tunable. Fatal before scoring.
    #[error("configuration: {0}")]
    Configuration(String),

    /// A team missing from one of the ranking tables. Recoverable at the
    /// call boundary; callers get this instead of a garbage probability.
    #[error("team '{team}' not found in {table} table")]
    TeamNotFound { team: String, table: &'static str },
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
