use thiserror::Error;

/// Errors raised at the rules boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("cannot parse move '{0}'")]
    UnparsableMove(String),

    #[error("illegal move '{mv}' in position {fen}")]
    IllegalMove { mv: String, fen: String },

    #[error("failed to mirror position {fen}: {reason}")]
    Mirror { fen: String, reason: String },
}
