use std::io;

/// Crate-wide result alias, mirrored on the teacher's `common::err::CResult`.
pub type CResult<T> = Result<T, ReError>;

/// Error taxonomy for the GTID bookkeeping core and its embedding glue.
///
/// Parse/decode and buffer-sizing errors are meant to be *surfaced*: callers
/// get a `Result` back and can retry or report upstream. Invariant
/// violations (caller passed `start > end`, an internal skip-list repair
/// invariant broke) are programmer bugs and are asserted on directly instead
/// of being represented here.
#[derive(Debug, thiserror::Error)]
pub enum ReError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("buffer too small: need at least {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("invalid sync request: {0}")]
    InvalidSync(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl ReError {
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        ReError::ParseError(msg.into())
    }
}
