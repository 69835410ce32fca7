use crate::config::ConfigError;
use std::fmt;

/// Engine-level failures. Degenerate statistical inputs never surface here;
/// they resolve to neutral values inside the stats layer.
#[derive(Debug)]
pub enum EngineError {
    InvalidConfig(ConfigError),
    Canceled,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidConfig(err) => write!(f, "invalid analysis config: {err}"),
            EngineError::Canceled => write!(f, "analysis canceled"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::InvalidConfig(err) => Some(err),
            EngineError::Canceled => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::InvalidConfig(err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
