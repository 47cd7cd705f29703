//! Error types.
//!
//! Every error here is a load-time or programming error. Physics-level
//! non-matches ("trigger did not fire", "no trigger object", "zero matches")
//! are ordinary [`MatchOutcome`](crate::matching::MatchOutcome) values.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading trigger definitions or addressing channels.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The definition document (or an event file) could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or a field has the wrong type.
    #[error("malformed definition document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is structurally invalid.
    #[error("invalid definition document: {0}")]
    Schema(String),

    /// A path leg references a filter name that is not registered for its object type.
    #[error(
        "unknown filter '{filter}' for {object} in path '{path}' (available: {})",
        .available.join(", ")
    )]
    UnknownFilter {
        object: String,
        filter: String,
        path: String,
        available: Vec<String>,
    },

    /// A combination references a path that is not declared.
    #[error(
        "unknown path '{path}' in {data_kind} channel '{channel}' (available: {})",
        .available.join(", ")
    )]
    UnknownPath {
        path: String,
        channel: String,
        data_kind: String,
        available: Vec<String>,
    },

    /// A matching request names a channel that was not loaded.
    #[error("unknown channel '{channel}' (available: {})", .available.join(", "))]
    UnknownChannel {
        channel: String,
        available: Vec<String>,
    },
}

impl TriggerError {
    /// Shorthand for a [`TriggerError::Schema`] error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_filter_lists_alternatives() {
        let err = TriggerError::UnknownFilter {
            object: "Tau".to_string(),
            filter: "Tight".to_string(),
            path: "HLT_X".to_string(),
            available: vec!["A".to_string(), "B".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("'Tight'"));
        assert!(message.contains("HLT_X"));
        assert!(message.contains("available: A, B"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: TriggerError = parse.unwrap_err().into();
        assert!(matches!(err, TriggerError::Json(_)));
    }
}
