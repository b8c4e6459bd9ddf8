/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures talking to the repository store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The revision marker sent with a write no longer matches the remote.
    #[error("conflicting update to {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("not found: {path}")]
    NotFound { path: String },

    /// Any other non-success HTTP status.
    #[error("{method} {endpoint} returned {status}: {message}")]
    Http {
        method: String,
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A multi-file commit stopped before the branch ref was moved.
    #[error("commit of [{}] failed: {source}", files.join(", "))]
    MultiCommit {
        files: Vec<String>,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn decode(what: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.to_string(),
        }
    }

    /// `true` for a stale revision marker, including one wrapped by a
    /// multi-file commit.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::MultiCommit { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_commit_message_names_every_file() {
        let err = StoreError::MultiCommit {
            files: vec!["a/one.txt".into(), "b/two.txt".into()],
            source: Box::new(StoreError::invalid_input("x")),
        };
        assert_eq!(
            err.to_string(),
            "commit of [a/one.txt, b/two.txt] failed: invalid input: x"
        );
    }

    #[test]
    fn wrapped_conflict_is_still_a_conflict() {
        let err = StoreError::MultiCommit {
            files: vec!["a".into()],
            source: Box::new(StoreError::Conflict {
                path: "refs/heads/main".into(),
                message: "not a fast forward".into(),
            }),
        };
        assert!(err.is_conflict());
        assert!(!StoreError::invalid_input("x").is_conflict());
    }
}
