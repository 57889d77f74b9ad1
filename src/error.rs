//! Error types for cat and mission operations.

use thiserror::Error;

/// Why an operation was refused.
///
/// Every variant except [`Error::Store`] is a caller problem and carries a
/// field (or entity) it can be attributed to. None of them are retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is malformed or breaks a field rule (target count, notes
    /// immutability, unknown breed).
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The request collides with an existing assignment.
    #[error("{field}: {message}")]
    Conflict { field: &'static str, message: String },

    /// A referenced id does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The entity's current state forbids the transition.
    #[error("{field}: {message}")]
    State { field: &'static str, message: String },

    /// Persistence failed. Never caused by the caller.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn state(field: &'static str, message: impl Into<String>) -> Self {
        Self::State {
            field,
            message: message.into(),
        }
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::State { .. } => "state",
            Self::Store(_) => "internal",
        }
    }

    /// The field or entity the failure is attributed to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. }
            | Self::Conflict { field, .. }
            | Self::State { field, .. } => Some(field),
            Self::NotFound { entity, .. } => Some(entity),
            Self::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_field() {
        let err = Error::validation("targets", "a mission must have 1-3 targets");
        assert_eq!(err.to_string(), "targets: a mission must have 1-3 targets");
    }

    #[test]
    fn not_found_names_entity_and_id() {
        let err = Error::not_found("mission", 42);
        assert_eq!(err.to_string(), "mission 42 not found");
        assert_eq!(err.field(), Some("mission"));
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn store_errors_have_no_field() {
        let err = Error::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.kind(), "internal");
        assert!(err.field().is_none());
    }
}
