//! Error types for PISTE operations

use crate::{CompetitionId, CompetitionStatus, EntityType, PhaseId, PhaseStatus, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Concurrent modification of {entity_type:?} {id}: expected version {expected}, found {found}")]
    ConcurrentModification {
        entity_type: EntityType,
        id: Uuid,
        expected: i64,
        found: i64,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors. Always recoverable by correcting the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },

    #[error("Not enough entrants: {required} required, {available} available")]
    InsufficientEntrants { required: usize, available: usize },

    #[error("Malformed placement: {reason}")]
    MalformedPlacement { reason: String },
}

/// Lifecycle conflicts. The caller must change state before retrying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateConflictError {
    #[error("Competition {competition_id} is {status} and can no longer be modified")]
    CompetitionClosed {
        competition_id: CompetitionId,
        status: CompetitionStatus,
    },

    #[error("Illegal competition transition: {event} from {from}")]
    IllegalCompetitionTransition {
        from: CompetitionStatus,
        event: String,
    },

    #[error("Illegal phase transition for {phase_id}: {from} -> {to}")]
    IllegalPhaseTransition {
        phase_id: PhaseId,
        from: PhaseStatus,
        to: PhaseStatus,
    },
}

/// Authorization errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Permission denied for user {user_id}: {action} ({reason})")]
    PermissionDenied {
        user_id: UserId,
        action: String,
        reason: String,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all PISTE errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PisteError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("State conflict: {0}")]
    StateConflict(#[from] StateConflictError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for PISTE operations.
pub type PisteResult<T> = Result<T, PisteError>;

/// Error categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    StateConflict,
    Authorization,
    Storage,
    Config,
}

impl PisteError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PisteError::Storage(StorageError::NotFound { .. }) => ErrorKind::NotFound,
            PisteError::Storage(StorageError::ConcurrentModification { .. }) => {
                ErrorKind::StateConflict
            }
            PisteError::Storage(_) => ErrorKind::Storage,
            PisteError::Validation(_) => ErrorKind::Validation,
            PisteError::StateConflict(_) => ErrorKind::StateConflict,
            PisteError::Authorization(_) => ErrorKind::Authorization,
            PisteError::Config(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for a not-found storage error.
    pub fn not_found(entity_type: EntityType, id: impl Into<Uuid>) -> Self {
        PisteError::Storage(StorageError::NotFound {
            entity_type,
            id: id.into(),
        })
    }

    /// Shorthand for an invalid-value validation error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PisteError::Validation(ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Competition,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Competition"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_state_conflict_display_names_status() {
        let err = StateConflictError::CompetitionClosed {
            competition_id: CompetitionId::nil(),
            status: CompetitionStatus::Completed,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("COMPLETED"));
        assert!(msg.contains("can no longer be modified"));
    }

    #[test]
    fn test_validation_error_display_insufficient_entrants() {
        let err = ValidationError::InsufficientEntrants {
            required: 4,
            available: 3,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("4 required"));
        assert!(msg.contains("3 available"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PisteError::not_found(EntityType::Phase, Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            PisteError::from(StorageError::ConcurrentModification {
                entity_type: EntityType::Competition,
                id: Uuid::nil(),
                expected: 1,
                found: 2,
            })
            .kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            PisteError::from(StorageError::LockPoisoned).kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            PisteError::invalid_value("size", "too small").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            PisteError::from(AuthorizationError::PermissionDenied {
                user_id: UserId::nil(),
                action: "generate".to_string(),
                reason: "viewer".to_string(),
            })
            .kind(),
            ErrorKind::Authorization
        );
    }

    #[test]
    fn test_error_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::StateConflict).unwrap();
        assert_eq!(json, "\"STATE_CONFLICT\"");
    }
}
