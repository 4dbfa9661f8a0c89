use crate::domain::EntityKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Container runtime rejected {operation}: {message}")]
    RuntimeApi {
        operation: &'static str,
        message: String,
    },

    #[error("Failed to list {kind}s: {source}")]
    InventoryUnavailable {
        kind: EntityKind,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to delete {kind} {id}: {source}")]
    DeletionFailed {
        kind: EntityKind,
        id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Failed to read used disk space: {0}")]
    ProbeFailed(String),

    #[error("Invalid reclamation policy: {0}")]
    InvalidPolicy(String),

    #[error("Mode {0} runs once and cannot be scheduled")]
    NotContinuous(config::Mode),

    #[error("Schedule interval must be greater than zero")]
    InvalidInterval,

    #[error("Failed to stat filesystem: {0}")]
    Statvfs(#[from] nix::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
