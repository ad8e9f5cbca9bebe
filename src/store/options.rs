use serde::{Deserialize, Serialize};

/// Who mints the id of a new transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdAssignment {
    /// The store sends a random UUID v4 with the create request.
    #[default]
    Client,
    /// The store sends an empty id and keeps whatever the service answers with.
    Server,
}

serde_plain::derive_display_from_serialize!(IdAssignment);
serde_plain::derive_fromstr_from_deserialize!(IdAssignment);

/// What a failed delete restores.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Restore the whole list as it was when the delete started. When two deletes overlap and the
    /// first one fails after the second succeeded, this brings back the second record as well.
    #[default]
    Snapshot,
    /// Put back only the record this delete removed, at its old position.
    PerOperation,
}

serde_plain::derive_display_from_serialize!(RollbackPolicy);
serde_plain::derive_fromstr_from_deserialize!(RollbackPolicy);

/// Behaviors of the `Store` that depend on the backend it is paired with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    pub id_assignment: IdAssignment,
    pub delete_rollback: RollbackPolicy,
    /// When true, a fetch response that arrives after a newer fetch was applied is dropped. When
    /// false, the last response to complete wins.
    pub discard_stale_fetches: bool,
}
