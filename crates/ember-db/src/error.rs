/// Typed store failures. Callers translate these into their own taxonomy;
/// nothing here is user-facing.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness collision (room code or session token). Retryable by
    /// regenerating and inserting again.
    #[error("uniqueness conflict")]
    Conflict,

    /// A conditional update found the row in a different state than
    /// expected; the caller lost a race.
    #[error("stale room state")]
    StaleState,

    #[error("row not found")]
    NotFound,

    /// No live participant binding matches the (room, token) pair.
    #[error("no matching binding")]
    Unauthorized,

    /// A stored value failed to map back into a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Collapse a unique/primary-key violation into [`StoreError::Conflict`].
    pub(crate) fn from_insert(err: rusqlite::Error) -> Self {
        if is_constraint_violation(&err) {
            StoreError::Conflict
        } else {
            StoreError::Sqlite(err)
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
