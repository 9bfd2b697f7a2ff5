use ember_db::StoreError;

/// Failures of room and relay operations. The API layer maps each variant
/// onto an HTTP status and a stable error code.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("duration must be between {} and {} minutes", crate::MIN_DURATION_MINUTES, crate::MAX_DURATION_MINUTES)]
    InvalidDuration,

    #[error("unknown message kind")]
    InvalidKind,

    #[error("cipher payload exceeds {} bytes", crate::MAX_PAYLOAD_BYTES)]
    PayloadTooLarge,

    #[error("room not found")]
    NotFound,

    #[error("room has expired")]
    Expired,

    #[error("room already has two participants")]
    RoomFull,

    #[error("room is closed")]
    RoomClosed,

    #[error("session token is not valid for this room")]
    Unauthorized,

    #[error("could not allocate an unused room code")]
    CodesExhausted,

    #[error(transparent)]
    Store(StoreError),
}

/// Store errors carry semantics that must be lifted to the matching
/// domain variant, not wrapped verbatim. `StaleState` maps to `RoomFull`
/// here; `join` intercepts it first to tell a full room from one that
/// expired mid-race.
impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Unauthorized => Self::Unauthorized,
            StoreError::StaleState => Self::RoomFull,
            other => Self::Store(other),
        }
    }
}
