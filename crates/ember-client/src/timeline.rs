use chrono::{DateTime, Utc};
use ember_types::models::MessageKind;
use uuid::Uuid;

/// A message after client-side decryption, ready for display.
///
/// `text` holds the plaintext, or the decrypt sentinel when the payload
/// did not verify.
#[derive(Debug, Clone, PartialEq)]
pub struct DecryptedMessage {
    pub id: Uuid,
    pub seq: i64,
    pub sender_slot: u8,
    pub kind: MessageKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A locally sent message the relay has not confirmed yet. Rendered at
/// the tail of the timeline until [`Timeline::confirm`] or
/// [`Timeline::reject`] resolves it.
#[derive(Debug, Clone)]
pub struct PendingEcho {
    pub correlation_id: Uuid,
    pub kind: MessageKind,
    pub text: String,
    pub staged_at: DateTime<Utc>,
}

/// Client-side message list with optimistic local echo.
///
/// A send is staged immediately under a local correlation id so the UI
/// shows it at once. When the relay's authoritative copy arrives, from
/// the send response or the event stream, the staged entry is replaced
/// and the list keeps the server order `(created_at, seq)`. Both copies
/// of a message arriving (send response plus stream echo) collapse to
/// one entry via the server-assigned id.
#[derive(Debug, Default)]
pub struct Timeline {
    confirmed: Vec<DecryptedMessage>,
    pending: Vec<PendingEcho>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an outgoing message before the relay has seen it. Returns
    /// the correlation id the caller hands back to [`confirm`] or
    /// [`reject`] once the send resolves.
    ///
    /// [`confirm`]: Timeline::confirm
    /// [`reject`]: Timeline::reject
    pub fn stage(&mut self, kind: MessageKind, text: impl Into<String>) -> Uuid {
        let correlation_id = Uuid::new_v4();
        self.pending.push(PendingEcho {
            correlation_id,
            kind,
            text: text.into(),
            staged_at: Utc::now(),
        });
        correlation_id
    }

    /// Swap a staged entry for the relay's authoritative copy. The
    /// authoritative copy is kept even when the correlation id is
    /// unknown; only the local echo depends on it.
    pub fn confirm(&mut self, correlation_id: Uuid, message: DecryptedMessage) {
        self.pending.retain(|echo| echo.correlation_id != correlation_id);
        self.insert(message);
    }

    /// Drop a staged entry whose send failed.
    pub fn reject(&mut self, correlation_id: Uuid) {
        self.pending.retain(|echo| echo.correlation_id != correlation_id);
    }

    /// Fold in a message from the event stream or a history fetch.
    /// Re-deliveries and overlapping fetches collapse by server id.
    pub fn ingest(&mut self, message: DecryptedMessage) {
        self.insert(message);
    }

    fn insert(&mut self, message: DecryptedMessage) {
        if self.confirmed.iter().any(|m| m.id == message.id) {
            return;
        }
        let at = self
            .confirmed
            .partition_point(|m| (m.created_at, m.seq) <= (message.created_at, message.seq));
        self.confirmed.insert(at, message);
    }

    /// Highest sequence seen; the `after` cursor for the next history
    /// fetch. Not necessarily the last entry's seq, since display order
    /// is `(created_at, seq)`.
    pub fn last_seq(&self) -> Option<i64> {
        self.confirmed.iter().map(|m| m.seq).max()
    }

    /// Confirmed messages in server order.
    pub fn confirmed(&self) -> &[DecryptedMessage] {
        &self.confirmed
    }

    /// Unresolved local echoes, oldest first.
    pub fn pending(&self) -> &[PendingEcho] {
        &self.pending
    }

    pub fn is_fully_confirmed(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.confirmed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty()
    }
}
