use serde::Serialize;

/// A guardian message that could not be delivered immediately and was
/// persisted for the retry sweep. Consumed FIFO, deleted only after a
/// confirmed send.
#[derive(Debug, Clone, Serialize)]
pub struct QueuedMessage {
    pub id: i64,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub queued_at: String,
}
