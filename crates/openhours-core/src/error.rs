use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("invalid time slot: {0:?}")]
    InvalidSlot(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Failure while comparing a single item (one day or one dated override).
///
/// Never escapes [`compare`](crate::compare::compare): it is folded into the
/// result as a "comparison error" entry for the item that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("occurrence ordinal {ordinal} outside 1-5 in slot {slot}")]
    InvalidOccurrence { slot: String, ordinal: u8 },

    #[error("empty occurrence list in slot {slot}")]
    EmptyOccurrence { slot: String },
}
