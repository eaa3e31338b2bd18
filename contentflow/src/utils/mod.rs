//! Small helpers shared across modules: identifiers, clocks and panic payloads.

use std::any::Any;
use std::time::Instant;
use uuid::Uuid;

/// Generates a new random task identifier.
#[must_use]
pub fn generate_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the current time as milliseconds since the Unix epoch.
#[must_use]
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Milliseconds since `start`, saturating at `u64::MAX`.
#[must_use]
pub fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Extracts a readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Counts whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
