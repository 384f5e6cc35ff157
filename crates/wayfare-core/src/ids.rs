//! Identifier helpers shared across crates.

use uuid::Uuid;

/// Generate an opaque record id (32 hex chars).
pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Normalize a messaging identifier: strip the `whatsapp:` prefix and any
/// leading `+`, so `whatsapp:+97250...` and `97250...` compare equal.
pub fn normalize_user_id(raw: &str) -> String {
    let s = raw.trim();
    let s = s.strip_prefix("whatsapp:").unwrap_or(s);
    s.trim_start_matches('+').to_string()
}
