//! Well-known memory store keys.
//!
//! These are shared with external processes reading the same store, so the
//! layout is part of the on-disk contract.

/// Registry initialisation info.
pub const METADATA: &str = "swarms/metadata";

/// Cross-session seed context loaded at the start of every session.
pub const DEBUG_CONTEXT: &str = "swarms/debugging/context";

/// Parent of every persisted session record.
pub const SESSIONS: &str = "swarms/debugging/sessions";

/// Parent of every communication message.
pub const COMMUNICATION: &str = "swarms/communication";

/// Key of a persisted session record.
#[must_use]
pub fn session(session_id: &str) -> String {
    format!("{SESSIONS}/{session_id}")
}

/// Key of a communication message written at `unix_seconds`.
#[must_use]
pub fn communication(unix_seconds: i64) -> String {
    format!("{COMMUNICATION}/{unix_seconds}")
}

/// Prefix that matches every session record but not the parent key itself.
#[must_use]
pub fn session_prefix() -> String {
    format!("{SESSIONS}/")
}
