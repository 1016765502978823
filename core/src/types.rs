//! Shared primitive types used across the whole controller.

/// Virtual time. One unit = one millisecond of choreography time.
pub type Millis = f64;

/// Sequential ant identifier. Never reused within a process lifetime.
pub type AntId = u64;

/// The canonical run identifier used by the journal.
pub type RunId = String;
