use serde::{Deserialize, Serialize};

/// Every command a peer can issue.
/// Variants are only ever appended, never removed or reordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ChoreoCommand {
    // ── Animations ────────────────────────────────
    Shake,
    Edge,
    Boom,

    // ── Population ────────────────────────────────
    Add,
    Remove,

    // ── Tuning ────────────────────────────────────
    SetDelay { delay: f64 },
}

impl ChoreoCommand {
    /// Method names registered under the namespace, e.g. `ants/shake`.
    pub const METHODS: [&'static str; 5] = ["shake", "edge", "boom", "add", "remove"];

    /// Resolve a method name (without namespace) to its command.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "shake"  => Some(Self::Shake),
            "edge"   => Some(Self::Edge),
            "boom"   => Some(Self::Boom),
            "add"    => Some(Self::Add),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Shake          => "shake",
            Self::Edge           => "edge",
            Self::Boom           => "boom",
            Self::Add            => "add",
            Self::Remove         => "remove",
            Self::SetDelay { .. } => "set_delay",
        }
    }
}
