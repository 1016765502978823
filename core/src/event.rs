//! Choreography events — everything the controller did, in order.
//!
//! Every event is appended to the journal as it happens.
//! Variants are only ever appended, never removed or reordered.

use crate::{
    position::PositionStrategy,
    state::AntState,
    types::{AntId, Millis, RunId},
};
use serde::{Deserialize, Serialize};

/// Who caused an ant update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Peer,
    Stagger,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChoreoEvent {
    // ── Lifecycle ──────────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed:   u64,
    },
    ControllerReady {
        at:   Millis,
        ants: usize,
    },

    // ── Registry ───────────────────────────────────
    AntCreated {
        at:     Millis,
        ant_id: AntId,
        path:   String,
        state:  AntState,
    },
    AntRemoved {
        at:     Millis,
        ant_id: AntId,
        path:   String,
    },
    RemoveOnEmpty {
        at: Millis,
    },
    PublishFailed {
        at:     Millis,
        path:   String,
        reason: String,
    },

    // ── State changes ──────────────────────────────
    AntUpdated {
        at:     Millis,
        ant_id: AntId,
        source: UpdateSource,
        state:  AntState,
    },
    StaleUpdateSkipped {
        at:     Millis,
        ant_id: AntId,
    },
    DelayChanged {
        at:    Millis,
        value: serde_json::Value,
    },

    // ── Commands ───────────────────────────────────
    CommandInvoked {
        at:      Millis,
        command: String,
    },
    StaggerScheduled {
        at:            Millis,
        strategy:      PositionStrategy,
        delay:         Millis,
        size_override: Option<f64>,
        count:         usize,
    },
}

impl ChoreoEvent {
    /// Stable name for the journal's event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }     => "run_initialized",
            Self::ControllerReady { .. }    => "controller_ready",
            Self::AntCreated { .. }         => "ant_created",
            Self::AntRemoved { .. }         => "ant_removed",
            Self::RemoveOnEmpty { .. }      => "remove_on_empty",
            Self::PublishFailed { .. }      => "publish_failed",
            Self::AntUpdated { .. }         => "ant_updated",
            Self::StaleUpdateSkipped { .. } => "stale_update_skipped",
            Self::DelayChanged { .. }       => "delay_changed",
            Self::CommandInvoked { .. }     => "command_invoked",
            Self::StaggerScheduled { .. }   => "stagger_scheduled",
        }
    }

    /// Virtual time of the event. Run initialisation happens at 0.
    pub fn at(&self) -> Millis {
        match self {
            Self::RunInitialized { .. } => 0.0,
            Self::ControllerReady { at, .. }
            | Self::AntCreated { at, .. }
            | Self::AntRemoved { at, .. }
            | Self::RemoveOnEmpty { at }
            | Self::PublishFailed { at, .. }
            | Self::AntUpdated { at, .. }
            | Self::StaleUpdateSkipped { at, .. }
            | Self::DelayChanged { at, .. }
            | Self::CommandInvoked { at, .. }
            | Self::StaggerScheduled { at, .. } => *at,
        }
    }
}

/// The journal entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:          Option<i64>,
    pub run_id:      RunId,
    pub at:          Millis,
    pub event_type:  String,
    pub payload:     String, // JSON-serialized ChoreoEvent
    pub recorded_at: String,
}
