//! Point-in-time view of the whole controller, as handed to peers on fetch.

use crate::{
    state::AntState,
    types::{AntId, Millis},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntView {
    pub id:    AntId,
    pub path:  String,
    pub state: AntState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreoSnapshot {
    pub at:             Millis,
    pub delay:          serde_json::Value,
    pub pending_timers: usize,
    /// Live ants in registry order.
    pub ants:           Vec<AntView>,
}
