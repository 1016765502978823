//! The publish/subscribe boundary.
//!
//! The controller only needs four primitives from the state-sync layer:
//! publish a named state, push a new value for it, withdraw it, and
//! declare a remotely callable method. Inbound sets and calls are routed
//! to `Choreographer::handle_set` / `Choreographer::handle_call` by
//! whoever drives the substrate.

use crate::error::{ChoreoError, ChoreoResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// How an external set on a published state is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetMode {
    /// The controller merges the submission and returns the authoritative value.
    Merge,
    /// The submission is stored verbatim.
    AcceptAny,
}

/// Opaque reference to a published state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateHandle {
    pub id:   u64,
    pub name: String,
}

pub trait Substrate {
    fn publish_state(
        &mut self,
        name: &str,
        initial: Value,
        mode: SetMode,
    ) -> ChoreoResult<StateHandle>;

    /// Push a new authoritative value to every subscriber.
    fn post_value(&mut self, handle: &StateHandle, value: Value) -> ChoreoResult<()>;

    fn unpublish(&mut self, handle: &StateHandle) -> ChoreoResult<()>;

    fn register_method(&mut self, name: &str) -> ChoreoResult<()>;
}

/// One entry in the loopback change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Change {
    Add    { path: String, value: Value },
    Change { path: String, value: Value },
    Remove { path: String },
}

#[derive(Debug, Clone)]
struct PublishedState {
    handle: StateHandle,
    mode:   SetMode,
    value:  Value,
}

/// In-process substrate. Keeps published states and a change feed that a
/// peer loop (or a test) can drain.
#[derive(Debug, Default)]
pub struct LoopbackSubstrate {
    states:       BTreeMap<String, PublishedState>,
    methods:      BTreeSet<String>,
    changes:      Vec<Change>,
    next_handle:  u64,
    fail_publish: Option<String>,
    fail_methods: bool,
}

impl LoopbackSubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every publish whose name starts with `prefix` fails until cleared.
    pub fn fail_publishes_matching(&mut self, prefix: impl Into<String>) {
        self.fail_publish = Some(prefix.into());
    }

    pub fn clear_failures(&mut self) {
        self.fail_publish = None;
        self.fail_methods = false;
    }

    /// Every method registration fails until cleared.
    pub fn fail_method_registration(&mut self) {
        self.fail_methods = true;
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.states.get(name).map(|s| &s.value)
    }

    pub fn mode(&self, name: &str) -> Option<SetMode> {
        self.states.get(name).map(|s| s.mode)
    }

    pub fn is_published(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn published_count(&self) -> usize {
        self.states.len()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    pub fn drain_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    fn lookup(&mut self, handle: &StateHandle) -> ChoreoResult<&mut PublishedState> {
        match self.states.get_mut(&handle.name) {
            Some(s) if s.handle.id == handle.id => Ok(s),
            _ => Err(ChoreoError::UnknownState { name: handle.name.clone() }),
        }
    }
}

impl Substrate for LoopbackSubstrate {
    fn publish_state(
        &mut self,
        name: &str,
        initial: Value,
        mode: SetMode,
    ) -> ChoreoResult<StateHandle> {
        if let Some(prefix) = &self.fail_publish {
            if name.starts_with(prefix.as_str()) {
                return Err(ChoreoError::Publish {
                    name:   name.to_string(),
                    reason: "substrate refused the publish".into(),
                });
            }
        }
        if self.states.contains_key(name) {
            return Err(ChoreoError::Publish {
                name:   name.to_string(),
                reason: "path already published".into(),
            });
        }

        self.next_handle += 1;
        let handle = StateHandle { id: self.next_handle, name: name.to_string() };
        self.states.insert(
            name.to_string(),
            PublishedState { handle: handle.clone(), mode, value: initial.clone() },
        );
        self.changes.push(Change::Add { path: name.to_string(), value: initial });
        Ok(handle)
    }

    fn post_value(&mut self, handle: &StateHandle, value: Value) -> ChoreoResult<()> {
        let state = self.lookup(handle)?;
        state.value = value.clone();
        self.changes.push(Change::Change { path: handle.name.clone(), value });
        Ok(())
    }

    fn unpublish(&mut self, handle: &StateHandle) -> ChoreoResult<()> {
        self.lookup(handle)?;
        self.states.remove(&handle.name);
        self.changes.push(Change::Remove { path: handle.name.clone() });
        Ok(())
    }

    fn register_method(&mut self, name: &str) -> ChoreoResult<()> {
        if self.fail_methods || !self.methods.insert(name.to_string()) {
            return Err(ChoreoError::Startup {
                name:   name.to_string(),
                reason: "method registration refused".into(),
            });
        }
        Ok(())
    }
}
