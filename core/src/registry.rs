//! The ant registry — sole owner of ant lifetime.
//!
//! Ants live in insertion order. Creation appends, removal pops the most
//! recent one, and the index in this order is the stagger index.

use crate::{
    color::HslColor,
    error::{ChoreoError, ChoreoResult},
    position::ring_biased,
    rng::RandomSource,
    state::{AntPatch, AntState},
    substrate::{SetMode, StateHandle, Substrate},
    types::AntId,
};

#[derive(Debug, Clone)]
pub struct Ant {
    pub id:    AntId,
    pub state: AntState,
    handle:    StateHandle,
}

impl Ant {
    pub fn name(&self) -> &str {
        &self.handle.name
    }
}

/// A frozen list of live ant ids, in registry order at the moment it was
/// taken. Later creates and removes do not touch it, and it can be
/// iterated any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster(Vec<AntId>);

impl Roster {
    pub fn iter(&self) -> impl Iterator<Item = AntId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = AntId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, AntId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

pub struct AntRegistry {
    namespace: String,
    next_id:   AntId,
    ants:      Vec<Ant>,
}

impl AntRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next_id:   0,
            ants:      Vec::new(),
        }
    }

    /// Published path for an ant id, e.g. `ants/#12`.
    pub fn path_for(&self, id: AntId) -> String {
        format!("{}/#{id}", self.namespace)
    }

    /// Allocate the next id, place the ant on the ring, publish it, and
    /// append it. If the publish fails nothing is appended; the id stays
    /// burnt so it is never handed out twice.
    pub fn create(
        &mut self,
        substrate: &mut dyn Substrate,
        rng: &mut dyn RandomSource,
        canvas_size: f64,
        size: f64,
    ) -> ChoreoResult<AntId> {
        let id = self.next_id;
        self.next_id += 1;

        let state = AntState {
            pos:   ring_biased(canvas_size, rng),
            color: HslColor::random(rng).to_string(),
            size,
        };
        let path = self.path_for(id);
        let handle = substrate.publish_state(&path, state.to_value()?, SetMode::Merge)?;

        self.ants.push(Ant { id, state, handle });
        Ok(id)
    }

    /// Withdraw and drop the most recently created live ant.
    pub fn remove_last(&mut self, substrate: &mut dyn Substrate) -> ChoreoResult<Ant> {
        let last = self.ants.last().ok_or(ChoreoError::EmptyRegistry)?;
        substrate.unpublish(&last.handle)?;
        self.ants.pop().ok_or(ChoreoError::EmptyRegistry)
    }

    /// Merge a patch into a live ant and push the result to subscribers.
    /// Returns `None` when the ant is no longer live.
    pub fn apply(
        &mut self,
        substrate: &mut dyn Substrate,
        id: AntId,
        patch: &AntPatch,
    ) -> ChoreoResult<Option<AntState>> {
        let Some(ant) = self.ants.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        let merged = ant.state.merge(patch);
        substrate.post_value(&ant.handle, merged.to_value()?)?;
        ant.state = merged.clone();
        Ok(Some(merged))
    }

    pub fn all(&self) -> Roster {
        Roster(self.ants.iter().map(|a| a.id).collect())
    }

    pub fn get(&self, id: AntId) -> Option<&Ant> {
        self.ants.iter().find(|a| a.id == id)
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Ant> {
        self.ants.iter().find(|a| a.name() == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ant> {
        self.ants.iter()
    }

    pub fn len(&self) -> usize {
        self.ants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ants.is_empty()
    }
}
