//! Virtual clock — owns the current choreography time.

use crate::types::Millis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ChoreoClock {
    pub now: Millis,
}

impl ChoreoClock {
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Move forward to `t`. Time never runs backwards; an earlier `t`
    /// leaves the clock where it is. Returns the new time.
    pub fn advance_to(&mut self, t: Millis) -> Millis {
        if t > self.now {
            self.now = t;
        }
        self.now
    }
}
