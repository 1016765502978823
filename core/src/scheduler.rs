//! Staggered scheduling — one deferred update per ant, offset by index.
//!
//! RULES:
//!   - Offsets are `index * delay`, index taken from the roster at call time.
//!   - Timers hold ant ids, never ant data. Liveness is checked at fire time.
//!   - Timers fire in (fire_at, scheduling order). With delay 0 every
//!     timer of one call shares an instant and may interleave with other
//!     calls that land on the same instant.
//!   - Nothing is ever cancelled. Removing an ant turns its pending
//!     updates into no-ops.

use crate::{
    position::PositionStrategy,
    registry::Roster,
    types::{AntId, Millis},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What happens when a timer fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TimerAction {
    /// Move one ant to a fresh sample of `strategy`.
    Reposition {
        ant_id:        AntId,
        strategy:      PositionStrategy,
        size_override: Option<f64>,
    },
    /// Run a whole stagger over whatever is registered at fire time.
    Stagger {
        strategy:      PositionStrategy,
        delay:         Millis,
        size_override: Option<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct Timer {
    pub fire_at: Millis,
    pub seq:     u64,
    pub action:  TimerAction,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so the BinaryHeap pops the earliest timer first.
impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .total_cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// One update placed by a stagger call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledUpdate {
    pub ant_id:  AntId,
    pub offset:  Millis,
    pub fire_at: Millis,
}

/// Offset for the `index`-th ant. Negative or non-finite offsets fire
/// immediately.
pub fn stagger_offset(index: usize, delay: Millis) -> Millis {
    let offset = index as f64 * delay;
    if offset.is_finite() && offset > 0.0 {
        offset
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
pub struct StaggerScheduler {
    queue:    BinaryHeap<Timer>,
    next_seq: u64,
}

impl StaggerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule one reposition per ant in `roster`, in roster order.
    pub fn stagger(
        &mut self,
        now: Millis,
        roster: &Roster,
        strategy: PositionStrategy,
        delay: Millis,
        size_override: Option<f64>,
    ) -> Vec<ScheduledUpdate> {
        roster
            .iter()
            .enumerate()
            .map(|(index, ant_id)| {
                let offset = stagger_offset(index, delay);
                let fire_at = self.defer(
                    now,
                    offset,
                    TimerAction::Reposition { ant_id, strategy, size_override },
                );
                ScheduledUpdate { ant_id, offset, fire_at }
            })
            .collect()
    }

    /// Queue a single action `after` units from `now`. Returns the fire time.
    pub fn defer(&mut self, now: Millis, after: Millis, action: TimerAction) -> Millis {
        let after = if after.is_finite() && after > 0.0 { after } else { 0.0 };
        let fire_at = now + after;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Timer { fire_at, seq, action });
        fire_at
    }

    /// Pop the earliest timer if it is due at or before `until`.
    pub fn pop_due(&mut self, until: Millis) -> Option<Timer> {
        if self.queue.peek()?.fire_at <= until {
            self.queue.pop()
        } else {
            None
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_fire_times_keep_scheduling_order() {
        let mut s = StaggerScheduler::new();
        for id in 0..4 {
            s.defer(
                0.0,
                5.0,
                TimerAction::Reposition { ant_id: id, strategy: PositionStrategy::Center, size_override: None },
            );
        }
        let order: Vec<AntId> = std::iter::from_fn(|| s.pop_due(5.0))
            .map(|t| match t.action {
                TimerAction::Reposition { ant_id, .. } => ant_id,
                TimerAction::Stagger { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn negative_and_nan_offsets_clamp_to_zero() {
        assert_eq!(stagger_offset(3, -2.0), 0.0);
        assert_eq!(stagger_offset(3, f64::NAN), 0.0);
        assert_eq!(stagger_offset(0, 10.0), 0.0);
        assert_eq!(stagger_offset(2, 0.1), 0.2);
    }

    #[test]
    fn timers_not_yet_due_stay_queued() {
        let mut s = StaggerScheduler::new();
        s.defer(
            0.0,
            100.0,
            TimerAction::Stagger { strategy: PositionStrategy::Uniform, delay: 1.0, size_override: None },
        );
        assert!(s.pop_due(99.0).is_none());
        assert_eq!(s.pending(), 1);
        assert!(s.pop_due(100.0).is_some());
        assert!(s.is_idle());
    }
}
