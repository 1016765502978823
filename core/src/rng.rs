//! Deterministic random number generation.
//!
//! RULE: Nothing in the controller may call any platform RNG.
//! Position and colour generators draw from a `RandomSource`, which
//! is either a seeded stream from the `RngBank` or, in tests, a
//! `ScriptedRng` replaying fixed values.
//!
//! Each purpose gets its own stream, seeded from
//! (master_seed XOR slot_index). Adding a new slot never changes
//! the existing streams.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// Anything that can hand out uniform floats in [0.0, 1.0).
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// A named, deterministic RNG stream.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RandomSource for StreamRng {
    fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

/// Replays a fixed list of values, cycling when exhausted.
/// Used by tests to pin generator branches.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "ScriptedRng needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

/// All RNG streams for a single run, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn stream(&self, slot: StreamSlot) -> StreamRng {
        StreamRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries — only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Spawn = 0,
    Motion = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Motion => "motion",
        }
    }
}
