//! Colour generation — randomized, visually pleasant HSL colours.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const LIGHTNESS: f64 = 60.0;
pub const MIN_SATURATION: f64 = 40.0;
pub const SATURATION_SPAN: f64 = 60.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HslColor {
    pub hue:        f64,
    pub saturation: f64,
    pub lightness:  f64,
}

impl HslColor {
    /// Hue in [0, 360), saturation in [40, 100), lightness fixed at 60.
    pub fn random(rng: &mut dyn RandomSource) -> Self {
        Self {
            hue:        rng.next_f64() * 360.0,
            saturation: MIN_SATURATION + rng.next_f64() * SATURATION_SPAN,
            lightness:  LIGHTNESS,
        }
    }
}

/// CSS form, the shape clients render directly.
impl fmt::Display for HslColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({},{}%,{}%)", self.hue, self.saturation, self.lightness)
    }
}
