//! Position strategies — where an ant goes next.
//!
//! Every strategy is a pure function of the canvas size and a random
//! source. None of them hold state between calls.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Share of the half-canvas used for the outer ring.
pub const OUTER_RING: f64 = 0.8;
/// Share of the half-canvas used for the inner cluster.
pub const INNER_RING: f64 = 0.2;
/// Probability that a ring sample lands on the inner cluster.
pub const INNER_RING_CHANCE: f64 = 0.2;

/// Wide edge band, picked with probability 0.7.
pub const WIDE_BAND: f64 = 0.8;
/// Narrow edge band, picked with probability 0.3.
pub const NARROW_BAND: f64 = 0.4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The named distributions the choreography can draw from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PositionStrategy {
    Uniform,
    Ring,
    Edge,
    Center,
}

impl PositionStrategy {
    pub fn sample(&self, canvas_size: f64, rng: &mut dyn RandomSource) -> Point {
        match self {
            Self::Uniform => uniform(canvas_size, rng),
            Self::Ring    => ring_biased(canvas_size, rng),
            Self::Edge    => edge_biased(canvas_size, rng).point,
            Self::Center  => fixed_center(canvas_size),
        }
    }
}

/// Both coordinates independently uniform over [0, canvas_size).
pub fn uniform(canvas_size: f64, rng: &mut dyn RandomSource) -> Point {
    Point {
        x: rng.next_f64() * canvas_size,
        y: rng.next_f64() * canvas_size,
    }
}

/// Mostly on an outer ring, sometimes clustered near the centre.
pub fn ring_biased(canvas_size: f64, rng: &mut dyn RandomSource) -> Point {
    let max = canvas_size / 2.0;

    // Half circle, mirrored half the time.
    let mut angle = rng.next_f64() * PI;
    if rng.next_f64() > 0.5 {
        angle = -angle;
    }

    let radius = if rng.next_f64() > 1.0 - INNER_RING_CHANCE {
        INNER_RING * max
    } else {
        OUTER_RING * max
    };

    Point {
        x: angle.sin() * radius + max,
        y: angle.cos() * radius + max,
    }
}

/// Which side of the canvas an edge sample was pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

/// An edge sample together with the band geometry it was drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSample {
    pub point: Point,
    pub side:  Side,
    /// Low boundary: `(1 - band) / 2 * canvas_size`.
    pub margin: f64,
    /// High boundary: `(band + border) * canvas_size`.
    pub far_edge: f64,
}

/// Clustered along one of the four sides, with a variable band width.
pub fn edge_biased(canvas_size: f64, rng: &mut dyn RandomSource) -> EdgeSample {
    let side_roll = rng.next_f64();
    let band = if rng.next_f64() > 0.7 { NARROW_BAND } else { WIDE_BAND };

    let border = (1.0 - band) / 2.0;
    let margin = border * canvas_size;
    let far_edge = (band + border) * canvas_size;
    let along = rng.next_f64() * band * canvas_size + margin;

    let (point, side) = if side_roll > 0.75 {
        (Point::new(margin, along), Side::Left)
    } else if side_roll > 0.5 {
        (Point::new(far_edge, along), Side::Right)
    } else if side_roll > 0.25 {
        (Point::new(along, far_edge), Side::Bottom)
    } else {
        (Point::new(along, margin), Side::Top)
    };

    EdgeSample { point, side, margin, far_edge }
}

/// Always the middle of the canvas. Used for the implode phase.
pub fn fixed_center(canvas_size: f64) -> Point {
    let c = canvas_size / 2.0;
    Point::new(c, c)
}
