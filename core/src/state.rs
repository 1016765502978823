//! Ant state and the merge policy for partial external updates.
//!
//! POLICY: field-wise overwrite-if-present. A field counts as absent when
//! it is missing, null, not of the expected shape, or the "empty" value
//! for that field:
//!   - `pos`:   any well-formed point is present, including (0, 0).
//!   - `color`: the empty string is absent.
//!   - `size`:  0 and NaN are absent. Negative sizes are kept verbatim.
//!
//! Treating size 0 as absent means a peer cannot shrink an ant to nothing
//! through a set. Whether that is protection or a limitation is unsettled;
//! the tests pin the current behaviour.

use crate::position::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The published value of one ant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AntState {
    pub pos:   Point,
    pub color: String,
    pub size:  f64,
}

/// A partial update submitted by a remote peer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AntPatch {
    pub pos:   Option<Point>,
    pub color: Option<String>,
    pub size:  Option<f64>,
}

impl AntPatch {
    /// Read a patch from an arbitrary submitted JSON value.
    /// Fields of the wrong shape are dropped; a non-object yields an empty patch.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let pos = obj
            .get("pos")
            .and_then(|v| serde_json::from_value::<Point>(v.clone()).ok());

        let color = obj
            .get("color")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let size = obj.get("size").and_then(Value::as_f64);

        Self { pos, color, size }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// True when merging this patch cannot change any field.
    pub fn is_empty(&self) -> bool {
        self.pos.is_none() && self.present_color().is_none() && self.present_size().is_none()
    }

    fn present_color(&self) -> Option<&str> {
        self.color.as_deref().filter(|c| !c.is_empty())
    }

    fn present_size(&self) -> Option<f64> {
        self.size.filter(|s| *s != 0.0 && !s.is_nan())
    }
}

impl AntState {
    /// Merge a patch into this state. Absent fields keep their stored value.
    pub fn merge(&self, patch: &AntPatch) -> AntState {
        AntState {
            pos:   patch.pos.unwrap_or(self.pos),
            color: patch.present_color().unwrap_or(self.color.as_str()).to_owned(),
            size:  patch.present_size().unwrap_or(self.size),
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
