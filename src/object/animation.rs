//! Animation curves and curve nodes.
//!
//! Keys are stored as parallel time/value arrays, strictly ascending by
//! time (FBX ticks). Key interpolation flags are accepted in the file
//! but sampling is always linear.

use crate::tree::Element;
use crate::util::math::DVec3;
use crate::util::{Error, Result};

use super::properties::f64_property;

/// One scalar animation curve.
#[derive(Debug, Clone, Default)]
pub struct CurveData {
    /// Key times in FBX ticks, strictly increasing.
    pub times: Vec<i64>,
    /// Key values, parallel with `times`.
    pub values: Vec<f64>,
}

pub(crate) fn parse_curve(element: &Element) -> Result<CurveData> {
    let times = element
        .child("KeyTime")
        .and_then(|el| el.property(0))
        .ok_or_else(|| Error::invalid("animation curve has no KeyTime"))?
        .to_i64_array()?;
    let values = element
        .child("KeyValueFloat")
        .and_then(|el| el.property(0))
        .ok_or_else(|| Error::invalid("animation curve has no KeyValueFloat"))?
        .to_f64_array()?;

    if times.len() != values.len() {
        return Err(Error::invariant(format!(
            "curve carries {} times but {} values",
            times.len(),
            values.len()
        )));
    }
    if times.is_empty() {
        return Err(Error::invariant("curve has no keys"));
    }
    if times.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::invariant("curve key times are not strictly increasing"));
    }

    Ok(CurveData { times, values })
}

impl CurveData {
    /// Sample the curve at tick `t`, interpolating linearly between the
    /// surrounding keys and clamping at both ends.
    pub fn evaluate(&self, t: i64) -> f64 {
        match self.times.partition_point(|&k| k <= t) {
            0 => self.values.first().copied().unwrap_or(0.0),
            n if n == self.times.len() => self.values[n - 1],
            n => {
                let i = n - 1;
                let span = (self.times[i + 1] - self.times[i]) as f64;
                let f = (t - self.times[i]) as f64 / span;
                self.values[i] + (self.values[i + 1] - self.values[i]) * f
            }
        }
    }
}

/// Per-component defaults of an `AnimationCurveNode`; components without
/// a connected curve sample to these.
#[derive(Debug, Clone, Default)]
pub struct CurveNodeData {
    pub defaults: DVec3,
}

pub(crate) fn parse_curve_node(element: &Element) -> CurveNodeData {
    CurveNodeData {
        defaults: DVec3::new(
            f64_property(element, "d|X", 0.0),
            f64_property(element, "d|Y", 0.0),
            f64_property(element, "d|Z", 0.0),
        ),
    }
}
