//! Skin deformers and cluster re-indexing.
//!
//! A cluster names vertices in the original, pre-triangulation space;
//! after triangulation one original vertex corresponds to several emitted
//! vertices. Re-indexing expands each `(original, weight)` pair onto the
//! emitted stream.

use tracing::warn;

use crate::tree::Element;
use crate::util::math::DMat4;
use crate::util::{Error, Result};

use super::geometry::GeometryData;

/// Per-bone binding of a skin, after re-indexing.
#[derive(Debug, Clone)]
pub struct ClusterData {
    /// Emitted vertex indices, parallel with `weights`.
    pub indices: Vec<i32>,
    pub weights: Vec<f64>,
    pub transform_matrix: DMat4,
    pub transform_link_matrix: DMat4,
    pub(crate) raw_indices: Vec<i32>,
    pub(crate) raw_weights: Vec<f64>,
}

pub(crate) fn parse_cluster(element: &Element) -> Result<ClusterData> {
    let raw_indices = match element.child("Indexes").and_then(|el| el.property(0)) {
        Some(prop) => prop.to_i32_array()?,
        None => Vec::new(),
    };
    let raw_weights = match element.child("Weights").and_then(|el| el.property(0)) {
        Some(prop) => prop.to_f64_array()?,
        None => Vec::new(),
    };
    if raw_indices.len() != raw_weights.len() {
        return Err(Error::invariant(format!(
            "cluster carries {} indices but {} weights",
            raw_indices.len(),
            raw_weights.len()
        )));
    }

    Ok(ClusterData {
        indices: Vec::new(),
        weights: Vec::new(),
        transform_matrix: matrix_child(element, "Transform")?,
        transform_link_matrix: matrix_child(element, "TransformLink")?,
        raw_indices,
        raw_weights,
    })
}

fn matrix_child(element: &Element, id: &str) -> Result<DMat4> {
    let Some(prop) = element.child(id).and_then(|el| el.property(0)) else {
        return Ok(DMat4::IDENTITY);
    };
    let values = prop.to_f64_array()?;
    let cols: [f64; 16] = values.as_slice().try_into().map_err(|_| {
        Error::invariant(format!("{id} carries {} values, expected 16", values.len()))
    })?;
    Ok(DMat4::from_cols_array(&cols))
}

impl ClusterData {
    /// Remap the raw `(original, weight)` pairs onto the geometry's
    /// emitted vertex stream.
    ///
    /// The inverse index (original vertex -> emitted vertices) is an
    /// intrusive linked list over two flat arrays, so construction does
    /// no per-vertex allocation. Lists are built back to front, which
    /// leaves each list in ascending emitted order.
    pub(crate) fn remap(&mut self, geometry: &GeometryData) {
        let emitted = &geometry.to_old_vertices;
        let old_count = emitted
            .iter()
            .copied()
            .max()
            .map_or(0, |m| m.max(0) as usize + 1);

        let mut head = vec![-1i32; old_count];
        let mut next = vec![-1i32; emitted.len()];
        for e in (0..emitted.len()).rev() {
            let old = emitted[e];
            if old < 0 {
                continue;
            }
            next[e] = head[old as usize];
            head[old as usize] = e as i32;
        }

        self.indices = Vec::with_capacity(self.raw_indices.len());
        self.weights = Vec::with_capacity(self.raw_weights.len());
        for (&old, &weight) in self.raw_indices.iter().zip(&self.raw_weights) {
            let Some(&first) = usize::try_from(old).ok().and_then(|i| head.get(i)) else {
                warn!(vertex = old, "cluster references vertex outside the mesh");
                continue;
            };
            let mut e = first;
            while e >= 0 {
                self.indices.push(e);
                self.weights.push(weight);
                e = next[e as usize];
            }
        }

        self.raw_indices = Vec::new();
        self.raw_weights = Vec::new();
    }
}
