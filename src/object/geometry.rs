//! Geometry assembly.
//!
//! `PolygonVertexIndex` encodes polygons as signed indices into
//! `Vertices`: a negative value marks the last corner of a polygon and
//! decodes as `-k - 1`. Assembly fan-triangulates the corner stream,
//! resolves layered attributes (normals, UVs, colors, tangents) through
//! their mapping/reference modes onto the emitted vertex stream, and
//! partitions polygons by material.

use tracing::warn;

use crate::tree::Element;
use crate::util::math::{DVec2, DVec3, DVec4};
use crate::util::{Error, Result};

/// How a layer's values are laid out with respect to the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexMapping {
    ByPolygonVertex,
    ByPolygon,
    ByVertex,
    AllSame,
}

/// A contiguous run of same-material polygons and its emitted vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpan {
    pub polygon_start: usize,
    pub polygon_count: usize,
    pub vertex_start: usize,
    pub vertex_count: usize,
}

impl PartitionSpan {
    /// Emitted triangle range of this span (valid when triangulated).
    pub fn triangle_start(&self) -> usize {
        self.vertex_start / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count / 3
    }
}

/// The polygons of a mesh assigned to one material.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub spans: Vec<PartitionSpan>,
}

impl Partition {
    pub fn polygon_count(&self) -> usize {
        self.spans.iter().map(|s| s.polygon_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.spans.iter().map(|s| s.triangle_count()).sum()
    }
}

/// Assembled geometry in emitted-vertex order.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub positions: Vec<DVec3>,
    pub normals: Option<Vec<DVec3>>,
    pub tangents: Option<Vec<DVec3>>,
    pub colors: Option<Vec<DVec4>>,
    pub uvs: [Option<Vec<DVec2>>; 4],
    /// Material index per original polygon.
    pub materials: Option<Vec<i32>>,
    /// Original FBX vertex index per emitted vertex.
    pub to_old_vertices: Vec<i32>,
    /// Original polygon-corner index per emitted vertex.
    pub to_old_indices: Vec<i32>,
    pub partitions: Vec<Partition>,
}

impl GeometryData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Parse a `Geometry` element of class `Mesh`.
pub(crate) fn parse_geometry(element: &Element, triangulate: bool) -> Result<GeometryData> {
    let vertices = element
        .child("Vertices")
        .and_then(|el| el.property(0))
        .ok_or_else(|| Error::invalid("geometry has no Vertices"))?;
    let polygons = element
        .child("PolygonVertexIndex")
        .and_then(|el| el.property(0))
        .ok_or_else(|| Error::invalid("geometry has no PolygonVertexIndex"))?;

    let raw_positions = chunk3(&vertices.to_f64_array()?)?;
    let corner_stream = polygons.to_i32_array()?;

    let (to_old_vertices, to_old_indices) = if triangulate {
        fan_triangulate(&corner_stream)
    } else {
        passthrough(&corner_stream)
    };

    let mut positions = Vec::with_capacity(to_old_vertices.len());
    for &old in &to_old_vertices {
        let p = usize::try_from(old)
            .ok()
            .and_then(|i| raw_positions.get(i))
            .ok_or_else(|| {
                Error::invariant(format!(
                    "polygon corner references vertex {old} of {}",
                    raw_positions.len()
                ))
            })?;
        positions.push(*p);
    }

    let table = PolygonTable::build(&corner_stream);

    let mut normals: Option<Vec<DVec3>> = None;
    let mut tangents: Option<Vec<DVec3>> = None;
    let mut colors: Option<Vec<DVec4>> = None;
    let mut uvs: [Option<Vec<DVec2>>; 4] = Default::default();
    let mut materials: Option<Vec<i32>> = None;

    for layer in element.children() {
        let id = layer.id();
        let outcome: Result<()> = if id == "LayerElementNormal" {
            if normals.is_none() {
                decode_vec3_layer(layer, &["Normals", "Normal"], &["NormalsIndex", "NormalIndex"])
                    .map(|src| {
                        normals =
                            src.map(|s| splat(&s, &to_old_indices, &to_old_vertices, &table));
                    })
            } else {
                Ok(())
            }
        } else if id == "LayerElementTangent" || id == "LayerElementTangents" {
            if tangents.is_none() {
                decode_vec3_layer(layer, &["Tangents", "Tangent"], &["TangentsIndex", "TangentIndex"])
                    .map(|src| {
                        tangents =
                            src.map(|s| splat(&s, &to_old_indices, &to_old_vertices, &table));
                    })
            } else {
                Ok(())
            }
        } else if id == "LayerElementColor" {
            if colors.is_none() {
                decode_vec4_layer(layer, &["Colors"], &["ColorIndex", "ColorsIndex"]).map(|src| {
                    colors = src.map(|s| splat(&s, &to_old_indices, &to_old_vertices, &table));
                })
            } else {
                Ok(())
            }
        } else if id == "LayerElementUV" {
            let channel = layer
                .property(0)
                .and_then(|p| p.to_i64().ok())
                .unwrap_or(0);
            if !(0..4).contains(&channel) {
                warn!(channel, "UV layer index out of range, skipping");
                continue;
            }
            let slot = channel as usize;
            if uvs[slot].is_none() {
                decode_vec2_layer(layer, &["UV"], &["UVIndex"]).map(|src| {
                    uvs[slot] = src.map(|s| splat(&s, &to_old_indices, &to_old_vertices, &table));
                })
            } else {
                Ok(())
            }
        } else if id == "LayerElementMaterial" {
            if materials.is_none() {
                decode_material_layer(layer, table.polygon_count()).map(|m| materials = m)
            } else {
                Ok(())
            }
        } else {
            continue;
        };

        if let Err(e) = outcome {
            // A mesh without one attribute layer beats no mesh at all.
            warn!(layer = %layer.id(), error = %e, "skipping geometry layer");
        }
    }

    let partitions = build_partitions(materials.as_deref(), &table, triangulate);

    Ok(GeometryData {
        positions,
        normals,
        tangents,
        colors,
        uvs,
        materials,
        to_old_vertices,
        to_old_indices,
        partitions,
    })
}

/// Parse a `Geometry` element of class `Shape` (a blend-shape target):
/// positions only, identity mappings, no polygons.
pub(crate) fn parse_shape(element: &Element) -> Result<GeometryData> {
    let vertices = element
        .child("Vertices")
        .and_then(|el| el.property(0))
        .ok_or_else(|| Error::invalid("shape has no Vertices"))?;
    let positions = chunk3(&vertices.to_f64_array()?)?;
    let identity: Vec<i32> = (0..positions.len() as i32).collect();
    Ok(GeometryData {
        positions,
        to_old_vertices: identity.clone(),
        to_old_indices: identity,
        partitions: vec![Partition::default()],
        ..Default::default()
    })
}

fn chunk3(values: &[f64]) -> Result<Vec<DVec3>> {
    if values.len() % 3 != 0 {
        return Err(Error::invariant(format!(
            "vertex array length {} is not a multiple of 3",
            values.len()
        )));
    }
    Ok(values
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect())
}

#[inline]
fn decode_corner(raw: i32) -> i32 {
    if raw < 0 {
        -raw - 1
    } else {
        raw
    }
}

/// Fan-triangulate the signed corner stream.
///
/// The first three corners of every polygon are emitted directly; each
/// further corner emits the triangle `(corner0, corner_prev, corner)`.
/// Returns per-emitted-vertex maps to the original vertex index and the
/// original corner index.
fn fan_triangulate(stream: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let mut to_old_vertices = Vec::with_capacity(stream.len() * 3 / 2);
    let mut to_old_indices = Vec::with_capacity(stream.len() * 3 / 2);

    let mut in_polygon = 0usize;
    for (i, &raw) in stream.iter().enumerate() {
        let mut emit = |corner: usize| {
            to_old_vertices.push(decode_corner(stream[corner]));
            to_old_indices.push(corner as i32);
        };
        if in_polygon <= 2 {
            emit(i);
        } else {
            emit(i - in_polygon);
            emit(i - 1);
            emit(i);
        }
        in_polygon += 1;
        if raw < 0 {
            in_polygon = 0;
        }
    }
    (to_old_vertices, to_old_indices)
}

/// Emit the corner stream unexpanded (no triangulation).
fn passthrough(stream: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let to_old_vertices = stream.iter().map(|&raw| decode_corner(raw)).collect();
    let to_old_indices = (0..stream.len() as i32).collect();
    (to_old_vertices, to_old_indices)
}

/// Per-corner polygon ownership and per-polygon corner counts.
struct PolygonTable {
    corner_polygon: Vec<u32>,
    corner_counts: Vec<usize>,
}

impl PolygonTable {
    fn build(stream: &[i32]) -> Self {
        let mut corner_polygon = Vec::with_capacity(stream.len());
        let mut corner_counts = Vec::new();
        let mut polygon = 0u32;
        let mut count = 0usize;
        for &raw in stream {
            corner_polygon.push(polygon);
            count += 1;
            if raw < 0 {
                corner_counts.push(count);
                polygon += 1;
                count = 0;
            }
        }
        // An unterminated trailing polygon still owns its corners.
        if count > 0 {
            corner_counts.push(count);
        }
        Self {
            corner_polygon,
            corner_counts,
        }
    }

    fn polygon_count(&self) -> usize {
        self.corner_counts.len()
    }

    /// Emitted vertices contributed by a polygon with `corners` corners.
    fn emitted_len(corners: usize, triangulated: bool) -> usize {
        if triangulated && corners > 2 {
            3 * (corners - 2)
        } else {
            corners
        }
    }
}

/// A decoded attribute layer: values plus the mapping/reference pair.
/// `indices` is `Some` for `IndexToDirect` reference.
struct LayerSource<T> {
    values: Vec<T>,
    indices: Option<Vec<i32>>,
    mapping: VertexMapping,
}

impl<T: Copy + Default> LayerSource<T> {
    /// Resolve one emitted vertex's attribute. Out-of-range or negative
    /// indirection entries fall back to a zero value.
    fn resolve(&self, corner: usize, old_vertex: i32, polygon: u32) -> T {
        let slot = match self.mapping {
            VertexMapping::ByPolygonVertex => corner,
            VertexMapping::ByVertex => old_vertex.max(0) as usize,
            VertexMapping::ByPolygon => polygon as usize,
            VertexMapping::AllSame => 0,
        };
        let index = match &self.indices {
            None => slot as i64,
            Some(indices) => indices.get(slot).map_or(-1, |&i| i64::from(i)),
        };
        if index < 0 {
            return T::default();
        }
        self.values.get(index as usize).copied().unwrap_or_default()
    }
}

fn layer_mapping(layer: &Element) -> Result<VertexMapping> {
    let Some(token) = layer
        .child("MappingInformationType")
        .and_then(|el| el.property(0))
        .and_then(|p| p.as_token())
    else {
        return Ok(VertexMapping::ByPolygonVertex);
    };
    if token == "ByPolygonVertex" {
        Ok(VertexMapping::ByPolygonVertex)
    } else if token == "ByPolygon" {
        Ok(VertexMapping::ByPolygon)
    } else if token == "ByVertex" || token == "ByVertice" || token == "ByControlPoint" {
        Ok(VertexMapping::ByVertex)
    } else if token == "AllSame" {
        Ok(VertexMapping::AllSame)
    } else {
        Err(Error::unsupported(format!("mapping mode '{token}'")))
    }
}

/// `Direct` yields `None`; `IndexToDirect` yields the index array.
fn layer_indices(layer: &Element, index_names: &[&str]) -> Result<Option<Vec<i32>>> {
    let Some(token) = layer
        .child("ReferenceInformationType")
        .and_then(|el| el.property(0))
        .and_then(|p| p.as_token())
    else {
        return Ok(None);
    };
    if token == "Direct" {
        Ok(None)
    } else if token == "IndexToDirect" || token == "Index" {
        for name in index_names {
            if let Some(prop) = layer.child(name).and_then(|el| el.property(0)) {
                return Ok(Some(prop.to_i32_array()?));
            }
        }
        // Writers sometimes claim IndexToDirect while storing direct data.
        Ok(None)
    } else {
        Err(Error::unsupported(format!("reference mode '{token}'")))
    }
}

fn layer_values(layer: &Element, data_names: &[&str]) -> Result<Option<Vec<f64>>> {
    for name in data_names {
        if let Some(prop) = layer.child(name).and_then(|el| el.property(0)) {
            return Ok(Some(prop.to_f64_array()?));
        }
    }
    Ok(None)
}

fn decode_vec2_layer(
    layer: &Element,
    data_names: &[&str],
    index_names: &[&str],
) -> Result<Option<LayerSource<DVec2>>> {
    let Some(raw) = layer_values(layer, data_names)? else {
        return Ok(None);
    };
    let values = raw
        .chunks_exact(2)
        .map(|c| DVec2::new(c[0], c[1]))
        .collect();
    Ok(Some(LayerSource {
        values,
        indices: layer_indices(layer, index_names)?,
        mapping: layer_mapping(layer)?,
    }))
}

fn decode_vec3_layer(
    layer: &Element,
    data_names: &[&str],
    index_names: &[&str],
) -> Result<Option<LayerSource<DVec3>>> {
    let Some(raw) = layer_values(layer, data_names)? else {
        return Ok(None);
    };
    let values = raw
        .chunks_exact(3)
        .map(|c| DVec3::new(c[0], c[1], c[2]))
        .collect();
    Ok(Some(LayerSource {
        values,
        indices: layer_indices(layer, index_names)?,
        mapping: layer_mapping(layer)?,
    }))
}

fn decode_vec4_layer(
    layer: &Element,
    data_names: &[&str],
    index_names: &[&str],
) -> Result<Option<LayerSource<DVec4>>> {
    let Some(raw) = layer_values(layer, data_names)? else {
        return Ok(None);
    };
    let values = raw
        .chunks_exact(4)
        .map(|c| DVec4::new(c[0], c[1], c[2], c[3]))
        .collect();
    Ok(Some(LayerSource {
        values,
        indices: layer_indices(layer, index_names)?,
        mapping: layer_mapping(layer)?,
    }))
}

/// Re-index a layer onto the emitted vertex stream.
fn splat<T: Copy + Default>(
    src: &LayerSource<T>,
    to_old_indices: &[i32],
    to_old_vertices: &[i32],
    table: &PolygonTable,
) -> Vec<T> {
    let mut out = Vec::with_capacity(to_old_indices.len());
    for e in 0..to_old_indices.len() {
        let corner = to_old_indices[e] as usize;
        let old_vertex = to_old_vertices[e];
        let polygon = table.corner_polygon.get(corner).copied().unwrap_or(0);
        out.push(src.resolve(corner, old_vertex, polygon));
    }
    out
}

/// The material layer resolves per original polygon, not per vertex.
fn decode_material_layer(layer: &Element, polygon_count: usize) -> Result<Option<Vec<i32>>> {
    let Some(prop) = layer.child("Materials").and_then(|el| el.property(0)) else {
        return Ok(None);
    };
    let values = prop.to_i32_array()?;
    match layer_mapping(layer)? {
        VertexMapping::AllSame => {
            let index = values.first().copied().unwrap_or(0);
            Ok(Some(vec![index; polygon_count]))
        }
        VertexMapping::ByPolygon => {
            if values.len() != polygon_count {
                return Err(Error::invariant(format!(
                    "material layer covers {} polygons, mesh has {polygon_count}",
                    values.len()
                )));
            }
            Ok(Some(values))
        }
        other => Err(Error::unsupported(format!(
            "material layer mapping {other:?}"
        ))),
    }
}

/// One partition per material index `0..=max`; a single all-covering
/// partition when no material layer is present. Contiguous same-material
/// polygon runs become spans with their emitted vertex ranges.
fn build_partitions(
    materials: Option<&[i32]>,
    table: &PolygonTable,
    triangulated: bool,
) -> Vec<Partition> {
    let polygon_count = table.polygon_count();
    let partition_count = match materials {
        Some(m) => m.iter().map(|&i| i.max(0) as usize + 1).max().unwrap_or(1),
        None => 1,
    };
    let mut partitions = vec![Partition::default(); partition_count];

    let material_of = |p: usize| materials.map_or(0, |m| m[p].max(0) as usize);

    let mut vertex_offset = 0usize;
    let mut p = 0usize;
    while p < polygon_count {
        let material = material_of(p);
        let polygon_start = p;
        let vertex_start = vertex_offset;
        let mut vertex_count = 0usize;
        while p < polygon_count && material_of(p) == material {
            vertex_count += PolygonTable::emitted_len(table.corner_counts[p], triangulated);
            p += 1;
        }
        vertex_offset += vertex_count;
        partitions[material].spans.push(PartitionSpan {
            polygon_start,
            polygon_count: p - polygon_start,
            vertex_start,
            vertex_count,
        });
    }
    partitions
}
