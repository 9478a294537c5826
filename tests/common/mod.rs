//! In-memory binary FBX fixture builder shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

/// One property of a fixture element.
pub enum P {
    I16(i16),
    Bool(bool),
    I32(i32),
    F32(f32),
    F64(f64),
    I64(i64),
    Str(String),
    Raw(Vec<u8>),
    BArr(Vec<bool>),
    IArr(Vec<i32>),
    LArr(Vec<i64>),
    FArr(Vec<f32>),
    DArr(Vec<f64>),
    /// `d` array with encoding 1 (zlib).
    DArrZip(Vec<f64>),
    /// `i` array with encoding 1 (zlib).
    IArrZip(Vec<i32>),
}

impl P {
    pub fn s(text: &str) -> P {
        P::Str(text.to_string())
    }
}

pub struct El {
    pub id: String,
    pub props: Vec<P>,
    pub children: Vec<El>,
}

pub fn el(id: &str, props: Vec<P>, children: Vec<El>) -> El {
    El {
        id: id.to_string(),
        props,
        children,
    }
}

/// Route loader warnings to the test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Encode a document with the framing implied by the version.
pub fn encode(version: u32, top: &[El]) -> Vec<u8> {
    encode_framed(version, version >= 7500, top)
}

/// Encode a document with an explicit framing (for mismatch tests).
pub fn encode_framed(version: u32, wide: bool, top: &[El]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"Kaydara FBX Binary  \x00");
    out.extend_from_slice(&[0x1a, 0x00]);
    out.extend_from_slice(&version.to_le_bytes());
    for element in top {
        emit(element, &mut out, wide);
    }
    out.resize(out.len() + sentinel_len(wide), 0);
    out
}

fn sentinel_len(wide: bool) -> usize {
    if wide {
        25
    } else {
        13
    }
}

fn emit(element: &El, out: &mut Vec<u8>, wide: bool) {
    let header = out.len();
    let field = if wide { 8 } else { 4 };
    out.resize(out.len() + 3 * field, 0);
    out.push(element.id.len() as u8);
    out.extend_from_slice(element.id.as_bytes());

    let props_start = out.len();
    for prop in &element.props {
        emit_prop(prop, out);
    }
    let prop_length = out.len() - props_start;

    if !element.children.is_empty() {
        for child in &element.children {
            emit(child, out, wide);
        }
        out.resize(out.len() + sentinel_len(wide), 0);
    }

    let end = out.len() as u64;
    patch(out, header, wide, end, element.props.len() as u64, prop_length as u64);
}

fn patch(out: &mut [u8], at: usize, wide: bool, end: u64, count: u64, length: u64) {
    if wide {
        out[at..at + 8].copy_from_slice(&end.to_le_bytes());
        out[at + 8..at + 16].copy_from_slice(&count.to_le_bytes());
        out[at + 16..at + 24].copy_from_slice(&length.to_le_bytes());
    } else {
        out[at..at + 4].copy_from_slice(&(end as u32).to_le_bytes());
        out[at + 4..at + 8].copy_from_slice(&(count as u32).to_le_bytes());
        out[at + 8..at + 12].copy_from_slice(&(length as u32).to_le_bytes());
    }
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn emit_array(out: &mut Vec<u8>, tag: u8, count: usize, encoding: u32, payload: &[u8]) {
    out.push(tag);
    out.extend_from_slice(&(count as u32).to_le_bytes());
    out.extend_from_slice(&encoding.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

fn emit_prop(prop: &P, out: &mut Vec<u8>) {
    match prop {
        P::I16(v) => {
            out.push(b'Y');
            out.extend_from_slice(&v.to_le_bytes());
        }
        P::Bool(v) => {
            out.push(b'C');
            out.push(*v as u8);
        }
        P::I32(v) => {
            out.push(b'I');
            out.extend_from_slice(&v.to_le_bytes());
        }
        P::F32(v) => {
            out.push(b'F');
            out.extend_from_slice(&v.to_le_bytes());
        }
        P::F64(v) => {
            out.push(b'D');
            out.extend_from_slice(&v.to_le_bytes());
        }
        P::I64(v) => {
            out.push(b'L');
            out.extend_from_slice(&v.to_le_bytes());
        }
        P::Str(s) => {
            out.push(b'S');
            out.extend_from_slice(&(s.len() as u32).to_le_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        P::Raw(bytes) => {
            out.push(b'R');
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        P::BArr(v) => {
            let bytes: Vec<u8> = v.iter().map(|&b| b as u8).collect();
            emit_array(out, b'b', v.len(), 0, &bytes);
        }
        P::IArr(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
            emit_array(out, b'i', v.len(), 0, &bytes);
        }
        P::LArr(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
            emit_array(out, b'l', v.len(), 0, &bytes);
        }
        P::FArr(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
            emit_array(out, b'f', v.len(), 0, &bytes);
        }
        P::DArr(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
            emit_array(out, b'd', v.len(), 0, &bytes);
        }
        P::DArrZip(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
            emit_array(out, b'd', v.len(), 1, &deflate(&bytes));
        }
        P::IArrZip(v) => {
            let bytes: Vec<u8> = v.iter().flat_map(|x| x.to_le_bytes()).collect();
            emit_array(out, b'i', v.len(), 1, &deflate(&bytes));
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical fixtures
// ---------------------------------------------------------------------------

/// The eight corners of the canonical cube fixture.
pub const CUBE_VERTICES: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// Quad faces of the cube, one per side.
pub const CUBE_FACES: [[i32; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 4, 5, 1],
    [1, 5, 6, 2],
    [2, 6, 7, 3],
    [3, 7, 4, 0],
];

/// Outward face normal per cube face.
pub const CUBE_FACE_NORMALS: [[f64; 3]; 6] = [
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [0.0, -1.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [-1.0, 0.0, 0.0],
];

pub const CUBE_GEOMETRY_UID: i64 = 1001;
pub const CUBE_MODEL_UID: i64 = 2001;

pub fn cube_vertex_array() -> Vec<f64> {
    CUBE_VERTICES.iter().flatten().copied().collect()
}

pub fn cube_polygon_vertex_index() -> Vec<i32> {
    let mut stream = Vec::new();
    for face in &CUBE_FACES {
        stream.extend_from_slice(&face[..3]);
        stream.push(-(face[3] + 1));
    }
    stream
}

pub fn cube_normal_array() -> Vec<f64> {
    let mut normals = Vec::new();
    for normal in &CUBE_FACE_NORMALS {
        for _ in 0..4 {
            normals.extend_from_slice(normal);
        }
    }
    normals
}

/// The canonical cube geometry element, with a per-corner normal layer.
pub fn cube_geometry(vertices: P) -> El {
    el(
        "Geometry",
        vec![
            P::I64(CUBE_GEOMETRY_UID),
            P::s("Cube\0\x01Geometry"),
            P::s("Mesh"),
        ],
        vec![
            el("Vertices", vec![vertices], vec![]),
            el(
                "PolygonVertexIndex",
                vec![P::IArr(cube_polygon_vertex_index())],
                vec![],
            ),
            el(
                "LayerElementNormal",
                vec![P::I32(0)],
                vec![
                    el("Version", vec![P::I32(101)], vec![]),
                    el("MappingInformationType", vec![P::s("ByPolygonVertex")], vec![]),
                    el("ReferenceInformationType", vec![P::s("Direct")], vec![]),
                    el("Normals", vec![P::DArr(cube_normal_array())], vec![]),
                ],
            ),
        ],
    )
}

/// A whole cube document: one geometry, one mesh model, connected.
pub fn cube_doc(version: u32) -> Vec<u8> {
    let objects = el(
        "Objects",
        vec![],
        vec![
            cube_geometry(P::DArr(cube_vertex_array())),
            el(
                "Model",
                vec![P::I64(CUBE_MODEL_UID), P::s("Cube\0\x01Model"), P::s("Mesh")],
                vec![],
            ),
        ],
    );
    let connections = el(
        "Connections",
        vec![],
        vec![
            el(
                "C",
                vec![P::s("OO"), P::I64(CUBE_GEOMETRY_UID), P::I64(CUBE_MODEL_UID)],
                vec![],
            ),
            el("C", vec![P::s("OO"), P::I64(CUBE_MODEL_UID), P::I64(0)], vec![]),
        ],
    );
    encode(version, &[objects, connections])
}
