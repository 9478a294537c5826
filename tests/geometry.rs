//! Integration tests for layer decoding and material partitioning.

mod common;

use common::*;
use fbx::prelude::*;
use fbx::object::PartitionSpan;
use fbx::util::math::{DVec2, DVec3};

const GEOMETRY_UID: i64 = 1001;
const MODEL_UID: i64 = 2001;
const MATERIAL_A_UID: i64 = 3001;
const MATERIAL_B_UID: i64 = 3002;

/// A unit plane made of two triangles over four vertices.
fn plane_vertices() -> Vec<f64> {
    vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ]
}

fn plane_geometry(extra_layers: Vec<El>) -> El {
    let mut children = vec![
        el("Vertices", vec![P::DArr(plane_vertices())], vec![]),
        el(
            "PolygonVertexIndex",
            vec![P::IArr(vec![0, 1, -3, 0, 2, -4])],
            vec![],
        ),
    ];
    children.extend(extra_layers);
    el(
        "Geometry",
        vec![P::I64(GEOMETRY_UID), P::s("Plane\0\x01Geometry"), P::s("Mesh")],
        children,
    )
}

fn material(uid: i64, name: &str) -> El {
    el(
        "Material",
        vec![P::I64(uid), P::Str(format!("{name}\0\x01Material")), P::s("")],
        vec![el(
            "Properties70",
            vec![],
            vec![el(
                "P",
                vec![
                    P::s("DiffuseColor"),
                    P::s("Color"),
                    P::s(""),
                    P::s("A"),
                    P::F64(1.0),
                    P::F64(0.0),
                    P::F64(0.0),
                ],
                vec![],
            )],
        )],
    )
}

fn material_layer(indices: Vec<i32>, mapping: &str) -> El {
    el(
        "LayerElementMaterial",
        vec![P::I32(0)],
        vec![
            el("MappingInformationType", vec![P::s(mapping)], vec![]),
            el("ReferenceInformationType", vec![P::s("IndexToDirect")], vec![]),
            el("Materials", vec![P::IArr(indices)], vec![]),
        ],
    )
}

fn plane_doc(layers: Vec<El>) -> Vec<u8> {
    let objects = el(
        "Objects",
        vec![],
        vec![
            plane_geometry(layers),
            el(
                "Model",
                vec![P::I64(MODEL_UID), P::s("Plane\0\x01Model"), P::s("Mesh")],
                vec![],
            ),
            material(MATERIAL_A_UID, "MatA"),
            material(MATERIAL_B_UID, "MatB"),
        ],
    );
    let connections = el(
        "Connections",
        vec![],
        vec![
            el("C", vec![P::s("OO"), P::I64(GEOMETRY_UID), P::I64(MODEL_UID)], vec![]),
            el("C", vec![P::s("OO"), P::I64(MATERIAL_A_UID), P::I64(MODEL_UID)], vec![]),
            el("C", vec![P::s("OO"), P::I64(MATERIAL_B_UID), P::I64(MODEL_UID)], vec![]),
            el("C", vec![P::s("OO"), P::I64(MODEL_UID), P::I64(0)], vec![]),
        ],
    );
    encode(7400, &[objects, connections])
}

#[test]
fn test_two_material_plane_partitions() {
    let scene = load(
        &plane_doc(vec![material_layer(vec![0, 1], "ByPolygon")]),
        LoadFlags::default(),
    )
    .unwrap();
    let data = scene.mesh(0).unwrap().geometry().unwrap().data();

    assert_eq!(data.materials.as_deref(), Some(&[0, 1][..]));
    assert_eq!(data.partitions.len(), 2);
    assert_eq!(
        data.partitions[0].spans,
        vec![PartitionSpan { polygon_start: 0, polygon_count: 1, vertex_start: 0, vertex_count: 3 }]
    );
    assert_eq!(
        data.partitions[1].spans,
        vec![PartitionSpan { polygon_start: 1, polygon_count: 1, vertex_start: 3, vertex_count: 3 }]
    );

    // Partition spans form a disjoint cover of all polygons.
    let covered: usize = data.partitions.iter().map(|p| p.polygon_count()).sum();
    assert_eq!(covered, 2);
}

#[test]
fn test_all_same_material_layer() {
    let scene = load(
        &plane_doc(vec![material_layer(vec![1], "AllSame")]),
        LoadFlags::default(),
    )
    .unwrap();
    let data = scene.mesh(0).unwrap().geometry().unwrap().data();
    assert_eq!(data.materials.as_deref(), Some(&[1, 1][..]));
    // Indices 0 and 1 both exist so the single run lands in partition 1.
    assert_eq!(data.partitions.len(), 2);
    assert!(data.partitions[0].spans.is_empty());
    assert_eq!(data.partitions[1].polygon_count(), 2);
}

#[test]
fn test_materials_enumerate_in_file_order() {
    let scene = load(
        &plane_doc(vec![material_layer(vec![0, 1], "ByPolygon")]),
        LoadFlags::default(),
    )
    .unwrap();
    let mesh = scene.mesh(0).unwrap();
    assert_eq!(mesh.material_count(), 2);
    assert!(mesh.material(0).unwrap().name() == "MatA");
    assert!(mesh.material(1).unwrap().name() == "MatB");
    assert!(mesh.material(2).is_none());
    assert_eq!(
        mesh.material(0).unwrap().diffuse_color(),
        DVec3::new(1.0, 0.0, 0.0)
    );

    // Successive indexed queries enumerate in the same order as the
    // connection list.
    let by_iter: Vec<u64> = mesh.materials().map(|m| m.uid()).collect();
    assert_eq!(by_iter, vec![MATERIAL_A_UID as u64, MATERIAL_B_UID as u64]);
}

#[test]
fn test_uv_layer_index_to_direct() {
    // Two distinct UV values indexed per corner.
    let uv_layer = el(
        "LayerElementUV",
        vec![P::I32(0)],
        vec![
            el("MappingInformationType", vec![P::s("ByPolygonVertex")], vec![]),
            el("ReferenceInformationType", vec![P::s("IndexToDirect")], vec![]),
            el("UV", vec![P::DArr(vec![0.0, 0.0, 1.0, 1.0])], vec![]),
            el("UVIndex", vec![P::IArr(vec![0, 1, 0, 1, 0, 1])], vec![]),
        ],
    );
    let scene = load(&plane_doc(vec![uv_layer]), LoadFlags::default()).unwrap();
    let data = scene.mesh(0).unwrap().geometry().unwrap().data();

    let uvs = data.uvs[0].as_ref().expect("uv channel 0 present");
    assert_eq!(uvs.len(), data.vertex_count());
    assert_eq!(uvs[0], DVec2::new(0.0, 0.0));
    assert_eq!(uvs[1], DVec2::new(1.0, 1.0));
    assert_eq!(uvs[2], DVec2::new(0.0, 0.0));
    assert!(data.uvs[1].is_none());
}

#[test]
fn test_uv_layer_channel_slot() {
    let uv_layer = el(
        "LayerElementUV",
        vec![P::I32(2)],
        vec![
            el("MappingInformationType", vec![P::s("ByPolygonVertex")], vec![]),
            el("ReferenceInformationType", vec![P::s("Direct")], vec![]),
            el(
                "UV",
                vec![P::DArr(vec![0.5; 12])],
                vec![],
            ),
        ],
    );
    let scene = load(&plane_doc(vec![uv_layer]), LoadFlags::default()).unwrap();
    let data = scene.mesh(0).unwrap().geometry().unwrap().data();
    assert!(data.uvs[0].is_none());
    assert!(data.uvs[2].is_some());
}

#[test]
fn test_by_vertex_normals() {
    // One normal per original vertex; shared vertices keep one value
    // across every emitted copy.
    let normals: Vec<f64> = vec![
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 1.0, 0.0,
    ];
    let layer = el(
        "LayerElementNormal",
        vec![P::I32(0)],
        vec![
            el("MappingInformationType", vec![P::s("ByVertex")], vec![]),
            el("ReferenceInformationType", vec![P::s("Direct")], vec![]),
            el("Normals", vec![P::DArr(normals)], vec![]),
        ],
    );
    let scene = load(&plane_doc(vec![layer]), LoadFlags::default()).unwrap();
    let data = scene.mesh(0).unwrap().geometry().unwrap().data();
    let normals = data.normals.as_ref().unwrap();

    for (e, &old) in data.to_old_vertices.iter().enumerate() {
        let expected = match old {
            0 => DVec3::new(1.0, 0.0, 0.0),
            1 => DVec3::new(0.0, 1.0, 0.0),
            2 => DVec3::new(0.0, 0.0, 1.0),
            _ => DVec3::new(1.0, 1.0, 0.0),
        };
        assert_eq!(normals[e], expected, "emitted vertex {e}");
    }
}

#[test]
fn test_by_edge_layer_is_skipped() {
    let layer = el(
        "LayerElementNormal",
        vec![P::I32(0)],
        vec![
            el("MappingInformationType", vec![P::s("ByEdge")], vec![]),
            el("ReferenceInformationType", vec![P::s("Direct")], vec![]),
            el("Normals", vec![P::DArr(vec![0.0; 6])], vec![]),
        ],
    );
    let scene = load(&plane_doc(vec![layer]), LoadFlags::default()).unwrap();
    let data = scene.mesh(0).unwrap().geometry().unwrap().data();
    // The unsupported layer is dropped, the geometry survives.
    assert!(data.normals.is_none());
    assert_eq!(data.vertex_count(), 6);
}

#[test]
fn test_texture_reaches_material() {
    let texture_uid = 4001i64;
    let objects = el(
        "Objects",
        vec![],
        vec![
            plane_geometry(vec![]),
            el(
                "Model",
                vec![P::I64(MODEL_UID), P::s("Plane\0\x01Model"), P::s("Mesh")],
                vec![],
            ),
            material(MATERIAL_A_UID, "MatA"),
            el(
                "Texture",
                vec![P::I64(texture_uid), P::s("Tex\0\x01Texture"), P::s("")],
                vec![
                    el("FileName", vec![P::s("textures/checker.png")], vec![]),
                    el("RelativeFilename", vec![P::s("checker.png")], vec![]),
                ],
            ),
        ],
    );
    let connections = el(
        "Connections",
        vec![],
        vec![
            el("C", vec![P::s("OO"), P::I64(GEOMETRY_UID), P::I64(MODEL_UID)], vec![]),
            el("C", vec![P::s("OO"), P::I64(MATERIAL_A_UID), P::I64(MODEL_UID)], vec![]),
            el(
                "C",
                vec![
                    P::s("OP"),
                    P::I64(texture_uid),
                    P::I64(MATERIAL_A_UID),
                    P::s("DiffuseColor"),
                ],
                vec![],
            ),
        ],
    );
    let scene = load(&encode(7400, &[objects, connections]), LoadFlags::default()).unwrap();

    let mesh = scene.mesh(0).unwrap();
    let texture = mesh
        .material(0)
        .unwrap()
        .texture("DiffuseColor")
        .expect("texture wired to DiffuseColor");
    assert!(texture.filename() == "textures/checker.png");
    assert!(texture.relative_filename() == "checker.png");
    assert!(mesh.material(0).unwrap().texture("NormalMap").is_none());
}
