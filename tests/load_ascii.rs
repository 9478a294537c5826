//! Integration tests for the ASCII form.

mod common;

use common::*;
use fbx::prelude::*;
use fbx::util::math::DVec3;

/// The canonical cube as FBX text.
fn cube_text() -> String {
    let vertices = cube_vertex_array()
        .iter()
        .map(|v| format!("{v}"))
        .collect::<Vec<_>>()
        .join(",");
    let indices = cube_polygon_vertex_index()
        .iter()
        .map(|v| format!("{v}"))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "; FBX 7.3.0 project file\n\
         FBXHeaderExtension:  {{\n\
         \tFBXVersion: 7300\n\
         }}\n\
         Objects:  {{\n\
         \tGeometry: 1001, \"Geometry::Cube\", \"Mesh\" {{\n\
         \t\tVertices: *24 {{\n\
         \t\t\ta: {vertices}\n\
         \t\t}}\n\
         \t\tPolygonVertexIndex: *24 {{\n\
         \t\t\ta: {indices}\n\
         \t\t}}\n\
         \t}}\n\
         \tModel: 2001, \"Model::Cube\", \"Mesh\" {{\n\
         \t}}\n\
         }}\n\
         Connections:  {{\n\
         \tC: \"OO\",1001,2001\n\
         \tC: \"OO\",2001,0\n\
         }}\n"
    )
}

#[test]
fn test_ascii_cube_matches_binary() {
    let text = cube_text();
    let ascii = load(text.as_bytes(), LoadFlags::default()).unwrap();
    assert_eq!(ascii.source_format(), SourceFormat::Ascii);
    assert_eq!(ascii.version(), 7300);

    let binary = load(&cube_doc(7400), LoadFlags::default()).unwrap();

    let a = ascii.mesh(0).unwrap();
    let b = binary.mesh(0).unwrap();
    assert!(a.name() == "Cube");

    let ag = a.geometry().unwrap().data();
    let bg = b.geometry().unwrap().data();
    assert_eq!(ag.vertex_count(), 36);
    assert_eq!(ag.positions, bg.positions);
    assert_eq!(ag.to_old_vertices, bg.to_old_vertices);
    assert_eq!(ag.to_old_indices, bg.to_old_indices);
    assert_eq!(ag.partitions.len(), 1);
}

#[test]
fn test_ascii_name_class_order() {
    // ASCII prefixes the class ("Model::Cube"); the name part is the tail.
    let scene = load(cube_text().as_bytes(), LoadFlags::default()).unwrap();
    let mesh = scene.mesh(0).unwrap();
    assert!(mesh.name() == "Cube");
    let geometry = mesh.geometry().unwrap();
    assert!(geometry.name() == "Cube");
}

#[test]
fn test_ascii_properties70() {
    let text = "\
Objects:  {
\tModel: 2001, \"Model::Pivot\", \"Mesh\" {
\t\tProperties70:  {
\t\t\tP: \"Lcl Translation\", \"Lcl Translation\", \"\", \"A\",1,2,3
\t\t}
\t}
}
Connections:  {
\tC: \"OO\",2001,0
}
";
    let scene = load(text.as_bytes(), LoadFlags::default()).unwrap();
    let mesh = scene.mesh(0).unwrap();
    // Integral literals tokenize as integers and still widen to doubles.
    let m = mesh.local_transform();
    assert_eq!(
        m.transform_point3(DVec3::ZERO),
        DVec3::new(1.0, 2.0, 3.0)
    );
}

#[test]
fn test_ascii_comments_and_bare_tokens() {
    let text = "\
; top comment
Header:  {
\tFlag: T ; trailing comment
\tCount: 3
}
";
    let scene = load(text.as_bytes(), LoadFlags::default()).unwrap();
    let header = scene.root_element().child("Header").unwrap();
    let flag = header.child("Flag").unwrap().property(0).unwrap();
    assert!(flag.as_token().unwrap() == "T");
    assert_eq!(
        header.child("Count").unwrap().property(0).unwrap().to_i64().unwrap(),
        3
    );
}

#[test]
fn test_ascii_garbage_is_rejected() {
    // Printable text that is not FBX still fails, with a syntax error.
    let result = load(b"{{{{ definitely not fbx", LoadFlags::default());
    assert!(result.is_err());
}
