//! The object factory.
//!
//! Walks `Objects/*` in file order, dispatching on the element id and
//! its class (the 3rd property). Unknown elements are skipped;
//! construction failure of a single object is logged and the object
//! omitted, preserving partial scenes. Cluster re-indexing runs as a
//! second pass once all geometries exist.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::object::{
    animation, geometry, material, skin, Object, ObjectKind, Payload,
};
use crate::tree::{Element, Token};
use crate::util::Result;

use super::connections::Connection;
use super::LoadFlags;

pub(crate) struct ObjectArena {
    pub objects: Vec<Object>,
    pub by_uid: HashMap<u64, usize>,
    /// Mesh object slots, file order.
    pub meshes: Vec<usize>,
    /// Animation stack slots, file order.
    pub stacks: Vec<usize>,
}

pub(crate) fn build_objects(
    root: &Element,
    connections: &[Connection],
    flags: LoadFlags,
) -> ObjectArena {
    let mut objects: Vec<Object> = Vec::new();
    let mut by_uid: HashMap<u64, usize> = HashMap::new();

    if let Some(container) = root.child("Objects") {
        for (slot, element) in container.children().iter().enumerate() {
            let Some(uid) = element.property(0).and_then(|p| p.to_i64().ok()) else {
                warn!(id = %element.id(), "object element has no uid, skipping");
                continue;
            };
            let uid = uid as u64;
            if uid == 0 {
                warn!(id = %element.id(), "object uses the reserved root uid, skipping");
                continue;
            }

            let Some(payload) = construct(element, flags) else {
                continue;
            };

            let name = element
                .property(1)
                .and_then(|p| p.as_token())
                .map(Token::name_part)
                .unwrap_or_default();
            let object = Object {
                uid,
                name,
                element_slot: Some(slot),
                payload,
            };

            match by_uid.get(&uid) {
                // Duplicate uids: the later definition replaces the
                // earlier one, as the original reader's map insert did.
                Some(&existing) => {
                    warn!(uid, "duplicate object uid, later definition wins");
                    objects[existing] = object;
                }
                None => {
                    by_uid.insert(uid, objects.len());
                    objects.push(object);
                }
            }
        }
    }

    // The synthetic root enters after the map is populated.
    by_uid.insert(0, objects.len());
    objects.push(Object {
        uid: 0,
        name: Token::empty(),
        element_slot: None,
        payload: Payload::Root,
    });

    remap_clusters(&mut objects, &by_uid, connections);

    let meshes = slots_of(&objects, ObjectKind::Mesh);
    let stacks = slots_of(&objects, ObjectKind::AnimationStack);

    ObjectArena {
        objects,
        by_uid,
        meshes,
        stacks,
    }
}

fn slots_of(objects: &[Object], kind: ObjectKind) -> Vec<usize> {
    objects
        .iter()
        .enumerate()
        .filter(|(_, o)| o.kind() == kind)
        .map(|(i, _)| i)
        .collect()
}

/// Dispatch one `Objects/*` element to its payload. `None` skips the
/// object, either because its kind is ignored by flags, unknown, or its
/// construction failed.
fn construct(element: &Element, flags: LoadFlags) -> Option<Payload> {
    let id = element.id();
    let class = element.property(2).and_then(|p| p.as_token());
    let class_is = |s: &str| class.is_some_and(|t| t == s);

    if id == "Geometry" {
        if class_is("Mesh") {
            if flags.contains(LoadFlags::IGNORE_GEOMETRY) {
                return None;
            }
            let triangulate = flags.contains(LoadFlags::TRIANGULATE);
            return fallible(element, geometry::parse_geometry(element, triangulate))
                .map(Payload::Geometry);
        }
        if class_is("Shape") {
            if flags.contains(LoadFlags::IGNORE_GEOMETRY)
                || flags.contains(LoadFlags::IGNORE_BLEND_SHAPES)
            {
                return None;
            }
            return fallible(element, geometry::parse_shape(element)).map(Payload::Geometry);
        }
        debug!(class = ?class.map(Token::to_string_lossy), "unknown geometry class, skipping");
        None
    } else if id == "Model" {
        if class_is("Mesh") {
            (!flags.contains(LoadFlags::IGNORE_MESHES)).then_some(Payload::Mesh)
        } else if class_is("LimbNode") {
            let ignored = flags.contains(LoadFlags::IGNORE_BONES)
                || flags.contains(LoadFlags::IGNORE_LIMBS);
            (!ignored).then_some(Payload::LimbNode)
        } else if class_is("Null") {
            Some(Payload::NullNode)
        } else {
            debug!(class = ?class.map(Token::to_string_lossy), "unknown model class, skipping");
            None
        }
    } else if id == "Material" {
        (!flags.contains(LoadFlags::IGNORE_MATERIALS))
            .then(|| Payload::Material(material::parse_material(element)))
    } else if id == "Texture" {
        (!flags.contains(LoadFlags::IGNORE_TEXTURES))
            .then(|| Payload::Texture(material::parse_texture(element)))
    } else if id == "Deformer" {
        if flags.contains(LoadFlags::IGNORE_SKIN) {
            return None;
        }
        if class_is("Cluster") {
            fallible(element, skin::parse_cluster(element)).map(Payload::Cluster)
        } else if class_is("Skin") {
            Some(Payload::Skin)
        } else {
            None
        }
    } else if id == "NodeAttribute" {
        let data = material::parse_node_attribute(element);
        if flags.contains(LoadFlags::IGNORE_CAMERAS) && data.type_flags == "Camera" {
            return None;
        }
        if flags.contains(LoadFlags::IGNORE_LIGHTS) && data.type_flags == "Light" {
            return None;
        }
        Some(Payload::NodeAttribute(data))
    } else if id == "AnimationStack" {
        (!flags.contains(LoadFlags::IGNORE_ANIMATIONS)).then_some(Payload::AnimationStack)
    } else if id == "AnimationLayer" {
        (!flags.contains(LoadFlags::IGNORE_ANIMATIONS)).then_some(Payload::AnimationLayer)
    } else if id == "AnimationCurve" {
        if flags.contains(LoadFlags::IGNORE_ANIMATIONS) {
            return None;
        }
        fallible(element, animation::parse_curve(element)).map(Payload::AnimationCurve)
    } else if id == "AnimationCurveNode" {
        (!flags.contains(LoadFlags::IGNORE_ANIMATIONS))
            .then(|| Payload::AnimationCurveNode(animation::parse_curve_node(element)))
    } else {
        None
    }
}

fn fallible<T>(element: &Element, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(id = %element.id(), error = %e, "object construction failed, omitting");
            None
        }
    }
}

/// Remap every cluster onto the emitted vertex stream of the geometry it
/// deforms, found through its skin.
fn remap_clusters(objects: &mut [Object], by_uid: &HashMap<u64, usize>, connections: &[Connection]) {
    let destination_of = |from: u64, kind: ObjectKind| -> Option<usize> {
        connections.iter().find_map(|c| {
            if c.from != from {
                return None;
            }
            let &slot = by_uid.get(&c.to)?;
            (objects[slot].kind() == kind).then_some(slot)
        })
    };

    let cluster_slots: Vec<(usize, usize)> = objects
        .iter()
        .enumerate()
        .filter(|(_, o)| o.kind() == ObjectKind::Cluster)
        .filter_map(|(slot, o)| {
            let skin_slot = destination_of(o.uid, ObjectKind::Skin)?;
            let geometry_slot = destination_of(objects[skin_slot].uid, ObjectKind::Geometry)?;
            Some((slot, geometry_slot))
        })
        .collect();

    for (slot, geometry_slot) in cluster_slots {
        let Payload::Cluster(cluster) = &objects[slot].payload else {
            continue;
        };
        let mut cluster = cluster.clone();
        {
            let Payload::Geometry(geometry) = &objects[geometry_slot].payload else {
                continue;
            };
            cluster.remap(geometry);
        }
        objects[slot].payload = Payload::Cluster(cluster);
    }
}
