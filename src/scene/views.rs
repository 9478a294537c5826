//! Typed view handles over the object arena.
//!
//! Views are cheap copies of `(scene, object)` pairs; navigation
//! resolves UID links through the scene's connection list, in file
//! order. A view borrows the scene and dies with it.

use crate::object::animation::{CurveData, CurveNodeData};
use crate::object::geometry::GeometryData;
use crate::object::material::{MaterialData, TextureData};
use crate::object::skin::ClusterData;
use crate::object::transform::NodeTransform;
use crate::object::{Object, ObjectKind, Payload};
use crate::tree::{Element, Token};
use crate::util::math::{DMat4, DVec3};

use super::{LoadFlags, Scene};

macro_rules! view_common {
    () => {
        pub fn uid(&self) -> u64 {
            self.object.uid()
        }

        pub fn name(&self) -> &'a Token {
            let object = self.object;
            object.name()
        }

        pub fn object(&self) -> &'a Object {
            self.object
        }

        /// The element this object overlays, for late property lookup.
        pub fn element(&self) -> Option<&'a Element> {
            self.scene.element_of(self.object)
        }
    };
}

/// A participant in the transform hierarchy (Mesh, LimbNode, NullNode or
/// Root).
#[derive(Clone, Copy)]
pub struct Node<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Node<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert!(object.is_node());
        Self { scene, object }
    }

    view_common!();

    pub fn kind(&self) -> ObjectKind {
        self.object.kind()
    }

    /// Parent node, the first in file order.
    pub fn parent(&self) -> Option<Node<'a>> {
        let parent = self.scene.parent_of(self.object.uid())?;
        Some(Node::new(self.scene, parent))
    }

    /// Transform-relevant properties with defaults filled in.
    pub fn transform(&self) -> NodeTransform {
        NodeTransform::from_element(self.element())
    }

    /// Local transform from the Maya chain.
    pub fn local_transform(&self) -> DMat4 {
        let ignore_pivots = self.scene.flags().contains(LoadFlags::IGNORE_PIVOTS);
        self.transform().local_matrix(ignore_pivots)
    }

    /// Product of local transforms up to the root.
    pub fn global_transform(&self) -> DMat4 {
        let mut matrix = self.local_transform();
        let mut current = self.parent();
        // Bounded walk: a parent cycle in a malformed file must not hang.
        let mut remaining = 256;
        while let Some(node) = current {
            if node.kind() == ObjectKind::Root || remaining == 0 {
                break;
            }
            matrix = node.local_transform() * matrix;
            remaining -= 1;
            current = node.parent();
        }
        matrix
    }

    /// Geometric offset, applied to this node's mesh geometry only.
    pub fn geometric_transform(&self) -> DMat4 {
        self.transform().geometric_matrix()
    }
}

/// A `Model` of class `Mesh`.
#[derive(Clone, Copy)]
pub struct Mesh<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Mesh<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::Mesh);
        Self { scene, object }
    }

    view_common!();

    pub fn node(&self) -> Node<'a> {
        Node::new(self.scene, self.object)
    }

    pub fn geometry(&self) -> Option<Geometry<'a>> {
        self.scene
            .source_of_kind(self.object.uid(), ObjectKind::Geometry, 0)
            .map(|o| Geometry::new(self.scene, o))
    }

    /// Materials connected to this mesh, file order; partition indices of
    /// the mesh's geometry index into this sequence.
    pub fn materials(&self) -> impl Iterator<Item = Material<'a>> {
        let scene = self.scene;
        scene
            .sources(self.object.uid())
            .filter(|o| o.kind() == ObjectKind::Material)
            .map(move |o| Material::new(scene, o))
    }

    pub fn material_count(&self) -> usize {
        self.materials().count()
    }

    pub fn material(&self, index: usize) -> Option<Material<'a>> {
        self.materials().nth(index)
    }

    pub fn skin(&self) -> Option<Skin<'a>> {
        self.geometry()?.skin()
    }

    pub fn local_transform(&self) -> DMat4 {
        self.node().local_transform()
    }

    pub fn global_transform(&self) -> DMat4 {
        self.node().global_transform()
    }

    pub fn geometric_transform(&self) -> DMat4 {
        self.node().geometric_transform()
    }
}

/// A `Geometry` object with its assembled vertex streams.
#[derive(Clone, Copy)]
pub struct Geometry<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Geometry<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::Geometry);
        Self { scene, object }
    }

    view_common!();

    pub fn data(&self) -> &'a GeometryData {
        let object = self.object;
        match &object.payload {
            Payload::Geometry(data) => data,
            _ => unreachable!("geometry view over non-geometry object"),
        }
    }

    pub fn skin(&self) -> Option<Skin<'a>> {
        self.scene
            .source_of_kind(self.object.uid(), ObjectKind::Skin, 0)
            .map(|o| Skin::new(self.scene, o))
    }
}

/// A surface material.
#[derive(Clone, Copy)]
pub struct Material<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Material<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::Material);
        Self { scene, object }
    }

    view_common!();

    pub fn data(&self) -> &'a MaterialData {
        let object = self.object;
        match &object.payload {
            Payload::Material(data) => data,
            _ => unreachable!("material view over non-material object"),
        }
    }

    pub fn diffuse_color(&self) -> DVec3 {
        self.data().diffuse_color
    }

    /// Texture wired to the named material property (`"DiffuseColor"`).
    pub fn texture(&self, property: &str) -> Option<Texture<'a>> {
        self.scene
            .source_by_property(self.object.uid(), ObjectKind::Texture, property)
            .map(|o| Texture::new(self.scene, o))
    }
}

/// A file texture.
#[derive(Clone, Copy)]
pub struct Texture<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Texture<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::Texture);
        Self { scene, object }
    }

    view_common!();

    pub fn data(&self) -> &'a TextureData {
        let object = self.object;
        match &object.payload {
            Payload::Texture(data) => data,
            _ => unreachable!("texture view over non-texture object"),
        }
    }

    pub fn filename(&self) -> &'a Token {
        &self.data().filename
    }

    pub fn relative_filename(&self) -> &'a Token {
        &self.data().relative_filename
    }
}

/// A skin deformer: an ordered sequence of clusters.
#[derive(Clone, Copy)]
pub struct Skin<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Skin<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::Skin);
        Self { scene, object }
    }

    view_common!();

    pub fn clusters(&self) -> impl Iterator<Item = Cluster<'a>> {
        let scene = self.scene;
        scene
            .sources(self.object.uid())
            .filter(|o| o.kind() == ObjectKind::Cluster)
            .map(move |o| Cluster::new(scene, o))
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters().count()
    }

    pub fn cluster(&self, index: usize) -> Option<Cluster<'a>> {
        self.clusters().nth(index)
    }
}

/// One per-bone binding of a skin.
#[derive(Clone, Copy)]
pub struct Cluster<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> Cluster<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::Cluster);
        Self { scene, object }
    }

    view_common!();

    pub fn data(&self) -> &'a ClusterData {
        let object = self.object;
        match &object.payload {
            Payload::Cluster(data) => data,
            _ => unreachable!("cluster view over non-cluster object"),
        }
    }

    /// Emitted vertex indices, parallel with [`Cluster::weights`].
    pub fn indices(&self) -> &'a [i32] {
        &self.data().indices
    }

    pub fn weights(&self) -> &'a [f64] {
        &self.data().weights
    }

    pub fn transform_matrix(&self) -> DMat4 {
        self.data().transform_matrix
    }

    pub fn transform_link_matrix(&self) -> DMat4 {
        self.data().transform_link_matrix
    }

    /// The bone driving this cluster.
    pub fn link(&self) -> Option<Node<'a>> {
        self.scene
            .source_of_kind(self.object.uid(), ObjectKind::LimbNode, 0)
            .map(|o| Node::new(self.scene, o))
    }
}

/// An animation stack: ordered layers.
#[derive(Clone, Copy)]
pub struct AnimationStack<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> AnimationStack<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::AnimationStack);
        Self { scene, object }
    }

    view_common!();

    pub fn layers(&self) -> impl Iterator<Item = AnimationLayer<'a>> {
        let scene = self.scene;
        scene
            .sources(self.object.uid())
            .filter(|o| o.kind() == ObjectKind::AnimationLayer)
            .map(move |o| AnimationLayer::new(scene, o))
    }

    pub fn layer_count(&self) -> usize {
        self.layers().count()
    }

    pub fn layer(&self, index: usize) -> Option<AnimationLayer<'a>> {
        self.layers().nth(index)
    }
}

/// An animation layer: a set of curve nodes.
#[derive(Clone, Copy)]
pub struct AnimationLayer<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> AnimationLayer<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::AnimationLayer);
        Self { scene, object }
    }

    view_common!();

    pub fn curve_nodes(&self) -> impl Iterator<Item = AnimationCurveNode<'a>> {
        let scene = self.scene;
        scene
            .sources(self.object.uid())
            .filter(|o| o.kind() == ObjectKind::AnimationCurveNode)
            .map(move |o| AnimationCurveNode::new(scene, o))
    }

    pub fn curve_node_count(&self) -> usize {
        self.curve_nodes().count()
    }

    pub fn curve_node(&self, index: usize) -> Option<AnimationCurveNode<'a>> {
        self.curve_nodes().nth(index)
    }

    /// The curve node of this layer driving `property` (for example
    /// `"Lcl Translation"`) of the node with the given uid.
    pub fn curve_node_for(&self, target_uid: u64, property: &str) -> Option<AnimationCurveNode<'a>> {
        self.curve_nodes().find(|cn| {
            cn.target()
                .map_or(false, |(node, prop)| {
                    node.uid() == target_uid && prop == &property
                })
        })
    }
}

/// Up to three component curves driving one animatable property.
#[derive(Clone, Copy)]
pub struct AnimationCurveNode<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> AnimationCurveNode<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::AnimationCurveNode);
        Self { scene, object }
    }

    view_common!();

    pub fn data(&self) -> &'a CurveNodeData {
        let object = self.object;
        match &object.payload {
            Payload::AnimationCurveNode(data) => data,
            _ => unreachable!("curve node view over wrong object"),
        }
    }

    /// Component curve on `"d|X"`, `"d|Y"` or `"d|Z"`.
    pub fn curve(&self, component: &str) -> Option<AnimationCurve<'a>> {
        self.scene
            .source_by_property(self.object.uid(), ObjectKind::AnimationCurve, component)
            .map(|o| AnimationCurve::new(self.scene, o))
    }

    /// The node and property this curve node animates.
    pub fn target(&self) -> Option<(Node<'a>, &'a Token)> {
        self.scene.connections().iter().find_map(|c| {
            if c.from != self.object.uid() {
                return None;
            }
            let property = c.property.as_ref()?;
            let object = self.scene.object_by_uid(c.to)?;
            if !object.is_node() {
                return None;
            }
            Some((Node::new(self.scene, object), property))
        })
    }

    /// Sample all three components at tick `t`; components without a
    /// curve fall back to the node's defaults.
    pub fn evaluate(&self, t: i64) -> DVec3 {
        let defaults = self.data().defaults;
        let sample = |component: &str, default: f64| {
            self.curve(component)
                .map_or(default, |c| c.data().evaluate(t))
        };
        DVec3::new(
            sample("d|X", defaults.x),
            sample("d|Y", defaults.y),
            sample("d|Z", defaults.z),
        )
    }
}

/// One scalar animation curve.
#[derive(Clone, Copy)]
pub struct AnimationCurve<'a> {
    scene: &'a Scene,
    object: &'a Object,
}

impl<'a> AnimationCurve<'a> {
    pub(crate) fn new(scene: &'a Scene, object: &'a Object) -> Self {
        debug_assert_eq!(object.kind(), ObjectKind::AnimationCurve);
        Self { scene, object }
    }

    view_common!();

    pub fn data(&self) -> &'a CurveData {
        let object = self.object;
        match &object.payload {
            Payload::AnimationCurve(data) => data,
            _ => unreachable!("curve view over non-curve object"),
        }
    }

    pub fn times(&self) -> &'a [i64] {
        &self.data().times
    }

    pub fn values(&self) -> &'a [f64] {
        &self.data().values
    }

    /// Linear sample at tick `t`.
    pub fn evaluate(&self, t: i64) -> f64 {
        self.data().evaluate(t)
    }
}
