use crate::{RenderPass, TransformState};
use aurora_backend::{IndexBuffer, LightingHandle, TextureHandle, VertexBuffer};
use aurora_math::*;
use bitflags::bitflags;
use std::sync::Arc;

/// Index of a node inside its model's arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    pub struct NodeFlags: u32 {
        const RENDER = 1;
        const TRANSPARENT = 2;
        const HAS_TRANSPARENCY_HINT = 4;
        const TRANSPARENCY_HINT = 8;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::empty()
    }
}

/// How an environment map is combined with the diffuse textures.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EnvMapMode {
    None,
    /// Env map drawn first, diffuse blended on top.
    BlendedUnder,
    /// Diffuse drawn first, env map added where the diffuse alpha leaves room.
    BlendedOver,
}

impl Default for EnvMapMode {
    fn default() -> Self {
        EnvMapMode::BlendedUnder
    }
}

#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub vertices: Option<Arc<VertexBuffer>>,
    pub indices: Option<Arc<IndexBuffer>>,
    pub textures: Vec<Option<TextureHandle>>,
    pub env_map: Option<TextureHandle>,
    pub env_map_mode: EnvMapMode,
}

impl Geometry {
    pub fn index_count(&self) -> usize {
        self.indices.as_ref().map(|i| i.count()).unwrap_or(0)
    }

    pub fn loaded_textures(&self) -> impl Iterator<Item = &TextureHandle> + '_ {
        self.textures.iter().flatten()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub(crate) name: String,
    pub(crate) state: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) level: u32,
    pub(crate) transform: TransformState,
    pub(crate) geometry: Geometry,
    pub(crate) flags: NodeFlags,
    pub(crate) bound: BoundingBox,
    pub(crate) center: Vec3,
    pub(crate) absolute_matrix: Mat4,
    pub(crate) absolute_bound: BoundingBox,
    pub(crate) lighting: Vec<LightingHandle>,
}

impl ModelNode {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn state(&self) -> usize {
        self.state
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_slice()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation
    }

    pub fn orientation(&self) -> Vec4 {
        self.transform.orientation
    }

    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_rendered(&self) -> bool {
        self.flags.contains(NodeFlags::RENDER)
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(NodeFlags::TRANSPARENT)
    }

    /// Whether this node contributes geometry to `pass`.
    pub fn should_render(&self, pass: RenderPass) -> bool {
        let pass_matches = match pass {
            RenderPass::Opaque => !self.is_transparent(),
            RenderPass::Transparent => self.is_transparent(),
        };

        pass_matches && self.is_rendered() && self.geometry.index_count() > 0
    }

    /// Bounding box of the node's own geometry in local space.
    pub fn bound(&self) -> &BoundingBox {
        &self.bound
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Transform relative to the model origin, as of the last bound update.
    pub fn absolute_matrix(&self) -> &Mat4 {
        &self.absolute_matrix
    }

    /// Bounds of this node and all its descendants relative to the model origin.
    pub fn absolute_bound(&self) -> &BoundingBox {
        &self.absolute_bound
    }

    pub fn lighting(&self) -> &[LightingHandle] {
        self.lighting.as_slice()
    }

    pub fn inherit_position(&self, target: &mut ModelNode) {
        target.transform.position = self.transform.position;
    }

    pub fn inherit_orientation(&self, target: &mut ModelNode) {
        target.transform.orientation = self.transform.orientation;
    }

    /// Copies textures, buffers, bounds and render flags. The target's
    /// environment map is left as is.
    pub fn inherit_geometry(&self, target: &mut ModelNode) {
        target.geometry.textures = self.geometry.textures.clone();
        target.geometry.vertices = self.geometry.vertices.clone();
        target.geometry.indices = self.geometry.indices.clone();

        let copied = NodeFlags::RENDER | NodeFlags::TRANSPARENT;
        target.flags.remove(copied);
        target.flags.insert(self.flags & copied);

        target.bound = self.bound;
        target.center = self.center;
    }

    pub(crate) fn rebuild_bound(&mut self) {
        self.bound = match self.geometry.vertices.as_ref() {
            Some(vertices) => BoundingBox::from_points(vertices.positions()),
            None => BoundingBox::new(),
        };
        self.center = self.bound.center();
    }

    /// An explicit hint wins unless one of the textures is a decal. Without a
    /// hint, any translucent texture makes the node transparent.
    pub(crate) fn classify_transparency(&mut self) {
        let decal = self.geometry.loaded_textures().any(|t| t.txi().decal);

        let transparent = if self.flags.contains(NodeFlags::HAS_TRANSPARENCY_HINT) {
            self.flags.contains(NodeFlags::TRANSPARENCY_HINT) || decal
        } else {
            self.geometry.loaded_textures().any(|t| t.is_translucent())
        };

        self.flags.set(NodeFlags::TRANSPARENT, transparent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_backend::{Texture, TxiFeatures};

    fn texture(has_alpha: bool, alpha_mean: Option<f32>, decal: bool) -> Option<TextureHandle> {
        let txi = TxiFeatures {
            alpha_mean,
            decal,
            ..TxiFeatures::default()
        };
        Some(Arc::new(Texture::new("tex", has_alpha, txi)))
    }

    #[test]
    fn transparency_without_hint() {
        let mut node = ModelNode::new("a");
        node.classify_transparency();
        assert!(!node.is_transparent());

        node.geometry.textures = vec![None, texture(true, Some(0.5), false)];
        node.classify_transparency();
        assert!(node.is_transparent());

        node.geometry.textures = vec![texture(true, Some(1.0), false)];
        node.classify_transparency();
        assert!(!node.is_transparent());
    }

    #[test]
    fn decal_overrides_opaque_hint() {
        let mut node = ModelNode::new("a");
        node.flags.insert(NodeFlags::HAS_TRANSPARENCY_HINT);

        node.geometry.textures = vec![texture(true, Some(0.5), false)];
        node.classify_transparency();
        assert!(!node.is_transparent());

        node.geometry.textures = vec![texture(false, None, true)];
        node.classify_transparency();
        assert!(node.is_transparent());
    }

    #[test]
    fn inherit_geometry_copies_render_state() {
        let mut source = ModelNode::new("source");
        source.geometry.textures = vec![texture(true, None, false)];
        source.geometry.vertices = Some(Arc::new(VertexBuffer::from_positions(&[
            Vec3::ZERO,
            Vec3::ONE,
        ])));
        source.flags.insert(NodeFlags::RENDER | NodeFlags::TRANSPARENT);
        source.rebuild_bound();

        let mut target = ModelNode::new("target");
        target.flags.insert(NodeFlags::HAS_TRANSPARENCY_HINT);
        source.inherit_geometry(&mut target);

        assert!(target.is_rendered());
        assert!(target.is_transparent());
        assert!(target.flags.contains(NodeFlags::HAS_TRANSPARENCY_HINT));
        assert_eq!(target.geometry.textures.len(), 1);
        assert_eq!(target.center(), Vec3::splat(0.5));
    }
}
