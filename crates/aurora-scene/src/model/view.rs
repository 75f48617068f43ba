use super::Model;
use crate::{
    EnvMapMode, ModelNode, NodeFlags, NodeId, PositionKeyFrame, QuaternionKeyFrame, Result,
};
use aurora_backend::{IndexBuffer, TextureHandle, TextureManager, VertexBuffer};
use aurora_math::*;
use aurora_utils::log::warn;
use std::ops::Deref;
use std::sync::Arc;

/// Read access to a node together with the model it belongs to.
#[derive(Debug, Copy, Clone)]
pub struct NodeRef<'a> {
    pub(crate) model: &'a Model,
    pub(crate) id: NodeId,
    pub(crate) node: &'a ModelNode,
}

impl<'a> Deref for NodeRef<'a> {
    type Target = ModelNode;

    fn deref(&self) -> &Self::Target {
        self.node
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn parent_node(&self) -> Option<NodeRef<'a>> {
        self.model.node(self.node.parent?)
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let model = self.model;
        self.node.children.iter().filter_map(move |c| model.node(*c))
    }

    /// Local position, in model units.
    pub fn position(&self) -> Vec3 {
        self.node.transform.position * self.model.scale()
    }

    /// Position relative to the model origin, as of the last bound update.
    pub fn absolute_position(&self) -> Vec3 {
        self.node.absolute_matrix.get_position() * self.model.scale()
    }

    pub fn world_position(&self) -> Vec3 {
        (*self.model.world_matrix() * self.node.absolute_matrix).get_position()
    }

    pub fn width(&self) -> f32 {
        self.node.bound.width() * self.model.scale().x
    }

    pub fn height(&self) -> f32 {
        self.node.bound.height() * self.model.scale().y
    }

    pub fn depth(&self) -> f32 {
        self.node.bound.depth() * self.model.scale().z
    }

    pub fn is_in_front_of(&self, other: &NodeRef<'_>) -> bool {
        debug_assert!(std::ptr::eq(self.model, other.model));
        self.model.is_in_front_of(self.id, other.id)
    }

    /// Position at `time`, or the static position without a position track.
    pub fn interpolate_position(&self, time: f32) -> Vec3 {
        self.node
            .transform
            .interpolate_position(time)
            .unwrap_or_else(|| self.position())
    }

    /// Orientation at `time`, or the static orientation without an
    /// orientation track.
    pub fn interpolate_orientation(&self, time: f32) -> Vec4 {
        self.node
            .transform
            .interpolate_orientation(time)
            .unwrap_or(self.node.transform.orientation)
    }
}

/// Mutable access to a node. Changes that affect sibling order or bounds keep
/// the owning model consistent.
#[derive(Debug)]
pub struct NodeMut<'a> {
    pub(crate) model: &'a mut Model,
    pub(crate) id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn view(&self) -> NodeRef<'_> {
        NodeRef {
            model: &*self.model,
            id: self.id,
            node: &self.model.nodes[self.id.index()],
        }
    }

    /// Raw access to the node, bypassing sibling ordering.
    pub fn get_mut(&mut self) -> &mut ModelNode {
        &mut self.model.nodes[self.id.index()]
    }

    /// Sets the local position, in model units. Siblings are re-sorted by depth.
    pub fn set_position(&mut self, position: Vec3) {
        let scale = self.model.scale();
        self.get_mut().transform.position = position / scale;
        self.model.order_siblings(self.id);
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.get_mut().transform.rotation = rotation;
    }

    pub fn set_orientation(&mut self, orientation: Vec4) {
        self.get_mut().transform.orientation = orientation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.get_mut().transform.scale = scale;
    }

    pub fn move_by(&mut self, delta: Vec3) {
        let position = self.view().position();
        self.set_position(position + delta);
    }

    pub fn rotate(&mut self, delta: Vec3) {
        let rotation = self.view().rotation();
        self.set_rotation(rotation + delta);
    }

    pub fn set_position_frames(&mut self, frames: Vec<PositionKeyFrame>) {
        self.get_mut().transform.set_position_frames(frames);
    }

    pub fn set_orientation_frames(&mut self, frames: Vec<QuaternionKeyFrame>) {
        self.get_mut().transform.set_orientation_frames(frames);
    }

    /// Moves this node, with all its descendants, below `parent`.
    pub fn reparent(&mut self, parent: NodeId) -> Result<()> {
        self.model.reparent(self.id, parent)
    }

    /// Moves the current state of `donor` below this node.
    pub fn add_child(&mut self, donor: Model) -> Result<()> {
        self.model.add_child(self.id, donor)
    }

    pub fn order_children(&mut self) {
        self.model.order_children(self.id);
    }

    /// Replaces the mesh and rebuilds the local bound and center from its
    /// vertex positions.
    pub fn set_geometry(&mut self, vertices: Arc<VertexBuffer>, indices: Arc<IndexBuffer>) {
        let node = self.get_mut();
        node.geometry.vertices = Some(vertices);
        node.geometry.indices = Some(indices);
        node.rebuild_bound();
    }

    /// Loads the textures named in `names` into the texture slots.
    ///
    /// Empty and `NULL` names leave their slot empty. Failed loads are logged
    /// and leave the slot empty as well. The environment map named by the
    /// TXI of the loaded textures is loaded along with them. A node without a
    /// single loaded texture is not rendered.
    pub fn set_textures<S: AsRef<str>>(&mut self, names: &[S], textures: &dyn TextureManager) {
        let node_name = self.view().name().to_string();

        let mut slots: Vec<Option<TextureHandle>> = Vec::with_capacity(names.len());
        let mut env_map = String::new();
        for name in names.iter().map(|n| n.as_ref()) {
            if name.is_empty() || name == "NULL" {
                slots.push(None);
                continue;
            }

            match textures.get(name) {
                Ok(texture) => {
                    let txi = texture.txi();
                    if !txi.bumpy_shiny_texture.is_empty() {
                        env_map = txi.bumpy_shiny_texture.clone();
                    }
                    if !txi.env_map_texture.is_empty() {
                        env_map = txi.env_map_texture.clone();
                    }
                    slots.push(Some(texture));
                }
                Err(e) => {
                    warn!(
                        "node \"{}\": failed to load texture \"{}\": {}",
                        node_name, name, e
                    );
                    slots.push(None);
                }
            }
        }

        let env_map = env_map.trim();
        if !env_map.is_empty() {
            self.set_environment_map(env_map, textures);
        }

        let node = self.get_mut();
        node.geometry.textures = slots;
        node.classify_transparency();

        let any_loaded = node.geometry.loaded_textures().next().is_some();
        node.flags.set(NodeFlags::RENDER, any_loaded);
    }

    /// Loads `name` as the environment map. A failed load is logged and
    /// keeps the previous map.
    pub fn set_environment_map(&mut self, name: &str, textures: &dyn TextureManager) {
        match textures.get(name) {
            Ok(texture) => self.get_mut().geometry.env_map = Some(texture),
            Err(e) => {
                let node_name = self.view().name().to_string();
                warn!(
                    "node \"{}\": failed to load environment map \"{}\": {}",
                    node_name, name, e
                );
            }
        }
    }

    pub fn clear_environment_map(&mut self) {
        self.get_mut().geometry.env_map = None;
    }

    pub fn set_env_map_mode(&mut self, mode: EnvMapMode) {
        self.get_mut().geometry.env_map_mode = mode;
    }

    pub fn set_invisible(&mut self, invisible: bool) {
        self.get_mut().flags.set(NodeFlags::RENDER, !invisible);
    }

    /// Forces the node's transparency class, or derives it from the textures
    /// again when `None`. Decal textures are always transparent.
    pub fn set_transparency_hint(&mut self, hint: Option<bool>) {
        let node = self.get_mut();
        node.flags.set(NodeFlags::HAS_TRANSPARENCY_HINT, hint.is_some());
        node.flags
            .set(NodeFlags::TRANSPARENCY_HINT, hint.unwrap_or(false));
        node.classify_transparency();
    }
}
