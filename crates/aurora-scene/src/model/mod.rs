use crate::{ModelNode, NodeId, Result, SceneError};
use aurora_math::*;
use aurora_utils::collections::TrackedStorage;
use aurora_utils::log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashMap;

mod view;

pub use view::*;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ModelType {
    Object,
    Gui,
    /// GUI drawn on top of everything else; larger Z is closer to the viewer.
    GuiFront,
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Object
    }
}

/// A named variant of a model's node forest.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    name: String,
    nodes: Vec<NodeId>,
    node_map: HashMap<String, NodeId>,
    root_nodes: Vec<NodeId>,
}

impl ModelState {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Every node of this state in load order.
    pub fn nodes(&self) -> &[NodeId] {
        self.nodes.as_slice()
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        self.root_nodes.as_slice()
    }

    /// Looks up a named node. Unnamed nodes are never indexed.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.root_nodes.is_empty() && self.node_map.is_empty()
    }

    fn register(&mut self, id: NodeId, name: &str) {
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }

        if !name.is_empty() {
            self.node_map.insert(name.to_string(), id);
        }
    }

    fn unregister(&mut self, id: NodeId, name: &str) {
        self.nodes.retain(|n| *n != id);
        self.root_nodes.retain(|n| *n != id);
        if self.node_map.get(name) == Some(&id) {
            self.node_map.remove(name);
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.node_map.clear();
        self.root_nodes.clear();
    }
}

/// A renderable model: an arena of nodes organised into named states, of which
/// exactly one is current, plus a model-wide transform.
///
/// Node positions are stored divided by the model scale and reported scaled
/// back up, so the scale can be changed without touching every node.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    model_type: ModelType,
    pub(crate) nodes: TrackedStorage<ModelNode>,
    states: Vec<ModelState>,
    current_state: usize,

    position: Vec3,
    orientation: Vec4,
    scale: Vec3,
    absolute_matrix: Mat4,

    bound: BoundingBox,
    absolute_bound: BoundingBox,
}

impl Default for Model {
    fn default() -> Self {
        Self::new("", ModelType::Object)
    }
}

impl Model {
    /// Creates a model with a single, unnamed state.
    pub fn new<T: Into<String>>(name: T, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
            nodes: TrackedStorage::new(),
            states: vec![ModelState::new("")],
            current_state: 0,
            position: Vec3::ZERO,
            orientation: Vec4::ZERO,
            scale: Vec3::ONE,
            absolute_matrix: Mat4::IDENTITY,
            bound: BoundingBox::new(),
            absolute_bound: BoundingBox::new(),
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.set_scale(scale);
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Adds an empty state, returning its index. Existing states are reused.
    pub fn add_state<T: Into<String>>(&mut self, name: T) -> usize {
        let name = name.into();
        if let Some(index) = self.states.iter().position(|s| s.name == name) {
            return index;
        }

        self.states.push(ModelState::new(name));
        self.states.len() - 1
    }

    /// Switches the current state and rebuilds ordering and bounds for it.
    pub fn set_state(&mut self, name: &str) -> Result<()> {
        let index = self
            .states
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| SceneError::InvalidState(name.to_string()))?;

        if index != self.current_state {
            debug!("model \"{}\": switching to state \"{}\"", self.name, name);
            self.current_state = index;
            self.finalize();
        }

        Ok(())
    }

    pub fn state(&self) -> &ModelState {
        &self.states[self.current_state]
    }

    pub fn state_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(|s| s.name())
    }

    /// Creates a node in the current state. Nodes without a name are listed
    /// but cannot be found with [`Model::node_by_name`].
    pub fn add_node(&mut self, name: Option<&str>, parent: Option<NodeId>) -> Result<NodeId> {
        let level = match parent {
            Some(p) => self.get(p).ok_or(SceneError::InvalidNode(p))?.level + 1,
            None => 0,
        };

        let name = name.unwrap_or("");
        let mut node = ModelNode::new(name);
        node.state = self.current_state;
        node.parent = parent;
        node.level = level;

        let id = NodeId::from_index(self.nodes.push(node));
        let current = self.current_state;
        self.states[current].register(id, name);
        match parent {
            Some(p) => self.nodes[p.index()].children.push(id),
            None => self.states[current].root_nodes.push(id),
        }

        Ok(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.index())
    }

    pub fn get(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(id.index())
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let node = self.get(id)?;
        Some(NodeRef {
            model: self,
            id,
            node,
        })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if !self.contains(id) {
            return None;
        }

        Some(NodeMut { model: self, id })
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.state().get(name)
    }

    pub fn root_nodes(&self) -> &[NodeId] {
        self.state().root_nodes()
    }

    pub fn nodes(&self) -> &[NodeId] {
        self.state().nodes()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.update_absolute_matrix();
    }

    pub fn orientation(&self) -> Vec4 {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Vec4) {
        self.orientation = orientation;
        self.update_absolute_matrix();
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.update_absolute_matrix();
    }

    /// Model to world transform.
    pub fn world_matrix(&self) -> &Mat4 {
        &self.absolute_matrix
    }

    /// World space bounds of the current state, as of the last bound update.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.absolute_bound
    }

    /// Bounds of the current state relative to the model origin.
    pub fn local_bounding_box(&self) -> &BoundingBox {
        &self.bound
    }

    fn update_absolute_matrix(&mut self) {
        self.absolute_matrix = Mat4::IDENTITY
            .translated(self.position)
            .oriented(self.orientation)
            .scaled(self.scale);
        self.absolute_bound = self.bound.transformed(&self.absolute_matrix);
    }

    /// Whether `a` is drawn in front of `b`.
    pub fn is_in_front_of(&self, a: NodeId, b: NodeId) -> bool {
        let z = |id: NodeId| self.get(id).map(|n| n.transform.position.z).unwrap_or(0.0);

        if self.model_type == ModelType::GuiFront {
            z(a) > z(b)
        } else {
            z(a) < z(b)
        }
    }

    fn depth_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if self.is_in_front_of(a, b) {
            Ordering::Less
        } else if self.is_in_front_of(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// Sorts the children of `id` by depth, recursing into all descendants.
    pub(crate) fn order_children(&mut self, id: NodeId) {
        let mut children = match self.nodes.get_mut(id.index()) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };

        children.sort_by(|a, b| self.depth_order(*a, *b));
        self.nodes[id.index()].children = children.clone();

        for child in children {
            self.order_children(child);
        }
    }

    fn order_roots(&mut self) {
        let current = self.current_state;
        let mut roots = std::mem::take(&mut self.states[current].root_nodes);
        roots.sort_by(|a, b| self.depth_order(*a, *b));
        self.states[current].root_nodes = roots;
    }

    /// Re-sorts the siblings of `id` after its depth changed.
    pub(crate) fn order_siblings(&mut self, id: NodeId) {
        match self.get(id).and_then(|n| n.parent) {
            Some(parent) => self.order_children(parent),
            None => self.order_roots(),
        }
    }

    /// Recomputes the absolute matrix and bounds of every node in the current
    /// state, then the model bounds.
    pub fn create_absolute_bound(&mut self) {
        let roots = self.state().root_nodes.clone();

        let mut bound = BoundingBox::new();
        for root in roots {
            self.create_node_bound(root, Mat4::IDENTITY);
            if let Some(node) = self.get(root) {
                bound.grow_bb(&node.absolute_bound);
            }
        }

        self.bound = bound;
        self.absolute_bound = bound.transformed(&self.absolute_matrix);
        self.nodes.reset_changed();
    }

    fn create_node_bound(&mut self, id: NodeId, parent: Mat4) {
        let (matrix, children) = match self.nodes.get_mut(id.index()) {
            Some(node) => {
                let matrix = parent * node.transform.local_matrix();
                node.absolute_matrix = matrix;
                node.absolute_bound = node.bound.transformed(&matrix);
                (matrix, node.children.clone())
            }
            None => return,
        };

        for child in children {
            self.create_node_bound(child, matrix);
            let child_bound = self.nodes[child.index()].absolute_bound;
            self.nodes[id.index()].absolute_bound.grow_bb(&child_bound);
        }
    }

    /// Recomputes bounds only if a node changed since the last update.
    pub fn update_bounds(&mut self) -> bool {
        if !self.nodes.any_changed() {
            return false;
        }

        self.create_absolute_bound();
        true
    }

    /// Orders roots and children by depth and rebuilds all bounds.
    pub fn finalize(&mut self) {
        self.order_roots();
        for root in self.state().root_nodes.clone() {
            self.order_children(root);
        }

        self.create_absolute_bound();
    }

    fn is_descendant_or_self(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }

        false
    }

    pub(crate) fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<()> {
        if !self.contains(new_parent) {
            return Err(SceneError::InvalidNode(new_parent));
        }

        let (old_parent, old_state) = match self.get(id) {
            Some(node) => (node.parent, node.state),
            None => return Err(SceneError::InvalidNode(id)),
        };

        if self.is_descendant_or_self(new_parent, id) {
            return Err(SceneError::CyclicReparent {
                node: id,
                parent: new_parent,
            });
        }

        match old_parent {
            Some(p) => self.nodes[p.index()].children.retain(|c| *c != id),
            None => self.states[old_state].root_nodes.retain(|c| *c != id),
        }

        let level = self.nodes[new_parent.index()].level + 1;
        self.nodes[new_parent.index()].children.push(id);
        self.nodes[id.index()].parent = Some(new_parent);

        let current = self.current_state;
        self.register_subtree(id, level, current);
        self.order_children(new_parent);
        Ok(())
    }

    fn register_subtree(&mut self, id: NodeId, level: u32, state: usize) {
        let node = &mut self.nodes[id.index()];
        let previous = node.state;
        node.state = state;
        node.level = level;
        let name = node.name.clone();
        let children = node.children.clone();

        if previous != state {
            self.states[previous].unregister(id, &name);
        }
        self.states[state].register(id, &name);

        for child in children {
            self.register_subtree(child, level + 1, state);
        }
    }

    /// Moves every node of `donor`'s current state below `target`.
    ///
    /// Node ids are remapped into this model's arena. The donor's current
    /// state is left empty.
    pub fn graft(&mut self, target: NodeId, donor: &mut Model) -> Result<()> {
        let level = self
            .get(target)
            .ok_or(SceneError::InvalidNode(target))?
            .level
            + 1;

        let mut moved = 0;
        for root in donor.state().root_nodes.clone() {
            moved += self.relocate(donor, root, target, level);
        }

        let donor_state = donor.current_state;
        for id in std::mem::take(&mut donor.states[donor_state].nodes) {
            donor.nodes.take(id.index());
        }
        donor.states[donor_state].clear();
        donor.create_absolute_bound();

        info!(
            "moved {} nodes of model \"{}\" into \"{}\"",
            moved, donor.name, self.name
        );

        self.finalize();
        Ok(())
    }

    fn relocate(&mut self, donor: &mut Model, id: NodeId, parent: NodeId, level: u32) -> usize {
        let mut node = match donor.nodes.take(id.index()) {
            Some(node) => node,
            None => return 0,
        };

        let children = std::mem::take(&mut node.children);
        let name = node.name.clone();
        node.parent = Some(parent);
        node.level = level;
        node.state = self.current_state;
        node.lighting.clear();

        let new_id = NodeId::from_index(self.nodes.push(node));
        let current = self.current_state;
        self.states[current].register(new_id, &name);
        self.nodes[parent.index()].children.push(new_id);

        let mut moved = 1;
        for child in children {
            moved += self.relocate(donor, child, new_id, level + 1);
        }

        moved
    }

    /// Like [`Model::graft`], consuming the donor.
    pub fn add_child(&mut self, target: NodeId, mut donor: Model) -> Result<()> {
        self.graft(target, &mut donor)
    }
}
