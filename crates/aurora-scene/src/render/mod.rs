use crate::{EnvMapMode, Model, ModelNode, NodeId};
use aurora_backend::*;
use aurora_math::*;
use aurora_utils::log::info;

mod queue;

pub use queue::*;

/// Geometry is drawn in two passes per frame so transparent surfaces blend
/// over everything opaque.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RenderPass {
    Opaque,
    Transparent,
}

impl RenderPass {
    pub const ALL: [RenderPass; 2] = [RenderPass::Opaque, RenderPass::Transparent];
}

const POINT_SIZE: f32 = 5.0;
const LINE_WIDTH: f32 = 2.0;
const RENDERED_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
const INVISIBLE_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
const BONE_COLOR: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);

/// Walks model node trees and issues their draw calls on a [`RenderBackend`].
#[derive(Debug, Clone)]
pub struct RenderDispatcher {
    wireframe_untextured: bool,
    skeleton_show_invisible: bool,
}

impl Default for RenderDispatcher {
    fn default() -> Self {
        Self {
            wireframe_untextured: true,
            skeleton_show_invisible: false,
        }
    }
}

impl RenderDispatcher {
    pub const WIREFRAME_UNTEXTURED: &'static str = "wireframe_untextured";
    pub const SKELETON_SHOW_INVISIBLE: &'static str = "skeleton_show_invisible";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_settings(&self) -> Vec<Setting> {
        vec![
            Setting::flag(Self::WIREFRAME_UNTEXTURED, self.wireframe_untextured),
            Setting::flag(Self::SKELETON_SHOW_INVISIBLE, self.skeleton_show_invisible),
        ]
    }

    /// Applies `setting` if it names a known setting and holds a valid value.
    pub fn set_setting(&mut self, setting: Setting) -> Result<(), SettingError> {
        let mut current = self
            .get_settings()
            .into_iter()
            .find(|s| s.key() == setting.key())
            .ok_or_else(|| SettingError::Unknown(setting.key().clone()))?;
        current.set(setting.value().clone())?;

        let enabled = current.as_bool().unwrap_or(false);
        match current.key().as_str() {
            Self::WIREFRAME_UNTEXTURED => self.wireframe_untextured = enabled,
            Self::SKELETON_SHOW_INVISIBLE => self.skeleton_show_invisible = enabled,
            _ => {}
        }

        info!("render setting \"{}\" set to {}", current.key(), enabled);
        Ok(())
    }

    /// Per-frame preparation: recomputes absolute bounds if any node changed,
    /// then evaluates the lights affecting every node at the center of its
    /// world space bound.
    pub fn begin_frame(&self, model: &mut Model, lights: &mut dyn LightingManager) {
        model.update_bounds();

        let world = *model.world_matrix();
        for id in model.nodes().to_vec() {
            let node = match model.nodes.get_mut(id.index()) {
                Some(node) => node,
                None => continue,
            };

            let center = node
                .bound
                .transformed(&(world * node.absolute_matrix))
                .center();
            let handle = match node.lighting.first() {
                Some(handle) => *handle,
                None => {
                    let handle = lights.create_lighting();
                    node.lighting.push(handle);
                    handle
                }
            };

            lights.evaluate_lighting(handle, center);
        }

        model.nodes.reset_changed();
    }

    /// Draws the geometry of the current state belonging to `pass`.
    pub fn render(
        &self,
        model: &Model,
        pass: RenderPass,
        backend: &mut dyn RenderBackend,
        lights: &mut dyn LightingManager,
    ) {
        let world = *model.world_matrix();
        for root in model.root_nodes() {
            self.render_node(model, *root, world, pass, backend, lights);
        }
    }

    fn render_node(
        &self,
        model: &Model,
        id: NodeId,
        parent: Mat4,
        pass: RenderPass,
        backend: &mut dyn RenderBackend,
        lights: &mut dyn LightingManager,
    ) {
        let node = match model.get(id) {
            Some(node) => node,
            None => return,
        };

        let matrix = parent * node.transform().local_matrix();
        if node.should_render(pass) {
            self.render_geometry(node, &matrix, backend, lights);
        }

        for child in node.children() {
            self.render_node(model, *child, matrix, pass, backend, lights);
        }
    }

    /// Draws a single node's mesh with `transform`, regardless of pass.
    pub fn render_geometry(
        &self,
        node: &ModelNode,
        transform: &Mat4,
        backend: &mut dyn RenderBackend,
        lights: &mut dyn LightingManager,
    ) {
        let geometry = node.geometry();
        let (vertices, indices) = match (geometry.vertices.as_ref(), geometry.indices.as_ref()) {
            (Some(v), Some(i)) if !i.is_empty() => (&**v, &**i),
            _ => return,
        };

        if let Some(handle) = node.lighting().first() {
            lights.render_lights(*handle);
        }

        let textures = geometry.textures.as_slice();
        match (geometry.env_map.as_deref(), geometry.env_map_mode) {
            (Some(env_map), EnvMapMode::BlendedUnder) => {
                Self::render_blended_under(env_map, textures, transform, vertices, indices, backend)
            }
            (Some(env_map), EnvMapMode::BlendedOver) => {
                Self::render_blended_over(env_map, textures, transform, vertices, indices, backend)
            }
            _ => self.render_plain(textures, transform, vertices, indices, backend),
        }
    }

    fn bind_diffuse(textures: &[Option<TextureHandle>], backend: &mut dyn RenderBackend) {
        for (unit, texture) in textures.iter().enumerate() {
            backend.bind_texture(unit, texture.as_deref(), TextureMode::Diffuse);
        }
    }

    fn unbind(units: usize, backend: &mut dyn RenderBackend) {
        for unit in 0..units {
            backend.bind_texture(unit, None, TextureMode::Diffuse);
        }
    }

    fn render_plain(
        &self,
        textures: &[Option<TextureHandle>],
        transform: &Mat4,
        vertices: &VertexBuffer,
        indices: &IndexBuffer,
        backend: &mut dyn RenderBackend,
    ) {
        let wireframe = textures.is_empty() && self.wireframe_untextured;
        if wireframe {
            backend.set_polygon_mode(PolygonMode::Line);
        }

        Self::bind_diffuse(textures, backend);
        backend.draw_triangles(transform, vertices, indices);
        Self::unbind(textures.len(), backend);

        if wireframe {
            backend.set_polygon_mode(PolygonMode::Fill);
        }
    }

    fn render_blended_under(
        env_map: &Texture,
        textures: &[Option<TextureHandle>],
        transform: &Mat4,
        vertices: &VertexBuffer,
        indices: &IndexBuffer,
        backend: &mut dyn RenderBackend,
    ) {
        backend.bind_texture(0, Some(env_map), TextureMode::EnvironmentMapReflective);
        backend.draw_triangles(transform, vertices, indices);

        Self::bind_diffuse(textures, backend);
        backend.draw_triangles(transform, vertices, indices);
        Self::unbind(textures.len().max(1), backend);
    }

    fn render_blended_over(
        env_map: &Texture,
        textures: &[Option<TextureHandle>],
        transform: &Mat4,
        vertices: &VertexBuffer,
        indices: &IndexBuffer,
        backend: &mut dyn RenderBackend,
    ) {
        if let Some(first) = textures.first() {
            // Diffuse colour without blending.
            backend.set_blend_func(BlendFunc::new(BlendFactor::One, BlendFactor::Zero));
            Self::bind_diffuse(textures, backend);
            backend.draw_triangles(transform, vertices, indices);
            Self::unbind(textures.len(), backend);

            // Write the alpha of the first texture only.
            backend.bind_texture(0, first.as_deref(), TextureMode::Diffuse);
            backend.set_alpha_test(false);
            backend.set_blend_func(BlendFunc::new(BlendFactor::Zero, BlendFactor::One));
            backend.draw_triangles(transform, vertices, indices);
        }

        // Env map where the diffuse alpha leaves room.
        backend.bind_texture(0, Some(env_map), TextureMode::EnvironmentMapReflective);
        backend.set_blend_func(BlendFunc::new(BlendFactor::OneMinusDstAlpha, BlendFactor::One));
        backend.draw_triangles(transform, vertices, indices);
        backend.bind_texture(0, None, TextureMode::Diffuse);

        backend.set_alpha_test(true);
        backend.set_blend_func(BlendFunc::ALPHA);
    }

    /// Debug view of the node hierarchy: a point at every node origin and a
    /// line from each node to its parent.
    pub fn draw_skeleton(&self, model: &Model, backend: &mut dyn RenderBackend) {
        let world = *model.world_matrix();
        for root in model.root_nodes() {
            self.draw_bone(model, *root, world, backend);
        }
    }

    fn draw_bone(&self, model: &Model, id: NodeId, parent: Mat4, backend: &mut dyn RenderBackend) {
        let node = match model.get(id) {
            Some(node) => node,
            None => return,
        };

        let transform = node.transform();
        let matrix = parent
            .translated(transform.position)
            .oriented(transform.orientation)
            .scaled(transform.scale);

        let origin = matrix.get_position();
        if node.is_rendered() {
            backend.draw_point(origin, POINT_SIZE, RENDERED_COLOR);
        } else if self.skeleton_show_invisible {
            backend.draw_point(origin, POINT_SIZE, INVISIBLE_COLOR);
        }

        if node.parent().is_some() {
            backend.draw_line(parent.get_position(), origin, LINE_WIDTH, BONE_COLOR);
        }

        for child in node.children() {
            self.draw_bone(model, *child, matrix, backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::ModelType;
    use pretty_assertions::assert_eq;

    fn textured_model(textures: &StubTextures) -> (Model, NodeId, NodeId, NodeId) {
        let mut model = Model::new("m", ModelType::Object);
        let opaque = model.add_node(Some("opaque"), None).unwrap();
        let glass = model.add_node(Some("glass"), Some(opaque)).unwrap();
        let empty = model.add_node(Some("empty"), Some(opaque)).unwrap();

        for (id, texture) in [(opaque, "stone"), (glass, "glass"), (empty, "stone")].iter() {
            let mut node = model.node_mut(*id).unwrap();
            let (vertices, indices) = quad();
            node.set_geometry(vertices, indices);
            node.set_textures(&[*texture], textures);
        }

        let (vertices, _) = quad();
        model
            .node_mut(empty)
            .unwrap()
            .set_geometry(vertices, std::sync::Arc::new(IndexBuffer::new(Vec::new())));
        model.finalize();

        (model, opaque, glass, empty)
    }

    fn stub_textures() -> StubTextures {
        let mut textures = StubTextures::default();
        textures.insert("stone", false, Default::default());
        textures.insert_alpha("glass", 0.25);
        textures
    }

    #[test]
    fn passes_split_by_transparency() {
        let textures = stub_textures();
        let (mut model, opaque, _, _) = textured_model(&textures);

        let empty_glass = model.add_node(Some("empty_glass"), Some(opaque)).unwrap();
        let mut node = model.node_mut(empty_glass).unwrap();
        let (vertices, _) = quad();
        node.set_geometry(vertices, std::sync::Arc::new(IndexBuffer::new(Vec::new())));
        node.set_textures(&["glass"], &textures);
        assert!(model.get(empty_glass).unwrap().is_transparent());
        assert!(model.get(empty_glass).unwrap().is_rendered());

        let dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();

        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);
        assert_eq!(backend.drawn_textures(), vec![Some("stone".to_string())]);

        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Transparent, &mut backend, &mut lights);
        assert_eq!(backend.drawn_textures(), vec![Some("glass".to_string())]);
    }

    #[test]
    fn children_compose_parent_transform() {
        let textures = stub_textures();
        let (mut model, opaque, glass, _) = textured_model(&textures);
        model
            .node_mut(opaque)
            .unwrap()
            .set_position(Vec3::new(1.0, 0.0, 0.0));
        model
            .node_mut(glass)
            .unwrap()
            .set_position(Vec3::new(0.0, 2.0, 0.0));
        model.set_position(Vec3::new(0.0, 0.0, 3.0));

        let dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();
        let mut backend = RecordingBackend::default();
        for pass in RenderPass::ALL.iter() {
            dispatcher.render(&model, *pass, &mut backend, &mut lights);
        }

        assert_eq!(
            backend.draw_positions(),
            vec![Vec3::new(1.0, 0.0, 3.0), Vec3::new(1.0, 2.0, 3.0)]
        );
    }

    #[test]
    fn untextured_nodes_draw_as_wireframe() {
        let mut model = Model::new("m", ModelType::Object);
        let root = model.add_node(None, None).unwrap();
        let mut node = model.node_mut(root).unwrap();
        let (vertices, indices) = quad();
        node.set_geometry(vertices, indices);
        node.set_invisible(false);

        let mut dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();
        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);
        assert_eq!(
            backend.calls,
            vec![
                Call::PolygonMode(PolygonMode::Line),
                Call::Draw { texture: None },
                Call::PolygonMode(PolygonMode::Fill),
            ]
        );

        dispatcher
            .set_setting(Setting::flag(RenderDispatcher::WIREFRAME_UNTEXTURED, false))
            .unwrap();
        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);
        assert_eq!(backend.calls, vec![Call::Draw { texture: None }]);
    }

    #[test]
    fn blended_over_sequence() {
        let mut textures = stub_textures();
        textures.insert("CM_Metal", false, Default::default());

        let mut model = Model::new("m", ModelType::Object);
        let root = model.add_node(None, None).unwrap();
        let mut node = model.node_mut(root).unwrap();
        let (vertices, indices) = quad();
        node.set_geometry(vertices, indices);
        node.set_textures(&["stone"], &textures);
        node.set_environment_map("CM_Metal", &textures);
        node.set_env_map_mode(EnvMapMode::BlendedOver);

        let dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();
        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);

        let stone = Some("stone".to_string());
        let metal = Some("CM_Metal".to_string());
        assert_eq!(
            backend.calls,
            vec![
                Call::Blend(BlendFunc::new(BlendFactor::One, BlendFactor::Zero)),
                Call::Bind(0, stone.clone(), TextureMode::Diffuse),
                Call::Draw { texture: stone.clone() },
                Call::Bind(0, None, TextureMode::Diffuse),
                Call::Bind(0, stone.clone(), TextureMode::Diffuse),
                Call::AlphaTest(false),
                Call::Blend(BlendFunc::new(BlendFactor::Zero, BlendFactor::One)),
                Call::Draw { texture: stone },
                Call::Bind(0, metal.clone(), TextureMode::EnvironmentMapReflective),
                Call::Blend(BlendFunc::new(BlendFactor::OneMinusDstAlpha, BlendFactor::One)),
                Call::Draw { texture: metal },
                Call::Bind(0, None, TextureMode::Diffuse),
                Call::AlphaTest(true),
                Call::Blend(BlendFunc::ALPHA),
            ]
        );
    }

    #[test]
    fn blended_over_untextured_draws_env_map_only() {
        let mut textures = stub_textures();
        textures.insert("CM_Metal", false, Default::default());

        let mut model = Model::new("m", ModelType::Object);
        let root = model.add_node(None, None).unwrap();
        let mut node = model.node_mut(root).unwrap();
        let (vertices, indices) = quad();
        node.set_geometry(vertices, indices);
        node.set_invisible(false);
        node.set_environment_map("CM_Metal", &textures);
        node.set_env_map_mode(EnvMapMode::BlendedOver);

        let dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();
        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);

        let metal = Some("CM_Metal".to_string());
        assert_eq!(backend.drawn_textures(), vec![metal.clone()]);
        assert_eq!(
            backend.calls,
            vec![
                Call::Bind(0, metal.clone(), TextureMode::EnvironmentMapReflective),
                Call::Blend(BlendFunc::new(BlendFactor::OneMinusDstAlpha, BlendFactor::One)),
                Call::Draw { texture: metal },
                Call::Bind(0, None, TextureMode::Diffuse),
                Call::AlphaTest(true),
                Call::Blend(BlendFunc::ALPHA),
            ]
        );
    }

    #[test]
    fn blended_under_draws_env_map_first() {
        let mut textures = stub_textures();
        textures.insert("CM_Metal", false, Default::default());

        let mut model = Model::new("m", ModelType::Object);
        let root = model.add_node(None, None).unwrap();
        let mut node = model.node_mut(root).unwrap();
        let (vertices, indices) = quad();
        node.set_geometry(vertices, indices);
        node.set_textures(&["stone"], &textures);
        node.set_environment_map("CM_Metal", &textures);

        let dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();
        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);

        assert_eq!(
            backend.drawn_textures(),
            vec![Some("CM_Metal".to_string()), Some("stone".to_string())]
        );
        assert_eq!(
            backend.calls.last(),
            Some(&Call::Bind(0, None, TextureMode::Diffuse))
        );

        model
            .node_mut(root)
            .unwrap()
            .set_env_map_mode(EnvMapMode::None);
        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);
        assert_eq!(backend.drawn_textures(), vec![Some("stone".to_string())]);
    }

    #[test]
    fn begin_frame_evaluates_lights_once_per_node() {
        let textures = stub_textures();
        let (mut model, opaque, _, _) = textured_model(&textures);
        model.set_position(Vec3::new(10.0, 0.0, 0.0));

        let dispatcher = RenderDispatcher::new();
        let mut lights = CountingLights::default();
        dispatcher.begin_frame(&mut model, &mut lights);
        dispatcher.begin_frame(&mut model, &mut lights);

        assert_eq!(lights.created, 3);
        assert_eq!(lights.evaluated.len(), 6);
        let (handle, center) = lights.evaluated[0];
        assert_eq!(model.get(opaque).unwrap().lighting(), &[handle]);
        assert_eq!(center, Vec3::new(10.5, 0.5, 0.0));

        let mut backend = RecordingBackend::default();
        dispatcher.render(&model, RenderPass::Opaque, &mut backend, &mut lights);
        assert_eq!(lights.rendered, vec![handle]);
    }

    #[test]
    fn skeleton_marks_invisible_nodes() {
        let mut model = Model::new("m", ModelType::Object);
        let root = model.add_node(None, None).unwrap();
        let child = model.add_node(None, Some(root)).unwrap();
        model.node_mut(root).unwrap().set_invisible(false);
        model
            .node_mut(child)
            .unwrap()
            .set_position(Vec3::new(0.0, 1.0, 0.0));

        let mut dispatcher = RenderDispatcher::new();
        let mut backend = RecordingBackend::default();
        dispatcher.draw_skeleton(&model, &mut backend);
        assert_eq!(
            backend.calls,
            vec![
                Call::Point(Vec3::ZERO, RENDERED_COLOR),
                Call::Line(Vec3::ZERO, Vec3::Y),
            ]
        );

        dispatcher
            .set_setting(Setting::flag(RenderDispatcher::SKELETON_SHOW_INVISIBLE, true))
            .unwrap();
        let mut backend = RecordingBackend::default();
        dispatcher.draw_skeleton(&model, &mut backend);
        assert_eq!(backend.calls[1], Call::Point(Vec3::Y, INVISIBLE_COLOR));
    }

    #[test]
    fn settings_are_validated() {
        let mut dispatcher = RenderDispatcher::new();
        assert!(matches!(
            dispatcher.set_setting(Setting::flag("bogus", true)),
            Err(SettingError::Unknown(_))
        ));
        assert!(matches!(
            dispatcher.set_setting(Setting::new(
                RenderDispatcher::WIREFRAME_UNTEXTURED,
                SettingValue::Int(7),
                None
            )),
            Err(SettingError::OutOfRange(_))
        ));

        let settings = dispatcher.get_settings();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings[0].as_bool(), Some(true));
    }
}
