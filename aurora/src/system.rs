use aurora_backend::{LightingManager, RenderBackend, Setting, SettingError};
use aurora_scene::{Model, ModelHandle, RenderDispatcher, RenderQueue};
use aurora_utils::log::debug;
use std::sync::Arc;

/// Owns the render side of the engine: the graphics backend, the light
/// manager and the queue of visible models.
pub struct RenderSystem<B: RenderBackend, L: LightingManager> {
    backend: B,
    lights: L,
    dispatcher: RenderDispatcher,
    queue: Arc<RenderQueue>,
    frame: u64,
    show_skeletons: bool,
}

impl<B: RenderBackend, L: LightingManager> RenderSystem<B, L> {
    pub const SHOW_SKELETONS: &'static str = "show_skeletons";

    pub fn new(backend: B, lights: L) -> Self {
        Self {
            backend,
            lights,
            dispatcher: RenderDispatcher::new(),
            queue: Arc::new(RenderQueue::new()),
            frame: 0,
            show_skeletons: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn lights(&self) -> &L {
        &self.lights
    }

    pub fn dispatcher(&self) -> &RenderDispatcher {
        &self.dispatcher
    }

    pub fn queue(&self) -> &Arc<RenderQueue> {
        &self.queue
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Wraps `model` in a handle and makes it visible.
    pub fn show(&self, model: Model) -> ModelHandle {
        let mut handle = ModelHandle::new(model);
        handle.show(&self.queue);
        handle
    }

    pub fn render(&mut self) {
        self.queue
            .render_frame(&self.dispatcher, &mut self.backend, &mut self.lights);

        if self.show_skeletons {
            self.queue.draw_skeletons(&self.dispatcher, &mut self.backend);
        }

        self.frame += 1;
    }

    pub fn get_settings(&self) -> Vec<Setting> {
        let mut settings = vec![Setting::flag(Self::SHOW_SKELETONS, self.show_skeletons)];
        settings.extend(self.dispatcher.get_settings());
        settings.extend(self.backend.get_settings());
        settings
    }

    /// Routes `setting` to whichever part of the system knows its key.
    pub fn set_setting(&mut self, setting: Setting) -> Result<(), SettingError> {
        if setting.key() == Self::SHOW_SKELETONS {
            let mut current = Setting::flag(Self::SHOW_SKELETONS, self.show_skeletons);
            current.set(setting.value().clone())?;
            self.show_skeletons = current.as_bool().unwrap_or(false);
            debug!("show_skeletons = {}", self.show_skeletons);
            return Ok(());
        }

        match self.dispatcher.set_setting(setting.clone()) {
            Err(SettingError::Unknown(_)) => self.backend.set_setting(setting),
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_backend::*;
    use aurora_math::*;
    use aurora_scene::ModelType;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct CountingBackend {
        draws: usize,
        points: usize,
        vsync: bool,
    }

    impl RenderBackend for CountingBackend {
        fn bind_texture(&mut self, _: usize, _: Option<&Texture>, _: TextureMode) {}
        fn set_blend_func(&mut self, _: BlendFunc) {}
        fn set_alpha_test(&mut self, _: bool) {}
        fn set_polygon_mode(&mut self, _: PolygonMode) {}

        fn draw_triangles(&mut self, _: &Mat4, _: &VertexBuffer, _: &IndexBuffer) {
            self.draws += 1;
        }

        fn draw_point(&mut self, _: Vec3, _: f32, _: Vec4) {
            self.points += 1;
        }

        fn draw_line(&mut self, _: Vec3, _: Vec3, _: f32, _: Vec4) {}

        fn get_settings(&self) -> Vec<Setting> {
            vec![Setting::flag("vsync", self.vsync)]
        }

        fn set_setting(&mut self, setting: Setting) -> Result<(), SettingError> {
            match setting.key().as_str() {
                "vsync" => {
                    self.vsync = setting.as_bool().unwrap_or(false);
                    Ok(())
                }
                _ => Err(SettingError::Unknown(setting.key().clone())),
            }
        }
    }

    #[derive(Default)]
    struct NoLights(u32);

    impl LightingManager for NoLights {
        fn create_lighting(&mut self) -> LightingHandle {
            self.0 += 1;
            LightingHandle(self.0)
        }

        fn evaluate_lighting(&mut self, _: LightingHandle, _: Vec3) {}
        fn render_lights(&mut self, _: LightingHandle) {}
    }

    fn wireframe_model() -> Model {
        let mut model = Model::new("box", ModelType::Object);
        let root = model.add_node(Some("root"), None).unwrap();
        let mut node = model.node_mut(root).unwrap();
        node.set_geometry(
            Arc::new(VertexBuffer::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y])),
            Arc::new(IndexBuffer::new(vec![0, 1, 2])),
        );
        node.set_invisible(false);
        model
    }

    #[test]
    fn renders_visible_models() {
        let mut system = RenderSystem::new(CountingBackend::default(), NoLights::default());
        let mut handle = system.show(wireframe_model());

        system.render();
        assert_eq!(system.backend().draws, 1);
        assert_eq!(system.lights().0, 1);

        handle.hide();
        system.render();
        assert_eq!(system.backend().draws, 1);
        assert_eq!(system.frame(), 2);
    }

    #[test]
    fn settings_are_routed() {
        let mut system = RenderSystem::new(CountingBackend::default(), NoLights::default());
        let keys: Vec<String> = system
            .get_settings()
            .iter()
            .map(|s| s.key().clone())
            .collect();
        assert_eq!(
            keys,
            vec![
                "show_skeletons",
                "wireframe_untextured",
                "skeleton_show_invisible",
                "vsync"
            ]
        );

        system.set_setting(Setting::flag("vsync", true)).unwrap();
        assert!(system.backend().vsync);

        let _handle = system.show(wireframe_model());
        let key = RenderSystem::<CountingBackend, NoLights>::SHOW_SKELETONS;
        system.set_setting(Setting::flag(key, true)).unwrap();
        system.render();
        assert_eq!(system.backend().points, 1);

        assert!(matches!(
            system.set_setting(Setting::flag("bogus", true)),
            Err(SettingError::Unknown(_))
        ));
    }
}
