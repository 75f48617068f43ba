use super::{RenderDispatcher, RenderPass};
use crate::{Model, SharedFrame};
use aurora_backend::{LightingManager, RenderBackend};
use aurora_utils::log::warn;
use parking_lot::Mutex;

/// The models currently visible, walked once per frame by the render thread.
#[derive(Debug, Default)]
pub struct RenderQueue {
    models: Mutex<Vec<(usize, SharedFrame)>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, id: usize, frame: SharedFrame) {
        let mut models = self.models.lock();
        match models.iter_mut().find(|(i, _)| *i == id) {
            Some(entry) => entry.1 = frame,
            None => models.push((id, frame)),
        }
    }

    pub(crate) fn remove(&self, id: usize) -> bool {
        let mut models = self.models.lock();
        let count = models.len();
        models.retain(|(i, _)| *i != id);
        models.len() != count
    }

    pub fn contains(&self, id: usize) -> bool {
        self.models.lock().iter().any(|(i, _)| *i == id)
    }

    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.lock().is_empty()
    }

    /// The registered frames at this point. The queue lock is released before
    /// any frame is locked, so a thread holding a frame can still show or
    /// hide models.
    fn snapshot(&self) -> Vec<SharedFrame> {
        self.models
            .lock()
            .iter()
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    fn visit(frame: &SharedFrame, f: impl FnOnce(&mut Model)) {
        if let Err(err) = frame.with(f) {
            warn!("skipping model this frame: {}", err);
        }
    }

    /// Renders every registered model: frame preparation for all of them,
    /// then the opaque pass over all models followed by the transparent pass.
    ///
    /// Models shown or hidden while a frame is in progress take effect on the
    /// next frame.
    pub fn render_frame(
        &self,
        dispatcher: &RenderDispatcher,
        backend: &mut dyn RenderBackend,
        lights: &mut dyn LightingManager,
    ) {
        let models = self.snapshot();

        for frame in models.iter() {
            Self::visit(frame, |model| dispatcher.begin_frame(model, lights));
        }

        for pass in RenderPass::ALL.iter() {
            for frame in models.iter() {
                Self::visit(frame, |model| dispatcher.render(model, *pass, backend, lights));
            }
        }
    }

    pub fn draw_skeletons(&self, dispatcher: &RenderDispatcher, backend: &mut dyn RenderBackend) {
        for frame in self.snapshot().iter() {
            Self::visit(frame, |model| dispatcher.draw_skeleton(model, backend));
        }
    }
}
