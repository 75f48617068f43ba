use crate::{Model, NodeId, RenderQueue, Result, SceneError};
use aurora_math::*;
use aurora_utils::log::{info, warn};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static NEXT_HANDLE_ID: AtomicUsize = AtomicUsize::new(0);

type FrameSlot = ReentrantMutex<RefCell<Model>>;

/// A model shared with the render thread. Every access goes through the
/// re-entrant frame lock.
#[derive(Debug, Clone)]
pub struct SharedFrame(Arc<FrameSlot>);

impl SharedFrame {
    fn new(model: Model) -> Self {
        Self(Arc::new(ReentrantMutex::new(RefCell::new(model))))
    }

    /// Blocks until no other thread holds the frame. Locking again on the
    /// same thread does not deadlock.
    pub fn lock(&self) -> FrameGuard<'_> {
        FrameGuard::Shared(self.0.lock())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Model) -> R) -> Result<R> {
        self.lock().with(f)
    }

    fn try_unwrap(self) -> std::result::Result<Model, SharedFrame> {
        Arc::try_unwrap(self.0)
            .map(|slot| slot.into_inner().into_inner())
            .map_err(SharedFrame)
    }

    fn take(&self) -> Result<Model> {
        self.with(std::mem::take)
    }
}

/// Scoped access to a model. Holds the frame lock while the model is shared
/// with a renderer and nothing otherwise.
pub enum FrameGuard<'a> {
    Unshared(&'a mut Model),
    Shared(ReentrantMutexGuard<'a, RefCell<Model>>),
}

impl<'a> FrameGuard<'a> {
    pub fn is_locked(&self) -> bool {
        matches!(self, FrameGuard::Shared(_))
    }

    /// Runs `f` on the guarded model.
    ///
    /// # Errors
    /// [`SceneError::FrameBusy`] when called from within another `with` on the
    /// same shared model. Locking again is fine, borrowing twice is not.
    pub fn with<R>(&mut self, f: impl FnOnce(&mut Model) -> R) -> Result<R> {
        match self {
            FrameGuard::Unshared(model) => Ok(f(model)),
            FrameGuard::Shared(guard) => {
                let mut model = guard
                    .try_borrow_mut()
                    .map_err(|_| SceneError::FrameBusy)?;
                Ok(f(&mut model))
            }
        }
    }
}

#[derive(Debug)]
enum Access {
    Unshared(Box<Model>),
    Shared {
        frame: SharedFrame,
        queue: Option<Arc<RenderQueue>>,
    },
}

impl Default for Access {
    fn default() -> Self {
        Access::Unshared(Box::new(Model::default()))
    }
}

/// Owner of a [`Model`].
///
/// A hidden model is owned outright and mutated without locking. Showing it
/// moves it behind a frame lock shared with a [`RenderQueue`]; from then on
/// every mutation waits for the renderer to finish the model's frame work.
#[derive(Debug)]
pub struct ModelHandle {
    id: usize,
    access: Access,
}

impl ModelHandle {
    pub fn new(model: Model) -> Self {
        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        info!("created model \"{}\" ({})", model.name(), id);

        Self {
            id,
            access: Access::Unshared(Box::new(model)),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.access, Access::Shared { queue: Some(_), .. })
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.access, Access::Shared { .. })
    }

    /// Another owner of the shared model, for threads other than the owner
    /// of this handle. `None` while the model is hidden.
    pub fn shared_frame(&self) -> Option<SharedFrame> {
        match &self.access {
            Access::Shared { frame, .. } => Some(frame.clone()),
            Access::Unshared(_) => None,
        }
    }

    pub fn lock_frame(&mut self) -> FrameGuard<'_> {
        match &mut self.access {
            Access::Unshared(model) => FrameGuard::Unshared(model),
            Access::Shared { frame, .. } => frame.lock(),
        }
    }

    pub fn with_frame<R>(&mut self, f: impl FnOnce(&mut Model) -> R) -> Result<R> {
        self.lock_frame().with(f)
    }

    /// Registers the model with `queue`, sharing it with the render thread.
    pub fn show(&mut self, queue: &Arc<RenderQueue>) {
        self.access = match std::mem::take(&mut self.access) {
            Access::Unshared(model) => {
                let frame = SharedFrame::new(*model);
                queue.insert(self.id, frame.clone());
                Access::Shared {
                    frame,
                    queue: Some(queue.clone()),
                }
            }
            Access::Shared { frame, queue: None } => {
                queue.insert(self.id, frame.clone());
                Access::Shared {
                    frame,
                    queue: Some(queue.clone()),
                }
            }
            visible => visible,
        };
    }

    /// Removes the model from its render queue and takes back exclusive
    /// ownership when no other [`SharedFrame`] is alive. A frame in progress
    /// may still hold one; hiding again later reclaims the model.
    pub fn hide(&mut self) {
        self.access = match std::mem::take(&mut self.access) {
            Access::Shared { frame, queue } => {
                if let Some(queue) = queue {
                    queue.remove(self.id);
                }

                match frame.try_unwrap() {
                    Ok(model) => Access::Unshared(Box::new(model)),
                    Err(frame) => {
                        warn!(
                            "model {} is still referenced elsewhere, keeping it locked",
                            self.id
                        );
                        Access::Shared { frame, queue: None }
                    }
                }
            }
            hidden => hidden,
        };
    }

    /// The queue the model is currently registered with.
    pub fn queue(&self) -> Option<Arc<RenderQueue>> {
        match &self.access {
            Access::Shared { queue, .. } => queue.clone(),
            Access::Unshared(_) => None,
        }
    }

    /// Hides the model and hands it out.
    pub fn into_model(mut self) -> Result<Model> {
        self.hide();
        match std::mem::take(&mut self.access) {
            Access::Unshared(model) => Ok(*model),
            Access::Shared { frame, .. } => frame.take(),
        }
    }

    /// Moves the current state of `donor` below `node`. Both models are hidden
    /// while their nodes move; this model is shown again afterwards if it was
    /// visible before.
    pub fn add_child(&mut self, node: NodeId, donor: ModelHandle) -> Result<()> {
        let donor = donor.into_model()?;

        let queue = self.queue();
        self.hide();
        let result = self
            .with_frame(|model| model.add_child(node, donor))
            .and_then(|r| r);
        if let Some(queue) = queue {
            self.show(&queue);
        }

        result
    }

    pub fn set_position(&mut self, node: NodeId, position: Vec3) -> Result<()> {
        self.with_node(node, |mut n| n.set_position(position))
    }

    pub fn set_rotation(&mut self, node: NodeId, rotation: Vec3) -> Result<()> {
        self.with_node(node, |mut n| n.set_rotation(rotation))
    }

    pub fn set_orientation(&mut self, node: NodeId, orientation: Vec4) -> Result<()> {
        self.with_node(node, |mut n| n.set_orientation(orientation))
    }

    pub fn move_by(&mut self, node: NodeId, delta: Vec3) -> Result<()> {
        self.with_node(node, |mut n| n.move_by(delta))
    }

    pub fn rotate(&mut self, node: NodeId, delta: Vec3) -> Result<()> {
        self.with_node(node, |mut n| n.rotate(delta))
    }

    fn with_node<R>(
        &mut self,
        node: NodeId,
        f: impl FnOnce(crate::NodeMut<'_>) -> R,
    ) -> Result<R> {
        self.with_frame(|model| {
            model
                .node_mut(node)
                .map(f)
                .ok_or(SceneError::InvalidNode(node))
        })?
    }
}

impl Drop for ModelHandle {
    fn drop(&mut self) {
        if let Access::Shared {
            queue: Some(queue), ..
        } = &self.access
        {
            queue.remove(self.id);
        }
    }
}
