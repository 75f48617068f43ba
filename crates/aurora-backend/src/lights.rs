use aurora_math::Vec3;

/// Opaque identifier of a lighting evaluation owned by a [`LightingManager`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LightingHandle(pub u32);

pub trait LightingManager {
    fn create_lighting(&mut self) -> LightingHandle;

    /// Picks the lights affecting `position` and stores them under `handle`.
    fn evaluate_lighting(&mut self, handle: LightingHandle, position: Vec3);

    /// Enables the lights stored under `handle` for the following draws.
    fn render_lights(&mut self, handle: LightingHandle);
}
