use aurora_math::*;

mod buffers;
pub mod images;
mod lights;
mod settings;
mod texture;

pub use buffers::*;
pub use images::txi::{parse_txi_command, TxiBlending, TxiCommand, TxiFeatures};
pub use lights::*;
pub use settings::*;
pub use texture::*;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }

    /// Regular alpha blending, the state every draw expects to be left in.
    pub const ALPHA: BlendFunc =
        BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self::ALPHA
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PolygonMode {
    Fill,
    Line,
}

impl Default for PolygonMode {
    fn default() -> Self {
        PolygonMode::Fill
    }
}

/// Raw draw interface the scene graph renders through. Implementations own
/// the graphics API state; the scene graph only sequences state changes and
/// draw calls.
pub trait RenderBackend {
    /// Binds `texture` to `unit`, or unbinds the unit when `None`.
    fn bind_texture(&mut self, unit: usize, texture: Option<&Texture>, mode: TextureMode);

    fn set_blend_func(&mut self, func: BlendFunc);

    fn set_alpha_test(&mut self, enabled: bool);

    fn set_polygon_mode(&mut self, mode: PolygonMode);

    /// Draws indexed triangles with the given model-view transform.
    fn draw_triangles(&mut self, transform: &Mat4, vertices: &VertexBuffer, indices: &IndexBuffer);

    fn draw_point(&mut self, position: Vec3, size: f32, color: Vec4);

    fn draw_line(&mut self, from: Vec3, to: Vec3, width: f32, color: Vec4);

    fn get_settings(&self) -> Vec<Setting> {
        Vec::new()
    }

    fn set_setting(&mut self, setting: Setting) -> Result<(), SettingError> {
        Err(SettingError::Unknown(setting.key().clone()))
    }
}
