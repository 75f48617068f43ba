//! Collaborator doubles shared by the unit tests.

use aurora_backend::*;
use aurora_math::*;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bind(usize, Option<String>, TextureMode),
    Blend(BlendFunc),
    AlphaTest(bool),
    PolygonMode(PolygonMode),
    /// A draw, with the name of the texture bound to unit 0 at the time.
    Draw { texture: Option<String> },
    Point(Vec3, Vec4),
    Line(Vec3, Vec3),
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub transforms: Vec<Mat4>,
    bound: Option<String>,
}

impl RecordingBackend {
    pub fn drawn_textures(&self) -> Vec<Option<String>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw { texture } => Some(texture.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn draw_positions(&self) -> Vec<Vec3> {
        self.transforms.iter().map(|m| m.get_position()).collect()
    }
}

impl RenderBackend for RecordingBackend {
    fn bind_texture(&mut self, unit: usize, texture: Option<&Texture>, mode: TextureMode) {
        let name = texture.map(|t| t.name().to_string());
        if unit == 0 {
            self.bound = name.clone();
        }
        self.calls.push(Call::Bind(unit, name, mode));
    }

    fn set_blend_func(&mut self, func: BlendFunc) {
        self.calls.push(Call::Blend(func));
    }

    fn set_alpha_test(&mut self, enabled: bool) {
        self.calls.push(Call::AlphaTest(enabled));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.calls.push(Call::PolygonMode(mode));
    }

    fn draw_triangles(
        &mut self,
        transform: &Mat4,
        _vertices: &VertexBuffer,
        _indices: &IndexBuffer,
    ) {
        self.transforms.push(*transform);
        self.calls.push(Call::Draw {
            texture: self.bound.clone(),
        });
    }

    fn draw_point(&mut self, position: Vec3, _size: f32, color: Vec4) {
        self.calls.push(Call::Point(position, color));
    }

    fn draw_line(&mut self, from: Vec3, to: Vec3, _width: f32, _color: Vec4) {
        self.calls.push(Call::Line(from, to));
    }
}

#[derive(Debug, Default)]
pub struct StubTextures {
    textures: HashMap<String, TextureHandle>,
}

impl StubTextures {
    pub fn insert(&mut self, name: &str, has_alpha: bool, txi: TxiFeatures) {
        self.textures
            .insert(name.to_string(), Arc::new(Texture::new(name, has_alpha, txi)));
    }

    pub fn insert_alpha(&mut self, name: &str, alpha_mean: f32) {
        let txi = TxiFeatures {
            alpha_mean: Some(alpha_mean),
            ..TxiFeatures::default()
        };
        self.insert(name, true, txi);
    }

    pub fn insert_decal(&mut self, name: &str) {
        let txi = TxiFeatures {
            decal: true,
            ..TxiFeatures::default()
        };
        self.insert(name, false, txi);
    }

    pub fn insert_env_mapped(&mut self, name: &str, env_map: &str) {
        let txi = TxiFeatures {
            env_map_texture: env_map.to_string(),
            ..TxiFeatures::default()
        };
        self.insert(name, false, txi);
    }
}

impl TextureManager for StubTextures {
    fn get(&self, name: &str) -> Result<TextureHandle, TextureError> {
        self.textures
            .get(name)
            .cloned()
            .ok_or_else(|| TextureError::NotFound(name.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct CountingLights {
    pub created: u32,
    pub evaluated: Vec<(LightingHandle, Vec3)>,
    pub rendered: Vec<LightingHandle>,
}

impl LightingManager for CountingLights {
    fn create_lighting(&mut self) -> LightingHandle {
        self.created += 1;
        LightingHandle(self.created)
    }

    fn evaluate_lighting(&mut self, handle: LightingHandle, position: Vec3) {
        self.evaluated.push((handle, position));
    }

    fn render_lights(&mut self, handle: LightingHandle) {
        self.rendered.push(handle);
    }
}

/// Unit square in the XY plane with its corner at the origin.
pub fn quad() -> (Arc<VertexBuffer>, Arc<IndexBuffer>) {
    let vertices = VertexBuffer::from_positions(&[
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ]);
    let indices = IndexBuffer::new(vec![0, 1, 2, 2, 3, 0]);
    (Arc::new(vertices), Arc::new(indices))
}
