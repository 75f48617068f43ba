use aurora_math::*;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Color,
    TexCoord0,
    TexCoord1,
    TexCoord2,
    TexCoord3,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttributeType {
    Float,
    UnsignedByte,
    Short,
}

/// One attribute of an interleaved vertex layout. `offset` is measured in
/// floats from the start of the buffer, `stride` in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttrib {
    pub index: VertexAttribute,
    pub kind: AttributeType,
    pub size: u32,
    pub stride: u32,
    pub offset: u32,
}

impl VertexAttrib {
    pub fn new(
        index: VertexAttribute,
        kind: AttributeType,
        size: u32,
        stride: u32,
        offset: u32,
    ) -> Self {
        Self {
            index,
            kind,
            size,
            stride,
            offset,
        }
    }

    /// Distance between consecutive vertices, in floats.
    pub fn float_stride(&self) -> usize {
        self.size.max(self.stride / std::mem::size_of::<f32>() as u32) as usize
    }
}

pub type VertexDecl = Vec<VertexAttrib>;

/// Vertex data populated by a model loader.
#[derive(Debug, Clone, Default)]
pub struct VertexBuffer {
    decl: VertexDecl,
    data: Vec<f32>,
    count: u32,
}

impl VertexBuffer {
    pub fn new(decl: VertexDecl, data: Vec<f32>, count: u32) -> Self {
        Self { decl, data, count }
    }

    /// Tightly packed buffer holding only positions.
    pub fn from_positions(positions: &[Vec3]) -> Self {
        let data = positions.iter().flat_map(|p| p.to_array()).collect();
        Self {
            decl: vec![VertexAttrib::new(
                VertexAttribute::Position,
                AttributeType::Float,
                3,
                12,
                0,
            )],
            data,
            count: positions.len() as u32,
        }
    }

    pub fn decl(&self) -> &[VertexAttrib] {
        self.decl.as_slice()
    }

    pub fn data(&self) -> &[f32] {
        self.data.as_slice()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Every vertex position found in float position attributes. Vertices that
    /// would read past the end of the data are skipped.
    pub fn positions(&self) -> Vec<Vec3> {
        let mut positions = Vec::with_capacity(self.count as usize);
        for attrib in self
            .decl
            .iter()
            .filter(|a| a.index == VertexAttribute::Position && a.kind == AttributeType::Float)
        {
            let stride = attrib.float_stride();
            for v in 0..self.count as usize {
                let i = attrib.offset as usize + v * stride;
                if let Some(p) = self.data.get(i..i + 3) {
                    positions.push(Vec3::new(p[0], p[1], p[2]));
                }
            }
        }
        positions
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexBuffer {
    indices: Vec<u32>,
}

impl IndexBuffer {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    pub fn indices(&self) -> &[u32] {
        self.indices.as_slice()
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
