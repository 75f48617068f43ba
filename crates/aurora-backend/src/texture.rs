use crate::TxiFeatures;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureMode {
    Diffuse,
    EnvironmentMapReflective,
}

/// A loaded texture as far as the scene graph is concerned: its name, whether
/// the image carries an alpha channel and the features of its TXI sidecar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture {
    name: String,
    has_alpha: bool,
    txi: TxiFeatures,
}

pub type TextureHandle = Arc<Texture>;

impl Texture {
    pub fn new<T: Into<String>>(name: T, has_alpha: bool, txi: TxiFeatures) -> Self {
        Self {
            name: name.into(),
            has_alpha,
            txi,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn txi(&self) -> &TxiFeatures {
        &self.txi
    }

    /// Whether blending against this texture can show what is behind it. An
    /// alpha channel whose TXI reports a mean of exactly 1.0 is opaque.
    pub fn is_translucent(&self) -> bool {
        self.has_alpha && self.txi.alpha_mean != Some(1.0)
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture \"{0}\" does not exist")]
    NotFound(String),
    #[error("could not decode texture \"{name}\": {reason}")]
    Decode { name: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait TextureManager {
    fn get(&self, name: &str) -> Result<TextureHandle, TextureError>;
}
