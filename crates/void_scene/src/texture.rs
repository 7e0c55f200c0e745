//! Textures and their raw buffers
//!
//! Image textures keep the bytes they were created from so the project
//! exporter can embed them. Render-target textures have no buffer; they are
//! addressed by name instead.

use serde::{Deserialize, Serialize};
use void_core::Handle;

use crate::provenance::Provenance;

/// Handle to a [`Texture`] in a [`crate::Scene`]
pub type TextureHandle = Handle<Texture>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextureKind {
    Image,
    RenderTarget,
    Mirror,
    ReflectionProbe,
}

/// Sampling parameters, stored by the owner of the slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureSettings {
    pub level: f32,
    pub has_alpha: bool,
    pub u_scale: f32,
    pub v_scale: f32,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            level: 1.0,
            has_alpha: false,
            u_scale: 1.0,
            v_scale: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Texture {
    pub name: String,
    pub kind: TextureKind,
    pub settings: TextureSettings,
    /// Encoded image bytes exactly as loaded (png, jpeg, ...)
    pub buffer: Option<Vec<u8>>,
    pub provenance: Provenance,
}

impl Texture {
    pub fn image(name: impl Into<String>, buffer: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            kind: TextureKind::Image,
            settings: TextureSettings::default(),
            buffer: Some(buffer),
            provenance: Provenance::Native,
        }
    }

    pub fn render_target(name: impl Into<String>, kind: TextureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            settings: TextureSettings::default(),
            buffer: None,
            provenance: Provenance::Native,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
