//! Offscreen rendering: shadow casters and render targets / probes
//!
//! Both own a render list of meshes. Render targets also own the texture
//! they render into, which materials reference by name.

use serde::{Deserialize, Serialize};
use void_core::Handle;

use crate::node::NodeHandle;
use crate::provenance::Provenance;
use crate::texture::TextureHandle;

pub type ShadowCasterHandle = Handle<ShadowCaster>;
pub type RenderTargetHandle = Handle<RenderTarget>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShadowFilter {
    #[default]
    None,
    Poisson,
    Exponential,
    BlurExponential,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub bias: f32,
    pub darkness: f32,
    pub filter: ShadowFilter,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 1024,
            bias: 0.00005,
            darkness: 0.0,
            filter: ShadowFilter::None,
        }
    }
}

/// Shadow map generator owned by a light
#[derive(Clone, Debug)]
pub struct ShadowCaster {
    pub light: NodeHandle,
    pub settings: ShadowSettings,
    pub render_list: Vec<NodeHandle>,
    pub provenance: Provenance,
}

impl ShadowCaster {
    pub fn new(light: NodeHandle) -> Self {
        Self {
            light,
            settings: ShadowSettings::default(),
            render_list: Vec::new(),
            provenance: Provenance::Native,
        }
    }

    pub fn with_render_list(mut self, render_list: Vec<NodeHandle>) -> Self {
        self.render_list = render_list;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderTargetKind {
    Custom,
    Mirror,
    ReflectionProbe,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderTargetSettings {
    pub size: u32,
    pub generate_mipmaps: bool,
    /// Render every n-th frame; 0 renders once
    pub refresh_rate: u32,
}

impl Default for RenderTargetSettings {
    fn default() -> Self {
        Self {
            size: 512,
            generate_mipmaps: true,
            refresh_rate: 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderTarget {
    pub id: String,
    pub name: String,
    pub kind: RenderTargetKind,
    pub settings: RenderTargetSettings,
    pub texture: TextureHandle,
    pub render_list: Vec<NodeHandle>,
    /// Probes follow the mesh they are attached to
    pub attached_mesh: Option<NodeHandle>,
    pub provenance: Provenance,
}

impl RenderTarget {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: RenderTargetKind,
        texture: TextureHandle,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            settings: RenderTargetSettings::default(),
            texture,
            render_list: Vec::new(),
            attached_mesh: None,
            provenance: Provenance::Native,
        }
    }

    pub fn is_probe(&self) -> bool {
        matches!(self.kind, RenderTargetKind::ReflectionProbe)
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
