//! Emitter-hosted effects: particle systems and lens flares

use serde::{Deserialize, Serialize};
use void_core::Handle;

use crate::node::NodeHandle;
use crate::provenance::Provenance;
use crate::texture::TextureHandle;

pub type ParticleSystemHandle = Handle<ParticleSystem>;
pub type LensFlareSystemHandle = Handle<LensFlareSystem>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlendMode {
    #[default]
    OneOne,
    Standard,
}

/// Portable particle emission parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticleSettings {
    pub capacity: u32,
    pub emit_rate: f32,
    pub min_life_time: f32,
    pub max_life_time: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub min_emit_power: f32,
    pub max_emit_power: f32,
    pub update_speed: f32,
    pub gravity: [f32; 3],
    pub direction1: [f32; 3],
    pub direction2: [f32; 3],
    pub min_emit_box: [f32; 3],
    pub max_emit_box: [f32; 3],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub color_dead: [f32; 4],
    pub blend_mode: BlendMode,
    /// 0 means the system never stops on its own
    pub target_stop_duration: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            capacity: 1000,
            emit_rate: 10.0,
            min_life_time: 1.0,
            max_life_time: 1.0,
            min_size: 1.0,
            max_size: 1.0,
            min_emit_power: 1.0,
            max_emit_power: 1.0,
            update_speed: 0.01,
            gravity: [0.0, 0.0, 0.0],
            direction1: [0.0, 1.0, 0.0],
            direction2: [0.0, 1.0, 0.0],
            min_emit_box: [-0.5, -0.5, -0.5],
            max_emit_box: [0.5, 0.5, 0.5],
            color1: [1.0, 1.0, 1.0, 1.0],
            color2: [1.0, 1.0, 1.0, 1.0],
            color_dead: [0.0, 0.0, 0.0, 1.0],
            blend_mode: BlendMode::OneOne,
            target_stop_duration: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParticleSystem {
    pub id: String,
    pub name: String,
    pub emitter: NodeHandle,
    pub texture: Option<TextureHandle>,
    pub settings: ParticleSettings,
    pub provenance: Provenance,
}

impl ParticleSystem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, emitter: NodeHandle) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emitter,
            texture: None,
            settings: ParticleSettings::default(),
            provenance: Provenance::Native,
        }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

/// One flare of a lens flare system
#[derive(Clone, Debug, PartialEq)]
pub struct LensFlare {
    pub size: f32,
    /// Position along the flare axis, 0 at the emitter
    pub position: f32,
    pub color: [f32; 3],
    pub texture: Option<TextureHandle>,
}

impl LensFlare {
    pub fn new(size: f32, position: f32, color: [f32; 3]) -> Self {
        Self {
            size,
            position,
            color,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.texture = Some(texture);
        self
    }
}

#[derive(Clone, Debug)]
pub struct LensFlareSystem {
    pub id: String,
    pub name: String,
    pub emitter: NodeHandle,
    pub border_limit: f32,
    pub flares: Vec<LensFlare>,
    pub provenance: Provenance,
}

impl LensFlareSystem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, emitter: NodeHandle) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emitter,
            border_limit: 300.0,
            flares: Vec::new(),
            provenance: Provenance::Native,
        }
    }

    pub fn with_flare(mut self, flare: LensFlare) -> Self {
        self.flares.push(flare);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
