//! Serialized shapes of encoded entity state.
//!
//! These mirror the live types but carry names and ids where the live
//! types carry handles. Everything is camelCase JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::animation::{AnimationDataType, AnimationKey, LoopMode};
use crate::audio::SoundSettings;
use crate::effects::ParticleSettings;
use crate::geometry::Geometry;
use crate::node::{CameraData, LightData, MeshSettings, Transform};
use crate::rendering::{RenderTargetKind, RenderTargetSettings, ShadowSettings};
use crate::value::PropertyValue;

fn default_true() -> bool {
    true
}

/// Header shared by every node kind
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraData>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_id: Option<String>,
    #[serde(default)]
    pub settings: MeshSettings,
}

/// Mesh payload: geometry sub-records precede the mesh they feed
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshPayload {
    #[serde(default)]
    pub geometries: Vec<Geometry>,
    pub mesh: NodeState,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureSlotState {
    pub name: String,
    #[serde(default = "one")]
    pub level: f32,
    #[serde(default)]
    pub has_alpha: bool,
    #[serde(default = "one")]
    pub u_scale: f32,
    #[serde(default = "one")]
    pub v_scale: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialState {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub textures: BTreeMap<String, TextureSlotState>,
    /// Sub-material names by submesh index, multi-materials only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_materials: Vec<Option<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundState {
    pub name: String,
    #[serde(default)]
    pub settings: SoundSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleSystemState {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub settings: ParticleSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LensFlareState {
    pub size: f32,
    pub position: f32,
    pub color: [f32; 3],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LensFlareSystemState {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub border_limit: f32,
    #[serde(default)]
    pub flares: Vec<LensFlareState>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowCasterState {
    #[serde(default)]
    pub settings: ShadowSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTargetState {
    pub id: String,
    pub name: String,
    pub kind: RenderTargetKind,
    #[serde(default)]
    pub settings: RenderTargetSettings,
    /// Name under which materials find the rendered texture
    pub texture_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    pub name: String,
    pub target_property: String,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
    pub data_type: AnimationDataType,
    #[serde(default)]
    pub loop_mode: LoopMode,
    #[serde(default)]
    pub keys: Vec<AnimationKey>,
}

fn default_frame_rate() -> f32 {
    60.0
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcessState {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub settings: BTreeMap<String, PropertyValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    pub name: String,
    /// Required; a container without a kind cannot be instantiated
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}
