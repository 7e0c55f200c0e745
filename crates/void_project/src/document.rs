//! Project document model
//!
//! The serialized overlay: everything the user added to or changed in a
//! base scene. Every list defaults to empty so documents written by older
//! editors, which lack some sections, still parse.
//!
//! Cross-references are [`EntityReference`]s: by id for objects the
//! document itself creates, by name for objects of the base scene.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use void_scene::AutoStartKind;

/// Document format written by this version
pub const FORMAT_VERSION: u32 = 1;

fn default_format_version() -> u32 {
    FORMAT_VERSION
}

/// Reference from one record to an entity
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityReference {
    /// Entity created earlier in the same document
    ById(String),
    /// Entity of the base scene
    ByName(String),
}

impl EntityReference {
    /// The id or name, whichever this is
    pub fn key(&self) -> &str {
        match self {
            EntityReference::ById(id) => id,
            EntityReference::ByName(name) => name,
        }
    }
}

impl std::fmt::Display for EntityReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityReference::ById(id) => write!(f, "id '{}'", id),
            EntityReference::ByName(name) => write!(f, "name '{}'", name),
        }
    }
}

/// Record kinds in `nodes[]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Scene,
    Mesh,
    Light,
    Camera,
    InstancedMesh,
    Sound,
}

/// Id of the scene singleton record
pub const SCENE_RECORD_ID: &str = "Scene";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureRecord {
    pub slot: String,
    pub texture_name: String,
    pub texture_buffer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    #[serde(default)]
    pub mesh_names: Vec<String>,
    /// False for sub-material slots of a multi-material
    #[serde(default = "default_true")]
    pub is_new_instance: bool,
    pub encoded_state: Value,
    #[serde(default)]
    pub textures: Vec<TextureRecord>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleSystemRecord {
    pub encoded_state: Value,
    pub emitter: EntityReference,
    #[serde(default = "default_true")]
    pub has_emitter: bool,
    /// Where to put the synthesized emitter when `has_emitter` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitter_position: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_buffer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlareTextureRecord {
    pub flare_name: String,
    pub flare_buffer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LensFlareSystemRecord {
    pub encoded_state: Value,
    pub emitter: EntityReference,
    /// Index-aligned with the encoded flares
    #[serde(default)]
    pub flares: Vec<Option<FlareTextureRecord>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowCasterRecord {
    pub encoded_state: Value,
    pub light: EntityReference,
    #[serde(default)]
    pub render_list: Vec<EntityReference>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTargetRecord {
    #[serde(default)]
    pub is_probe: bool,
    pub encoded_state: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_mesh: Option<EntityReference>,
    #[serde(default)]
    pub render_list: Vec<EntityReference>,
}

/// Events of one track sharing a frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationEventGroup {
    pub frame: f32,
    pub events: Vec<AnimationEventRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationEventRecord {
    pub name: String,
    #[serde(default)]
    pub only_once: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationTrackRecord {
    pub encoded_state: Value,
    #[serde(default)]
    pub events: Vec<AnimationEventGroup>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsRecord {
    pub impostor: void_scene::ImpostorKind,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub name: String,
    /// `"Scene"` for the scene singleton, absent for sounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: EntityKind,
    /// Full encoded state, only for entities the document creates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntityReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mesh: Option<EntityReference>,
    /// Material of a created mesh, by name; may live in the base scene
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    #[serde(default)]
    pub animation_tracks: Vec<AnimationTrackRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_graph: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physics: Option<PhysicsRecord>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            id: None,
            kind,
            payload: None,
            parent: None,
            source_mesh: None,
            material_name: None,
            animation_tracks: Vec::new(),
            action_graph: None,
            physics: None,
        }
    }

    /// True when the record only carries deltas for an existing entity
    pub fn is_delta_only(&self) -> bool {
        self.payload.is_none()
    }

    pub fn has_deltas(&self) -> bool {
        !self.animation_tracks.is_empty() || self.action_graph.is_some() || self.physics.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundRecord {
    pub name: String,
    pub encoded_state: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_buffer: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcessRecord {
    pub encoded_state: Value,
    #[serde(default = "default_true")]
    pub attach: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container2DRecord {
    pub encoded_state: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoStartRecord {
    pub name: String,
    pub kind: AutoStartKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfiguration {
    pub global_animation_speed: f32,
    pub frames_per_second: f32,
    #[serde(default)]
    pub animated_at_launch: Vec<AutoStartRecord>,
}

impl Default for GlobalConfiguration {
    fn default() -> Self {
        Self {
            global_animation_speed: 1.0,
            frames_per_second: 60.0,
            animated_at_launch: Vec::new(),
        }
    }
}

/// Root of a project document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    #[serde(default)]
    pub global_configuration: GlobalConfiguration,
    #[serde(default)]
    pub materials: Vec<MaterialRecord>,
    #[serde(default)]
    pub particle_systems: Vec<ParticleSystemRecord>,
    #[serde(default)]
    pub nodes: Vec<EntityRecord>,
    #[serde(default)]
    pub shadow_casters: Vec<ShadowCasterRecord>,
    #[serde(default)]
    pub post_processes: Vec<PostProcessRecord>,
    #[serde(default)]
    pub lens_flare_systems: Vec<LensFlareSystemRecord>,
    #[serde(default)]
    pub render_targets: Vec<RenderTargetRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_graph: Option<Value>,
    #[serde(default)]
    pub physics_enabled: bool,
    #[serde(default)]
    pub sounds: Vec<SoundRecord>,
    #[serde(default, rename = "scene2D")]
    pub scene_2d: Vec<Container2DRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_material_kinds: Option<Vec<String>>,
    #[serde(default)]
    pub custom_metadata: BTreeMap<String, Value>,
}

impl Default for ProjectDocument {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            global_configuration: GlobalConfiguration::default(),
            materials: Vec::new(),
            particle_systems: Vec::new(),
            nodes: Vec::new(),
            shadow_casters: Vec::new(),
            post_processes: Vec::new(),
            lens_flare_systems: Vec::new(),
            render_targets: Vec::new(),
            action_graph: None,
            physics_enabled: false,
            sounds: Vec::new(),
            scene_2d: Vec::new(),
            requested_material_kinds: None,
            custom_metadata: BTreeMap::new(),
        }
    }
}

impl ProjectDocument {
    /// Parse document text. Any syntax or shape error is fatal.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        serde_json::from_str(text).map_err(crate::ProjectError::MalformedDocument)
    }

    /// Serialize with the given indentation
    pub fn to_json(&self, indent: &str) -> crate::Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)
            .map_err(crate::ProjectError::Serialize)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn find_node(&self, name: &str) -> Option<&EntityRecord> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn find_material(&self, name: &str) -> Option<&MaterialRecord> {
        self.materials
            .iter()
            .find(|m| m.encoded_state.get("name").and_then(Value::as_str) == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_default_to_empty() {
        let doc = ProjectDocument::from_json(r#"{"nodes": []}"#).unwrap();
        assert_eq!(doc.format_version, FORMAT_VERSION);
        assert!(doc.materials.is_empty());
        assert!(doc.scene_2d.is_empty());
        assert!(!doc.physics_enabled);
        assert_eq!(doc.global_configuration.frames_per_second, 60.0);
    }

    #[test]
    fn test_reference_encoding() {
        let json = serde_json::to_string(&EntityReference::ById("mesh-1".into())).unwrap();
        assert_eq!(json, r#"{"byId":"mesh-1"}"#);
        let back: EntityReference = serde_json::from_str(r#"{"byName":"ground"}"#).unwrap();
        assert_eq!(back, EntityReference::ByName("ground".into()));
    }

    #[test]
    fn test_tab_indentation() {
        let text = ProjectDocument::default().to_json("\t").unwrap();
        assert!(text.contains("\n\t\"formatVersion\": 1"));
        assert!(text.contains("\"scene2D\""));
    }

    #[test]
    fn test_malformed_text() {
        assert!(matches!(
            ProjectDocument::from_json("{\"nodes\": ["),
            Err(crate::ProjectError::MalformedDocument(_))
        ));
    }
}
