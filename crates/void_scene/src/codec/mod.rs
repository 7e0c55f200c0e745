//! Entity codec registry
//!
//! Encodes live scene objects to self-describing JSON state and creates
//! objects back from it. Codecs only handle an object's intrinsic state:
//! links to other objects (parents, emitters, render lists, material
//! assignment) are resolved by the caller, which knows how the document
//! addresses them.
//!
//! Everything a codec decodes is tagged [`Provenance::Overlay`].

mod material;
mod state;

pub use material::{MaterialCodec, MaterialDecodeContext, MultiMaterialCodec, PropertyMaterialCodec};
pub use state::*;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::animation::{ActionGraph, AnimationTrack};
use crate::audio::{Sound, SoundHandle};
use crate::effects::{
    LensFlare, LensFlareSystem, LensFlareSystemHandle, ParticleSystem, ParticleSystemHandle,
};
use crate::geometry::{Geometry, GeometryHandle};
use crate::material::{MaterialHandle, MaterialKind};
use crate::node::{InstanceData, MeshData, Node, NodeHandle, NodeKind, NodeKindTag};
use crate::overlay2d::{Container2D, ContainerHandle};
use crate::post_process::{PostProcess, PostProcessHandle};
use crate::provenance::Provenance;
use crate::rendering::{
    RenderTarget, RenderTargetHandle, RenderTargetKind, ShadowCaster, ShadowCasterHandle,
};
use crate::scene::Scene;
use crate::texture::{Texture, TextureHandle, TextureKind};

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    /// State does not have the expected shape
    #[error("Malformed {entity} state: {source}")]
    Malformed {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A required field is absent
    #[error("Missing '{field}' in {entity} state")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// No codec is registered for a material kind
    #[error("No codec registered for material kind '{0}'")]
    UnknownMaterialKind(MaterialKind),

    /// Node kind cannot be decoded through this entry point
    #[error("Cannot decode node of kind {0:?} here")]
    UnsupportedNodeKind(NodeKindTag),

    /// Handle points at nothing in the scene being encoded
    #[error("Dangling {0} handle")]
    DanglingHandle(&'static str),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

fn encode_state<T: Serialize>(entity: &'static str, state: &T) -> Result<Value> {
    serde_json::to_value(state).map_err(|source| CodecError::Malformed { entity, source })
}

fn decode_state<T: DeserializeOwned>(entity: &'static str, state: &Value) -> Result<T> {
    T::deserialize(state).map_err(|source| CodecError::Malformed { entity, source })
}

fn texture_kind_for(kind: RenderTargetKind) -> TextureKind {
    match kind {
        RenderTargetKind::Custom => TextureKind::RenderTarget,
        RenderTargetKind::Mirror => TextureKind::Mirror,
        RenderTargetKind::ReflectionProbe => TextureKind::ReflectionProbe,
    }
}

/// Per-entity-type encode/decode capability
pub struct CodecRegistry {
    default_material: Box<dyn MaterialCodec>,
    materials: BTreeMap<String, Box<dyn MaterialCodec>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("material_kinds", &self.material_kinds())
            .finish()
    }
}

impl CodecRegistry {
    /// Registry with the built-in material kinds
    pub fn new() -> Self {
        let mut registry = Self {
            default_material: Box::new(PropertyMaterialCodec::standard()),
            materials: BTreeMap::new(),
        };
        registry.register_material_codec(Box::new(PropertyMaterialCodec::new(MaterialKind::Pbr)));
        registry.register_material_codec(Box::new(MultiMaterialCodec));
        registry
    }

    /// Register (or replace) the codec for its kind
    pub fn register_material_codec(&mut self, codec: Box<dyn MaterialCodec>) {
        let kind = codec.kind();
        if kind.is_default() {
            self.default_material = codec;
        } else {
            log::debug!("Registered material codec '{}'", kind);
            self.materials.insert(kind.name().to_string(), codec);
        }
    }

    pub fn material_codec(&self, kind: &MaterialKind) -> Option<&dyn MaterialCodec> {
        if kind.is_default() {
            return Some(self.default_material.as_ref());
        }
        self.materials.get(kind.name()).map(|c| c.as_ref())
    }

    pub fn default_material_codec(&self) -> &dyn MaterialCodec {
        self.default_material.as_ref()
    }

    /// Kinds with a registered codec, default kind first
    pub fn material_kinds(&self) -> Vec<MaterialKind> {
        let mut kinds = vec![self.default_material.kind()];
        kinds.extend(self.materials.values().map(|c| c.kind()));
        kinds
    }

    // ---- nodes ----

    /// Encode a node. Meshes produce `{"geometries": [...], "mesh": {...}}`.
    pub fn encode_node(&self, scene: &Scene, handle: NodeHandle) -> Result<Value> {
        let node = scene.node(handle).ok_or(CodecError::DanglingHandle("node"))?;
        let mut state = NodeState {
            id: node.id.clone(),
            name: node.name.clone(),
            enabled: node.enabled,
            transform: node.transform,
            mesh: None,
            light: None,
            camera: None,
        };
        match &node.kind {
            NodeKind::Mesh(mesh) => {
                let mut geometries = Vec::new();
                let mut geometry_id = None;
                if let Some(geometry) = mesh.geometry {
                    let geometry = scene
                        .geometry(geometry)
                        .ok_or(CodecError::DanglingHandle("geometry"))?;
                    geometry_id = Some(geometry.id.clone());
                    geometries.push(geometry.clone());
                }
                state.mesh = Some(MeshState {
                    geometry_id,
                    settings: mesh.settings.clone(),
                });
                encode_state("mesh", &MeshPayload { geometries, mesh: state })
            }
            NodeKind::InstancedMesh(_) => encode_state("instance", &state),
            NodeKind::Light(light) => {
                state.light = Some(light.clone());
                encode_state("light", &state)
            }
            NodeKind::Camera(camera) => {
                state.camera = Some(camera.clone());
                encode_state("camera", &state)
            }
        }
    }

    /// Create a mesh, light or camera from encoded state
    pub fn decode_node(
        &self,
        scene: &mut Scene,
        kind: NodeKindTag,
        state: &Value,
    ) -> Result<NodeHandle> {
        let (state, node_kind) = match kind {
            NodeKindTag::Mesh => {
                let payload: MeshPayload = decode_state("mesh", state)?;
                for geometry in &payload.geometries {
                    self.decode_geometry(scene, geometry);
                }
                let mesh_state = payload.mesh.mesh.clone().unwrap_or_default();
                let geometry = match &mesh_state.geometry_id {
                    Some(id) => {
                        let found = scene.find_geometry_by_id(id);
                        if found.is_none() {
                            log::warn!("Mesh '{}': geometry '{}' not found", payload.mesh.name, id);
                        }
                        found
                    }
                    None => None,
                };
                let kind = NodeKind::Mesh(MeshData {
                    geometry,
                    material: None,
                    settings: mesh_state.settings,
                });
                (payload.mesh, kind)
            }
            NodeKindTag::Light => {
                let state: NodeState = decode_state("light", state)?;
                let light = state.light.clone().ok_or(CodecError::MissingField {
                    entity: "light",
                    field: "light",
                })?;
                (state, NodeKind::Light(light))
            }
            NodeKindTag::Camera => {
                let state: NodeState = decode_state("camera", state)?;
                let camera = state.camera.clone().ok_or(CodecError::MissingField {
                    entity: "camera",
                    field: "camera",
                })?;
                (state, NodeKind::Camera(camera))
            }
            NodeKindTag::InstancedMesh => return Err(CodecError::UnsupportedNodeKind(kind)),
        };
        Ok(scene.add_node(Self::node_from_state(state, node_kind)))
    }

    /// Create an instance of `source` from encoded state
    pub fn decode_instance(
        &self,
        scene: &mut Scene,
        state: &Value,
        source: NodeHandle,
    ) -> Result<NodeHandle> {
        let state: NodeState = decode_state("instance", state)?;
        let node = Self::node_from_state(state, NodeKind::InstancedMesh(InstanceData { source }));
        Ok(scene.add_node(node))
    }

    fn node_from_state(state: NodeState, kind: NodeKind) -> Node {
        let mut node = Node::new(state.id, state.name, kind)
            .with_transform(state.transform)
            .with_provenance(Provenance::Overlay);
        node.enabled = state.enabled;
        node
    }

    /// Geometry ids are shared; an existing geometry with the same id wins
    fn decode_geometry(&self, scene: &mut Scene, geometry: &Geometry) -> GeometryHandle {
        match scene.find_geometry_by_id(&geometry.id) {
            Some(existing) => existing,
            None => scene.add_geometry(geometry.clone()),
        }
    }

    // ---- materials ----

    pub fn encode_material(&self, scene: &Scene, handle: MaterialHandle) -> Result<Value> {
        let material = scene
            .material(handle)
            .ok_or(CodecError::DanglingHandle("material"))?;
        let codec = self
            .material_codec(&material.kind)
            .ok_or_else(|| CodecError::UnknownMaterialKind(material.kind.clone()))?;
        codec.encode(scene, material)
    }

    /// Decode a material, falling back to the default kind when no codec
    /// handles the recorded one
    pub fn decode_material(
        &self,
        scene: &mut Scene,
        state: &Value,
        context: MaterialDecodeContext<'_>,
    ) -> Result<MaterialHandle> {
        let kind = MaterialKind::from_name(state.get("kind").and_then(Value::as_str).unwrap_or(""));
        let codec = match self.material_codec(&kind) {
            Some(codec) => codec,
            None => {
                log::warn!(
                    "No codec for material kind '{}', falling back to '{}'",
                    kind,
                    self.default_material.kind()
                );
                self.default_material.as_ref()
            }
        };
        codec.decode(scene, state, context)
    }

    // ---- sounds ----

    pub fn encode_sound(&self, sound: &Sound) -> Result<Value> {
        encode_state(
            "sound",
            &SoundState {
                name: sound.name.clone(),
                settings: sound.settings.clone(),
            },
        )
    }

    pub fn decode_sound(
        &self,
        scene: &mut Scene,
        state: &Value,
        buffer: Option<Vec<u8>>,
    ) -> Result<SoundHandle> {
        let state: SoundState = decode_state("sound", state)?;
        let mut sound = Sound::new(state.name).with_provenance(Provenance::Overlay);
        sound.settings = state.settings;
        sound.buffer = buffer;
        Ok(scene.add_sound(sound))
    }

    // ---- emitter-hosted effects ----

    pub fn encode_particle_system(&self, system: &ParticleSystem) -> Result<Value> {
        encode_state(
            "particle system",
            &ParticleSystemState {
                id: system.id.clone(),
                name: system.name.clone(),
                settings: system.settings.clone(),
            },
        )
    }

    pub fn decode_particle_system(
        &self,
        scene: &mut Scene,
        state: &Value,
        emitter: NodeHandle,
        texture: Option<TextureHandle>,
    ) -> Result<ParticleSystemHandle> {
        let state: ParticleSystemState = decode_state("particle system", state)?;
        let mut system = ParticleSystem::new(state.id, state.name, emitter)
            .with_provenance(Provenance::Overlay);
        system.settings = state.settings;
        system.texture = texture;
        Ok(scene.add_particle_system(system))
    }

    pub fn encode_lens_flare_system(&self, system: &LensFlareSystem) -> Result<Value> {
        encode_state(
            "lens flare system",
            &LensFlareSystemState {
                id: system.id.clone(),
                name: system.name.clone(),
                border_limit: system.border_limit,
                flares: system
                    .flares
                    .iter()
                    .map(|f| LensFlareState {
                        size: f.size,
                        position: f.position,
                        color: f.color,
                    })
                    .collect(),
            },
        )
    }

    /// `textures` is index-aligned with the encoded flares
    pub fn decode_lens_flare_system(
        &self,
        scene: &mut Scene,
        state: &Value,
        emitter: NodeHandle,
        textures: &[Option<TextureHandle>],
    ) -> Result<LensFlareSystemHandle> {
        let state: LensFlareSystemState = decode_state("lens flare system", state)?;
        let mut system = LensFlareSystem::new(state.id, state.name, emitter)
            .with_provenance(Provenance::Overlay);
        system.border_limit = state.border_limit;
        for (index, flare) in state.flares.into_iter().enumerate() {
            let mut lens_flare = LensFlare::new(flare.size, flare.position, flare.color);
            lens_flare.texture = textures.get(index).copied().flatten();
            system.flares.push(lens_flare);
        }
        Ok(scene.add_lens_flare_system(system))
    }

    // ---- offscreen rendering ----

    pub fn encode_shadow_caster(&self, caster: &ShadowCaster) -> Result<Value> {
        encode_state(
            "shadow caster",
            &ShadowCasterState {
                settings: caster.settings.clone(),
            },
        )
    }

    /// Render list is left empty for the caller to fill
    pub fn decode_shadow_caster(
        &self,
        scene: &mut Scene,
        state: &Value,
        light: NodeHandle,
    ) -> Result<ShadowCasterHandle> {
        let state: ShadowCasterState = decode_state("shadow caster", state)?;
        let mut caster = ShadowCaster::new(light).with_provenance(Provenance::Overlay);
        caster.settings = state.settings;
        Ok(scene.add_shadow_caster(caster))
    }

    pub fn encode_render_target(&self, scene: &Scene, target: &RenderTarget) -> Result<Value> {
        let texture = scene
            .texture(target.texture)
            .ok_or(CodecError::DanglingHandle("render target texture"))?;
        encode_state(
            "render target",
            &RenderTargetState {
                id: target.id.clone(),
                name: target.name.clone(),
                kind: target.kind,
                settings: target.settings.clone(),
                texture_name: texture.name.clone(),
            },
        )
    }

    /// Creates the render target and the texture it renders into
    pub fn decode_render_target(
        &self,
        scene: &mut Scene,
        state: &Value,
    ) -> Result<RenderTargetHandle> {
        let state: RenderTargetState = decode_state("render target", state)?;
        let texture = scene.add_texture(
            Texture::render_target(state.texture_name, texture_kind_for(state.kind))
                .with_provenance(Provenance::Overlay),
        );
        let mut target = RenderTarget::new(state.id, state.name, state.kind, texture)
            .with_provenance(Provenance::Overlay);
        target.settings = state.settings;
        Ok(scene.add_render_target(target))
    }

    // ---- behaviors ----

    /// Encode a track's keys; events are carried separately
    pub fn encode_animation(&self, track: &AnimationTrack) -> Result<Value> {
        encode_state(
            "animation",
            &AnimationState {
                name: track.name.clone(),
                target_property: track.target_property.clone(),
                frame_rate: track.frame_rate,
                data_type: track.data_type,
                loop_mode: track.loop_mode,
                keys: track.keys.clone(),
            },
        )
    }

    pub fn decode_animation(&self, state: &Value) -> Result<AnimationTrack> {
        let state: AnimationState = decode_state("animation", state)?;
        let mut track = AnimationTrack::new(state.name, state.target_property, state.data_type)
            .with_provenance(Provenance::Overlay);
        track.frame_rate = state.frame_rate;
        track.loop_mode = state.loop_mode;
        track.keys = state.keys;
        Ok(track)
    }

    pub fn encode_action_graph(&self, graph: &ActionGraph) -> Value {
        graph.definition.clone()
    }

    pub fn decode_action_graph(&self, state: &Value) -> ActionGraph {
        ActionGraph::new(state.clone()).with_provenance(Provenance::Overlay)
    }

    // ---- post-processes and 2D ----

    pub fn encode_post_process(&self, post_process: &PostProcess) -> Result<Value> {
        encode_state(
            "post-process",
            &PostProcessState {
                name: post_process.name.clone(),
                kind: post_process.kind.clone(),
                settings: post_process.settings.clone(),
            },
        )
    }

    /// Created attached; the caller detaches it if requested
    pub fn decode_post_process(
        &self,
        scene: &mut Scene,
        state: &Value,
    ) -> Result<PostProcessHandle> {
        let state: PostProcessState = decode_state("post-process", state)?;
        let mut post_process =
            PostProcess::new(state.name, state.kind).with_provenance(Provenance::Overlay);
        post_process.settings = state.settings;
        Ok(scene.add_post_process(post_process))
    }

    pub fn encode_container(&self, container: &Container2D) -> Result<Value> {
        encode_state(
            "2D container",
            &ContainerState {
                name: container.name.clone(),
                kind: Some(container.kind.clone()),
                properties: container.properties.clone(),
            },
        )
    }

    /// Parent is left unset for the caller to link by name
    pub fn decode_container(&self, scene: &mut Scene, state: &Value) -> Result<ContainerHandle> {
        let state: ContainerState = decode_state("2D container", state)?;
        let kind = state.kind.ok_or(CodecError::MissingField {
            entity: "2D container",
            field: "kind",
        })?;
        let mut container = Container2D::new(state.name, kind).with_provenance(Provenance::Overlay);
        container.properties = state.properties;
        Ok(scene.add_container(container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationDataType;
    use crate::node::{LightData, LightKind};
    use serde_json::json;

    #[test]
    fn test_mesh_payload_shape_and_geometry_reuse() {
        let mut scene = Scene::new("test");
        let geometry = scene.add_geometry(Geometry::quad("geo-1"));
        let mesh = scene.add_node(
            Node::mesh("mesh-1", "floor")
                .with_geometry(geometry)
                .with_position([1.0, 2.0, 3.0]),
        );

        let registry = CodecRegistry::new();
        let state = registry.encode_node(&scene, mesh).unwrap();
        assert_eq!(state["geometries"][0]["id"], "geo-1");
        assert_eq!(state["mesh"]["mesh"]["geometryId"], "geo-1");

        let mut target = Scene::new("target");
        let existing = target.add_geometry(Geometry::quad("geo-1"));
        let handle = registry.decode_node(&mut target, NodeKindTag::Mesh, &state).unwrap();
        let node = target.node(handle).unwrap();
        assert_eq!(node.id, "mesh-1");
        assert_eq!(node.transform.position, [1.0, 2.0, 3.0]);
        assert_eq!(node.provenance, Provenance::Overlay);
        assert_eq!(node.as_mesh().unwrap().geometry, Some(existing));
    }

    #[test]
    fn test_light_round_trip() {
        let mut scene = Scene::new("test");
        let data = LightData {
            kind: LightKind::Directional { direction: [0.0, -1.0, 0.0] },
            ..Default::default()
        };
        let light = scene.add_node(Node::light("light-1", "sun", data.clone()));

        let registry = CodecRegistry::new();
        let state = registry.encode_node(&scene, light).unwrap();
        let mut target = Scene::new("target");
        let handle = registry.decode_node(&mut target, NodeKindTag::Light, &state).unwrap();
        assert_eq!(target.node(handle).unwrap().kind, NodeKind::Light(data));
    }

    #[test]
    fn test_unknown_material_kind_falls_back_to_default() {
        let registry = CodecRegistry::new();
        let mut scene = Scene::new("test");
        let textures = BTreeMap::new();
        let materials = BTreeMap::new();
        let state = json!({
            "id": "m1",
            "name": "lava",
            "kind": "lava",
            "properties": {"speed": 2.0}
        });

        let handle = registry
            .decode_material(
                &mut scene,
                &state,
                MaterialDecodeContext {
                    textures: &textures,
                    materials: &materials,
                },
            )
            .unwrap();
        let material = scene.material(handle).unwrap();
        assert_eq!(material.kind, MaterialKind::Standard);
        assert_eq!(material.properties["speed"].as_number(), Some(2.0));
    }

    #[test]
    fn test_custom_codec_registration() {
        let mut registry = CodecRegistry::new();
        let water = MaterialKind::Custom("water".into());
        assert!(registry.material_codec(&water).is_none());

        registry.register_material_codec(Box::new(PropertyMaterialCodec::new(water.clone())));
        assert!(registry.material_codec(&water).is_some());
        assert!(registry.material_kinds().contains(&water));
    }

    #[test]
    fn test_container_requires_kind() {
        let registry = CodecRegistry::new();
        let mut scene = Scene::new("test");
        let result = registry.decode_container(&mut scene, &json!({"name": "hud"}));
        assert!(matches!(result, Err(CodecError::MissingField { field: "kind", .. })));
    }

    #[test]
    fn test_animation_events_not_encoded() {
        let registry = CodecRegistry::new();
        let track = AnimationTrack::new("bob", "position.y", AnimationDataType::Float)
            .with_key(0.0, 0.0f32)
            .with_key(30.0, 1.0f32)
            .with_event(15.0, "halfway");
        let state = registry.encode_animation(&track).unwrap();
        assert!(state.get("events").is_none());

        let decoded = registry.decode_animation(&state).unwrap();
        assert_eq!(decoded.keys, track.keys);
        assert!(decoded.events.is_empty());
    }

    #[test]
    fn test_render_target_creates_named_texture() {
        let registry = CodecRegistry::new();
        let mut scene = Scene::new("test");
        let state = json!({
            "id": "rt-1",
            "name": "probe",
            "kind": "reflectionProbe",
            "textureName": "probe-tex"
        });
        let handle = registry.decode_render_target(&mut scene, &state).unwrap();

        assert!(scene.render_target(handle).unwrap().is_probe());
        let texture = scene.find_texture_by_name("probe-tex").unwrap();
        assert_eq!(scene.texture(texture).unwrap().kind, TextureKind::ReflectionProbe);
    }
}
