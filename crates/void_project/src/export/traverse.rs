//! Graph traverser
//!
//! Depth-first walk of the live scene: the scene singleton, then every
//! top-level node in creation order with its descendants, then sounds.
//! Emitter-hosted effects, materials and shadow casters are collected as
//! their owning node is visited, so records come out in a stable order.

use void_scene::{
    AnimationTrack, LensFlareSystemHandle, Node, NodeHandle, NodeKind, NodeKindTag,
    ParticleSystemHandle, Scene,
};

use super::builder::DocumentBuilder;
use crate::document::{
    AnimationEventGroup, AnimationEventRecord, AnimationTrackRecord, EntityKind, EntityRecord,
    EntityReference, FlareTextureRecord, LensFlareSystemRecord, ParticleSystemRecord,
    PhysicsRecord, ShadowCasterRecord, SCENE_RECORD_ID,
};
use crate::error::{ProjectError, Result};
use crate::provenance::{
    classify, persisted_action_graph, persisted_animations, persisted_physics, should_emit,
};

/// How a record points at `node`: overlay nodes by id, native by name
pub fn reference_for(scene: &Scene, node: NodeHandle) -> Option<EntityReference> {
    let node = scene.node(node)?;
    Some(if node.provenance.is_overlay() {
        EntityReference::ById(node.id.clone())
    } else {
        EntityReference::ByName(node.name.clone())
    })
}

fn entity_kind(tag: NodeKindTag) -> EntityKind {
    match tag {
        NodeKindTag::Mesh => EntityKind::Mesh,
        NodeKindTag::InstancedMesh => EntityKind::InstancedMesh,
        NodeKindTag::Light => EntityKind::Light,
        NodeKindTag::Camera => EntityKind::Camera,
    }
}

pub struct GraphTraverser<'s, 'b, 'c> {
    scene: &'s Scene,
    builder: &'b mut DocumentBuilder<'c>,
}

impl<'s, 'b, 'c> GraphTraverser<'s, 'b, 'c> {
    pub fn new(scene: &'s Scene, builder: &'b mut DocumentBuilder<'c>) -> Self {
        Self { scene, builder }
    }

    pub fn run(&mut self) -> Result<()> {
        self.visit_scene()?;
        for root in self.scene.root_nodes() {
            self.visit_node(root)?;
        }
        self.visit_sounds()
    }

    fn visit_scene(&mut self) -> Result<()> {
        if !should_emit(self.scene) {
            return Ok(());
        }
        let mut record = EntityRecord::new(self.scene.name.clone(), EntityKind::Scene);
        record.id = Some(SCENE_RECORD_ID.to_string());
        record.animation_tracks =
            self.encode_tracks(&self.scene.name, persisted_animations(self.scene))?;
        self.builder.document_mut().nodes.push(record);
        Ok(())
    }

    fn visit_node(&mut self, handle: NodeHandle) -> Result<()> {
        let scene = self.scene;
        let Some(node) = scene.node(handle) else {
            return Ok(());
        };
        // The editor camera itself is never written, its children are
        if scene.editor_camera == Some(handle) {
            for child in node.children() {
                self.visit_node(*child)?;
            }
            return Ok(());
        }

        for system in scene.particle_systems_for(handle) {
            self.collect_particle_system(system)?;
        }
        for system in scene.lens_flare_systems_for(handle) {
            self.collect_lens_flare_system(system)?;
        }

        if let Some(material) = node.as_mesh().and_then(|mesh| mesh.material) {
            // Sub-materials first so the multi-material finds them on load
            if let Some(multi) = scene.material(material) {
                for sub in multi.sub_materials.iter().flatten() {
                    self.builder.register_material(scene, *sub, None)?;
                }
            }
            self.builder
                .register_material(scene, material, Some(&node.name))?;
        }

        if should_emit(node) {
            let record = self.node_record(handle, node)?;
            self.builder.document_mut().nodes.push(record);
        }

        for child in node.children() {
            self.visit_node(*child)?;
        }

        if node.is_light() {
            self.collect_shadow_caster(handle)?;
        }
        Ok(())
    }

    fn node_record(&self, handle: NodeHandle, node: &Node) -> Result<EntityRecord> {
        let scene = self.scene;
        let provenance = classify(node);

        let mut record = EntityRecord::new(node.name.clone(), entity_kind(node.kind_tag()));
        record.id = Some(node.id.clone());

        // Placeholders are re-synthesized from their effect record
        if provenance.is_overlay() && !provenance.is_placeholder() {
            let payload = self
                .builder
                .codecs()
                .encode_node(scene, handle)
                .map_err(|source| ProjectError::Codec {
                    entity: "node",
                    name: node.name.clone(),
                    source,
                })?;
            record.payload = Some(payload);
            record.parent = node
                .parent()
                .filter(|p| scene.editor_camera != Some(*p))
                .and_then(|p| reference_for(scene, p));
            match &node.kind {
                NodeKind::InstancedMesh(instance) => {
                    record.source_mesh = reference_for(scene, instance.source);
                }
                NodeKind::Mesh(mesh) => {
                    record.material_name = mesh
                        .material
                        .and_then(|m| scene.material(m))
                        .map(|m| m.name.clone());
                }
                NodeKind::Light(_) | NodeKind::Camera(_) => {}
            }
        }

        record.animation_tracks = self.encode_tracks(&node.name, persisted_animations(node))?;
        record.action_graph = persisted_action_graph(node)
            .map(|graph| self.builder.codecs().encode_action_graph(graph));
        record.physics = persisted_physics(node).map(|impostor| PhysicsRecord {
            impostor: impostor.kind,
            mass: impostor.mass,
            friction: impostor.friction,
            restitution: impostor.restitution,
        });
        Ok(record)
    }

    fn encode_tracks(
        &self,
        owner: &str,
        tracks: Vec<&AnimationTrack>,
    ) -> Result<Vec<AnimationTrackRecord>> {
        let mut records = Vec::with_capacity(tracks.len());
        for track in tracks {
            let encoded_state = self
                .builder
                .codecs()
                .encode_animation(track)
                .map_err(|source| ProjectError::Codec {
                    entity: "animation",
                    name: format!("{}.{}", owner, track.name),
                    source,
                })?;

            let mut events: Vec<AnimationEventGroup> = Vec::new();
            for event in &track.events {
                let entry = AnimationEventRecord {
                    name: event.name.clone(),
                    only_once: event.only_once,
                };
                match events.iter_mut().find(|g| g.frame == event.frame) {
                    Some(group) => group.events.push(entry),
                    None => events.push(AnimationEventGroup {
                        frame: event.frame,
                        events: vec![entry],
                    }),
                }
            }
            records.push(AnimationTrackRecord {
                encoded_state,
                events,
            });
        }
        Ok(records)
    }

    fn collect_particle_system(&mut self, handle: ParticleSystemHandle) -> Result<()> {
        let scene = self.scene;
        let Some(system) = scene.particle_system(handle) else {
            return Ok(());
        };
        if !system.provenance.is_overlay() {
            return Ok(());
        }
        let Some(emitter) = scene.node(system.emitter) else {
            log::warn!("Particle system '{}' has no emitter, skipped", system.name);
            return Ok(());
        };
        let Some(emitter_ref) = reference_for(scene, system.emitter) else {
            return Ok(());
        };

        let encoded_state = self
            .builder
            .codecs()
            .encode_particle_system(system)
            .map_err(|source| ProjectError::Codec {
                entity: "particle system",
                name: system.name.clone(),
                source,
            })?;
        let has_emitter = !emitter.provenance.is_placeholder();
        let mut record = ParticleSystemRecord {
            encoded_state,
            emitter: emitter_ref,
            has_emitter,
            emitter_position: (!has_emitter).then_some(emitter.transform.position),
            texture_name: None,
            texture_buffer: None,
        };
        if let Some(texture) = system.texture.and_then(|t| scene.texture(t)) {
            record.texture_name = Some(texture.name.clone());
            record.texture_buffer = self
                .builder
                .inliner()
                .inline_texture(texture)
                .map(|asset| asset.buffer);
        }
        self.builder.document_mut().particle_systems.push(record);
        Ok(())
    }

    fn collect_lens_flare_system(&mut self, handle: LensFlareSystemHandle) -> Result<()> {
        let scene = self.scene;
        let Some(system) = scene.lens_flare_system(handle) else {
            return Ok(());
        };
        if !system.provenance.is_overlay() {
            return Ok(());
        }
        let Some(emitter) = reference_for(scene, system.emitter) else {
            log::warn!("Lens flare system '{}' has no emitter, skipped", system.name);
            return Ok(());
        };

        let encoded_state = self
            .builder
            .codecs()
            .encode_lens_flare_system(system)
            .map_err(|source| ProjectError::Codec {
                entity: "lens flare system",
                name: system.name.clone(),
                source,
            })?;
        let inliner = *self.builder.inliner();
        let flares = system
            .flares
            .iter()
            .map(|flare| {
                flare
                    .texture
                    .and_then(|t| scene.texture(t))
                    .and_then(|t| inliner.inline_texture(t))
                    .map(|asset| FlareTextureRecord {
                        flare_name: asset.name,
                        flare_buffer: asset.buffer,
                    })
            })
            .collect();
        self.builder
            .document_mut()
            .lens_flare_systems
            .push(LensFlareSystemRecord {
                encoded_state,
                emitter,
                flares,
            });
        Ok(())
    }

    fn collect_shadow_caster(&mut self, light: NodeHandle) -> Result<()> {
        let scene = self.scene;
        let Some(caster) = scene
            .shadow_caster_for_light(light)
            .and_then(|c| scene.shadow_caster(c))
        else {
            return Ok(());
        };
        if !caster.provenance.is_overlay() {
            return Ok(());
        }
        let Some(light_ref) = reference_for(scene, light) else {
            return Ok(());
        };

        let encoded_state = self
            .builder
            .codecs()
            .encode_shadow_caster(caster)
            .map_err(|source| ProjectError::Codec {
                entity: "shadow caster",
                name: light_ref.key().to_string(),
                source,
            })?;
        let render_list = caster
            .render_list
            .iter()
            .filter_map(|mesh| reference_for(scene, *mesh))
            .collect();
        self.builder
            .document_mut()
            .shadow_casters
            .push(ShadowCasterRecord {
                encoded_state,
                light: light_ref,
                render_list,
            });
        Ok(())
    }

    /// Sound records in `nodes[]` carry only animation tracks
    fn visit_sounds(&mut self) -> Result<()> {
        let scene = self.scene;
        for (_, sound) in scene.sounds() {
            if !should_emit(sound) {
                continue;
            }
            let tracks = persisted_animations(sound);
            if tracks.is_empty() {
                continue;
            }
            let mut record = EntityRecord::new(sound.name.clone(), EntityKind::Sound);
            record.animation_tracks = self.encode_tracks(&sound.name, tracks)?;
            self.builder.document_mut().nodes.push(record);
        }
        Ok(())
    }
}
