//! Phased document reconstruction
//!
//! Entities are created in dependency order: resources first, then nodes,
//! then the effects hosted by nodes. Links between entities are queued as
//! they are discovered and applied once every identifier is known.

use std::collections::BTreeMap;

use serde_json::Value;

use void_scene::{
    AnimationEvent, AnimationTrack, AutoStart, AutoStartKind, CodecRegistry, MaterialDecodeContext,
    Node, NodeHandle, NodeKindTag, PhysicsImpostor, Provenance, Scene, TextureHandle,
};

use super::ImportReport;
use crate::document::{
    AnimationTrackRecord, Container2DRecord, EntityKind, EntityRecord, EntityReference,
    GlobalConfiguration, LensFlareSystemRecord, MaterialRecord, ParticleSystemRecord,
    PhysicsRecord, PostProcessRecord, ProjectDocument, RenderTargetRecord, ShadowCasterRecord,
    SoundRecord,
};
use crate::extension::ExtensionRegistry;
use crate::inline::{AssetInliner, InlinedAsset};
use crate::resolve::{DanglingReference, LinkKind, LinkQueue, PendingLink, ReferenceResolver};

pub(crate) struct Reconstructor<'s, 'c> {
    scene: &'s mut Scene,
    codecs: &'c CodecRegistry,
    inliner: AssetInliner,
    resolver: ReferenceResolver,
    links: LinkQueue,
    report: ImportReport,
}

impl<'s, 'c> Reconstructor<'s, 'c> {
    pub fn new(
        scene: &'s mut Scene,
        codecs: &'c CodecRegistry,
        inliner: AssetInliner,
        resolver: ReferenceResolver,
    ) -> Self {
        Self {
            scene,
            codecs,
            inliner,
            resolver,
            links: LinkQueue::new(),
            report: ImportReport::default(),
        }
    }

    /// Run every phase in order and hand back the report
    pub fn run(
        mut self,
        document: &ProjectDocument,
        extensions: Option<&ExtensionRegistry>,
    ) -> ImportReport {
        self.report.format_version = document.format_version;

        for record in &document.render_targets {
            self.import_render_target(record);
        }
        for record in &document.materials {
            self.import_material(record);
        }
        for record in &document.sounds {
            self.import_sound(record);
        }
        for record in &document.nodes {
            self.import_entity(record, document);
        }
        for record in &document.particle_systems {
            self.import_particle_system(record);
        }
        for record in &document.lens_flare_systems {
            self.import_lens_flare_system(record);
        }
        for record in &document.shadow_casters {
            self.import_shadow_caster(record);
        }
        if let Some(graph) = &document.action_graph {
            self.scene.action_graph = Some(self.codecs.decode_action_graph(graph));
        }
        self.apply_global_configuration(&document.global_configuration);
        for record in &document.post_processes {
            self.import_post_process(record);
        }

        log::debug!(
            "Resolving {} queued links against {} base nodes",
            self.links.len(),
            self.resolver.base().node_count()
        );
        self.flush(&[
            LinkKind::Parent,
            LinkKind::RenderListEntry,
            LinkKind::ProbeAttachment,
        ]);
        self.flush(&[LinkKind::MaterialAssignment]);

        match extensions {
            Some(extensions) => extensions.load_metadata(self.scene, &document.custom_metadata),
            None => {
                for (key, blob) in &document.custom_metadata {
                    self.scene.custom_metadata.insert(key.clone(), blob.clone());
                }
            }
        }

        for record in &document.scene_2d {
            self.import_container(record);
        }
        self.flush(&[LinkKind::ContainerParent]);

        self.report
    }

    fn flush(&mut self, kinds: &[LinkKind]) {
        let dangling = self.links.flush(kinds, self.scene, &self.resolver);
        self.report.dangling.extend(dangling);
    }

    fn dangling(&mut self, context: String, reference: &str) {
        let missing = DanglingReference::new(context, reference);
        log::warn!("Unresolved reference, {}", missing);
        self.report.dangling.push(missing);
    }

    fn skip(&mut self, entity: &'static str, name: &str, reason: impl std::fmt::Display) {
        log::warn!("Skipped {} '{}': {}", entity, name, reason);
        self.report.skip(entity, name, reason.to_string());
    }

    fn materialize_texture(&mut self, name: &str, buffer: &str) -> Option<TextureHandle> {
        let asset = InlinedAsset {
            name: name.to_string(),
            buffer: buffer.to_string(),
        };
        match self.inliner.materialize_texture(self.scene, &asset) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        }
    }

    // ---- phase 1: render targets ----

    fn import_render_target(&mut self, record: &RenderTargetRecord) {
        let target = match self.codecs.decode_render_target(self.scene, &record.encoded_state) {
            Ok(target) => target,
            Err(err) => return self.skip("render target", &state_name(&record.encoded_state), err),
        };
        self.report.created.render_targets += 1;
        for mesh in &record.render_list {
            self.links.push(PendingLink::RenderListEntry {
                target,
                mesh: mesh.clone(),
            });
        }
        if let Some(mesh) = &record.attached_mesh {
            self.links.push(PendingLink::ProbeAttachment {
                target,
                mesh: mesh.clone(),
            });
        }
    }

    // ---- phase 2: materials ----

    fn import_material(&mut self, record: &MaterialRecord) {
        let mut textures = BTreeMap::new();
        for texture in &record.textures {
            let handle = self.materialize_texture(&texture.texture_name, &texture.texture_buffer);
            if let Some(handle) = handle {
                textures.insert(texture.texture_name.clone(), handle);
            }
        }

        let context = MaterialDecodeContext {
            textures: &textures,
            materials: self.resolver.materials(),
        };
        let decoded = self
            .codecs
            .decode_material(self.scene, &record.encoded_state, context);
        let material = match decoded {
            Ok(material) => material,
            Err(err) => return self.skip("material", &state_name(&record.encoded_state), err),
        };
        let name = match self.scene.material(material) {
            Some(material) => material.name.clone(),
            None => return,
        };
        self.resolver.register_material(&name, material);
        self.report.created.materials += 1;

        for mesh_name in &record.mesh_names {
            self.links.push(PendingLink::MaterialAssignment {
                material,
                mesh_name: mesh_name.clone(),
            });
        }
    }

    // ---- phase 3: sounds ----

    fn import_sound(&mut self, record: &SoundRecord) {
        let buffer = record.sound_buffer.as_ref().and_then(|buffer| {
            let asset = InlinedAsset {
                name: record.sound_name.clone().unwrap_or_else(|| record.name.clone()),
                buffer: buffer.clone(),
            };
            match self.inliner.materialize_audio(&asset) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!("{}", err);
                    None
                }
            }
        });
        match self.codecs.decode_sound(self.scene, &record.encoded_state, buffer) {
            Ok(sound) => {
                self.resolver.register_sound(&record.name, sound);
                self.report.created.sounds += 1;
            }
            Err(err) => self.skip("sound", &record.name, err),
        }
    }

    // ---- phase 4: nodes and behavior deltas ----

    fn import_entity(&mut self, record: &EntityRecord, document: &ProjectDocument) {
        match record.kind {
            EntityKind::Scene => {
                let tracks = self.decode_tracks(&record.name, &record.animation_tracks);
                self.scene.animations.extend(tracks);
                if let Some(graph) = &record.action_graph {
                    self.scene.action_graph = Some(self.codecs.decode_action_graph(graph));
                }
            }
            EntityKind::Sound => {
                let Some(sound) = self.resolver.resolve_sound_name(&record.name) else {
                    return self.dangling("animated sound".to_string(), &record.name);
                };
                let tracks = self.decode_tracks(&record.name, &record.animation_tracks);
                if let Some(sound) = self.scene.sound_mut(sound) {
                    sound.animations.extend(tracks);
                }
            }
            EntityKind::Mesh
            | EntityKind::Light
            | EntityKind::Camera
            | EntityKind::InstancedMesh => self.import_node(record, document),
        }
    }

    fn import_node(&mut self, record: &EntityRecord, document: &ProjectDocument) {
        let host = orphan_effect_host(document, record);
        let handle = if let Some(payload) = &record.payload {
            match self.instantiate(record, payload) {
                Some(handle) => handle,
                None => return,
            }
        } else if host == Some(HostMatch::ById) {
            // Ids never address the base, even when a base node shares the name
            self.synthesize_placeholder(record)
        } else if let Some(handle) = self.resolver.base().resolve_native(&record.name) {
            self.report.updated_nodes += 1;
            handle
        } else if host.is_some() {
            self.synthesize_placeholder(record)
        } else {
            return self.skip("node", &record.name, "not found in the base scene");
        };

        let tracks = self.decode_tracks(&record.name, &record.animation_tracks);
        let action_graph = record
            .action_graph
            .as_ref()
            .map(|graph| self.codecs.decode_action_graph(graph));
        let Some(node) = self.scene.node_mut(handle) else {
            return;
        };
        node.animations.extend(tracks);
        if action_graph.is_some() {
            node.action_graph = action_graph;
        }
        if let Some(physics) = &record.physics {
            node.physics = Some(impostor_from(physics));
        }
    }

    fn instantiate(&mut self, record: &EntityRecord, payload: &Value) -> Option<NodeHandle> {
        let decoded = match record.kind {
            EntityKind::Mesh => self.codecs.decode_node(self.scene, NodeKindTag::Mesh, payload),
            EntityKind::Light => self.codecs.decode_node(self.scene, NodeKindTag::Light, payload),
            EntityKind::Camera => self.codecs.decode_node(self.scene, NodeKindTag::Camera, payload),
            EntityKind::InstancedMesh => {
                let source = record
                    .source_mesh
                    .as_ref()
                    .and_then(|source| self.resolver.resolve_node(source));
                let Some(source) = source else {
                    let reference = record
                        .source_mesh
                        .as_ref()
                        .map(|s| s.key().to_string())
                        .unwrap_or_default();
                    self.dangling(format!("source of instance '{}'", record.name), &reference);
                    return None;
                };
                self.codecs.decode_instance(self.scene, payload, source)
            }
            EntityKind::Scene | EntityKind::Sound => return None,
        };
        let handle = match decoded {
            Ok(handle) => handle,
            Err(err) => {
                self.skip("node", &record.name, err);
                return None;
            }
        };

        let id = match &record.id {
            Some(id) => id.clone(),
            None => self.scene.node(handle).map(|n| n.id.clone()).unwrap_or_default(),
        };
        self.resolver.register_node(&id, &record.name, handle);
        self.report.created.nodes += 1;
        if let Some(parent) = &record.parent {
            self.links.push(PendingLink::Parent {
                child: handle,
                parent: parent.clone(),
            });
        }
        if let Some(material_name) = &record.material_name {
            self.links.push(PendingLink::MeshMaterial {
                mesh: handle,
                material_name: material_name.clone(),
            });
        }
        Some(handle)
    }

    fn synthesize_placeholder(&mut self, record: &EntityRecord) -> NodeHandle {
        let id = record
            .id
            .clone()
            .unwrap_or_else(|| self.scene.next_id("placeholder"));
        let handle = self.scene.add_node(
            Node::mesh(id.clone(), record.name.clone())
                .with_provenance(Provenance::OverlayPlaceholder),
        );
        log::debug!("Synthesized emitter placeholder '{}'", record.name);
        self.resolver.register_node(&id, &record.name, handle);
        self.report.created.placeholders += 1;
        handle
    }

    fn decode_tracks(
        &mut self,
        owner: &str,
        records: &[AnimationTrackRecord],
    ) -> Vec<AnimationTrack> {
        let mut tracks = Vec::with_capacity(records.len());
        for record in records {
            let mut track = match self.codecs.decode_animation(&record.encoded_state) {
                Ok(track) => track,
                Err(err) => {
                    self.skip("animation", owner, err);
                    continue;
                }
            };
            for group in &record.events {
                track.events.extend(group.events.iter().map(|event| AnimationEvent {
                    frame: group.frame,
                    name: event.name.clone(),
                    only_once: event.only_once,
                }));
            }
            tracks.push(track);
        }
        tracks
    }

    // ---- phases 5 to 7: emitter-hosted effects and shadows ----

    fn import_particle_system(&mut self, record: &ParticleSystemRecord) {
        let name = state_name(&record.encoded_state);
        let Some(emitter) = self.resolver.resolve_node(&record.emitter) else {
            let context = format!("emitter of particle system '{}'", name);
            return self.dangling(context, record.emitter.key());
        };

        let texture = match (&record.texture_name, &record.texture_buffer) {
            (Some(texture_name), Some(buffer)) => self.materialize_texture(texture_name, buffer),
            (Some(texture_name), None) => self.scene.find_texture_by_name(texture_name),
            _ => None,
        };
        if let Err(err) =
            self.codecs
                .decode_particle_system(self.scene, &record.encoded_state, emitter, texture)
        {
            return self.skip("particle system", &name, err);
        }
        self.report.created.particle_systems += 1;

        if !record.has_emitter {
            let node = self.scene.node_mut(emitter);
            if let (Some(position), Some(node)) = (record.emitter_position, node) {
                node.transform.position = position;
            }
        }
    }

    fn import_lens_flare_system(&mut self, record: &LensFlareSystemRecord) {
        let name = state_name(&record.encoded_state);
        let Some(emitter) = self.resolver.resolve_node(&record.emitter) else {
            let context = format!("emitter of lens flare system '{}'", name);
            return self.dangling(context, record.emitter.key());
        };

        let mut textures = Vec::with_capacity(record.flares.len());
        for flare in &record.flares {
            let texture = flare
                .as_ref()
                .and_then(|flare| self.materialize_texture(&flare.flare_name, &flare.flare_buffer));
            textures.push(texture);
        }
        match self
            .codecs
            .decode_lens_flare_system(self.scene, &record.encoded_state, emitter, &textures)
        {
            Ok(_) => self.report.created.lens_flare_systems += 1,
            Err(err) => self.skip("lens flare system", &name, err),
        }
    }

    fn import_shadow_caster(&mut self, record: &ShadowCasterRecord) {
        let Some(light) = self.resolver.resolve_node(&record.light) else {
            return self.dangling("light of shadow caster".to_string(), record.light.key());
        };
        let caster = match self
            .codecs
            .decode_shadow_caster(self.scene, &record.encoded_state, light)
        {
            Ok(caster) => caster,
            Err(err) => return self.skip("shadow caster", record.light.key(), err),
        };
        self.report.created.shadow_casters += 1;

        let mut render_list = Vec::with_capacity(record.render_list.len());
        for mesh in &record.render_list {
            match self.resolver.resolve_node(mesh) {
                Some(handle) => render_list.push(handle),
                None => self.dangling(
                    format!("shadow render list of {}", record.light),
                    mesh.key(),
                ),
            }
        }
        if let Some(caster) = self.scene.shadow_caster_mut(caster) {
            caster.render_list = render_list;
        }
    }

    // ---- phase 9 and post-processes ----

    fn apply_global_configuration(&mut self, config: &GlobalConfiguration) {
        let mut autostart = Vec::with_capacity(config.animated_at_launch.len());
        for entry in &config.animated_at_launch {
            let resolved = match entry.kind {
                AutoStartKind::Scene => Some(AutoStart::Scene),
                AutoStartKind::Node => {
                    self.resolver.resolve_node_name(&entry.name).map(AutoStart::Node)
                }
                AutoStartKind::Sound => {
                    self.resolver.resolve_sound_name(&entry.name).map(AutoStart::Sound)
                }
                AutoStartKind::ParticleSystem => self
                    .scene
                    .find_particle_system_by_name(&entry.name)
                    .map(AutoStart::ParticleSystem),
            };
            match resolved {
                Some(start) => autostart.push(start),
                None => self.dangling("animated at launch".to_string(), &entry.name),
            }
        }

        let playback = &mut self.scene.playback;
        playback.animation_speed = config.global_animation_speed;
        playback.frames_per_second = config.frames_per_second;
        playback.autostart = autostart;
    }

    fn import_post_process(&mut self, record: &PostProcessRecord) {
        let decoded = self.codecs.decode_post_process(self.scene, &record.encoded_state);
        let post_process = match decoded {
            Ok(post_process) => post_process,
            Err(err) => return self.skip("post-process", &state_name(&record.encoded_state), err),
        };
        self.report.created.post_processes += 1;
        if !record.attach {
            if let Some(post_process) = self.scene.post_process_mut(post_process) {
                post_process.attached = false;
            }
        }
    }

    // ---- phase 13: 2D containers ----

    fn import_container(&mut self, record: &Container2DRecord) {
        let container = match self.codecs.decode_container(self.scene, &record.encoded_state) {
            Ok(container) => container,
            Err(err) => return self.skip("2D container", &state_name(&record.encoded_state), err),
        };
        if let Some(name) = self.scene.container(container).map(|c| c.name.clone()) {
            self.resolver.register_container(&name, container);
        }
        self.report.created.containers += 1;
        if let Some(parent_name) = &record.parent_name {
            self.links.push(PendingLink::ContainerParent {
                child: container,
                parent_name: parent_name.clone(),
            });
        }
    }
}

/// Name field of an encoded state, for log messages
fn state_name(state: &Value) -> String {
    state
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
        .to_string()
}

fn impostor_from(record: &PhysicsRecord) -> PhysicsImpostor {
    let mut impostor =
        PhysicsImpostor::new(record.impostor, record.mass).with_provenance(Provenance::Overlay);
    impostor.friction = record.friction;
    impostor.restitution = record.restitution;
    impostor
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HostMatch {
    ById,
    ByName,
}

/// How an emitter-less effect in the document points at `record`, if one does
fn orphan_effect_host(document: &ProjectDocument, record: &EntityRecord) -> Option<HostMatch> {
    let points_here = |reference: &EntityReference| match reference {
        EntityReference::ById(id) => {
            (record.id.as_deref() == Some(id.as_str())).then_some(HostMatch::ById)
        }
        EntityReference::ByName(name) => (*name == record.name).then_some(HostMatch::ByName),
    };
    let particle_hosts = document
        .particle_systems
        .iter()
        .filter(|system| !system.has_emitter)
        .filter_map(|system| points_here(&system.emitter));
    let flare_hosts = document
        .lens_flare_systems
        .iter()
        .filter(|system| matches!(system.emitter, EntityReference::ById(_)))
        .filter_map(|system| points_here(&system.emitter));
    let mut found = None;
    for host in particle_hosts.chain(flare_hosts) {
        if host == HostMatch::ById {
            return Some(host);
        }
        found = Some(host);
    }
    found
}
