//! Project export
//!
//! Turns the live scene into a [`ProjectDocument`] holding only what the
//! editing session added or changed. Export is all-or-nothing: a codec
//! failure aborts it and no text is produced.

mod builder;
mod traverse;

pub use builder::DocumentBuilder;
pub use traverse::{reference_for, GraphTraverser};

use void_scene::{AutoStart, CodecRegistry, Scene};

use crate::config::ExportOptions;
use crate::document::{
    AutoStartRecord, Container2DRecord, GlobalConfiguration, PostProcessRecord, ProjectDocument,
    RenderTargetRecord, SoundRecord,
};
use crate::error::{ProjectError, Result};
use crate::extension::ExtensionRegistry;
use crate::inline::AssetInliner;

/// Result of an export
#[derive(Clone, Debug)]
pub struct ExportOutput {
    pub document: ProjectDocument,
    /// Serialized document, UTF-8 JSON
    pub text: String,
    /// Non-built-in material kinds the scene uses, sorted
    pub requested_material_kinds: Vec<String>,
}

pub struct ProjectExporter<'a> {
    codecs: &'a CodecRegistry,
    extensions: Option<&'a ExtensionRegistry>,
    options: ExportOptions,
}

impl<'a> ProjectExporter<'a> {
    pub fn new(codecs: &'a CodecRegistry) -> Self {
        Self {
            codecs,
            extensions: None,
            options: ExportOptions::default(),
        }
    }

    pub fn with_extensions(mut self, extensions: &'a ExtensionRegistry) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn export(&self, scene: &Scene) -> Result<ExportOutput> {
        let mut builder = DocumentBuilder::new(self.codecs, AssetInliner::default());
        GraphTraverser::new(scene, &mut builder).run()?;

        self.export_render_targets(scene, &mut builder)?;
        self.export_post_processes(scene, &mut builder)?;
        self.export_sounds(scene, &mut builder)?;
        self.export_containers(scene, &mut builder)?;

        let document = builder.document_mut();
        document.global_configuration = global_configuration(scene);
        document.action_graph = scene
            .action_graph
            .as_ref()
            .filter(|graph| graph.provenance.is_overlay())
            .map(|graph| self.codecs.encode_action_graph(graph));
        document.physics_enabled = scene.physics_enabled;
        document.custom_metadata = match self.extensions {
            Some(extensions) => extensions.serialize_metadata(scene),
            None => scene.custom_metadata.clone(),
        };

        let requested_material_kinds = builder.requested_kinds();
        let (document, text) =
            builder.finish(self.options.request_material_kinds, &self.options.indent)?;
        log::info!(
            "Exported project for '{}': {} nodes, {} materials, {} bytes",
            scene.name,
            document.nodes.len(),
            document.materials.len(),
            text.len()
        );
        Ok(ExportOutput {
            document,
            text,
            requested_material_kinds,
        })
    }

    fn export_render_targets(&self, scene: &Scene, builder: &mut DocumentBuilder<'_>) -> Result<()> {
        for (_, target) in scene.render_targets() {
            if !target.provenance.is_overlay() {
                continue;
            }
            let encoded_state = self
                .codecs
                .encode_render_target(scene, target)
                .map_err(|source| ProjectError::Codec {
                    entity: "render target",
                    name: target.name.clone(),
                    source,
                })?;
            builder.document_mut().render_targets.push(RenderTargetRecord {
                is_probe: target.is_probe(),
                encoded_state,
                attached_mesh: target.attached_mesh.and_then(|m| reference_for(scene, m)),
                render_list: target
                    .render_list
                    .iter()
                    .filter_map(|m| reference_for(scene, *m))
                    .collect(),
            });
        }
        Ok(())
    }

    fn export_post_processes(&self, scene: &Scene, builder: &mut DocumentBuilder<'_>) -> Result<()> {
        for (_, post_process) in scene.post_processes() {
            if !post_process.provenance.is_overlay() {
                continue;
            }
            let encoded_state = self
                .codecs
                .encode_post_process(post_process)
                .map_err(|source| ProjectError::Codec {
                    entity: "post-process",
                    name: post_process.name.clone(),
                    source,
                })?;
            builder.document_mut().post_processes.push(PostProcessRecord {
                encoded_state,
                attach: post_process.attached,
            });
        }
        Ok(())
    }

    fn export_sounds(&self, scene: &Scene, builder: &mut DocumentBuilder<'_>) -> Result<()> {
        let inliner = *builder.inliner();
        for (_, sound) in scene.sounds() {
            if !sound.provenance.is_overlay() {
                continue;
            }
            let encoded_state = self
                .codecs
                .encode_sound(sound)
                .map_err(|source| ProjectError::Codec {
                    entity: "sound",
                    name: sound.name.clone(),
                    source,
                })?;
            let asset = sound
                .buffer
                .as_deref()
                .map(|bytes| inliner.inline(sound.name.clone(), bytes));
            builder.document_mut().sounds.push(SoundRecord {
                name: sound.name.clone(),
                encoded_state,
                sound_name: asset.as_ref().map(|a| a.name.clone()),
                sound_buffer: asset.map(|a| a.buffer),
            });
        }
        Ok(())
    }

    fn export_containers(&self, scene: &Scene, builder: &mut DocumentBuilder<'_>) -> Result<()> {
        for (_, container) in scene.containers() {
            if !container.provenance.is_overlay() {
                continue;
            }
            let encoded_state = self
                .codecs
                .encode_container(container)
                .map_err(|source| ProjectError::Codec {
                    entity: "2D container",
                    name: container.name.clone(),
                    source,
                })?;
            let parent_name = container
                .parent()
                .and_then(|p| scene.container(p))
                .map(|p| p.name.clone());
            builder.document_mut().scene_2d.push(Container2DRecord {
                encoded_state,
                parent_name,
            });
        }
        Ok(())
    }
}

fn global_configuration(scene: &Scene) -> GlobalConfiguration {
    let animated_at_launch = scene
        .playback
        .autostart
        .iter()
        .filter_map(|entry| {
            let name = match entry {
                AutoStart::Scene => Some(scene.name.clone()),
                AutoStart::Node(handle) => scene.node(*handle).map(|n| n.name.clone()),
                AutoStart::Sound(handle) => scene.sound(*handle).map(|s| s.name.clone()),
                AutoStart::ParticleSystem(handle) => {
                    scene.particle_system(*handle).map(|p| p.name.clone())
                }
            };
            name.map(|name| AutoStartRecord {
                name,
                kind: entry.kind(),
            })
        })
        .collect();
    GlobalConfiguration {
        global_animation_speed: scene.playback.animation_speed,
        frames_per_second: scene.playback.frames_per_second,
        animated_at_launch,
    }
}
