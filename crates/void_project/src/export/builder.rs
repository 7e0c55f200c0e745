//! Document builder
//!
//! Accumulates records in traversal order and owns the name-keyed material
//! table, so a material shared by several meshes is written once with all
//! of their names.

use std::collections::{BTreeMap, BTreeSet};

use void_scene::{CodecRegistry, MaterialHandle, Scene};

use crate::document::{MaterialRecord, ProjectDocument, TextureRecord};
use crate::error::{ProjectError, Result};
use crate::inline::AssetInliner;
use crate::provenance::should_record_material;

pub struct DocumentBuilder<'a> {
    codecs: &'a CodecRegistry,
    inliner: AssetInliner,
    document: ProjectDocument,
    material_index: BTreeMap<String, usize>,
    requested_kinds: BTreeSet<String>,
}

impl<'a> DocumentBuilder<'a> {
    pub fn new(codecs: &'a CodecRegistry, inliner: AssetInliner) -> Self {
        Self {
            codecs,
            inliner,
            document: ProjectDocument::default(),
            material_index: BTreeMap::new(),
            requested_kinds: BTreeSet::new(),
        }
    }

    pub fn codecs(&self) -> &'a CodecRegistry {
        self.codecs
    }

    pub fn inliner(&self) -> &AssetInliner {
        &self.inliner
    }

    pub fn document_mut(&mut self) -> &mut ProjectDocument {
        &mut self.document
    }

    /// Register a material used by `mesh_name`. Sub-material slots pass
    /// `None`; they are written as records that are not new instances.
    pub fn register_material(
        &mut self,
        scene: &Scene,
        handle: MaterialHandle,
        mesh_name: Option<&str>,
    ) -> Result<()> {
        let Some(material) = scene.material(handle) else {
            log::warn!("Mesh '{}' uses a missing material", mesh_name.unwrap_or("?"));
            return Ok(());
        };
        if !material.kind.is_builtin() {
            self.requested_kinds.insert(material.kind.name().to_string());
        }
        if !should_record_material(material) {
            return Ok(());
        }

        if let Some(&index) = self.material_index.get(&material.name) {
            let record = &mut self.document.materials[index];
            if let Some(mesh_name) = mesh_name {
                record.is_new_instance = true;
                if !record.mesh_names.iter().any(|n| n == mesh_name) {
                    record.mesh_names.push(mesh_name.to_string());
                }
            }
            return Ok(());
        }

        let encoded_state = self
            .codecs
            .encode_material(scene, handle)
            .map_err(|source| ProjectError::Codec {
                entity: "material",
                name: material.name.clone(),
                source,
            })?;
        let mut textures = Vec::new();
        for (slot, texture) in &material.textures {
            // Render-target textures have no bytes and are found by name
            let asset = scene
                .texture(*texture)
                .and_then(|t| self.inliner.inline_texture(t));
            if let Some(asset) = asset {
                textures.push(TextureRecord {
                    slot: slot.clone(),
                    texture_name: asset.name,
                    texture_buffer: asset.buffer,
                });
            }
        }

        log::debug!("Recorded material '{}' ({})", material.name, material.kind);
        self.material_index
            .insert(material.name.clone(), self.document.materials.len());
        self.document.materials.push(MaterialRecord {
            mesh_names: mesh_name.map(|n| vec![n.to_string()]).unwrap_or_default(),
            is_new_instance: mesh_name.is_some(),
            encoded_state,
            textures,
        });
        Ok(())
    }

    /// Non-built-in material kinds seen so far, sorted
    pub fn requested_kinds(&self) -> Vec<String> {
        self.requested_kinds.iter().cloned().collect()
    }

    /// Assemble the document and serialize it
    pub fn finish(
        mut self,
        request_material_kinds: bool,
        indent: &str,
    ) -> Result<(ProjectDocument, String)> {
        if request_material_kinds {
            self.document.requested_material_kinds = Some(self.requested_kinds());
        }
        let text = self.document.to_json(indent)?;
        Ok((self.document, text))
    }
}
