//! Project import
//!
//! Rebuilds an overlay document on top of a live base scene. Only
//! malformed document text is fatal, and it is detected before the scene
//! is touched. Everything else (dangling references, records a codec
//! rejects, undecodable payloads) is logged, skipped and listed in the
//! [`ImportReport`]. A failure partway leaves whatever was already
//! reconstructed in place.

mod reconstruct;

use void_scene::{CodecRegistry, Scene};

use crate::config::ImportOptions;
use crate::document::{ProjectDocument, FORMAT_VERSION};
use crate::error::Result;
use crate::extension::ExtensionRegistry;
use crate::inline::AssetInliner;
use crate::resolve::{BaseSceneHandle, DanglingReference, ReferenceResolver};

use reconstruct::Reconstructor;

/// Number of entities created per kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub render_targets: usize,
    pub materials: usize,
    pub sounds: usize,
    pub nodes: usize,
    pub placeholders: usize,
    pub particle_systems: usize,
    pub lens_flare_systems: usize,
    pub shadow_casters: usize,
    pub post_processes: usize,
    pub containers: usize,
}

/// A record that was not reconstructed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    pub entity: &'static str,
    pub name: String,
    pub reason: String,
}

/// Outcome of an import
#[derive(Clone, Debug, Default)]
pub struct ImportReport {
    pub format_version: u32,
    pub created: ImportCounts,
    /// Base-scene nodes that received behavior deltas
    pub updated_nodes: usize,
    pub dangling: Vec<DanglingReference>,
    pub skipped: Vec<SkippedRecord>,
}

impl ImportReport {
    /// True when every record was reconstructed and every reference resolved
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.skipped.is_empty()
    }

    pub(crate) fn skip(&mut self, entity: &'static str, name: &str, reason: String) {
        self.skipped.push(SkippedRecord {
            entity,
            name: name.to_string(),
            reason,
        });
    }
}

pub struct ProjectImporter<'a> {
    codecs: &'a CodecRegistry,
    extensions: Option<&'a ExtensionRegistry>,
    options: ImportOptions,
}

impl<'a> ProjectImporter<'a> {
    pub fn new(codecs: &'a CodecRegistry) -> Self {
        Self {
            codecs,
            extensions: None,
            options: ImportOptions::default(),
        }
    }

    pub fn with_extensions(mut self, extensions: &'a ExtensionRegistry) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse `text` and layer it onto `scene`
    pub fn import(&self, scene: &mut Scene, text: &str) -> Result<ImportReport> {
        let document = ProjectDocument::from_json(text)?;
        Ok(self.import_document(scene, &document))
    }

    /// Layer an already parsed document onto `scene`
    pub fn import_document(&self, scene: &mut Scene, document: &ProjectDocument) -> ImportReport {
        if document.format_version > FORMAT_VERSION {
            log::warn!(
                "Project document format {} is newer than supported format {}",
                document.format_version,
                FORMAT_VERSION
            );
        }
        if document.physics_enabled && self.options.honor_physics_flag {
            scene.enable_physics();
        }

        let resolver = ReferenceResolver::new(BaseSceneHandle::capture(scene));
        let inliner = AssetInliner::new(self.options.strip_data_uri_prefix);
        let report = Reconstructor::new(scene, self.codecs, inliner, resolver)
            .run(document, self.extensions);

        log::info!(
            "Imported project into '{}': {} nodes created, {} updated, {} dangling, {} skipped",
            scene.name,
            report.created.nodes + report.created.placeholders,
            report.updated_nodes,
            report.dangling.len(),
            report.skipped.len()
        );
        report
    }
}
