//! Void Project - Editor Overlay Documents
//!
//! A project document records what an editing session added to or changed
//! in a base scene. Exporting walks the live scene and keeps only overlay
//! entities plus the user-made behaviors of native ones; importing replays
//! the document on top of a freshly loaded base scene.
//!
//! # Architecture
//!
//! ```text
//! export:  Scene ──▶ GraphTraverser ──▶ DocumentBuilder ──▶ JSON text
//!                        │  (provenance filter, asset inliner)
//!                        ▼
//!                  CodecRegistry
//!
//! import:  JSON text ──▶ ProjectDocument ──▶ Reconstructor ──▶ Scene
//!                                   (resolver, link queue, inliner)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_project::prelude::*;
//!
//! let codecs = CodecRegistry::new();
//! let output = ProjectExporter::new(&codecs).export(&edited)?;
//!
//! let mut scene = load_base_scene();
//! let report = ProjectImporter::new(&codecs).import(&mut scene, &output.text)?;
//! for missing in &report.dangling {
//!     log::warn!("{}", missing);
//! }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod extension;
pub mod import;
pub mod inline;
pub mod provenance;
pub mod resolve;

pub use config::{ExportOptions, ImportOptions, ProjectConfig};
pub use document::{EntityKind, EntityRecord, EntityReference, ProjectDocument, FORMAT_VERSION};
pub use error::{ProjectError, Result};
pub use export::{ExportOutput, ProjectExporter};
pub use extension::{ExtensionRegistry, ProjectExtension};
pub use import::{ImportCounts, ImportReport, ProjectImporter, SkippedRecord};
pub use inline::{AssetInliner, InlineError, InlinedAsset};
pub use resolve::{BaseSceneHandle, DanglingReference};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::config::ProjectConfig;
    pub use crate::document::ProjectDocument;
    pub use crate::error::{ProjectError, Result};
    pub use crate::export::{ExportOutput, ProjectExporter};
    pub use crate::extension::{ExtensionRegistry, ProjectExtension};
    pub use crate::import::{ImportReport, ProjectImporter};
    pub use void_scene::prelude::*;
}
