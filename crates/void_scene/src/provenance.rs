//! Provenance of scene objects
//!
//! Every object in the live graph records where it came from. Objects
//! loaded from the base asset are `Native`; anything the editor creates or
//! re-creates from a project document is `Overlay`. The distinction decides
//! what a project document has to persist.

use serde::{Deserialize, Serialize};

/// Origin of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    /// Loaded from the base asset; never persisted by the project
    #[default]
    Native,
    /// Introduced or modified during an editing session
    Overlay,
    /// Empty entity synthesized to host an emitter-less effect
    OverlayPlaceholder,
}

impl Provenance {
    /// True for anything the project document owns
    #[inline]
    pub fn is_overlay(self) -> bool {
        !matches!(self, Self::Native)
    }

    /// True only for synthesized emitter placeholders
    #[inline]
    pub fn is_placeholder(self) -> bool {
        matches!(self, Self::OverlayPlaceholder)
    }
}
