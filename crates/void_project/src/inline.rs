//! Asset inliner
//!
//! Embeds binary resources (texture images, flare images, audio) as base64
//! text so a project document is self-contained, and turns them back into
//! scene resources on import. Payloads are never deduplicated: two records
//! using the same image each carry a copy.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use void_scene::{Provenance, Scene, Texture, TextureHandle};

/// Prefix some producers leave on embedded resource names
const DATA_URI_PREFIX: &str = "data:";

/// An embedded binary resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlinedAsset {
    pub name: String,
    /// Standard base64 with padding
    pub buffer: String,
}

/// Inliner errors
#[derive(Debug, Error)]
pub enum InlineError {
    #[error("Invalid base64 payload for '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct AssetInliner {
    strip_data_uri_prefix: bool,
}

impl Default for AssetInliner {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AssetInliner {
    pub fn new(strip_data_uri_prefix: bool) -> Self {
        Self {
            strip_data_uri_prefix,
        }
    }

    pub fn inline(&self, name: impl Into<String>, bytes: &[u8]) -> InlinedAsset {
        InlinedAsset {
            name: name.into(),
            buffer: STANDARD.encode(bytes),
        }
    }

    /// Inline a texture's source bytes. Textures without a buffer (render
    /// targets) are addressed by name and yield `None`.
    pub fn inline_texture(&self, texture: &Texture) -> Option<InlinedAsset> {
        texture
            .buffer
            .as_deref()
            .map(|bytes| self.inline(texture.name.clone(), bytes))
    }

    /// Name under which a materialized resource is registered
    pub fn resource_name<'a>(&self, name: &'a str) -> &'a str {
        if self.strip_data_uri_prefix {
            name.strip_prefix(DATA_URI_PREFIX).unwrap_or(name)
        } else {
            name
        }
    }

    pub fn decode(&self, asset: &InlinedAsset) -> Result<Vec<u8>, InlineError> {
        STANDARD
            .decode(asset.buffer.as_bytes())
            .map_err(|source| InlineError::Decode {
                name: asset.name.clone(),
                source,
            })
    }

    /// Create an overlay image texture from an embedded payload
    pub fn materialize_texture(
        &self,
        scene: &mut Scene,
        asset: &InlinedAsset,
    ) -> Result<TextureHandle, InlineError> {
        let bytes = self.decode(asset)?;
        let name = self.resource_name(&asset.name);
        log::debug!("Materialized texture '{}' ({} bytes)", name, bytes.len());
        Ok(scene.add_texture(Texture::image(name, bytes).with_provenance(Provenance::Overlay)))
    }

    /// Decode an embedded audio buffer for the sound that owns it
    pub fn materialize_audio(&self, asset: &InlinedAsset) -> Result<Vec<u8>, InlineError> {
        let bytes = self.decode(asset)?;
        log::debug!(
            "Materialized audio '{}' ({} bytes)",
            self.resource_name(&asset.name),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_lossless() {
        let inliner = AssetInliner::default();
        let bytes: Vec<u8> = (0..=255).collect();
        let asset = inliner.inline("gradient.png", &bytes);
        assert_eq!(inliner.decode(&asset).unwrap(), bytes);
    }

    #[test]
    fn test_empty_buffer_round_trips() {
        let inliner = AssetInliner::default();
        let asset = inliner.inline("empty.png", &[]);
        assert_eq!(asset.buffer, "");
        assert!(inliner.decode(&asset).unwrap().is_empty());
    }

    #[test]
    fn test_data_prefix_is_stripped() {
        let mut scene = Scene::new("test");
        let inliner = AssetInliner::default();
        let asset = inliner.inline("data:grass.png", &[1, 2, 3]);
        let handle = inliner.materialize_texture(&mut scene, &asset).unwrap();

        let texture = scene.texture(handle).unwrap();
        assert_eq!(texture.name, "grass.png");
        assert_eq!(texture.buffer.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(texture.provenance, Provenance::Overlay);

        let keep = AssetInliner::new(false);
        assert_eq!(keep.resource_name("data:grass.png"), "data:grass.png");
    }

    #[test]
    fn test_invalid_payload() {
        let inliner = AssetInliner::default();
        let asset = InlinedAsset {
            name: "broken.png".into(),
            buffer: "not base64!".into(),
        };
        assert!(matches!(inliner.decode(&asset), Err(InlineError::Decode { .. })));
    }
}
