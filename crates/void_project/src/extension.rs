//! Extension hooks
//!
//! Editor extensions keep their own data in the scene's custom metadata,
//! one JSON blob per extension key. The exporter copies every blob into the
//! document and lets the owning extension rewrite it first; the importer
//! stores the blobs back and hands each to its extension.

use std::collections::BTreeMap;

use serde_json::Value;
use void_scene::Scene;

pub trait ProjectExtension {
    /// Key of this extension's blob in `customMetadata`
    fn key(&self) -> &str;

    /// Called on export with a copy of the blob about to be written
    fn on_serialize(&self, _blob: &mut Value) {}

    /// Called on import after the blob has been stored in the scene
    fn on_load(&self, scene: &mut Scene, blob: &Value);
}

#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: BTreeMap<String, Box<dyn ProjectExtension>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("keys", &self.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension, replacing any with the same key
    pub fn register(&mut self, extension: Box<dyn ProjectExtension>) {
        let key = extension.key().to_string();
        if self.extensions.insert(key.clone(), extension).is_some() {
            log::warn!("Replaced project extension '{}'", key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn ProjectExtension> {
        self.extensions.get(key).map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Metadata to write for `scene`
    pub fn serialize_metadata(&self, scene: &Scene) -> BTreeMap<String, Value> {
        let mut metadata = scene.custom_metadata.clone();
        for (key, blob) in metadata.iter_mut() {
            if let Some(extension) = self.get(key) {
                extension.on_serialize(blob);
            }
        }
        metadata
    }

    /// Store every blob in the scene, then notify the owning extensions.
    /// Blobs with no registered extension are kept for a later export.
    pub fn load_metadata(&self, scene: &mut Scene, metadata: &BTreeMap<String, Value>) {
        for (key, blob) in metadata {
            scene.custom_metadata.insert(key.clone(), blob.clone());
        }
        for (key, blob) in metadata {
            match self.get(key) {
                Some(extension) => extension.on_load(scene, blob),
                None => log::debug!("No extension registered for metadata '{}'", key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Weather;

    impl ProjectExtension for Weather {
        fn key(&self) -> &str {
            "weather"
        }

        fn on_serialize(&self, blob: &mut Value) {
            blob["saved"] = json!(true);
        }

        fn on_load(&self, scene: &mut Scene, blob: &Value) {
            if blob["rain"] == json!(true) {
                scene.name = format!("{} (rainy)", scene.name);
            }
        }
    }

    #[test]
    fn test_serialize_lets_extension_rewrite() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Weather));
        let mut scene = Scene::new("level");
        scene.custom_metadata.insert("weather".into(), json!({"rain": true}));
        scene.custom_metadata.insert("other".into(), json!(1));

        let metadata = registry.serialize_metadata(&scene);
        assert_eq!(metadata["weather"], json!({"rain": true, "saved": true}));
        assert_eq!(metadata["other"], json!(1));
        // The scene itself is untouched
        assert_eq!(scene.custom_metadata["weather"], json!({"rain": true}));
    }

    #[test]
    fn test_load_hands_blob_to_extension() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Weather));
        let mut scene = Scene::new("level");
        let mut metadata = BTreeMap::new();
        metadata.insert("weather".to_string(), json!({"rain": true}));
        metadata.insert("unknown".to_string(), json!("kept"));

        registry.load_metadata(&mut scene, &metadata);
        assert_eq!(scene.name, "level (rainy)");
        assert_eq!(scene.custom_metadata["unknown"], json!("kept"));
    }
}
