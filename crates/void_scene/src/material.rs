//! Materials
//!
//! The material kind decides which codec reads and writes a material.
//! `Standard` is always available; other kinds need a registered codec on
//! the consuming side, which is why the project exporter reports the
//! non-built-in kinds it encountered.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use void_core::Handle;

use crate::provenance::Provenance;
use crate::texture::TextureHandle;
use crate::value::PropertyValue;

/// Handle to a [`Material`] in a [`crate::Scene`]
pub type MaterialHandle = Handle<Material>;

/// Material kind, open to engine extensions through `Custom`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialKind {
    /// The universally-available default kind
    Standard,
    Pbr,
    /// Container of per-submesh materials
    Multi,
    /// Kind provided by an extension codec, e.g. "water" or "fur"
    Custom(String),
}

impl MaterialKind {
    pub fn name(&self) -> &str {
        match self {
            MaterialKind::Standard => "standard",
            MaterialKind::Pbr => "pbr",
            MaterialKind::Multi => "multi",
            MaterialKind::Custom(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "standard" => MaterialKind::Standard,
            "pbr" => MaterialKind::Pbr,
            "multi" => MaterialKind::Multi,
            other => MaterialKind::Custom(other.to_string()),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, MaterialKind::Standard)
    }

    /// Kinds every consumer ships with
    pub fn is_builtin(&self) -> bool {
        !matches!(self, MaterialKind::Custom(_))
    }
}

impl Default for MaterialKind {
    fn default() -> Self {
        MaterialKind::Standard
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for MaterialKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for MaterialKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(MaterialKind::from_name(&name))
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub kind: MaterialKind,
    pub provenance: Provenance,
    /// Colors, scalars and flags by engine property name
    pub properties: BTreeMap<String, PropertyValue>,
    /// Texture per slot ("diffuse", "bump", "reflection", ...)
    pub textures: BTreeMap<String, TextureHandle>,
    /// Per-submesh materials, only for `MaterialKind::Multi`
    pub sub_materials: Vec<Option<MaterialHandle>>,
}

impl Material {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: MaterialKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            provenance: Provenance::Native,
            properties: BTreeMap::new(),
            textures: BTreeMap::new(),
            sub_materials: Vec::new(),
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_texture(mut self, slot: impl Into<String>, texture: TextureHandle) -> Self {
        self.textures.insert(slot.into(), texture);
        self
    }

    pub fn is_multi(&self) -> bool {
        matches!(self.kind, MaterialKind::Multi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(MaterialKind::from_name("standard"), MaterialKind::Standard);
        assert_eq!(MaterialKind::from_name(""), MaterialKind::Standard);
        assert_eq!(
            MaterialKind::from_name("water"),
            MaterialKind::Custom("water".to_string())
        );
        assert!(MaterialKind::Pbr.is_builtin());
        assert!(!MaterialKind::from_name("fur").is_builtin());
    }

    #[test]
    fn test_kind_serializes_as_string() {
        let json = serde_json::to_string(&MaterialKind::Custom("lava".into())).unwrap();
        assert_eq!(json, "\"lava\"");
        let kind: MaterialKind = serde_json::from_str("\"multi\"").unwrap();
        assert_eq!(kind, MaterialKind::Multi);
    }
}
