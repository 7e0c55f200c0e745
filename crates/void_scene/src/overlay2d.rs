//! Screen-space 2D containers (HUD panels, sprites, labels)
//!
//! Containers form their own hierarchy, separate from the 3D nodes, and
//! are addressed by name.

use std::collections::BTreeMap;

use void_core::Handle;

use crate::provenance::Provenance;
use crate::value::PropertyValue;

pub type ContainerHandle = Handle<Container2D>;

#[derive(Clone, Debug)]
pub struct Container2D {
    pub name: String,
    /// Container kind, e.g. "group2d", "rectangle2d", "text2d", "sprite2d"
    pub kind: String,
    pub properties: BTreeMap<String, PropertyValue>,
    pub provenance: Provenance,
    pub(crate) parent: Option<ContainerHandle>,
}

impl Container2D {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            properties: BTreeMap::new(),
            provenance: Provenance::Native,
            parent: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn parent(&self) -> Option<ContainerHandle> {
        self.parent
    }
}
