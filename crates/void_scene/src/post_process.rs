//! Post-process pipelines attached to the scene cameras

use std::collections::BTreeMap;

use void_core::Handle;

use crate::provenance::Provenance;
use crate::value::PropertyValue;

pub type PostProcessHandle = Handle<PostProcess>;

#[derive(Clone, Debug)]
pub struct PostProcess {
    pub name: String,
    /// Pipeline kind, e.g. "standard", "ssao", "hdr"
    pub kind: String,
    /// Detached pipelines exist but do not render
    pub attached: bool,
    pub settings: BTreeMap<String, PropertyValue>,
    pub provenance: Provenance,
}

impl PostProcess {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            attached: true,
            settings: BTreeMap::new(),
            provenance: Provenance::Native,
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn detached(mut self) -> Self {
        self.attached = false;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
