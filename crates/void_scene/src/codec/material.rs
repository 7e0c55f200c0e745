//! Material codecs
//!
//! One codec per material kind. Property-bag kinds (standard, pbr and most
//! extension kinds) share [`PropertyMaterialCodec`]; multi-materials store
//! their sub-materials by name and need [`MultiMaterialCodec`].

use std::collections::BTreeMap;

use serde_json::Value;

use super::state::{MaterialState, TextureSlotState};
use super::{CodecError, Result};
use crate::material::{Material, MaterialHandle, MaterialKind};
use crate::provenance::Provenance;
use crate::scene::Scene;
use crate::texture::{TextureHandle, TextureSettings};

/// Objects a decoded material may refer to by name, besides the scene
#[derive(Clone, Copy, Debug)]
pub struct MaterialDecodeContext<'a> {
    /// Textures materialized for this material, by texture name
    pub textures: &'a BTreeMap<String, TextureHandle>,
    /// Materials created earlier in the same load, by material name
    pub materials: &'a BTreeMap<String, MaterialHandle>,
}

/// Encoder/decoder for one material kind
pub trait MaterialCodec: Send + Sync {
    /// Kind this codec produces
    fn kind(&self) -> MaterialKind;

    fn encode(&self, scene: &Scene, material: &Material) -> Result<Value>;

    /// Create a material in `scene` from encoded state
    fn decode(
        &self,
        scene: &mut Scene,
        state: &Value,
        context: MaterialDecodeContext<'_>,
    ) -> Result<MaterialHandle>;
}

fn parse_state(state: &Value) -> Result<MaterialState> {
    serde_json::from_value(state.clone()).map_err(|source| CodecError::Malformed {
        entity: "material",
        source,
    })
}

fn to_value(state: &MaterialState) -> Result<Value> {
    serde_json::to_value(state).map_err(|source| CodecError::Malformed {
        entity: "material",
        source,
    })
}

fn encode_textures(
    scene: &Scene,
    material: &Material,
) -> Result<BTreeMap<String, TextureSlotState>> {
    let mut slots = BTreeMap::new();
    for (slot, handle) in &material.textures {
        let texture = scene
            .texture(*handle)
            .ok_or(CodecError::DanglingHandle("texture"))?;
        slots.insert(
            slot.clone(),
            TextureSlotState {
                name: texture.name.clone(),
                level: texture.settings.level,
                has_alpha: texture.settings.has_alpha,
                u_scale: texture.settings.u_scale,
                v_scale: texture.settings.v_scale,
            },
        );
    }
    Ok(slots)
}

/// Bind texture slots, preferring textures materialized for this material
fn decode_textures(
    scene: &mut Scene,
    material: &mut Material,
    slots: &BTreeMap<String, TextureSlotState>,
    context: MaterialDecodeContext<'_>,
) {
    for (slot, state) in slots {
        let handle = context
            .textures
            .get(&state.name)
            .copied()
            .or_else(|| scene.find_texture_by_name(&state.name));
        let Some(handle) = handle else {
            log::warn!(
                "Material '{}': texture '{}' for slot '{}' not found, slot left empty",
                material.name,
                state.name,
                slot
            );
            continue;
        };
        if let Some(texture) = scene.texture_mut(handle) {
            texture.settings = TextureSettings {
                level: state.level,
                has_alpha: state.has_alpha,
                u_scale: state.u_scale,
                v_scale: state.v_scale,
            };
        }
        material.textures.insert(slot.clone(), handle);
    }
}

/// Codec for kinds fully described by properties and texture slots
#[derive(Clone, Debug)]
pub struct PropertyMaterialCodec {
    kind: MaterialKind,
}

impl PropertyMaterialCodec {
    pub fn new(kind: MaterialKind) -> Self {
        Self { kind }
    }

    pub fn standard() -> Self {
        Self::new(MaterialKind::Standard)
    }
}

impl MaterialCodec for PropertyMaterialCodec {
    fn kind(&self) -> MaterialKind {
        self.kind.clone()
    }

    fn encode(&self, scene: &Scene, material: &Material) -> Result<Value> {
        to_value(&MaterialState {
            id: material.id.clone(),
            name: material.name.clone(),
            kind: material.kind.name().to_string(),
            properties: material.properties.clone(),
            textures: encode_textures(scene, material)?,
            sub_materials: Vec::new(),
        })
    }

    fn decode(
        &self,
        scene: &mut Scene,
        state: &Value,
        context: MaterialDecodeContext<'_>,
    ) -> Result<MaterialHandle> {
        let state = parse_state(state)?;
        let mut material = Material::new(state.id, state.name, self.kind.clone())
            .with_provenance(Provenance::Overlay);
        material.properties = state.properties;
        decode_textures(scene, &mut material, &state.textures, context);
        Ok(scene.add_material(material))
    }
}

/// Codec for multi-materials
#[derive(Clone, Debug, Default)]
pub struct MultiMaterialCodec;

impl MaterialCodec for MultiMaterialCodec {
    fn kind(&self) -> MaterialKind {
        MaterialKind::Multi
    }

    fn encode(&self, scene: &Scene, material: &Material) -> Result<Value> {
        let mut sub_materials = Vec::with_capacity(material.sub_materials.len());
        for slot in &material.sub_materials {
            let name = match slot {
                Some(handle) => Some(
                    scene
                        .material(*handle)
                        .ok_or(CodecError::DanglingHandle("sub-material"))?
                        .name
                        .clone(),
                ),
                None => None,
            };
            sub_materials.push(name);
        }
        to_value(&MaterialState {
            id: material.id.clone(),
            name: material.name.clone(),
            kind: MaterialKind::Multi.name().to_string(),
            properties: material.properties.clone(),
            textures: BTreeMap::new(),
            sub_materials,
        })
    }

    fn decode(
        &self,
        scene: &mut Scene,
        state: &Value,
        context: MaterialDecodeContext<'_>,
    ) -> Result<MaterialHandle> {
        let state = parse_state(state)?;
        let mut material = Material::new(state.id, state.name, MaterialKind::Multi)
            .with_provenance(Provenance::Overlay);
        material.properties = state.properties;
        for name in state.sub_materials {
            let handle = name.as_deref().and_then(|name| {
                let found = context
                    .materials
                    .get(name)
                    .copied()
                    .or_else(|| scene.find_material_by_name(name));
                if found.is_none() {
                    log::warn!(
                        "Multi-material '{}': sub-material '{}' not found",
                        material.name,
                        name
                    );
                }
                found
            });
            material.sub_materials.push(handle);
        }
        Ok(scene.add_material(material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;

    fn empty_context<'a>(
        textures: &'a BTreeMap<String, TextureHandle>,
        materials: &'a BTreeMap<String, MaterialHandle>,
    ) -> MaterialDecodeContext<'a> {
        MaterialDecodeContext { textures, materials }
    }

    #[test]
    fn test_property_codec_keeps_properties_and_slots() {
        let mut scene = Scene::new("test");
        let tex = scene.add_texture(Texture::image("rock.png", vec![1, 2, 3]));
        let material = Material::new("mat-1", "rock", MaterialKind::Standard)
            .with_property("alpha", 0.5f32)
            .with_texture("diffuse", tex);

        let codec = PropertyMaterialCodec::standard();
        let state = codec.encode(&scene, &material).unwrap();
        assert_eq!(state["textures"]["diffuse"]["name"], "rock.png");

        let mut target = Scene::new("target");
        let fresh = target.add_texture(Texture::image("rock.png", vec![1, 2, 3]));
        let mut textures = BTreeMap::new();
        textures.insert("rock.png".to_string(), fresh);
        let materials = BTreeMap::new();
        let handle = codec
            .decode(&mut target, &state, empty_context(&textures, &materials))
            .unwrap();

        let decoded = target.material(handle).unwrap();
        assert_eq!(decoded.id, "mat-1");
        assert_eq!(decoded.provenance, Provenance::Overlay);
        assert_eq!(decoded.properties["alpha"].as_number(), Some(0.5));
        assert_eq!(decoded.textures["diffuse"], fresh);
    }

    #[test]
    fn test_multi_codec_resolves_sub_materials_by_name() {
        let mut scene = Scene::new("test");
        let a = scene.add_material(Material::new("a", "red", MaterialKind::Standard));
        let mut multi = Material::new("m", "multi", MaterialKind::Multi);
        multi.sub_materials = vec![Some(a), None];

        let state = MultiMaterialCodec.encode(&scene, &multi).unwrap();
        assert_eq!(state["subMaterials"], serde_json::json!(["red", null]));

        let mut target = Scene::new("target");
        let red = target.add_material(Material::new("a", "red", MaterialKind::Standard));
        let textures = BTreeMap::new();
        let materials = BTreeMap::new();
        let handle = MultiMaterialCodec
            .decode(&mut target, &state, empty_context(&textures, &materials))
            .unwrap();
        assert_eq!(target.material(handle).unwrap().sub_materials, vec![Some(red), None]);
    }
}
