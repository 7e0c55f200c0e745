//! # void_scene - Editor Scene Graph
//!
//! The live scene edited by the Void editor:
//! - **Nodes**: meshes, instances, lights and cameras in a transform hierarchy
//! - **Resources**: geometry, materials, textures and sounds
//! - **Effects**: particle systems, lens flares, shadow casters, render
//!   targets, post-processes and screen-space 2D containers
//! - **Behaviors**: animation tracks, action graphs and physics impostors
//!
//! Every object carries a [`Provenance`] telling whether it came from the
//! base asset or from an editing session. The [`codec`] module converts
//! objects to and from portable JSON state.
//!
//! ## Example
//!
//! ```ignore
//! use void_scene::prelude::*;
//!
//! let mut scene = Scene::new("level");
//! let geometry = scene.add_geometry(Geometry::quad("geo-1"));
//! let floor = scene.add_node(
//!     Node::mesh(scene.next_id("mesh"), "floor")
//!         .with_geometry(geometry)
//!         .with_provenance(Provenance::Overlay),
//! );
//! ```

pub mod animation;
pub mod audio;
pub mod codec;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod material;
pub mod node;
pub mod overlay2d;
pub mod post_process;
pub mod provenance;
pub mod rendering;
pub mod scene;
pub mod texture;
pub mod value;

pub use animation::*;
pub use audio::*;
pub use codec::{CodecError, CodecRegistry, MaterialCodec, MaterialDecodeContext};
pub use effects::*;
pub use error::{Result, SceneError};
pub use geometry::*;
pub use material::*;
pub use node::*;
pub use overlay2d::*;
pub use post_process::*;
pub use provenance::Provenance;
pub use rendering::*;
pub use scene::*;
pub use texture::*;
pub use value::PropertyValue;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::animation::{
        ActionGraph, AnimationDataType, AnimationTrack, ImpostorKind, PhysicsImpostor,
    };
    pub use crate::audio::{Sound, SoundHandle};
    pub use crate::codec::{CodecRegistry, MaterialCodec, PropertyMaterialCodec};
    pub use crate::effects::{LensFlare, LensFlareSystem, ParticleSystem, ParticleSystemHandle};
    pub use crate::geometry::{Geometry, GeometryHandle};
    pub use crate::material::{Material, MaterialHandle, MaterialKind};
    pub use crate::node::{CameraData, LightData, LightKind, Node, NodeHandle, NodeKind, Transform};
    pub use crate::overlay2d::Container2D;
    pub use crate::post_process::PostProcess;
    pub use crate::provenance::Provenance;
    pub use crate::rendering::{RenderTarget, RenderTargetKind, ShadowCaster};
    pub use crate::scene::{AutoStart, Scene};
    pub use crate::texture::{Texture, TextureHandle, TextureKind};
    pub use crate::value::PropertyValue;
}
