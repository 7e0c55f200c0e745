//! Per-object behaviors: animation tracks, action graphs, physics impostors
//!
//! These attach to nodes (and, for animations, to sounds and the scene
//! itself). Each carries its own provenance so a native node can still
//! own user-made behaviors.

use serde::{Deserialize, Serialize};

use crate::provenance::Provenance;
use crate::value::PropertyValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationDataType {
    Float,
    Vector3,
    Color3,
    Quaternion,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopMode {
    Relative,
    #[default]
    Cycle,
    Constant,
}

/// A keyframe
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationKey {
    pub frame: f32,
    pub value: PropertyValue,
}

/// A named event fired when playback reaches `frame`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationEvent {
    pub frame: f32,
    pub name: String,
    #[serde(default)]
    pub only_once: bool,
}

/// Keyframed animation of one property
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationTrack {
    pub name: String,
    /// Dotted property path on the owner, e.g. "position.y"
    pub target_property: String,
    pub frame_rate: f32,
    pub data_type: AnimationDataType,
    pub loop_mode: LoopMode,
    pub keys: Vec<AnimationKey>,
    pub events: Vec<AnimationEvent>,
    pub provenance: Provenance,
}

impl AnimationTrack {
    pub fn new(
        name: impl Into<String>,
        target_property: impl Into<String>,
        data_type: AnimationDataType,
    ) -> Self {
        Self {
            name: name.into(),
            target_property: target_property.into(),
            frame_rate: 60.0,
            data_type,
            loop_mode: LoopMode::Cycle,
            keys: Vec::new(),
            events: Vec::new(),
            provenance: Provenance::Native,
        }
    }

    pub fn with_key(mut self, frame: f32, value: impl Into<PropertyValue>) -> Self {
        self.keys.push(AnimationKey {
            frame,
            value: value.into(),
        });
        self
    }

    pub fn with_event(mut self, frame: f32, name: impl Into<String>) -> Self {
        self.events.push(AnimationEvent {
            frame,
            name: name.into(),
            only_once: false,
        });
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Last keyed frame, 0 for an empty track
    pub fn duration(&self) -> f32 {
        self.keys.iter().map(|k| k.frame).fold(0.0, f32::max)
    }
}

/// Trigger/action graph attached to a node or to the scene.
///
/// The graph itself is interpreted by the runtime; the editor only stores
/// its definition.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionGraph {
    pub definition: serde_json::Value,
    pub provenance: Provenance,
}

impl ActionGraph {
    pub fn new(definition: serde_json::Value) -> Self {
        Self {
            definition,
            provenance: Provenance::Native,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImpostorKind {
    Box,
    Sphere,
    Plane,
    Cylinder,
    Mesh,
    Heightmap,
}

/// Rigid body description attached to a mesh
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsImpostor {
    pub kind: ImpostorKind,
    pub mass: f32,
    pub friction: f32,
    pub restitution: f32,
    pub provenance: Provenance,
}

impl PhysicsImpostor {
    pub fn new(kind: ImpostorKind, mass: f32) -> Self {
        Self {
            kind,
            mass,
            friction: 0.2,
            restitution: 0.2,
            provenance: Provenance::Native,
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
