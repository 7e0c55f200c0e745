//! Scene graph nodes
//!
//! A node is anything that sits in the transform hierarchy: meshes,
//! instances of meshes, lights and cameras. Portable settings live in
//! serde-friendly structs; links to other scene objects are handles and
//! never serialized directly.

use serde::{Deserialize, Serialize};
use void_core::Handle;

use crate::animation::{ActionGraph, AnimationTrack, PhysicsImpostor};
use crate::geometry::GeometryHandle;
use crate::material::MaterialHandle;
use crate::provenance::Provenance;

/// Handle to a [`Node`] in a [`crate::Scene`]
pub type NodeHandle = Handle<Node>;

fn one() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_true() -> bool {
    true
}

/// Local transform relative to the parent (or world if root)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "one")]
    pub scaling: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scaling: one(),
        }
    }
}

impl Transform {
    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

/// Discriminant of [`NodeKind`], used where only the kind is known
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKindTag {
    Mesh,
    InstancedMesh,
    Light,
    Camera,
}

/// Kind-specific node data
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Mesh(MeshData),
    InstancedMesh(InstanceData),
    Light(LightData),
    Camera(CameraData),
}

impl NodeKind {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::Mesh(_) => NodeKindTag::Mesh,
            NodeKind::InstancedMesh(_) => NodeKindTag::InstancedMesh,
            NodeKind::Light(_) => NodeKindTag::Light,
            NodeKind::Camera(_) => NodeKindTag::Camera,
        }
    }
}

/// Mesh component: geometry, material and render flags
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// `None` for empty meshes such as emitter placeholders
    pub geometry: Option<GeometryHandle>,
    pub material: Option<MaterialHandle>,
    pub settings: MeshSettings,
}

/// Portable mesh flags
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshSettings {
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub receive_shadows: bool,
    #[serde(default = "default_true")]
    pub pickable: bool,
    #[serde(default)]
    pub check_collisions: bool,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            visible: true,
            receive_shadows: false,
            pickable: true,
            check_collisions: false,
        }
    }
}

/// Instance of another mesh sharing its geometry and material
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceData {
    pub source: NodeHandle,
}

/// Light type with its type-specific parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LightKind {
    Point,
    Directional {
        direction: [f32; 3],
    },
    #[serde(rename_all = "camelCase")]
    Spot {
        direction: [f32; 3],
        angle: f32,
        exponent: f32,
    },
    #[serde(rename_all = "camelCase")]
    Hemispheric {
        direction: [f32; 3],
        ground_color: [f32; 3],
    },
}

/// Portable light parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightData {
    pub kind: LightKind,
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub intensity: f32,
    pub range: f32,
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
            intensity: 1.0,
            range: f32::MAX,
        }
    }
}

/// Camera type with its type-specific parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CameraKind {
    Free {
        #[serde(default)]
        target: Option<[f32; 3]>,
    },
    ArcRotate {
        alpha: f32,
        beta: f32,
        radius: f32,
        target: [f32; 3],
    },
}

/// Portable camera parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraData {
    pub kind: CameraKind,
    pub fov: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub speed: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            kind: CameraKind::Free { target: None },
            fov: 0.8,
            min_z: 1.0,
            max_z: 10_000.0,
            speed: 2.0,
        }
    }
}

/// A node in the scene hierarchy
#[derive(Clone, Debug)]
pub struct Node {
    /// Stable identifier, written into documents for overlay nodes
    pub id: String,
    /// Display name, used to address native nodes
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub enabled: bool,
    pub provenance: Provenance,
    pub animations: Vec<AnimationTrack>,
    pub action_graph: Option<ActionGraph>,
    pub physics: Option<PhysicsImpostor>,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            transform: Transform::default(),
            enabled: true,
            provenance: Provenance::Native,
            animations: Vec::new(),
            action_graph: None,
            physics: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Empty mesh with no geometry
    pub fn mesh(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeKind::Mesh(MeshData::default()))
    }

    pub fn light(id: impl Into<String>, name: impl Into<String>, data: LightData) -> Self {
        Self::new(id, name, NodeKind::Light(data))
    }

    pub fn camera(id: impl Into<String>, name: impl Into<String>, data: CameraData) -> Self {
        Self::new(id, name, NodeKind::Camera(data))
    }

    pub fn instance(id: impl Into<String>, name: impl Into<String>, source: NodeHandle) -> Self {
        Self::new(id, name, NodeKind::InstancedMesh(InstanceData { source }))
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_geometry(mut self, geometry: GeometryHandle) -> Self {
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            mesh.geometry = Some(geometry);
        }
        self
    }

    pub fn with_material(mut self, material: MaterialHandle) -> Self {
        if let NodeKind::Mesh(mesh) = &mut self.kind {
            mesh.material = Some(material);
        }
        self
    }

    pub fn kind_tag(&self) -> NodeKindTag {
        self.kind.tag()
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn as_mesh(&self) -> Option<&MeshData> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshData> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self.kind, NodeKind::Light(_))
    }

    /// Meshes and instances can be render-list members and material users
    pub fn is_mesh_like(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_) | NodeKind::InstancedMesh(_))
    }
}
