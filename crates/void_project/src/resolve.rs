//! Reference resolution for import
//!
//! References in a document point either at entities the document creates
//! (by id) or at entities of the base scene (by name). The resolver keeps
//! both tables and never fails: an unknown reference resolves to `None`
//! and the caller decides whether to skip, prune or report it.
//!
//! Links that need every entity to exist first (parents, render lists,
//! probe attachments, material assignment, 2D parents) are queued as
//! [`PendingLink`]s and flushed once the tables are complete.

use std::collections::BTreeMap;

use void_scene::{
    ContainerHandle, MaterialHandle, NodeHandle, RenderTargetHandle, Scene, SoundHandle,
};

use crate::document::EntityReference;

/// Snapshot of the native entities of the base scene, taken before the
/// import adds anything
#[derive(Clone, Debug, Default)]
pub struct BaseSceneHandle {
    nodes: BTreeMap<String, NodeHandle>,
    sounds: BTreeMap<String, SoundHandle>,
    containers: BTreeMap<String, ContainerHandle>,
    materials: BTreeMap<String, MaterialHandle>,
}

impl BaseSceneHandle {
    pub fn capture(scene: &Scene) -> Self {
        let mut base = Self::default();
        // First entity with a given name wins
        for (handle, node) in scene.nodes() {
            if !node.provenance.is_overlay() {
                base.nodes.entry(node.name.clone()).or_insert(handle);
            }
        }
        for (handle, sound) in scene.sounds() {
            if !sound.provenance.is_overlay() {
                base.sounds.entry(sound.name.clone()).or_insert(handle);
            }
        }
        for (handle, container) in scene.containers() {
            if !container.provenance.is_overlay() {
                base.containers.entry(container.name.clone()).or_insert(handle);
            }
        }
        for (handle, material) in scene.materials() {
            if !material.provenance.is_overlay() {
                base.materials.entry(material.name.clone()).or_insert(handle);
            }
        }
        log::debug!(
            "Captured base scene: {} nodes, {} sounds, {} materials",
            base.nodes.len(),
            base.sounds.len(),
            base.materials.len()
        );
        base
    }

    /// The only by-name path into the base scene
    pub fn resolve_native(&self, name: &str) -> Option<NodeHandle> {
        self.nodes.get(name).copied()
    }

    pub fn resolve_native_sound(&self, name: &str) -> Option<SoundHandle> {
        self.sounds.get(name).copied()
    }

    pub fn resolve_native_container(&self, name: &str) -> Option<ContainerHandle> {
        self.containers.get(name).copied()
    }

    pub fn resolve_native_material(&self, name: &str) -> Option<MaterialHandle> {
        self.materials.get(name).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Identifier tables for one import run
#[derive(Debug)]
pub struct ReferenceResolver {
    base: BaseSceneHandle,
    nodes_by_id: BTreeMap<String, NodeHandle>,
    nodes_by_name: BTreeMap<String, NodeHandle>,
    sounds_by_name: BTreeMap<String, SoundHandle>,
    containers_by_name: BTreeMap<String, ContainerHandle>,
    materials_by_name: BTreeMap<String, MaterialHandle>,
}

impl ReferenceResolver {
    pub fn new(base: BaseSceneHandle) -> Self {
        Self {
            base,
            nodes_by_id: BTreeMap::new(),
            nodes_by_name: BTreeMap::new(),
            sounds_by_name: BTreeMap::new(),
            containers_by_name: BTreeMap::new(),
            materials_by_name: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> &BaseSceneHandle {
        &self.base
    }

    /// Record a node created by the document
    pub fn register_node(&mut self, id: &str, name: &str, handle: NodeHandle) {
        self.nodes_by_id.insert(id.to_string(), handle);
        self.nodes_by_name.entry(name.to_string()).or_insert(handle);
    }

    pub fn register_sound(&mut self, name: &str, handle: SoundHandle) {
        self.sounds_by_name.entry(name.to_string()).or_insert(handle);
    }

    pub fn register_container(&mut self, name: &str, handle: ContainerHandle) {
        self.containers_by_name.entry(name.to_string()).or_insert(handle);
    }

    pub fn register_material(&mut self, name: &str, handle: MaterialHandle) {
        self.materials_by_name.insert(name.to_string(), handle);
    }

    /// Materials created by this import, by name
    pub fn materials(&self) -> &BTreeMap<String, MaterialHandle> {
        &self.materials_by_name
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.nodes_by_id.get(id).copied()
    }

    /// Ids resolve against the document, names against the base
    pub fn resolve_node(&self, reference: &EntityReference) -> Option<NodeHandle> {
        match reference {
            EntityReference::ById(id) => self.node_by_id(id),
            EntityReference::ByName(name) => self.base.resolve_native(name),
        }
    }

    /// Plain names: document-created nodes first, then the base
    pub fn resolve_node_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes_by_name
            .get(name)
            .copied()
            .or_else(|| self.base.resolve_native(name))
    }

    pub fn resolve_sound_name(&self, name: &str) -> Option<SoundHandle> {
        self.sounds_by_name
            .get(name)
            .copied()
            .or_else(|| self.base.resolve_native_sound(name))
    }

    pub fn resolve_container_name(&self, name: &str) -> Option<ContainerHandle> {
        self.containers_by_name
            .get(name)
            .copied()
            .or_else(|| self.base.resolve_native_container(name))
    }

    pub fn resolve_material_name(&self, name: &str) -> Option<MaterialHandle> {
        self.materials_by_name
            .get(name)
            .copied()
            .or_else(|| self.base.resolve_native_material(name))
    }
}

/// A reference that resolved to nothing when it was needed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingReference {
    /// What was being linked, e.g. "parent of 'crate'"
    pub context: String,
    /// The id or name that failed to resolve
    pub reference: String,
}

impl DanglingReference {
    pub fn new(context: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            reference: reference.into(),
        }
    }
}

impl std::fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}' not found", self.context, self.reference)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Parent,
    RenderListEntry,
    ProbeAttachment,
    MaterialAssignment,
    ContainerParent,
}

/// A link recorded while creating entities, applied on flush
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingLink {
    Parent {
        child: NodeHandle,
        parent: EntityReference,
    },
    RenderListEntry {
        target: RenderTargetHandle,
        mesh: EntityReference,
    },
    ProbeAttachment {
        target: RenderTargetHandle,
        mesh: EntityReference,
    },
    MaterialAssignment {
        material: MaterialHandle,
        mesh_name: String,
    },
    /// A created mesh naming its material, which may be native
    MeshMaterial {
        mesh: NodeHandle,
        material_name: String,
    },
    ContainerParent {
        child: ContainerHandle,
        parent_name: String,
    },
}

impl PendingLink {
    pub fn kind(&self) -> LinkKind {
        match self {
            PendingLink::Parent { .. } => LinkKind::Parent,
            PendingLink::RenderListEntry { .. } => LinkKind::RenderListEntry,
            PendingLink::ProbeAttachment { .. } => LinkKind::ProbeAttachment,
            PendingLink::MaterialAssignment { .. } | PendingLink::MeshMaterial { .. } => {
                LinkKind::MaterialAssignment
            }
            PendingLink::ContainerParent { .. } => LinkKind::ContainerParent,
        }
    }

    /// Apply the link; returns the dangling reference if it cannot be
    fn apply(self, scene: &mut Scene, resolver: &ReferenceResolver) -> Option<DanglingReference> {
        match self {
            PendingLink::Parent { child, parent } => {
                let child_name = scene.node(child).map(|n| n.name.clone()).unwrap_or_default();
                let context = format!("parent of '{}'", child_name);
                let Some(parent_handle) = resolver.resolve_node(&parent) else {
                    return Some(DanglingReference::new(context, parent.key()));
                };
                match scene.set_parent(child, Some(parent_handle)) {
                    Ok(()) => None,
                    Err(err) => {
                        log::warn!("Cannot parent '{}': {}", child_name, err);
                        Some(DanglingReference::new(context, parent.key()))
                    }
                }
            }
            PendingLink::RenderListEntry { target, mesh } => {
                let resolved = resolver.resolve_node(&mesh);
                let render_target = scene.render_target_mut(target)?;
                match resolved {
                    Some(handle) => {
                        render_target.render_list.push(handle);
                        None
                    }
                    None => Some(DanglingReference::new(
                        format!("render list of '{}'", render_target.name),
                        mesh.key(),
                    )),
                }
            }
            PendingLink::ProbeAttachment { target, mesh } => {
                let resolved = resolver.resolve_node(&mesh);
                let render_target = scene.render_target_mut(target)?;
                match resolved {
                    Some(handle) => {
                        render_target.attached_mesh = Some(handle);
                        None
                    }
                    None => Some(DanglingReference::new(
                        format!("probe '{}' attachment", render_target.name),
                        mesh.key(),
                    )),
                }
            }
            PendingLink::MaterialAssignment {
                material,
                mesh_name,
            } => {
                let material_name = scene
                    .material(material)
                    .map(|m| m.name.clone())
                    .unwrap_or_default();
                let context = format!("mesh using material '{}'", material_name);
                let mesh = resolver
                    .resolve_node_name(&mesh_name)
                    .and_then(|handle| scene.node_mut(handle))
                    .and_then(|node| node.as_mesh_mut());
                match mesh {
                    Some(mesh) => {
                        mesh.material = Some(material);
                        None
                    }
                    None => Some(DanglingReference::new(context, mesh_name)),
                }
            }
            PendingLink::MeshMaterial {
                mesh,
                material_name,
            } => {
                let mesh_name = scene.node(mesh).map(|n| n.name.clone()).unwrap_or_default();
                let context = format!("material of '{}'", mesh_name);
                let Some(material) = resolver.resolve_material_name(&material_name) else {
                    return Some(DanglingReference::new(context, material_name));
                };
                let mesh = scene.node_mut(mesh)?.as_mesh_mut()?;
                mesh.material = Some(material);
                None
            }
            PendingLink::ContainerParent { child, parent_name } => {
                let child_name = scene
                    .container(child)
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                let context = format!("parent of 2D container '{}'", child_name);
                let Some(parent) = resolver.resolve_container_name(&parent_name) else {
                    return Some(DanglingReference::new(context, parent_name));
                };
                match scene.set_container_parent(child, Some(parent)) {
                    Ok(()) => None,
                    Err(err) => {
                        log::warn!("Cannot parent 2D container '{}': {}", child_name, err);
                        Some(DanglingReference::new(context, parent_name))
                    }
                }
            }
        }
    }
}

/// Links waiting for the identifier tables to be complete
#[derive(Debug, Default)]
pub struct LinkQueue {
    links: Vec<PendingLink>,
}

impl LinkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, link: PendingLink) {
        self.links.push(link);
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Apply and remove every queued link of the given kinds, in the order
    /// they were queued. Each link is applied exactly once; the ones that
    /// do not resolve are logged and returned.
    pub fn flush(
        &mut self,
        kinds: &[LinkKind],
        scene: &mut Scene,
        resolver: &ReferenceResolver,
    ) -> Vec<DanglingReference> {
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.links)
            .into_iter()
            .partition(|link| kinds.contains(&link.kind()));
        self.links = waiting;

        let mut dangling = Vec::new();
        for link in ready {
            if let Some(missing) = link.apply(scene, resolver) {
                log::warn!("Unresolved link, {}", missing);
                dangling.push(missing);
            }
        }
        dangling
    }
}
