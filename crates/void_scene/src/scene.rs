//! The live scene graph
//!
//! `Scene` owns every object in typed arenas. Objects refer to each other
//! through handles; the string ids and names stored on the objects are what
//! survives serialization. Objects are never removed while the editor is
//! running, so arena iteration order is creation order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use void_core::{HandleMap, IdGenerator};

use crate::animation::{ActionGraph, AnimationTrack};
use crate::audio::{Sound, SoundHandle};
use crate::effects::{LensFlareSystem, LensFlareSystemHandle, ParticleSystem, ParticleSystemHandle};
use crate::error::{Result, SceneError};
use crate::geometry::{Geometry, GeometryHandle};
use crate::material::{Material, MaterialHandle};
use crate::node::{Node, NodeHandle};
use crate::overlay2d::{Container2D, ContainerHandle};
use crate::post_process::{PostProcess, PostProcessHandle};
use crate::rendering::{RenderTarget, RenderTargetHandle, ShadowCaster, ShadowCasterHandle};
use crate::texture::{Texture, TextureHandle};

/// Which kind of object an auto-start entry refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutoStartKind {
    Scene,
    Node,
    Sound,
    ParticleSystem,
}

/// An object whose animations (or emission) start when the game launches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutoStart {
    Scene,
    Node(NodeHandle),
    Sound(SoundHandle),
    ParticleSystem(ParticleSystemHandle),
}

impl AutoStart {
    pub fn kind(&self) -> AutoStartKind {
        match self {
            AutoStart::Scene => AutoStartKind::Scene,
            AutoStart::Node(_) => AutoStartKind::Node,
            AutoStart::Sound(_) => AutoStartKind::Sound,
            AutoStart::ParticleSystem(_) => AutoStartKind::ParticleSystem,
        }
    }
}

/// Launch-time playback configuration
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSettings {
    pub animation_speed: f32,
    pub frames_per_second: f32,
    pub autostart: Vec<AutoStart>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            animation_speed: 1.0,
            frames_per_second: 60.0,
            autostart: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Scene {
    pub name: String,
    nodes: HandleMap<Node>,
    geometries: HandleMap<Geometry>,
    materials: HandleMap<Material>,
    textures: HandleMap<Texture>,
    sounds: HandleMap<Sound>,
    particle_systems: HandleMap<ParticleSystem>,
    lens_flare_systems: HandleMap<LensFlareSystem>,
    shadow_casters: HandleMap<ShadowCaster>,
    render_targets: HandleMap<RenderTarget>,
    post_processes: HandleMap<PostProcess>,
    containers: HandleMap<Container2D>,
    /// Animations targeting the scene itself
    pub animations: Vec<AnimationTrack>,
    pub action_graph: Option<ActionGraph>,
    pub physics_enabled: bool,
    pub playback: PlaybackSettings,
    /// Extension data keyed by extension name
    pub custom_metadata: BTreeMap<String, serde_json::Value>,
    /// The editor's own viewport camera, never part of the project
    pub editor_camera: Option<NodeHandle>,
    ids: IdGenerator,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("scene")
    }
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: HandleMap::new(),
            geometries: HandleMap::new(),
            materials: HandleMap::new(),
            textures: HandleMap::new(),
            sounds: HandleMap::new(),
            particle_systems: HandleMap::new(),
            lens_flare_systems: HandleMap::new(),
            shadow_casters: HandleMap::new(),
            render_targets: HandleMap::new(),
            post_processes: HandleMap::new(),
            containers: HandleMap::new(),
            animations: Vec::new(),
            action_graph: None,
            physics_enabled: false,
            playback: PlaybackSettings::default(),
            custom_metadata: BTreeMap::new(),
            editor_camera: None,
            ids: IdGenerator::new(),
        }
    }

    /// Fresh unique id, e.g. `"mesh-12"`
    pub fn next_id(&self, prefix: &str) -> String {
        self.ids.next(prefix)
    }

    pub fn enable_physics(&mut self) {
        if !self.physics_enabled {
            log::info!("Enabling physics on scene '{}'", self.name);
            self.physics_enabled = true;
        }
    }

    // ---- nodes ----

    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        self.nodes.insert(node)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.nodes.find(|n| n.name == name)
    }

    pub fn find_node_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.nodes.find(|n| n.id == id)
    }

    /// Nodes without a parent, in creation order
    pub fn root_nodes(&self) -> Vec<NodeHandle> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(h, _)| h)
            .collect()
    }

    /// Returns true if `ancestor` is somewhere above `node`
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Re-parent `child`; `None` makes it a root node
    pub fn set_parent(&mut self, child: NodeHandle, parent: Option<NodeHandle>) -> Result<()> {
        if !self.nodes.contains(child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.nodes.contains(parent) {
                return Err(SceneError::NodeNotFound(parent));
            }
            // Child cannot be an ancestor of (or equal to) its new parent
            if child == parent || self.is_ancestor(child, parent) {
                return Err(SceneError::CycleDetected { child, parent });
            }
        }

        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(old) = old_parent {
            if let Some(node) = self.nodes.get_mut(old) {
                node.children.retain(|c| *c != child);
            }
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.push(child);
            }
        }
        Ok(())
    }

    // ---- geometry, materials, textures ----

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        self.geometries.insert(geometry)
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(handle)
    }

    pub fn find_geometry_by_id(&self, id: &str) -> Option<GeometryHandle> {
        self.geometries.find(|g| g.id == id)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials.iter()
    }

    pub fn find_material_by_name(&self, name: &str) -> Option<MaterialHandle> {
        self.materials.find(|m| m.name == name)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        self.textures.insert(texture)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle)
    }

    pub fn texture_mut(&mut self, handle: TextureHandle) -> Option<&mut Texture> {
        self.textures.get_mut(handle)
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureHandle, &Texture)> {
        self.textures.iter()
    }

    pub fn find_texture_by_name(&self, name: &str) -> Option<TextureHandle> {
        self.textures.find(|t| t.name == name)
    }

    // ---- sounds ----

    pub fn add_sound(&mut self, sound: Sound) -> SoundHandle {
        self.sounds.insert(sound)
    }

    pub fn sound(&self, handle: SoundHandle) -> Option<&Sound> {
        self.sounds.get(handle)
    }

    pub fn sound_mut(&mut self, handle: SoundHandle) -> Option<&mut Sound> {
        self.sounds.get_mut(handle)
    }

    pub fn sounds(&self) -> impl Iterator<Item = (SoundHandle, &Sound)> {
        self.sounds.iter()
    }

    pub fn find_sound_by_name(&self, name: &str) -> Option<SoundHandle> {
        self.sounds.find(|s| s.name == name)
    }

    // ---- emitter-hosted effects ----

    pub fn add_particle_system(&mut self, system: ParticleSystem) -> ParticleSystemHandle {
        self.particle_systems.insert(system)
    }

    pub fn particle_system(&self, handle: ParticleSystemHandle) -> Option<&ParticleSystem> {
        self.particle_systems.get(handle)
    }

    pub fn particle_system_mut(&mut self, handle: ParticleSystemHandle) -> Option<&mut ParticleSystem> {
        self.particle_systems.get_mut(handle)
    }

    pub fn particle_systems(&self) -> impl Iterator<Item = (ParticleSystemHandle, &ParticleSystem)> {
        self.particle_systems.iter()
    }

    pub fn find_particle_system_by_name(&self, name: &str) -> Option<ParticleSystemHandle> {
        self.particle_systems.find(|p| p.name == name)
    }

    pub fn particle_systems_for(&self, emitter: NodeHandle) -> Vec<ParticleSystemHandle> {
        self.particle_systems
            .iter()
            .filter(|(_, p)| p.emitter == emitter)
            .map(|(h, _)| h)
            .collect()
    }

    pub fn add_lens_flare_system(&mut self, system: LensFlareSystem) -> LensFlareSystemHandle {
        self.lens_flare_systems.insert(system)
    }

    pub fn lens_flare_system(&self, handle: LensFlareSystemHandle) -> Option<&LensFlareSystem> {
        self.lens_flare_systems.get(handle)
    }

    pub fn lens_flare_systems(&self) -> impl Iterator<Item = (LensFlareSystemHandle, &LensFlareSystem)> {
        self.lens_flare_systems.iter()
    }

    pub fn lens_flare_systems_for(&self, emitter: NodeHandle) -> Vec<LensFlareSystemHandle> {
        self.lens_flare_systems
            .iter()
            .filter(|(_, l)| l.emitter == emitter)
            .map(|(h, _)| h)
            .collect()
    }

    // ---- offscreen rendering ----

    pub fn add_shadow_caster(&mut self, caster: ShadowCaster) -> ShadowCasterHandle {
        self.shadow_casters.insert(caster)
    }

    pub fn shadow_caster(&self, handle: ShadowCasterHandle) -> Option<&ShadowCaster> {
        self.shadow_casters.get(handle)
    }

    pub fn shadow_caster_mut(&mut self, handle: ShadowCasterHandle) -> Option<&mut ShadowCaster> {
        self.shadow_casters.get_mut(handle)
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = (ShadowCasterHandle, &ShadowCaster)> {
        self.shadow_casters.iter()
    }

    /// A light owns at most one shadow caster
    pub fn shadow_caster_for_light(&self, light: NodeHandle) -> Option<ShadowCasterHandle> {
        self.shadow_casters.find(|c| c.light == light)
    }

    pub fn add_render_target(&mut self, target: RenderTarget) -> RenderTargetHandle {
        self.render_targets.insert(target)
    }

    pub fn render_target(&self, handle: RenderTargetHandle) -> Option<&RenderTarget> {
        self.render_targets.get(handle)
    }

    pub fn render_target_mut(&mut self, handle: RenderTargetHandle) -> Option<&mut RenderTarget> {
        self.render_targets.get_mut(handle)
    }

    pub fn render_targets(&self) -> impl Iterator<Item = (RenderTargetHandle, &RenderTarget)> {
        self.render_targets.iter()
    }

    pub fn find_render_target_by_id(&self, id: &str) -> Option<RenderTargetHandle> {
        self.render_targets.find(|r| r.id == id)
    }

    // ---- post-processes ----

    pub fn add_post_process(&mut self, post_process: PostProcess) -> PostProcessHandle {
        self.post_processes.insert(post_process)
    }

    pub fn post_process(&self, handle: PostProcessHandle) -> Option<&PostProcess> {
        self.post_processes.get(handle)
    }

    pub fn post_process_mut(&mut self, handle: PostProcessHandle) -> Option<&mut PostProcess> {
        self.post_processes.get_mut(handle)
    }

    pub fn post_processes(&self) -> impl Iterator<Item = (PostProcessHandle, &PostProcess)> {
        self.post_processes.iter()
    }

    pub fn find_post_process_by_name(&self, name: &str) -> Option<PostProcessHandle> {
        self.post_processes.find(|p| p.name == name)
    }

    // ---- 2D containers ----

    pub fn add_container(&mut self, container: Container2D) -> ContainerHandle {
        self.containers.insert(container)
    }

    pub fn container(&self, handle: ContainerHandle) -> Option<&Container2D> {
        self.containers.get(handle)
    }

    pub fn containers(&self) -> impl Iterator<Item = (ContainerHandle, &Container2D)> {
        self.containers.iter()
    }

    pub fn find_container_by_name(&self, name: &str) -> Option<ContainerHandle> {
        self.containers.find(|c| c.name == name)
    }

    pub fn set_container_parent(
        &mut self,
        child: ContainerHandle,
        parent: Option<ContainerHandle>,
    ) -> Result<()> {
        if !self.containers.contains(child) {
            return Err(SceneError::ContainerNotFound(child));
        }
        if let Some(parent) = parent {
            if !self.containers.contains(parent) {
                return Err(SceneError::ContainerNotFound(parent));
            }
            let mut current = Some(parent);
            while let Some(handle) = current {
                if handle == child {
                    return Err(SceneError::ContainerCycle { child, parent });
                }
                current = self.containers.get(handle).and_then(|c| c.parent);
            }
        }
        if let Some(container) = self.containers.get_mut(child) {
            container.parent = parent;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::LightData;
    use crate::rendering::ShadowCaster;

    #[test]
    fn test_root_nodes_in_creation_order() {
        let mut scene = Scene::new("test");
        let a = scene.add_node(Node::mesh("a", "a"));
        let b = scene.add_node(Node::mesh("b", "b"));
        let c = scene.add_node(Node::mesh("c", "c"));
        scene.set_parent(b, Some(a)).unwrap();

        assert_eq!(scene.root_nodes(), vec![a, c]);
        assert_eq!(scene.node(a).unwrap().children(), &[b]);
        assert_eq!(scene.node(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut scene = Scene::new("test");
        let a = scene.add_node(Node::mesh("a", "a"));
        let b = scene.add_node(Node::mesh("b", "b"));
        let c = scene.add_node(Node::mesh("c", "c"));
        scene.set_parent(b, Some(a)).unwrap();
        scene.set_parent(c, Some(b)).unwrap();

        assert!(matches!(
            scene.set_parent(a, Some(c)),
            Err(SceneError::CycleDetected { .. })
        ));
        assert!(matches!(
            scene.set_parent(a, Some(a)),
            Err(SceneError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut scene = Scene::new("test");
        let a = scene.add_node(Node::mesh("a", "a"));
        let b = scene.add_node(Node::mesh("b", "b"));
        let c = scene.add_node(Node::mesh("c", "c"));
        scene.set_parent(c, Some(a)).unwrap();
        scene.set_parent(c, Some(b)).unwrap();

        assert!(scene.node(a).unwrap().children().is_empty());
        assert_eq!(scene.node(b).unwrap().children(), &[c]);

        scene.set_parent(c, None).unwrap();
        assert_eq!(scene.root_nodes(), vec![a, b, c]);
    }

    #[test]
    fn test_lookups() {
        let mut scene = Scene::new("test");
        let light = scene.add_node(Node::light("light-1", "sun", LightData::default()));
        let caster = scene.add_shadow_caster(ShadowCaster::new(light));

        assert_eq!(scene.find_node_by_name("sun"), Some(light));
        assert_eq!(scene.find_node_by_id("light-1"), Some(light));
        assert_eq!(scene.find_node_by_name("moon"), None);
        assert_eq!(scene.shadow_caster_for_light(light), Some(caster));
    }

    #[test]
    fn test_container_cycle() {
        let mut scene = Scene::new("test");
        let a = scene.add_container(Container2D::new("a", "group2d"));
        let b = scene.add_container(Container2D::new("b", "group2d"));
        scene.set_container_parent(b, Some(a)).unwrap();

        assert!(matches!(
            scene.set_container_parent(a, Some(b)),
            Err(SceneError::ContainerCycle { .. })
        ));
        assert_eq!(scene.container(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_ids_are_unique() {
        let scene = Scene::new("test");
        let a = scene.next_id("mesh");
        let b = scene.next_id("mesh");
        assert_ne!(a, b);
    }
}
