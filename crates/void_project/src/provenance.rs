//! Provenance filter
//!
//! Decides what a project document persists. Overlay entities are written
//! in full; native entities are written only when they carry user-made
//! behaviors (a "delta"), and then only those behaviors.

use void_scene::{
    ActionGraph, AnimationTrack, Material, Node, PhysicsImpostor, Provenance, Scene, Sound,
};

/// Anything that can appear as a record in `nodes[]`
pub trait OverlaySubject {
    fn provenance(&self) -> Provenance;
    fn animations(&self) -> &[AnimationTrack];

    fn action_graph(&self) -> Option<&ActionGraph> {
        None
    }

    fn physics(&self) -> Option<&PhysicsImpostor> {
        None
    }
}

impl OverlaySubject for Node {
    fn provenance(&self) -> Provenance {
        self.provenance
    }

    fn animations(&self) -> &[AnimationTrack] {
        &self.animations
    }

    fn action_graph(&self) -> Option<&ActionGraph> {
        self.action_graph.as_ref()
    }

    fn physics(&self) -> Option<&PhysicsImpostor> {
        self.physics.as_ref()
    }
}

impl OverlaySubject for Sound {
    fn provenance(&self) -> Provenance {
        self.provenance
    }

    fn animations(&self) -> &[AnimationTrack] {
        &self.animations
    }
}

/// The scene singleton always exists in the base, so it only has deltas.
/// Its action graph is written at the document root, not on its record.
impl OverlaySubject for Scene {
    fn provenance(&self) -> Provenance {
        Provenance::Native
    }

    fn animations(&self) -> &[AnimationTrack] {
        &self.animations
    }
}

pub fn classify<T: OverlaySubject + ?Sized>(entity: &T) -> Provenance {
    entity.provenance()
}

/// Any behavior whose own provenance is overlay
pub fn has_qualifying_delta<T: OverlaySubject + ?Sized>(entity: &T) -> bool {
    entity.animations().iter().any(|a| a.provenance.is_overlay())
        || entity.action_graph().is_some_and(|g| g.provenance.is_overlay())
        || entity.physics().is_some_and(|p| p.provenance.is_overlay())
}

/// Whether the entity gets a record at all
pub fn should_emit<T: OverlaySubject + ?Sized>(entity: &T) -> bool {
    classify(entity).is_overlay() || has_qualifying_delta(entity)
}

/// Behaviors to persist: all of them for overlay entities, only the
/// overlay ones for native entities
pub fn persisted_animations<T: OverlaySubject + ?Sized>(entity: &T) -> Vec<&AnimationTrack> {
    let whole = classify(entity).is_overlay();
    entity
        .animations()
        .iter()
        .filter(|a| whole || a.provenance.is_overlay())
        .collect()
}

pub fn persisted_action_graph<T: OverlaySubject + ?Sized>(entity: &T) -> Option<&ActionGraph> {
    let whole = classify(entity).is_overlay();
    entity
        .action_graph()
        .filter(|g| whole || g.provenance.is_overlay())
}

pub fn persisted_physics<T: OverlaySubject + ?Sized>(entity: &T) -> Option<&PhysicsImpostor> {
    let whole = classify(entity).is_overlay();
    entity.physics().filter(|p| whole || p.provenance.is_overlay())
}

/// Materials of a kind the base asset format cannot carry are always
/// recorded, even when native
pub fn should_record_material(material: &Material) -> bool {
    material.provenance.is_overlay() || !material.kind.is_builtin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::{AnimationDataType, ImpostorKind, MaterialKind};

    #[test]
    fn test_native_node_without_deltas_is_skipped() {
        let node = Node::mesh("m", "ground");
        assert!(!should_emit(&node));
    }

    #[test]
    fn test_native_node_with_overlay_track() {
        let mut node = Node::mesh("m", "ground");
        node.animations.push(AnimationTrack::new("base", "position.x", AnimationDataType::Float));
        node.animations.push(
            AnimationTrack::new("user", "position.y", AnimationDataType::Float)
                .with_provenance(Provenance::Overlay),
        );

        assert!(has_qualifying_delta(&node));
        assert!(should_emit(&node));
        let tracks = persisted_animations(&node);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "user");
    }

    #[test]
    fn test_overlay_node_persists_everything() {
        let mut node = Node::mesh("m", "crate").with_provenance(Provenance::Overlay);
        node.animations.push(AnimationTrack::new("spin", "rotation.y", AnimationDataType::Float));
        node.physics = Some(PhysicsImpostor::new(ImpostorKind::Box, 1.0));

        assert!(!has_qualifying_delta(&node));
        assert!(should_emit(&node));
        assert_eq!(persisted_animations(&node).len(), 1);
        assert!(persisted_physics(&node).is_some());
    }

    #[test]
    fn test_material_rule() {
        let native = Material::new("a", "a", MaterialKind::Standard);
        let custom = Material::new("b", "b", MaterialKind::Custom("water".into()));
        let overlay = Material::new("c", "c", MaterialKind::Pbr).with_provenance(Provenance::Overlay);

        assert!(!should_record_material(&native));
        assert!(should_record_material(&custom));
        assert!(should_record_material(&overlay));
    }
}
