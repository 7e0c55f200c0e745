//! Export then import against a fresh base scene
//!
//! Every test builds the same base scene twice: once to edit and export,
//! once to import into.

use void_project::prelude::*;
use void_project::{EntityReference, ExportOptions};
use void_scene::codec::PropertyMaterialCodec;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn base_scene() -> Scene {
    let mut scene = Scene::new("level");
    let ground_geometry = scene.add_geometry(Geometry::quad("geo-ground"));
    let stone = scene.add_material(Material::new("mat-stone", "stone", MaterialKind::Standard));
    scene.add_node(
        Node::mesh("native-ground", "ground")
            .with_geometry(ground_geometry)
            .with_material(stone),
    );
    scene.add_node(Node::mesh("native-door", "door"));
    scene
}

fn overlay_mesh(scene: &mut Scene, id: &str, name: &str) -> NodeHandle {
    let geometry = scene.add_geometry(Geometry::quad(format!("geo-{}", id)));
    scene.add_node(
        Node::mesh(id, name)
            .with_geometry(geometry)
            .with_provenance(Provenance::Overlay),
    )
}

fn export(scene: &Scene) -> ExportOutput {
    let codecs = CodecRegistry::new();
    ProjectExporter::new(&codecs).export(scene).unwrap()
}

fn import(text: &str) -> (Scene, ImportReport) {
    let codecs = CodecRegistry::new();
    let mut scene = base_scene();
    let report = ProjectImporter::new(&codecs).import(&mut scene, text).unwrap();
    (scene, report)
}

#[test]
fn test_new_mesh_survives_round_trip() {
    init_logging();
    let mut edited = base_scene();
    let crate_mesh = overlay_mesh(&mut edited, "mesh-1", "crate");
    let wood = edited.add_material(
        Material::new("mat-wood", "wood", MaterialKind::Pbr)
            .with_property("metallic", 0.5)
            .with_provenance(Provenance::Overlay),
    );
    edited.node_mut(crate_mesh).unwrap().as_mesh_mut().unwrap().material = Some(wood);

    let output = export(&edited);
    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.created.nodes, 1);
    assert_eq!(report.created.materials, 1);

    let imported = scene.find_node_by_name("crate").unwrap();
    let node = scene.node(imported).unwrap();
    assert_eq!(node.id, "mesh-1");
    assert_eq!(node.provenance, Provenance::Overlay);

    let mesh = node.as_mesh().unwrap();
    let geometry = scene.geometry(mesh.geometry.unwrap()).unwrap();
    assert_eq!(geometry.id, "geo-mesh-1");
    assert_eq!(geometry.indices.len(), 6);

    let material = scene.material(mesh.material.unwrap()).unwrap();
    assert_eq!(material.name, "wood");
    assert_eq!(material.kind, MaterialKind::Pbr);
    assert_eq!(material.properties["metallic"], PropertyValue::Number(0.5));
}

#[test]
fn test_untouched_native_entities_are_not_recorded() {
    let edited = base_scene();
    let output = export(&edited);

    assert!(output.document.nodes.is_empty());
    assert!(output.document.materials.is_empty());
    assert!(output.document.find_node("ground").is_none());
    assert!(!output.text.contains("\"ground\""));
    assert!(!output.text.contains("stone"));
}

#[test]
fn test_shared_material_is_written_once() {
    let mut edited = base_scene();
    let a = overlay_mesh(&mut edited, "mesh-a", "crate-a");
    let b = overlay_mesh(&mut edited, "mesh-b", "crate-b");
    let paint = edited.add_material(
        Material::new("mat-paint", "paint", MaterialKind::Standard)
            .with_property("diffuse", [1.0f32, 0.0, 0.0])
            .with_provenance(Provenance::Overlay),
    );
    for mesh in [a, b] {
        edited.node_mut(mesh).unwrap().as_mesh_mut().unwrap().material = Some(paint);
    }

    let output = export(&edited);
    assert_eq!(output.document.materials.len(), 1);
    assert_eq!(output.document.materials[0].mesh_names, vec!["crate-a", "crate-b"]);

    let (scene, _) = import(&output.text);
    let material_of = |name: &str| {
        let node = scene.find_node_by_name(name).unwrap();
        scene.node(node).unwrap().as_mesh().unwrap().material
    };
    assert!(material_of("crate-a").is_some());
    assert_eq!(material_of("crate-a"), material_of("crate-b"));
}

#[test]
fn test_emitter_placeholder_is_resynthesized() {
    init_logging();
    let mut edited = Scene::new("level");
    let placeholder = edited.add_node(
        Node::mesh("placeholder-1", "sparks-emitter")
            .with_position([1.0, 2.0, 3.0])
            .with_provenance(Provenance::OverlayPlaceholder),
    );
    edited.add_particle_system(
        ParticleSystem::new("ps-1", "sparks", placeholder).with_provenance(Provenance::Overlay),
    );

    let output = export(&edited);
    let record = &output.document.particle_systems[0];
    assert!(!record.has_emitter);
    assert_eq!(record.emitter_position, Some([1.0, 2.0, 3.0]));
    let node_record = output.document.find_node("sparks-emitter").unwrap();
    assert!(node_record.payload.is_none());

    let codecs = CodecRegistry::new();
    let mut scene = Scene::new("empty");
    let report = ProjectImporter::new(&codecs)
        .import(&mut scene, &output.text)
        .unwrap();
    assert_eq!(report.created.placeholders, 1);

    let placeholders: Vec<_> = scene
        .nodes()
        .filter(|(_, node)| node.provenance == Provenance::OverlayPlaceholder)
        .map(|(handle, _)| handle)
        .collect();
    assert_eq!(placeholders.len(), 1);
    let node = scene.node(placeholders[0]).unwrap();
    assert_eq!(node.transform.position, [1.0, 2.0, 3.0]);

    let system = scene.find_particle_system_by_name("sparks").unwrap();
    assert_eq!(scene.particle_system(system).unwrap().emitter, placeholders[0]);
}

#[test]
fn test_binary_payloads_are_byte_identical() {
    let mut edited = base_scene();
    let mesh = overlay_mesh(&mut edited, "mesh-1", "sign");
    let full: Vec<u8> = (0..=255).collect();
    let pattern = edited.add_texture(Texture::image("pattern.png", full.clone()));
    let blank = edited.add_texture(Texture::image("blank.png", Vec::new()));
    let material = edited.add_material(
        Material::new("mat-sign", "sign-paint", MaterialKind::Standard)
            .with_texture("diffuse", pattern)
            .with_texture("opacity", blank)
            .with_provenance(Provenance::Overlay),
    );
    edited.node_mut(mesh).unwrap().as_mesh_mut().unwrap().material = Some(material);
    edited.add_sound(
        Sound::new("theme")
            .with_buffer(vec![0, 1, 2, 254, 255])
            .with_provenance(Provenance::Overlay),
    );
    edited.add_sound(
        Sound::new("silence")
            .with_buffer(Vec::new())
            .with_provenance(Provenance::Overlay),
    );

    let output = export(&edited);
    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);

    let texture = |name: &str| {
        let handle = scene.find_texture_by_name(name).unwrap();
        scene.texture(handle).unwrap().buffer.clone()
    };
    assert_eq!(texture("pattern.png"), Some(full));
    assert_eq!(texture("blank.png"), Some(Vec::new()));

    let sound = |name: &str| {
        let handle = scene.find_sound_by_name(name).unwrap();
        scene.sound(handle).unwrap().buffer.clone()
    };
    assert_eq!(sound("theme"), Some(vec![0, 1, 2, 254, 255]));
    assert_eq!(sound("silence"), Some(Vec::new()));
}

#[test]
fn test_export_is_idempotent() {
    let mut edited = base_scene();
    let lamp = edited.add_node(
        Node::light("light-1", "lamp", LightData::default()).with_provenance(Provenance::Overlay),
    );
    let crate_mesh = overlay_mesh(&mut edited, "mesh-1", "crate");
    edited.set_parent(crate_mesh, Some(lamp)).unwrap();

    let first = export(&edited);
    let second = export(&edited);
    assert_eq!(first.text, second.text);
    assert_eq!(first.document, second.document);
}

#[test]
fn test_unknown_material_kind_falls_back_to_default() {
    init_logging();
    let mut edited = base_scene();
    let floor = overlay_mesh(&mut edited, "mesh-1", "floor");
    let lava = edited.add_material(
        Material::new("mat-lava", "lava", MaterialKind::Custom("lava".into()))
            .with_property("flowSpeed", 2.0),
    );
    edited.node_mut(floor).unwrap().as_mesh_mut().unwrap().material = Some(lava);

    let mut writer_codecs = CodecRegistry::new();
    writer_codecs.register_material_codec(Box::new(PropertyMaterialCodec::new(
        MaterialKind::Custom("lava".into()),
    )));
    let output = ProjectExporter::new(&writer_codecs)
        .with_options(ExportOptions {
            request_material_kinds: true,
            ..Default::default()
        })
        .export(&edited)
        .unwrap();
    // Native, but a kind the base format cannot carry
    assert_eq!(output.document.materials.len(), 1);
    assert_eq!(output.requested_material_kinds, vec!["lava"]);
    assert_eq!(output.document.requested_material_kinds, Some(vec!["lava".to_string()]));

    let (scene, report) = import(&output.text);
    assert!(report.skipped.is_empty());
    let floor = scene.find_node_by_name("floor").unwrap();
    let material = scene.node(floor).unwrap().as_mesh().unwrap().material.unwrap();
    let material = scene.material(material).unwrap();
    assert_eq!(material.kind, MaterialKind::Standard);
    assert_eq!(material.properties["flowSpeed"], PropertyValue::Number(2.0));
}

#[test]
fn test_native_entity_delta_is_reapplied() {
    let mut edited = base_scene();
    let door = edited.find_node_by_name("door").unwrap();
    edited.node_mut(door).unwrap().animations.push(
        AnimationTrack::new("open", "rotation.y", AnimationDataType::Float)
            .with_key(0.0, 0.0)
            .with_key(30.0, 1.5)
            .with_event(30.0, "opened")
            .with_provenance(Provenance::Overlay),
    );

    let output = export(&edited);
    let record = output.document.find_node("door").unwrap();
    assert!(record.payload.is_none());
    assert_eq!(record.animation_tracks.len(), 1);
    assert_eq!(record.animation_tracks[0].events[0].frame, 30.0);

    let (scene, report) = import(&output.text);
    assert_eq!(report.updated_nodes, 1);
    assert_eq!(report.created.nodes, 0);

    let door = scene.find_node_by_name("door").unwrap();
    let node = scene.node(door).unwrap();
    assert_eq!(node.provenance, Provenance::Native);
    assert_eq!(node.animations.len(), 1);
    let track = &node.animations[0];
    assert_eq!(track.name, "open");
    assert_eq!(track.provenance, Provenance::Overlay);
    assert_eq!(track.keys.len(), 2);
    assert_eq!(track.events.len(), 1);
    assert_eq!(track.events[0].name, "opened");
}

#[test]
fn test_hierarchy_links_native_parent() {
    let mut edited = base_scene();
    let ground = edited.find_node_by_name("ground").unwrap();
    let lantern = overlay_mesh(&mut edited, "mesh-1", "lantern");
    let wick = overlay_mesh(&mut edited, "mesh-2", "wick");
    edited.set_parent(lantern, Some(ground)).unwrap();
    edited.set_parent(wick, Some(lantern)).unwrap();

    let output = export(&edited);
    assert_eq!(
        output.document.find_node("lantern").unwrap().parent,
        Some(EntityReference::ByName("ground".into()))
    );
    assert_eq!(
        output.document.find_node("wick").unwrap().parent,
        Some(EntityReference::ById("mesh-1".into()))
    );

    let (scene, report) = import(&output.text);
    assert!(report.dangling.is_empty());
    let ground = scene.find_node_by_name("ground").unwrap();
    let lantern = scene.find_node_by_name("lantern").unwrap();
    let wick = scene.find_node_by_name("wick").unwrap();
    assert_eq!(scene.node(lantern).unwrap().parent(), Some(ground));
    assert_eq!(scene.node(wick).unwrap().parent(), Some(lantern));
}

#[test]
fn test_probe_and_render_list_round_trip() {
    let mut edited = base_scene();
    let ground = edited.find_node_by_name("ground").unwrap();
    let ball = overlay_mesh(&mut edited, "mesh-1", "ball");
    let texture = edited.add_texture(
        Texture::render_target("probe-tex", TextureKind::ReflectionProbe)
            .with_provenance(Provenance::Overlay),
    );
    let mut probe = RenderTarget::new("rt-1", "probe", RenderTargetKind::ReflectionProbe, texture)
        .with_provenance(Provenance::Overlay);
    probe.attached_mesh = Some(ball);
    probe.render_list = vec![ground, ball];
    edited.add_render_target(probe);

    let output = export(&edited);
    let record = &output.document.render_targets[0];
    assert!(record.is_probe);
    assert_eq!(record.render_list.len(), 2);

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    let probe = scene.find_render_target_by_id("rt-1").unwrap();
    let probe = scene.render_target(probe).unwrap();
    let ball = scene.find_node_by_name("ball").unwrap();
    let ground = scene.find_node_by_name("ground").unwrap();
    assert_eq!(probe.attached_mesh, Some(ball));
    assert_eq!(probe.render_list, vec![ground, ball]);
    assert_eq!(scene.texture(probe.texture).unwrap().name, "probe-tex");
}

#[test]
fn test_playback_and_post_processes_round_trip() {
    let mut edited = base_scene();
    let crate_mesh = overlay_mesh(&mut edited, "mesh-1", "crate");
    let door = edited.find_node_by_name("door").unwrap();
    edited.playback.animation_speed = 2.0;
    edited.playback.frames_per_second = 30.0;
    edited.playback.autostart = vec![
        AutoStart::Scene,
        AutoStart::Node(crate_mesh),
        AutoStart::Node(door),
    ];
    edited.add_post_process(
        PostProcess::new("glow", "bloom")
            .with_setting("threshold", 0.8)
            .detached()
            .with_provenance(Provenance::Overlay),
    );

    let output = export(&edited);
    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);

    assert_eq!(scene.playback.animation_speed, 2.0);
    assert_eq!(scene.playback.frames_per_second, 30.0);
    let crate_mesh = scene.find_node_by_name("crate").unwrap();
    let door = scene.find_node_by_name("door").unwrap();
    assert_eq!(
        scene.playback.autostart,
        vec![AutoStart::Scene, AutoStart::Node(crate_mesh), AutoStart::Node(door)]
    );

    let glow = scene.find_post_process_by_name("glow").unwrap();
    let glow = scene.post_process(glow).unwrap();
    assert_eq!(glow.kind, "bloom");
    assert!(!glow.attached);
}

#[test]
fn test_containers_are_reparented_by_name() {
    let mut edited = base_scene();
    let hud = edited
        .add_container(Container2D::new("hud", "group2d").with_provenance(Provenance::Overlay));
    let score = edited.add_container(
        Container2D::new("score", "text2d")
            .with_property("text", "0")
            .with_provenance(Provenance::Overlay),
    );
    edited.set_container_parent(score, Some(hud)).unwrap();

    let output = export(&edited);
    assert_eq!(output.document.scene_2d.len(), 2);
    assert_eq!(output.document.scene_2d[1].parent_name.as_deref(), Some("hud"));

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    let hud = scene.find_container_by_name("hud").unwrap();
    let score = scene.find_container_by_name("score").unwrap();
    assert_eq!(scene.container(score).unwrap().parent(), Some(hud));
    assert_eq!(
        scene.container(score).unwrap().properties["text"],
        PropertyValue::Text("0".into())
    );
}

#[test]
fn test_created_mesh_keeps_base_material() {
    init_logging();
    let mut edited = base_scene();
    let crate_mesh = overlay_mesh(&mut edited, "mesh-1", "crate");
    let stone = edited.find_material_by_name("stone").unwrap();
    edited.node_mut(crate_mesh).unwrap().as_mesh_mut().unwrap().material = Some(stone);

    let output = export(&edited);
    assert!(output.document.materials.is_empty());
    let record = output.document.find_node("crate").unwrap();
    assert_eq!(record.material_name.as_deref(), Some("stone"));

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.created.materials, 0);
    let crate_mesh = scene.find_node_by_name("crate").unwrap();
    let material = scene.node(crate_mesh).unwrap().as_mesh().unwrap().material;
    assert_eq!(material, scene.find_material_by_name("stone"));
    let material = scene.material(material.unwrap()).unwrap();
    assert_eq!(material.kind, MaterialKind::Standard);
    assert_eq!(material.provenance, Provenance::Native);
}

#[test]
fn test_lens_flares_round_trip_with_textures() {
    let mut edited = base_scene();
    let lamp = edited.add_node(
        Node::light("light-1", "lamp", LightData::default()).with_provenance(Provenance::Overlay),
    );
    let flare_bytes = vec![7, 0, 7, 255];
    let glint = edited.add_texture(Texture::image("glint.png", flare_bytes.clone()));
    edited.add_lens_flare_system(
        LensFlareSystem::new("lf-1", "sun-flare", lamp)
            .with_flare(LensFlare::new(0.2, 0.0, [1.0, 1.0, 1.0]).with_texture(glint))
            .with_flare(LensFlare::new(0.5, 0.6, [1.0, 0.5, 0.0]))
            .with_provenance(Provenance::Overlay),
    );

    let output = export(&edited);
    let record = &output.document.lens_flare_systems[0];
    assert_eq!(record.emitter, EntityReference::ById("light-1".into()));
    assert_eq!(record.flares.len(), 2);
    let first = record.flares[0].as_ref().unwrap();
    assert_eq!(first.flare_name, "glint.png");
    assert_eq!(first.flare_buffer, "BwAH/w==");
    assert!(record.flares[1].is_none());

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.created.lens_flare_systems, 1);

    let lamp = scene.find_node_by_name("lamp").unwrap();
    let (_, system) = scene.lens_flare_systems().next().unwrap();
    assert_eq!(system.name, "sun-flare");
    assert_eq!(system.emitter, lamp);
    assert_eq!(system.flares.len(), 2);
    assert_eq!(system.flares[1].position, 0.6);
    assert!(system.flares[1].texture.is_none());
    let texture = scene.texture(system.flares[0].texture.unwrap()).unwrap();
    assert_eq!(texture.name, "glint.png");
    assert_eq!(texture.buffer, Some(flare_bytes));
}

#[test]
fn test_multi_material_registers_sub_materials_first() {
    let mut edited = base_scene();
    let panel = overlay_mesh(&mut edited, "mesh-1", "panel");
    let red = edited.add_material(
        Material::new("mat-red", "red", MaterialKind::Standard)
            .with_property("diffuse", [1.0f32, 0.0, 0.0])
            .with_provenance(Provenance::Overlay),
    );
    let stone = edited.find_material_by_name("stone").unwrap();
    let mut multi = Material::new("mat-multi", "panel-multi", MaterialKind::Multi)
        .with_provenance(Provenance::Overlay);
    multi.sub_materials = vec![Some(red), None, Some(stone)];
    let multi = edited.add_material(multi);
    edited.node_mut(panel).unwrap().as_mesh_mut().unwrap().material = Some(multi);

    let output = export(&edited);
    let materials = &output.document.materials;
    // The native built-in sub-material stays in the base
    assert_eq!(materials.len(), 2);
    let flags: Vec<bool> = materials.iter().map(|m| m.is_new_instance).collect();
    assert_eq!(flags, vec![false, true]);
    assert!(materials[0].mesh_names.is_empty());
    assert_eq!(materials[1].mesh_names, vec!["panel"]);

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.created.materials, 2);

    let panel = scene.find_node_by_name("panel").unwrap();
    let multi = scene.node(panel).unwrap().as_mesh().unwrap().material.unwrap();
    let multi = scene.material(multi).unwrap();
    assert_eq!(multi.name, "panel-multi");
    assert_eq!(multi.kind, MaterialKind::Multi);
    assert_eq!(
        multi.sub_materials,
        vec![
            scene.find_material_by_name("red"),
            None,
            scene.find_material_by_name("stone"),
        ]
    );
}

#[test]
fn test_children_of_editor_camera_are_exported() {
    let mut edited = base_scene();
    let camera = edited.add_node(
        Node::camera("camera-editor", "editor camera", CameraData::default())
            .with_provenance(Provenance::Overlay),
    );
    edited.editor_camera = Some(camera);
    let gizmo = overlay_mesh(&mut edited, "mesh-1", "gizmo");
    edited.set_parent(gizmo, Some(camera)).unwrap();

    let output = export(&edited);
    assert!(output.document.find_node("editor camera").is_none());
    let record = output.document.find_node("gizmo").unwrap();
    assert!(record.payload.is_some());
    assert_eq!(record.parent, None);

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    let gizmo = scene.find_node_by_name("gizmo").unwrap();
    assert_eq!(scene.node(gizmo).unwrap().parent(), None);
}

#[test]
fn test_placeholder_sharing_a_base_name_is_resynthesized() {
    init_logging();
    let mut edited = base_scene();
    let placeholder = edited.add_node(
        Node::mesh("placeholder-1", "ground")
            .with_position([4.0, 0.0, 0.0])
            .with_provenance(Provenance::OverlayPlaceholder),
    );
    edited.add_particle_system(
        ParticleSystem::new("ps-1", "dust", placeholder).with_provenance(Provenance::Overlay),
    );

    let output = export(&edited);
    assert_eq!(
        output.document.particle_systems[0].emitter,
        EntityReference::ById("placeholder-1".into())
    );

    let (scene, report) = import(&output.text);
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.created.placeholders, 1);
    assert_eq!(report.updated_nodes, 0);

    let system = scene.find_particle_system_by_name("dust").unwrap();
    let emitter = scene.particle_system(system).unwrap().emitter;
    let emitter = scene.node(emitter).unwrap();
    assert_eq!(emitter.id, "placeholder-1");
    assert_eq!(emitter.provenance, Provenance::OverlayPlaceholder);
    assert_eq!(emitter.transform.position, [4.0, 0.0, 0.0]);
}
