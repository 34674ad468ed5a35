use std::cell::RefCell;
use std::collections::HashMap;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use exosky_starmap::config::CameraConfig;
use exosky_starmap::engine::{OrbitCamera, SceneGraph, Viewport};
use exosky_starmap::starmap::{NodeId, NodeKind, Ray, RepresentationKind, SceneNode, SpriteTexture};
use exosky_starmap::{CelestialEntry, ClickPolicy, Coordinates, LabelPolicy, Scene, StarMap, StarMapConfig};

/// Scene double that records what the controller does and answers picks from a script.
#[derive(Default)]
struct FakeScene {
    nodes: HashMap<NodeId, SceneNode>,
    next: usize,
    removed: Vec<NodeId>,
    scripted_hit: Option<NodeId>,
    last_candidates: RefCell<Vec<NodeId>>,
}

impl FakeScene {
    fn node(&self, id: NodeId) -> &SceneNode {
        self.nodes.get(&id).expect("node is not live")
    }

    fn representation_nodes(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| !matches!(n.kind, NodeKind::Label { .. }))
            .count()
    }
}

impl Scene for FakeScene {
    fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.nodes.insert(id, node);
        id
    }

    fn remove(&mut self, id: NodeId) {
        assert!(self.nodes.remove(&id).is_some(), "removed a node that was not live");
        self.removed.push(id);
    }

    fn set_position(&mut self, id: NodeId, position: Vector3<f32>) {
        self.nodes.get_mut(&id).expect("node is not live").position = position;
    }

    fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes.get_mut(&id).expect("node is not live").visible = visible;
    }

    fn pick(&self, _ray: &Ray, candidates: &[NodeId]) -> Option<NodeId> {
        *self.last_candidates.borrow_mut() = candidates.to_vec();
        self.scripted_hit.filter(|id| candidates.contains(id))
    }
}

fn entries() -> Vec<CelestialEntry> {
    vec![
        CelestialEntry::new(
            Some("Kepler-22 b"),
            Coordinates { x: 0.0, y: 0.0, z: 0.0 },
            Some("A super-Earth in the habitable zone."),
        ),
        CelestialEntry::new(None, Coordinates { x: 0.02, y: 0.0, z: 0.0 }, None),
        CelestialEntry::new(
            Some("HD 209458 b"),
            Coordinates { x: 0.0, y: 0.04, z: 0.0 },
            Some("Nicknamed Osiris."),
        ),
    ]
}

fn camera() -> OrbitCamera {
    OrbitCamera::new(&CameraConfig::default(), 4.0 / 3.0)
}

fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0)
}

fn assert_one_representation_each(map: &StarMap, scene: &FakeScene) {
    assert_eq!(scene.representation_nodes(), map.objects().len());
    for object in map.objects() {
        let node = scene.node(object.representation.node());
        match object.kind() {
            RepresentationKind::Flat => assert!(matches!(node.kind, NodeKind::Sprite { .. })),
            RepresentationKind::Volumetric => assert!(matches!(node.kind, NodeKind::Sphere { .. })),
        }
    }
}

#[test]
fn populate_creates_aligned_flat_objects_and_labels() {
    let mut scene = FakeScene::default();
    let map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);

    assert_eq!(map.entries().len(), 3);
    assert_eq!(map.objects().len(), 3);
    assert_eq!(map.labels().len(), 3);
    assert_eq!(scene.nodes.len(), 6);

    for (i, object) in map.objects().iter().enumerate() {
        assert_eq!(object.entry, i);
        assert_eq!(object.kind(), RepresentationKind::Flat);
        assert_eq!(map.labels()[i].position, object.position);
        assert!(!scene.node(map.labels()[i].node).visible);
    }

    assert_relative_eq!(map.objects()[1].position.x, 100.0, epsilon = 1e-3);
    assert_relative_eq!(map.objects()[2].position.y, 200.0, epsilon = 1e-3);

    let texture_of = |i: usize| match scene.node(map.objects()[i].representation.node()).kind {
        NodeKind::Sprite { texture, size } => {
            assert_eq!(size, 20.0);
            texture
        }
        ref other => panic!("expected a sprite, got {:?}", other),
    };
    assert_eq!(texture_of(0), SpriteTexture::Planet);
    assert_eq!(texture_of(1), SpriteTexture::Star);

    match &scene.node(map.labels()[1].node).kind {
        NodeKind::Label { text, width, height } => {
            assert_eq!(text, "Unnamed Star");
            assert_eq!((*width, *height), (30.0, 15.0));
        }
        other => panic!("expected a label, got {:?}", other),
    }
}

#[test]
fn malformed_dataset_leaves_scene_empty() {
    let mut scene = FakeScene::default();
    let map = StarMap::from_json("{\"planets\": []}", StarMapConfig::default(), &mut scene);
    assert!(map.is_empty());
    assert!(scene.nodes.is_empty());

    let map = StarMap::from_json("[{\"planet_name\": \"x\"", StarMapConfig::default(), &mut scene);
    assert!(map.is_empty());
    assert!(scene.nodes.is_empty());
}

#[test]
fn from_json_loads_dataset_in_order() {
    let mut scene = FakeScene::default();
    let json = r#"[
        {"planet_name": "11 Com b", "coordinates": {"x": 0.1, "y": 0.0, "z": 0.0}},
        {"planet_name": "51 Peg b", "coordinates": {"x": 0.0, "y": 0.1, "z": 0.0}, "description": "First around a Sun-like star."}
    ]"#;
    let map = StarMap::from_json(json, StarMapConfig::default(), &mut scene);
    assert_eq!(map.objects().len(), 2);
    assert_eq!(map.entries()[1].display_name(), "51 Peg b");
    assert_relative_eq!(map.objects()[1].position.y, 500.0, epsilon = 1e-3);
}

#[test]
fn swaps_in_below_threshold_and_out_at_threshold() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    let sprite = map.objects()[0].representation.node();

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 49.9));
    assert_eq!(map.objects()[0].kind(), RepresentationKind::Volumetric);
    assert_eq!(map.objects()[1].kind(), RepresentationKind::Flat);
    assert_eq!(scene.removed, vec![sprite]);
    let mesh = scene.node(map.objects()[0].representation.node());
    assert_eq!(mesh.position, map.objects()[0].position);
    assert!(matches!(mesh.kind, NodeKind::Sphere { radius, segments: 32, .. } if radius == 10.0));
    assert_one_representation_each(&map, &scene);

    // Exactly on the threshold counts as far.
    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 50.0));
    assert_eq!(map.objects()[0].kind(), RepresentationKind::Flat);
    let node = scene.node(map.objects()[0].representation.node());
    assert!(matches!(node.kind, NodeKind::Sprite { texture: SpriteTexture::Planet, .. }));
    assert_eq!(node.position, Vector3::zeros());
    assert_one_representation_each(&map, &scene);
}

#[test]
fn threshold_distance_never_swaps_in() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);

    for _ in 0..3 {
        map.update_frame(&mut scene, &Point3::new(0.0, -50.0, 0.0));
        assert_eq!(map.objects()[0].kind(), RepresentationKind::Flat);
    }
    assert!(scene.removed.is_empty());
}

#[test]
fn stable_frames_do_not_churn_nodes() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 10.0));
    let removed = scene.removed.len();
    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 11.0));
    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 12.0));
    assert_eq!(scene.removed.len(), removed);
}

#[test]
fn exactly_one_representation_along_a_camera_path() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);

    for step in 0..=60 {
        let x = -50.0 + step as f32 * 5.0;
        map.update_frame(&mut scene, &Point3::new(x, 10.0, 0.0));
        assert_one_representation_each(&map, &scene);

        for (object, label) in map.objects().iter().zip(map.labels()) {
            assert_eq!(label.position, object.position);
            assert_eq!(scene.node(label.node).position, object.position);

            let distance = (Point3::from(object.position) - Point3::new(x, 10.0, 0.0)).norm();
            let expected = if distance < 50.0 { RepresentationKind::Volumetric } else { RepresentationKind::Flat };
            assert_eq!(object.kind(), expected);
        }
    }
}

#[test]
fn hover_shows_and_hides_tooltip_and_label() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    let cam = camera();
    let vp = viewport();

    scene.scripted_hit = Some(map.objects()[2].representation.node());
    let tooltip = map.hover(&mut scene, &cam, &vp, 400.0, 100.0).clone();
    assert!(tooltip.visible);
    assert_eq!(tooltip.title, "HD 209458 b");
    assert_eq!(tooltip.body, "Nicknamed Osiris.");
    assert_eq!(tooltip.subtitle, None);
    let (sx, sy) = cam.project_to_screen(&map.objects()[2].position, &vp);
    assert_relative_eq!(tooltip.screen_x, sx);
    assert_relative_eq!(tooltip.screen_y, sy);
    assert_eq!(map.hovered(), Some(2));
    assert!(scene.node(map.labels()[2].node).visible);

    scene.scripted_hit = None;
    let tooltip = map.hover(&mut scene, &cam, &vp, 10.0, 10.0);
    assert!(!tooltip.visible);
    assert_eq!(map.hovered(), None);
    assert!(!scene.node(map.labels()[2].node).visible);
}

#[test]
fn hover_moves_label_between_entries() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);

    scene.scripted_hit = Some(map.objects()[0].representation.node());
    map.hover(&mut scene, &camera(), &viewport(), 400.0, 300.0);
    scene.scripted_hit = Some(map.objects()[1].representation.node());
    let tooltip = map.hover(&mut scene, &camera(), &viewport(), 450.0, 300.0).clone();

    assert_eq!(tooltip.title, "Unnamed Star");
    assert_eq!(tooltip.body, "");
    assert!(!scene.node(map.labels()[0].node).visible);
    assert!(scene.node(map.labels()[1].node).visible);
}

#[test]
fn hover_only_considers_flat_sprites() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 5.0));
    let mesh = map.objects()[0].representation.node();

    scene.scripted_hit = Some(mesh);
    let tooltip = map.hover(&mut scene, &camera(), &viewport(), 400.0, 300.0);
    assert!(!tooltip.visible);

    let candidates = scene.last_candidates.borrow().clone();
    assert!(!candidates.contains(&mesh));
    assert_eq!(candidates.len(), 2);
}

#[test]
fn volumetric_only_click_policy() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    let cam = camera();

    scene.scripted_hit = Some(map.objects()[2].representation.node());
    assert_eq!(map.click(&scene, &cam), None);

    map.update_frame(&mut scene, &Point3::new(0.0, 200.0, 10.0));
    assert_eq!(map.objects()[2].kind(), RepresentationKind::Volumetric);
    scene.scripted_hit = Some(map.objects()[2].representation.node());
    assert_eq!(
        map.click(&scene, &cam).as_deref(),
        Some("https://science.nasa.gov/exoplanet-catalog/HD-209458-b")
    );
    assert_eq!(scene.last_candidates.borrow().len(), 3);

    scene.scripted_hit = None;
    assert_eq!(map.click(&scene, &cam), None);
}

#[test]
fn any_representation_click_policy() {
    let mut scene = FakeScene::default();
    let config = StarMapConfig { click_policy: ClickPolicy::AnyRepresentation, ..StarMapConfig::default() };
    let map = StarMap::populate(entries(), config, &mut scene);
    let cam = camera();

    scene.scripted_hit = Some(map.objects()[0].representation.node());
    assert_eq!(
        map.click(&scene, &cam).as_deref(),
        Some("https://science.nasa.gov/exoplanet-catalog/Kepler-22-b")
    );

    // No name, no catalog page.
    scene.scripted_hit = Some(map.objects()[1].representation.node());
    assert_eq!(map.click(&scene, &cam), None);
}

#[test]
fn proximity_labels_follow_volumetric_objects() {
    let mut scene = FakeScene::default();
    let config = StarMapConfig { label_policy: LabelPolicy::Proximity, ..StarMapConfig::default() };
    let mut map = StarMap::populate(entries(), config, &mut scene);

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 20.0));
    assert!(scene.node(map.labels()[0].node).visible);
    assert!(!scene.node(map.labels()[1].node).visible);

    // Hover drives the tooltip only; labels stay tied to distance.
    scene.scripted_hit = Some(map.objects()[1].representation.node());
    let tooltip = map.hover(&mut scene, &camera(), &viewport(), 400.0, 300.0);
    assert!(tooltip.visible);
    assert!(!scene.node(map.labels()[1].node).visible);
    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 20.0));
    assert!(!scene.node(map.labels()[1].node).visible);

    scene.scripted_hit = None;
    map.hover(&mut scene, &camera(), &viewport(), 0.0, 0.0);
    assert!(scene.node(map.labels()[0].node).visible);
    assert!(!scene.node(map.labels()[1].node).visible);

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 300.0));
    assert!(!scene.node(map.labels()[0].node).visible);
}

#[test]
fn hovered_sprite_turning_into_a_sphere_drops_its_tooltip() {
    let mut scene = SceneGraph::new();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    let cam = camera();
    let vp = viewport();

    assert!(map.hover(&mut scene, &cam, &vp, 400.0, 300.0).visible);
    assert_eq!(map.hovered(), Some(0));
    let label = map.labels()[0].node;
    assert!(scene.get(label).map_or(false, |n| n.visible));

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 20.0));
    assert_eq!(map.objects()[0].kind(), RepresentationKind::Volumetric);
    assert_eq!(map.hovered(), None);
    assert!(!map.tooltip().visible);
    assert!(!map.labels()[0].visible);
    assert!(!scene.get(label).map_or(true, |n| n.visible));

    // Swapping back out does not bring the hover back.
    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 300.0));
    assert_eq!(map.hovered(), None);
    assert!(!map.tooltip().visible);
    assert!(!scene.get(label).map_or(true, |n| n.visible));
}

#[test]
fn hover_survives_swaps_of_other_entries() {
    let mut scene = FakeScene::default();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);

    scene.scripted_hit = Some(map.objects()[2].representation.node());
    map.hover(&mut scene, &camera(), &viewport(), 400.0, 100.0);

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 20.0));
    assert_eq!(map.objects()[0].kind(), RepresentationKind::Volumetric);
    assert_eq!(map.hovered(), Some(2));
    assert!(map.tooltip().visible);
    assert!(scene.node(map.labels()[2].node).visible);
}

#[test]
fn proximity_keeps_label_of_hovered_sprite_that_turns_volumetric() {
    let mut scene = FakeScene::default();
    let config = StarMapConfig { label_policy: LabelPolicy::Proximity, ..StarMapConfig::default() };
    let mut map = StarMap::populate(entries(), config, &mut scene);

    scene.scripted_hit = Some(map.objects()[0].representation.node());
    assert!(map.hover(&mut scene, &camera(), &viewport(), 400.0, 300.0).visible);

    map.update_frame(&mut scene, &Point3::new(0.0, 0.0, 20.0));
    assert_eq!(map.hovered(), None);
    assert!(!map.tooltip().visible);
    assert!(scene.node(map.labels()[0].node).visible);
}

#[test]
fn resize_sets_aspect_and_clamps_degenerate_sizes() {
    let mut scene = FakeScene::default();
    let map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    let mut cam = camera();

    let vp = map.resize(&mut cam, 1600.0, 900.0);
    assert_eq!((vp.width, vp.height), (800, 450));
    assert_relative_eq!(cam.aspect(), 800.0 / 450.0);

    let again = map.resize(&mut cam, 1600.0, 900.0);
    assert_eq!(again, vp);
    assert_relative_eq!(cam.aspect(), 800.0 / 450.0);

    let vp = map.resize(&mut cam, 1600.0, 0.0);
    assert_eq!((vp.width, vp.height), (800, 1));
    assert_relative_eq!(cam.aspect(), 800.0);

    let vp = map.resize(&mut cam, 0.0, 0.0);
    assert_eq!((vp.width, vp.height), (1, 1));
    assert_relative_eq!(cam.aspect(), 1.0);
}

#[test]
fn hover_and_click_through_real_scene_graph() {
    let mut scene = SceneGraph::new();
    let mut map = StarMap::populate(entries(), StarMapConfig::default(), &mut scene);
    let mut cam = camera();
    let vp = viewport();

    let (x, y) = cam.project_to_screen(&map.objects()[2].position, &vp);
    let tooltip = map.hover(&mut scene, &cam, &vp, x, y).clone();
    assert!(tooltip.visible);
    assert_eq!(tooltip.title, "HD 209458 b");

    assert!(!map.hover(&mut scene, &cam, &vp, 5.0, 5.0).visible);

    // Zoom in to 40 units from the origin: entry 0 turns into a sphere.
    cam.handle_wheel(-1040.0);
    assert_relative_eq!(cam.distance(), 40.0);
    map.update_frame(&mut scene, &cam.position());
    assert_eq!(map.objects()[0].kind(), RepresentationKind::Volumetric);
    assert_eq!(map.objects()[1].kind(), RepresentationKind::Flat);
    assert_eq!(scene.len(), 6);

    map.set_pointer(&vp, 400.0, 300.0);
    assert_eq!(
        map.click(&scene, &cam).as_deref(),
        Some("https://science.nasa.gov/exoplanet-catalog/Kepler-22-b")
    );
}
