use nalgebra::{Point3, Vector2, Vector3};

use crate::catalog::{parse_catalog, CelestialEntry};
use crate::config::{ClickPolicy, LabelPolicy, StarMapConfig};
use crate::engine::camera::{OrbitCamera, Viewport};

use super::display::{DisplayObject, Label, Representation, RepresentationKind};
use super::scene::{NodeId, Scene, SceneNode, SpriteTexture};
use super::tooltip::Tooltip;

/// Owns the loaded entries and their on-screen state. Entries, display objects
/// and labels are index-aligned.
pub struct StarMap {
    config: StarMapConfig,
    entries: Vec<CelestialEntry>,
    objects: Vec<DisplayObject>,
    labels: Vec<Label>,
    pointer: Vector2<f32>,
    hovered: Option<usize>,
    tooltip: Tooltip,
}

impl StarMap {
    pub fn empty(config: StarMapConfig) -> Self {
        StarMap {
            config,
            entries: Vec::new(),
            objects: Vec::new(),
            labels: Vec::new(),
            // off-screen until the first pointer event
            pointer: Vector2::new(-2.0, -2.0),
            hovered: None,
            tooltip: Tooltip::hidden(),
        }
    }

    /// Adds a flat sprite and a hidden label to `scene` for every entry, in order.
    pub fn populate<S: Scene>(entries: Vec<CelestialEntry>, config: StarMapConfig, scene: &mut S) -> Self {
        let mut map = StarMap::empty(config);

        for (index, entry) in entries.iter().enumerate() {
            let position = entry.coordinates.scaled(map.config.coordinate_scale);
            let sprite = scene.add(map.flat_node(entry, position));
            map.objects.push(DisplayObject {
                entry: index,
                position,
                representation: Representation::Flat { sprite },
            });

            let label = scene.add(SceneNode::label(
                position,
                entry.display_name(),
                map.config.label_width,
                map.config.label_height,
            ));
            map.labels.push(Label { node: label, position, visible: false });
        }
        map.entries = entries;

        log::info!("Placed {} catalog entries", map.entries.len());
        map
    }

    /// Parses a dataset and populates from it. Malformed data is logged and
    /// leaves both the map and the scene empty.
    pub fn from_json<S: Scene>(text: &str, config: StarMapConfig, scene: &mut S) -> Self {
        match parse_catalog(text) {
            Ok(entries) => StarMap::populate(entries, config, scene),
            Err(e) => {
                log::error!("Error loading catalog: {}", e);
                StarMap::empty(config)
            }
        }
    }

    pub fn config(&self) -> &StarMapConfig {
        &self.config
    }

    pub fn entries(&self) -> &[CelestialEntry] {
        &self.entries
    }

    pub fn objects(&self) -> &[DisplayObject] {
        &self.objects
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn pointer(&self) -> Vector2<f32> {
        self.pointer
    }

    pub fn set_pointer(&mut self, viewport: &Viewport, x: f32, y: f32) {
        self.pointer = viewport.to_ndc(x, y);
    }

    /// Swaps representations by camera distance and keeps labels on their objects.
    pub fn update_frame<S: Scene>(&mut self, scene: &mut S, camera_position: &Point3<f32>) {
        let threshold = self.config.distance_threshold;

        for index in 0..self.objects.len() {
            let object = &self.objects[index];
            let distance = (Point3::from(object.position) - camera_position).norm();

            match object.representation {
                Representation::Flat { sprite } if distance < threshold => {
                    scene.remove(sprite);
                    let mesh = scene.add(SceneNode::sphere(
                        object.position,
                        self.config.sphere_radius,
                        self.config.sphere_segments,
                    ));
                    log::debug!("Entry {} switched to sphere at distance {:.1}", object.entry, distance);
                    self.objects[index].representation = Representation::Volumetric { mesh };

                    // Spheres are not hoverable.
                    if self.hovered == Some(index) {
                        self.hovered = None;
                        self.tooltip = Tooltip::hidden();
                        if self.config.label_policy == LabelPolicy::HoverOnly {
                            self.set_label_visible(scene, index, false);
                        }
                    }
                }
                Representation::Volumetric { mesh } if distance >= threshold => {
                    scene.remove(mesh);
                    let node = self.flat_node(&self.entries[object.entry], object.position);
                    let sprite = scene.add(node);
                    log::debug!("Entry {} switched to sprite at distance {:.1}", object.entry, distance);
                    self.objects[index].representation = Representation::Flat { sprite };
                }
                _ => {}
            }

            let position = self.objects[index].position;
            let label = &mut self.labels[index];
            label.position = position;
            scene.set_position(label.node, position);

            if self.config.label_policy == LabelPolicy::Proximity {
                let visible = self.objects[index].kind() == RepresentationKind::Volumetric;
                self.set_label_visible(scene, index, visible);
            }
        }
    }

    /// Updates the pointer and the tooltip from a pointer position in canvas pixels.
    /// Only flat sprites respond to hover. Labels follow the hover only under
    /// `LabelPolicy::HoverOnly`.
    pub fn hover<S: Scene>(
        &mut self,
        scene: &mut S,
        camera: &OrbitCamera,
        viewport: &Viewport,
        x: f32,
        y: f32,
    ) -> &Tooltip {
        self.set_pointer(viewport, x, y);

        let candidates: Vec<NodeId> = self
            .objects
            .iter()
            .filter(|o| o.is_flat())
            .map(|o| o.representation.node())
            .collect();
        let ray = camera.ray_from_ndc(self.pointer);
        let hit = scene.pick(&ray, &candidates).and_then(|id| self.object_for_node(id));

        let hover_labels = self.config.label_policy == LabelPolicy::HoverOnly;
        if let Some(previous) = self.hovered {
            if hit != Some(previous) && hover_labels {
                self.set_label_visible(scene, previous, false);
            }
        }
        self.hovered = hit;

        self.tooltip = match hit {
            Some(index) => {
                if hover_labels {
                    self.set_label_visible(scene, index, true);
                }

                let object = &self.objects[index];
                let entry = &self.entries[object.entry];
                let (screen_x, screen_y) = camera.project_to_screen(&object.position, viewport);
                Tooltip {
                    visible: true,
                    screen_x,
                    screen_y,
                    title: entry.display_name().to_string(),
                    subtitle: entry.host_star_line(),
                    body: entry.description_text().to_string(),
                }
            }
            None => Tooltip::hidden(),
        };
        &self.tooltip
    }

    /// Catalog URL to navigate to for a click at the current pointer, if the
    /// picked object qualifies under the click policy.
    pub fn click<S: Scene>(&self, scene: &S, camera: &OrbitCamera) -> Option<String> {
        let candidates: Vec<NodeId> = self.objects.iter().map(|o| o.representation.node()).collect();
        let ray = camera.ray_from_ndc(self.pointer);
        let index = self.object_for_node(scene.pick(&ray, &candidates)?)?;
        let object = &self.objects[index];

        let qualifies = match self.config.click_policy {
            ClickPolicy::VolumetricOnly => object.kind() == RepresentationKind::Volumetric,
            ClickPolicy::AnyRepresentation => true,
        };
        if !qualifies {
            return None;
        }
        self.entries[object.entry].catalog_url(&self.config.catalog_base_url)
    }

    /// Canvas size and camera aspect for a new window size.
    pub fn resize(&self, camera: &mut OrbitCamera, window_width: f64, window_height: f64) -> Viewport {
        let viewport = Viewport::scaled(window_width, window_height, self.config.viewport_scale);
        camera.set_aspect(viewport.aspect());
        viewport
    }

    fn flat_node(&self, entry: &CelestialEntry, position: Vector3<f32>) -> SceneNode {
        let texture = if entry.is_named() { SpriteTexture::Planet } else { SpriteTexture::Star };
        SceneNode::sprite(position, texture, self.config.sprite_size)
    }

    fn object_for_node(&self, id: NodeId) -> Option<usize> {
        self.objects.iter().position(|o| o.representation.node() == id)
    }

    fn set_label_visible<S: Scene>(&mut self, scene: &mut S, index: usize, visible: bool) {
        let label = &mut self.labels[index];
        if label.visible != visible {
            label.visible = visible;
            scene.set_visible(label.node, visible);
        }
    }
}
