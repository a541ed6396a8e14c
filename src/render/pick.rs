//! Pointer picking
//!
//! Converts a pointer click in window pixels into a world-space ray through
//! the active camera and tests it against every pickable box. The nearest
//! hit wins; equal distances resolve to the earliest registered pickable.
//! The resulting `PickHandle` is resolved to an entity by the scene registry,
//! so picking never depends on entity data.

use crate::render::Camera;
use crate::scene::{BoxShape, InteractiveEntity, PickHandle, SceneRegistry};
use glam::{Quat, Vec2, Vec3};

const PARALLEL_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Click reported by the input layer, in window pixels (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerClick {
    pub x: f32,
    pub y: f32,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl PointerClick {
    pub fn new(x: f32, y: f32, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            x,
            y,
            viewport_width,
            viewport_height,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.viewport_width.max(1) as f32 / self.viewport_height.max(1) as f32
    }

    /// Normalized device coordinates with +y up, or `None` when the viewport
    /// is empty or the pointer lies outside it.
    pub fn to_ndc(&self) -> Option<Vec2> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return None;
        }
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        let ndc = Vec2::new(
            (self.x / self.viewport_width as f32) * 2.0 - 1.0,
            -(self.y / self.viewport_height as f32) * 2.0 + 1.0,
        );
        if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 {
            return None;
        }
        Some(ndc)
    }
}

/// Oriented box geometry of a pickable renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickable {
    pub handle: PickHandle,
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

impl Pickable {
    pub fn from_shape(handle: PickHandle, shape: &BoxShape) -> Self {
        Self {
            handle,
            center: Vec3::from_array(shape.position),
            rotation: shape.rotation(),
            half_extents: shape.half_extents(),
        }
    }

    /// Distance along `ray` to the first surface hit, if any.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        ray_obb_intersection(ray, self.center, self.rotation, self.half_extents)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub handle: PickHandle,
    pub distance: f32,
    pub point: Vec3,
}

/// Slab test in the box's local frame. The transform is rigid, so distances
/// along the local ray equal world distances.
pub fn ray_obb_intersection(
    ray: &Ray,
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
) -> Option<f32> {
    let inverse = rotation.inverse();
    let origin = inverse * (ray.origin - center);
    let direction = inverse * ray.direction;

    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;
    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let h = half_extents[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (-h - o) * inv;
        let mut t1 = (h - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        return None;
    }
    // Origin inside the box reports the exit point.
    Some(if t_min >= 0.0 { t_min } else { t_max })
}

/// Holds the pickable set in insertion order.
#[derive(Debug, Default)]
pub struct Picker {
    pickables: Vec<Pickable>,
}

impl Picker {
    pub fn new(pickables: Vec<Pickable>) -> Self {
        Self { pickables }
    }

    pub fn pickables(&self) -> &[Pickable] {
        &self.pickables
    }

    /// Nearest pickable under the ray.
    pub fn cast(&self, ray: &Ray) -> Option<PickHit> {
        let mut best: Option<PickHit> = None;
        for pickable in &self.pickables {
            let Some(distance) = pickable.intersect(ray) else {
                continue;
            };
            // Strictly closer only, so ties keep the earlier pickable.
            if best.map_or(true, |hit| distance < hit.distance) {
                best = Some(PickHit {
                    handle: pickable.handle,
                    distance,
                    point: ray.at(distance),
                });
            }
        }
        best
    }

    pub fn pick(&self, click: &PointerClick, camera: &Camera) -> Option<PickHit> {
        let ndc = click.to_ndc()?;
        let ray = camera.ray_through(ndc, click.aspect());
        self.cast(&ray)
    }

    /// Pick and resolve through the registry. A hit on a handle the
    /// registry does not know is returned as `Err(handle)`.
    pub fn pick_entity<'a>(
        &self,
        click: &PointerClick,
        camera: &Camera,
        registry: &'a SceneRegistry,
    ) -> Option<Result<&'a InteractiveEntity, PickHandle>> {
        let hit = self.pick(click, camera)?;
        Some(registry.lookup(hit.handle).ok_or(hit.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{EntityKind, SceneLayout};

    fn unit_box(handle: u32, center: Vec3) -> Pickable {
        Pickable {
            handle: PickHandle(handle),
            center,
            rotation: Quat::IDENTITY,
            half_extents: Vec3::splat(0.5),
        }
    }

    #[test]
    fn ndc_maps_corners_and_center() {
        let click = PointerClick::new(400.0, 300.0, 800, 600);
        assert_eq!(click.to_ndc(), Some(Vec2::ZERO));
        let top_left = PointerClick::new(0.0, 0.0, 800, 600);
        assert_eq!(top_left.to_ndc(), Some(Vec2::new(-1.0, 1.0)));
        let bottom_right = PointerClick::new(800.0, 600.0, 800, 600);
        assert_eq!(bottom_right.to_ndc(), Some(Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn ndc_rejects_empty_viewport_and_outside_points() {
        assert!(PointerClick::new(10.0, 10.0, 0, 600).to_ndc().is_none());
        assert!(PointerClick::new(-5.0, 10.0, 800, 600).to_ndc().is_none());
        assert!(PointerClick::new(10.0, 900.0, 800, 600).to_ndc().is_none());
        assert!(PointerClick::new(f32::NAN, 10.0, 800, 600).to_ndc().is_none());
    }

    #[test]
    fn ray_hits_front_face_of_box() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let distance = ray_obb_intersection(&ray, Vec3::ZERO, Quat::IDENTITY, Vec3::splat(1.0));
        assert!((distance.unwrap() - 9.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_box_behind_origin() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray_obb_intersection(&ray, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE).is_none());
    }

    #[test]
    fn ray_from_inside_reports_exit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let distance = ray_obb_intersection(&ray, Vec3::ZERO, Quat::IDENTITY, Vec3::splat(2.0));
        assert!((distance.unwrap() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn rotated_thin_panel_faces_the_ray() {
        // Thin in z: seen from +x it is edge-on and the ray at z=1 misses.
        let half = Vec3::new(2.0, 1.0, 0.05);
        let ray = Ray::new(Vec3::new(10.0, 0.0, 1.0), Vec3::NEG_X);
        assert!(ray_obb_intersection(&ray, Vec3::ZERO, Quat::IDENTITY, half).is_none());
        let turned = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let distance = ray_obb_intersection(&ray, Vec3::ZERO, turned, half).unwrap();
        assert!((distance - 9.95).abs() < 1e-4);
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 10.0), Vec3::NEG_Z);
        assert!(ray_obb_intersection(&ray, Vec3::ZERO, Quat::IDENTITY, Vec3::ONE).is_none());
    }

    #[test]
    fn nearest_hit_wins() {
        let picker = Picker::new(vec![
            unit_box(1, Vec3::new(0.0, 0.0, -5.0)),
            unit_box(2, Vec3::new(0.0, 0.0, -2.0)),
        ]);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = picker.cast(&ray).unwrap();
        assert_eq!(hit.handle, PickHandle(2));
        assert!((hit.distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn ties_resolve_to_insertion_order() {
        let picker = Picker::new(vec![
            unit_box(7, Vec3::new(0.0, 0.0, -3.0)),
            unit_box(3, Vec3::new(0.0, 0.0, -3.0)),
        ]);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert_eq!(picker.cast(&ray).unwrap().handle, PickHandle(7));
    }

    #[test]
    fn empty_space_picks_nothing() {
        let built = SceneLayout::default_house().build().unwrap();
        let picker = Picker::new(built.pickables);
        for (x, y) in [(0.0, 0.0), (800.0, 0.0), (5.0, 590.0), (795.0, 595.0)] {
            let click = PointerClick::new(x, y, 800, 600);
            assert!(picker.pick(&click, &built.camera).is_none(), "({x}, {y})");
        }
    }

    #[test]
    fn screen_center_of_default_house_hits_middle_floor() {
        let built = SceneLayout::default_house().build().unwrap();
        let picker = Picker::new(built.pickables);
        let click = PointerClick::new(400.0, 300.0, 800, 600);
        let entity = picker
            .pick_entity(&click, &built.camera, &built.registry)
            .unwrap()
            .unwrap();
        assert_eq!(entity.kind(), EntityKind::Floor);
        assert_eq!(entity.name, "floor2");
    }

    #[test]
    fn unbound_handle_is_reported() {
        let registry = SceneRegistry::new();
        let picker = Picker::new(vec![unit_box(42, Vec3::new(0.0, 0.0, -5.0))]);
        let camera = Camera::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 50.0);
        let click = PointerClick::new(50.0, 50.0, 100, 100);
        let resolved = picker.pick_entity(&click, &camera, &registry).unwrap();
        assert_eq!(resolved.unwrap_err(), PickHandle(42));
    }
}
