//! Per-frame draw list
//!
//! Flattens the registry into what a renderer consumes each frame: where each
//! pickable lands in the window and the colour it currently shows. Rooms show
//! their light colour scaled by intensity, floors the average colour of the
//! assigned texture (or the placeholder) scaled by opacity.

use crate::assets::TextureCache;
use crate::render::{Camera, Picker};
use crate::scene::{EntityId, EntityKind, Light, SceneRegistry, VisualResources};
use glam::{Vec2, Vec3};
use std::fmt;

/// Spotlight parameters in the form a renderer takes them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotParams {
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub cone_rad: f32,
    pub penumbra: f32,
    pub decay: f32,
}

impl SpotParams {
    fn from_light(light: &Light) -> Self {
        Self {
            position: light.position,
            direction: (light.target - light.position)
                .try_normalize()
                .unwrap_or(Vec3::NEG_Y),
            range: light.distance,
            cone_rad: light.angle_rad,
            penumbra: light.penumbra,
            decay: light.decay,
        }
    }
}

impl fmt::Display for SpotParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "spot ({:.1}, {:.1}, {:.1}) dir ({:.2}, {:.2}, {:.2}) range {} cone {:.0}deg penumbra {} decay {}",
            self.position.x,
            self.position.y,
            self.position.z,
            self.direction.x,
            self.direction.y,
            self.direction.z,
            self.range,
            self.cone_rad.to_degrees(),
            self.penumbra,
            self.decay
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem<'a> {
    pub entity: EntityId,
    pub name: &'a str,
    pub kind: EntityKind,
    /// Window pixel of the box center, `None` when it is behind the camera.
    pub screen: Option<Vec2>,
    /// Colour currently shown, already scaled by `level`.
    pub color: [f32; 3],
    /// Intensity over max intensity for rooms, opacity for floors.
    pub level: f32,
    pub spot: Option<SpotParams>,
}

impl fmt::Display for DrawItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.kind)?;
        match self.screen {
            Some(pixel) => write!(f, " @ ({:.0}, {:.0})", pixel.x, pixel.y)?,
            None => write!(f, " offscreen")?,
        }
        write!(
            f,
            " rgb({:.2}, {:.2}, {:.2}) {:.0}%",
            self.color[0],
            self.color[1],
            self.color[2],
            self.level * 100.0
        )?;
        if let Some(spot) = &self.spot {
            write!(f, " {}", spot)?;
        }
        Ok(())
    }
}

/// Inverse of `PointerClick::to_ndc`.
pub fn ndc_to_pixel(ndc: Vec2, viewport: (u32, u32)) -> Vec2 {
    Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.0 as f32,
        (1.0 - ndc.y) * 0.5 * viewport.1 as f32,
    )
}

/// One item per pickable the registry knows, in pickable order.
pub fn draw_list<'a>(
    picker: &Picker,
    camera: &Camera,
    registry: &'a SceneRegistry,
    textures: &TextureCache,
    viewport: (u32, u32),
) -> Vec<DrawItem<'a>> {
    let aspect = viewport.0.max(1) as f32 / viewport.1.max(1) as f32;
    picker
        .pickables()
        .iter()
        .filter_map(|pickable| {
            let entity = registry.lookup(pickable.handle)?;
            let screen = camera
                .project(pickable.center, aspect)
                .map(|ndc| ndc_to_pixel(ndc, viewport));
            let (color, level, spot) = match &entity.resources {
                VisualResources::Room(light) => {
                    let level = if light.max_intensity > 0.0 {
                        light.intensity() / light.max_intensity
                    } else {
                        0.0
                    };
                    (
                        light.color.map(|channel| channel * level),
                        level,
                        Some(SpotParams::from_light(light)),
                    )
                }
                VisualResources::Floor(surface) => {
                    let appearance = textures.appearance(surface);
                    let [r, g, b, _] = appearance.texture.average_rgba;
                    let level = appearance.opacity;
                    (
                        [r, g, b].map(|channel| channel as f32 / 255.0 * level),
                        level,
                        None,
                    )
                }
            };
            Some(DrawItem {
                entity: entity.id,
                name: &entity.name,
                kind: entity.kind(),
                screen,
                color,
                level,
                spot,
            })
        })
        .collect()
}
