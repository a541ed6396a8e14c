pub mod registry;
pub mod serialization;

pub use registry::{
    EntityId, EntityKind, EntityState, FloorSurface, InteractiveEntity, Light, LogicalState,
    Material, MaterialSlot, PickHandle, RegistryError, SceneRegistry, TogglePhase,
    VisualResources,
};

use crate::render::{Camera, Pickable};
use glam::{EulerRot, Quat, Vec3};

/// Box geometry of a pickable renderable - matches the layout file
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoxShape {
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation_deg: [f32; 3],
    pub size: [f32; 3],
}

impl BoxShape {
    pub fn rotation(&self) -> Quat {
        // Rotation order: Z (roll) * Y (yaw) * X (pitch)
        Quat::from_euler(
            EulerRot::ZYX,
            self.rotation_deg[2].to_radians(),
            self.rotation_deg[1].to_radians(),
            self.rotation_deg[0].to_radians(),
        )
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::from_array(self.size).abs() * 0.5
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraData {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        Self {
            position: [0.0, 8.0, 20.0],
            target: [0.0, 2.0, 0.0],
            fov_deg: 50.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Fade durations in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransitionTimings {
    pub light_fade_ms: f32,
    /// Duration of each phase of a floor swap.
    pub floor_fade_ms: f32,
}

impl Default for TransitionTimings {
    fn default() -> Self {
        Self {
            light_fade_ms: 1000.0,
            floor_fade_ms: 500.0,
        }
    }
}

/// Spotlight-specific data
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightData {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub color: [f32; 3],
    pub max_intensity: f32,
    #[serde(default = "default_true")]
    pub initially_lit: bool,
    #[serde(default = "default_distance")]
    pub distance: f32,
    #[serde(default = "default_angle_deg")]
    pub angle_deg: f32,
    #[serde(default = "default_penumbra")]
    pub penumbra: f32,
    #[serde(default = "default_decay")]
    pub decay: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterialData {
    pub name: String,
    pub texture: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoomData {
    pub name: String,
    pub shape: BoxShape,
    pub light: LightData,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FloorData {
    pub name: String,
    pub shape: BoxShape,
    pub base: MaterialData,
    pub alternate: MaterialData,
}

/// Declarative description of the house. This is what gets saved/loaded
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SceneLayout {
    #[serde(default)]
    pub camera: CameraData,
    #[serde(default)]
    pub timings: TransitionTimings,
    #[serde(default)]
    pub floors: Vec<FloorData>,
    #[serde(default)]
    pub rooms: Vec<RoomData>,
}

/// Runtime scene produced from a layout.
pub struct BuiltScene {
    pub registry: SceneRegistry,
    pub pickables: Vec<Pickable>,
    pub camera: Camera,
    pub timings: TransitionTimings,
}

fn default_true() -> bool {
    true
}

fn default_distance() -> f32 {
    10.0
}

fn default_angle_deg() -> f32 {
    90.0
}

fn default_penumbra() -> f32 {
    0.5
}

fn default_decay() -> f32 {
    2.0
}

fn hex_color(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

impl SceneLayout {
    /// Three storey house: three floor slabs and six rooms split by divider panels.
    pub fn default_house() -> Self {
        let base = MaterialData {
            name: "modern-tile".to_string(),
            texture: "assets/modern-tile1-ao.png".to_string(),
        };
        let alternate = MaterialData {
            name: "modern-tile-height".to_string(),
            texture: "assets/modern-tile1-height.png".to_string(),
        };
        let floor = |name: &str, position: [f32; 3], depth: f32| FloorData {
            name: name.to_string(),
            shape: BoxShape {
                position,
                rotation_deg: [0.0, 0.0, 0.0],
                size: [7.0, 0.3, depth],
            },
            base: base.clone(),
            alternate: alternate.clone(),
        };
        let floors = vec![
            floor("floor1", [0.0, 0.0, 2.0], 11.0),
            floor("floor2", [0.0, 2.0, -0.5], 6.0),
            floor("floor3", [0.0, 4.0, -0.5], 6.0),
        ];

        let names = ["RoomOne", "RoomTwo", "RoomThree", "RoomFour", "RoomFive", "RoomSix"];
        let colors = [0x00ffff, 0xff00ff, 0xffff00, 0x00ff00, 0xff8000, 0xff0000];
        let rooms = names
            .iter()
            .zip(colors)
            .enumerate()
            .map(|(index, (name, color))| {
                let x: f32 = if index % 2 == 0 { 0.5 } else { -0.5 };
                let y = 1.0 + 2.0 * (index / 2) as f32;
                // Odd rooms are lit from the opposite side of the house.
                let light_x = if index % 2 == 0 { 5.0 } else { -5.0 };
                RoomData {
                    name: name.to_string(),
                    shape: BoxShape {
                        position: [x, y, 0.0],
                        rotation_deg: [0.0, 90.0, 0.0],
                        size: [4.0, 2.0, 0.1],
                    },
                    light: LightData {
                        position: [light_x, y + 1.0, 0.0],
                        target: [x.abs(), y, 0.0],
                        color: hex_color(color),
                        max_intensity: 5.0,
                        initially_lit: true,
                        distance: default_distance(),
                        angle_deg: default_angle_deg(),
                        penumbra: default_penumbra(),
                        decay: default_decay(),
                    },
                }
            })
            .collect();

        Self {
            camera: CameraData::default(),
            timings: TransitionTimings::default(),
            floors,
            rooms,
        }
    }

    /// Texture paths referenced by the layout, deduplicated in first-use order.
    pub fn texture_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        for floor in &self.floors {
            for material in [&floor.base, &floor.alternate] {
                if !paths.contains(&material.texture) {
                    paths.push(material.texture.clone());
                }
            }
        }
        paths
    }

    /// Register every floor and room and produce their pickable handles.
    /// Floors come first so that handle order matches the click target order.
    pub fn build(&self) -> Result<BuiltScene, RegistryError> {
        let mut registry = SceneRegistry::new();
        let mut pickables = Vec::with_capacity(self.floors.len() + self.rooms.len());
        let mut next_id = 1u32;

        for floor in &self.floors {
            let id = EntityId(next_id);
            let handle = PickHandle(next_id);
            next_id += 1;
            let surface = FloorSurface::new(
                Material {
                    name: floor.base.name.clone(),
                    texture_path: floor.base.texture.clone(),
                },
                Material {
                    name: floor.alternate.name.clone(),
                    texture_path: floor.alternate.texture.clone(),
                },
            );
            registry.register(InteractiveEntity::floor(id, &floor.name, surface), handle)?;
            pickables.push(Pickable::from_shape(handle, &floor.shape));
        }

        for room in &self.rooms {
            let id = EntityId(next_id);
            let handle = PickHandle(next_id);
            next_id += 1;
            let data = &room.light;
            let mut light = Light::new(
                Vec3::from_array(data.position),
                Vec3::from_array(data.target),
                data.color,
                data.max_intensity,
            )
            .with_spot(
                data.distance,
                data.angle_deg.to_radians(),
                data.penumbra,
                data.decay,
            );
            if data.initially_lit {
                light.set_intensity(light.max_intensity);
            }
            registry.register(InteractiveEntity::room(id, &room.name, light), handle)?;
            pickables.push(Pickable::from_shape(handle, &room.shape));
        }

        log::info!(
            "scene built: {} floors, {} rooms",
            self.floors.len(),
            self.rooms.len()
        );

        Ok(BuiltScene {
            registry,
            pickables,
            camera: Camera::from_data(&self.camera),
            timings: self.timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_house_registers_rooms_and_floors() {
        let built = SceneLayout::default_house().build().unwrap();
        let rooms = built
            .registry
            .entities()
            .filter(|entity| entity.kind() == EntityKind::Room)
            .count();
        let floors = built
            .registry
            .entities()
            .filter(|entity| entity.kind() == EntityKind::Floor)
            .count();
        assert_eq!(rooms, 6);
        assert_eq!(floors, 3);
        assert_eq!(built.pickables.len(), 9);
    }

    #[test]
    fn default_rooms_start_lit_at_max() {
        let built = SceneLayout::default_house().build().unwrap();
        for entity in built.registry.entities() {
            if let Some(light) = entity.light() {
                assert!(light.is_lit());
                assert_eq!(light.intensity(), light.max_intensity);
            }
        }
    }

    #[test]
    fn odd_rooms_are_lit_from_the_other_side() {
        let layout = SceneLayout::default_house();
        assert!(layout.rooms[0].light.position[0] > 0.0);
        assert!(layout.rooms[1].light.position[0] < 0.0);
        assert_eq!(layout.rooms[1].light.target, [0.5, 1.0, 0.0]);
    }

    #[test]
    fn duplicate_texture_paths_are_collapsed() {
        let layout = SceneLayout::default_house();
        assert_eq!(layout.texture_paths().len(), 2);
    }

    #[test]
    fn hex_color_unpacks_channels() {
        assert_eq!(hex_color(0xff8000), [1.0, 128.0 / 255.0, 0.0]);
    }

    #[test]
    fn box_rotation_turns_divider_along_z() {
        let shape = BoxShape {
            position: [0.0, 0.0, 0.0],
            rotation_deg: [0.0, 90.0, 0.0],
            size: [4.0, 2.0, 0.1],
        };
        let rotated = shape.rotation() * Vec3::X;
        assert!((rotated - Vec3::NEG_Z).length() < 1e-5);
    }
}
