//! Scene registry: the explicit map from pickable handles to interactive
//! entities (rooms and floors), their visual resources and toggle state.

use crate::transition::Generation;
use glam::Vec3;
use std::collections::HashMap;

/// Stable identity of an interactive entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Opaque id of a pickable renderable produced by scene construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Room,
    Floor,
}

/// Spotlight owned by a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub target: Vec3,
    pub color: [f32; 3],
    pub max_intensity: f32,
    intensity: f32,
    pub distance: f32,
    pub angle_rad: f32,
    pub penumbra: f32,
    pub decay: f32,
}

impl Light {
    pub fn new(position: Vec3, target: Vec3, color: [f32; 3], max_intensity: f32) -> Self {
        let max_intensity = if max_intensity.is_finite() {
            max_intensity.max(0.0)
        } else {
            0.0
        };
        Self {
            position,
            target,
            color,
            max_intensity,
            intensity: 0.0,
            distance: 10.0,
            angle_rad: std::f32::consts::FRAC_PI_2,
            penumbra: 0.5,
            decay: 2.0,
        }
    }

    pub fn with_spot(mut self, distance: f32, angle_rad: f32, penumbra: f32, decay: f32) -> Self {
        self.distance = distance;
        self.angle_rad = angle_rad;
        self.penumbra = penumbra;
        self.decay = decay;
        self
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Clamped to `[0, max_intensity]`.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = if intensity.is_finite() {
            intensity.clamp(0.0, self.max_intensity)
        } else {
            0.0
        };
    }

    pub fn is_lit(&self) -> bool {
        self.intensity > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Base,
    Alternate,
}

impl MaterialSlot {
    pub fn other(self) -> Self {
        match self {
            Self::Base => Self::Alternate,
            Self::Alternate => Self::Base,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub texture_path: String,
}

/// Material pair of a floor with the currently assigned variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorSurface {
    pub base: Material,
    pub alternate: Material,
    assigned: MaterialSlot,
    opacity: f32,
}

impl FloorSurface {
    pub fn new(base: Material, alternate: Material) -> Self {
        Self {
            base,
            alternate,
            assigned: MaterialSlot::Base,
            opacity: 1.0,
        }
    }

    pub fn assigned(&self) -> MaterialSlot {
        self.assigned
    }

    pub fn assign(&mut self, slot: MaterialSlot) {
        self.assigned = slot;
    }

    pub fn material(&self, slot: MaterialSlot) -> &Material {
        match slot {
            MaterialSlot::Base => &self.base,
            MaterialSlot::Alternate => &self.alternate,
        }
    }

    pub fn assigned_material(&self) -> &Material {
        self.material(self.assigned)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }
}

/// Tagged visual resources; the variant is the entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualResources {
    Room(Light),
    Floor(FloorSurface),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveEntity {
    pub id: EntityId,
    pub name: String,
    pub resources: VisualResources,
}

impl InteractiveEntity {
    pub fn room(id: EntityId, name: impl Into<String>, light: Light) -> Self {
        Self {
            id,
            name: name.into(),
            resources: VisualResources::Room(light),
        }
    }

    pub fn floor(id: EntityId, name: impl Into<String>, surface: FloorSurface) -> Self {
        Self {
            id,
            name: name.into(),
            resources: VisualResources::Floor(surface),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.resources {
            VisualResources::Room(_) => EntityKind::Room,
            VisualResources::Floor(_) => EntityKind::Floor,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        match &self.resources {
            VisualResources::Room(light) => Some(light),
            VisualResources::Floor(_) => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.resources {
            VisualResources::Room(light) => Some(light),
            VisualResources::Floor(_) => None,
        }
    }

    pub fn surface(&self) -> Option<&FloorSurface> {
        match &self.resources {
            VisualResources::Floor(surface) => Some(surface),
            VisualResources::Room(_) => None,
        }
    }

    pub fn surface_mut(&mut self) -> Option<&mut FloorSurface> {
        match &mut self.resources {
            VisualResources::Floor(surface) => Some(surface),
            VisualResources::Room(_) => None,
        }
    }

    /// Logical state read straight off the visual resources.
    pub fn observed_state(&self) -> LogicalState {
        match &self.resources {
            VisualResources::Room(light) => LogicalState::Lit(light.is_lit()),
            VisualResources::Floor(surface) => LogicalState::Surface(surface.assigned()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TogglePhase {
    Idle,
    Transitioning { generation: Generation },
}

/// Committed logical value of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalState {
    Lit(bool),
    Surface(MaterialSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityState {
    pub logical: LogicalState,
    pub phase: TogglePhase,
}

impl EntityState {
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, TogglePhase::Transitioning { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("entity id {0:?} is already registered")]
    DuplicateEntity(EntityId),
    #[error("pick handle {0:?} is already bound")]
    DuplicateHandle(PickHandle),
    #[error("entity id {0:?} is not registered")]
    UnknownEntity(EntityId),
}

struct Slot {
    entity: InteractiveEntity,
    state: EntityState,
}

#[derive(Default)]
pub struct SceneRegistry {
    slots: Vec<Slot>,
    by_id: HashMap<EntityId, usize>,
    by_handle: HashMap<PickHandle, usize>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Register an entity and bind the pickable handle that represents it.
    pub fn register(
        &mut self,
        entity: InteractiveEntity,
        handle: PickHandle,
    ) -> Result<(), RegistryError> {
        if self.by_id.contains_key(&entity.id) {
            return Err(RegistryError::DuplicateEntity(entity.id));
        }
        if self.by_handle.contains_key(&handle) {
            return Err(RegistryError::DuplicateHandle(handle));
        }
        let index = self.slots.len();
        let state = EntityState {
            logical: entity.observed_state(),
            phase: TogglePhase::Idle,
        };
        log::debug!(
            "registered {:?} '{}' ({:?}) as {:?}",
            entity.kind(),
            entity.name,
            entity.id,
            handle
        );
        self.by_id.insert(entity.id, index);
        self.by_handle.insert(handle, index);
        self.slots.push(Slot { entity, state });
        Ok(())
    }

    pub fn lookup(&self, handle: PickHandle) -> Option<&InteractiveEntity> {
        self.by_handle
            .get(&handle)
            .map(|&index| &self.slots[index].entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&InteractiveEntity> {
        self.by_id.get(&id).map(|&index| &self.slots[index].entity)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut InteractiveEntity> {
        let index = *self.by_id.get(&id)?;
        Some(&mut self.slots[index].entity)
    }

    pub fn get_state(&self, id: EntityId) -> Option<EntityState> {
        self.by_id.get(&id).map(|&index| self.slots[index].state)
    }

    pub fn set_state(&mut self, id: EntityId, state: EntityState) -> Result<(), RegistryError> {
        let index = *self
            .by_id
            .get(&id)
            .ok_or(RegistryError::UnknownEntity(id))?;
        self.slots[index].state = state;
        Ok(())
    }

    /// Entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &InteractiveEntity> {
        self.slots.iter().map(|slot| &slot.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(name: &str) -> Material {
        Material {
            name: name.to_string(),
            texture_path: format!("{name}.png"),
        }
    }

    fn sample_room(id: u32) -> InteractiveEntity {
        let mut light = Light::new(Vec3::new(5.0, 2.0, 0.0), Vec3::ZERO, [1.0, 0.0, 0.0], 5.0);
        light.set_intensity(5.0);
        InteractiveEntity::room(EntityId(id), format!("Room{id}"), light)
    }

    #[test]
    fn register_and_lookup_by_handle() {
        let mut registry = SceneRegistry::new();
        registry.register(sample_room(1), PickHandle(10)).unwrap();
        registry
            .register(
                InteractiveEntity::floor(
                    EntityId(2),
                    "floor1",
                    FloorSurface::new(tile("base"), tile("alt")),
                ),
                PickHandle(11),
            )
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup(PickHandle(10)).unwrap().kind(), EntityKind::Room);
        assert_eq!(registry.lookup(PickHandle(11)).unwrap().kind(), EntityKind::Floor);
        assert!(registry.lookup(PickHandle(12)).is_none());
        assert_eq!(registry.lookup(PickHandle(11)).unwrap().id, EntityId(2));
    }

    #[test]
    fn duplicate_ids_and_handles_are_rejected() {
        let mut registry = SceneRegistry::new();
        registry.register(sample_room(1), PickHandle(1)).unwrap();
        assert!(matches!(
            registry.register(sample_room(1), PickHandle(2)),
            Err(RegistryError::DuplicateEntity(EntityId(1)))
        ));
        assert!(matches!(
            registry.register(sample_room(2), PickHandle(1)),
            Err(RegistryError::DuplicateHandle(PickHandle(1)))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn initial_state_reflects_resources() {
        let mut registry = SceneRegistry::new();
        registry.register(sample_room(1), PickHandle(1)).unwrap();
        let state = registry.get_state(EntityId(1)).unwrap();
        assert_eq!(state.logical, LogicalState::Lit(true));
        assert_eq!(state.phase, TogglePhase::Idle);
    }

    #[test]
    fn set_state_on_unknown_entity_fails() {
        let mut registry = SceneRegistry::new();
        let state = EntityState {
            logical: LogicalState::Lit(false),
            phase: TogglePhase::Idle,
        };
        assert!(matches!(
            registry.set_state(EntityId(9), state),
            Err(RegistryError::UnknownEntity(EntityId(9)))
        ));
    }

    #[test]
    fn light_intensity_is_clamped() {
        let mut light = Light::new(Vec3::ZERO, Vec3::ZERO, [1.0; 3], 2.0);
        light.set_intensity(7.0);
        assert_eq!(light.intensity(), 2.0);
        light.set_intensity(-1.0);
        assert_eq!(light.intensity(), 0.0);
        assert!(!light.is_lit());
    }
}
