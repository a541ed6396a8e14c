//! Toggle controller
//!
//! Owns the registry, picker and transition engine and wires them together:
//! a click picks an entity, rooms toggle their light, floors swap their
//! material. `update` is the per-frame entry point that advances transitions
//! and commits finished toggles back into the registry.

use crate::assets::TextureCache;
use crate::render::{frame, Camera, DrawItem, Picker, PointerClick};
use crate::scene::{
    BuiltScene, EntityId, EntityKind, EntityState, InteractiveEntity, LogicalState,
    MaterialSlot, PickHandle, RegistryError, SceneRegistry, TogglePhase, TransitionTimings,
    VisualResources,
};
use crate::transition::{
    Completion, Generation, Property, TransitionEngine, TransitionError, TransitionState,
};

#[derive(Debug, thiserror::Error)]
pub enum ToggleError {
    #[error("pick handle {0:?} has no registered entity kind")]
    UnknownEntityKind(PickHandle),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    NoSelection,
    Started {
        entity: EntityId,
        kind: EntityKind,
        generation: Generation,
    },
}

enum Request {
    Light(f32),
    Swap(MaterialSlot),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusSummary {
    pub rooms: usize,
    pub lit_rooms: usize,
    pub floors: Vec<(String, String)>,
    pub transitioning: usize,
}

impl std::fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lit {}/{}", self.lit_rooms, self.rooms)?;
        for (floor, material) in &self.floors {
            write!(f, " | {}: {}", floor, material)?;
        }
        if self.transitioning > 0 {
            write!(f, " | {} animating", self.transitioning)?;
        }
        Ok(())
    }
}

pub struct ToggleController {
    registry: SceneRegistry,
    picker: Picker,
    camera: Camera,
    engine: TransitionEngine,
    timings: TransitionTimings,
}

impl ToggleController {
    pub fn new(scene: BuiltScene) -> Self {
        let picker = Picker::new(scene.pickables);
        log::debug!(
            "controller ready: {} entities, {} pickables",
            scene.registry.len(),
            picker.pickables().len()
        );
        Self {
            registry: scene.registry,
            picker,
            camera: scene.camera,
            engine: TransitionEngine::new(),
            timings: scene.timings,
        }
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    /// Entity under the pointer. Hits on unregistered pickables count as empty space.
    pub fn hovered(&self, pointer: &PointerClick) -> Option<&InteractiveEntity> {
        match self.picker.pick_entity(pointer, &self.camera, &self.registry)? {
            Ok(entity) => Some(entity),
            Err(handle) => {
                log::debug!("pointer over unregistered {:?}", handle);
                None
            }
        }
    }

    pub fn draw_list(&self, textures: &TextureCache, viewport: (u32, u32)) -> Vec<DrawItem<'_>> {
        frame::draw_list(&self.picker, &self.camera, &self.registry, textures, viewport)
    }

    /// Handle a click. Never fails: problems are logged and the click is a no-op.
    pub fn handle_click(&mut self, click: &PointerClick) -> ToggleOutcome {
        match self.try_handle_click(click) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("click ignored: {}", err);
                ToggleOutcome::NoSelection
            }
        }
    }

    pub fn try_handle_click(&mut self, click: &PointerClick) -> Result<ToggleOutcome, ToggleError> {
        let Some(hit) = self.picker.pick(click, &self.camera) else {
            log::debug!("click at ({}, {}) hit nothing", click.x, click.y);
            return Ok(ToggleOutcome::NoSelection);
        };
        log::debug!(
            "picked {:?} at distance {:.2} ({:.2}, {:.2}, {:.2})",
            hit.handle,
            hit.distance,
            hit.point.x,
            hit.point.y,
            hit.point.z
        );
        let entity = self
            .registry
            .lookup(hit.handle)
            .map(|entity| entity.id)
            .ok_or(ToggleError::UnknownEntityKind(hit.handle))?;
        self.toggle(entity).map(|(kind, generation)| ToggleOutcome::Started {
            entity,
            kind,
            generation,
        })
    }

    /// Toggle an entity directly, bypassing picking.
    pub fn toggle(&mut self, id: EntityId) -> Result<(EntityKind, Generation), ToggleError> {
        let entity = self
            .registry
            .get(id)
            .ok_or(RegistryError::UnknownEntity(id))?;
        let kind = entity.kind();
        // Decided from what is visible at click time, even mid-transition.
        let request = match &entity.resources {
            VisualResources::Room(light) => {
                let target = if light.is_lit() { 0.0 } else { light.max_intensity };
                log::info!("{}: light -> {}", entity.name, target);
                Request::Light(target)
            }
            VisualResources::Floor(surface) => {
                let next = surface.assigned().other();
                log::info!("{}: material -> {}", entity.name, surface.material(next).name);
                Request::Swap(next)
            }
        };

        let generation = match request {
            Request::Light(target) => self.engine.start(
                &mut self.registry,
                id,
                Property::LightIntensity,
                target,
                self.timings.light_fade_ms,
                None,
            )?,
            Request::Swap(next) => self.engine.start_swap(
                &mut self.registry,
                id,
                next,
                self.timings.floor_fade_ms,
            )?,
        };
        if let TransitionState::Running {
            target,
            start_ms,
            duration_ms,
        } = self.engine.state(id)
        {
            log::debug!(
                "{:?}: running toward {} from t={}ms for {}ms",
                id,
                target,
                start_ms,
                duration_ms
            );
        }

        let logical = self
            .registry
            .get_state(id)
            .map(|state| state.logical)
            .ok_or(RegistryError::UnknownEntity(id))?;
        self.registry.set_state(
            id,
            EntityState {
                logical,
                phase: TogglePhase::Transitioning { generation },
            },
        )?;
        Ok((kind, generation))
    }

    /// Per-frame entry point. Advances every transition by `elapsed_ms`
    /// and commits the ones that finished.
    pub fn update(&mut self, elapsed_ms: f32) {
        self.engine.update(&mut self.registry, elapsed_ms);
        for completion in self.engine.take_completions() {
            if let Err(err) = self.commit(&completion) {
                match &err {
                    ToggleError::Transition(TransitionError::StaleCompletion { .. }) => {
                        log::debug!("discarded: {}", err)
                    }
                    _ => log::error!("commit failed: {}", err),
                }
            }
        }
    }

    fn commit(&mut self, completion: &Completion) -> Result<(), ToggleError> {
        self.engine.validate(completion)?;
        if !completion.phase.is_final() {
            return Ok(());
        }
        let entity = self
            .registry
            .get(completion.entity)
            .ok_or(RegistryError::UnknownEntity(completion.entity))?;
        let logical = entity.observed_state();
        log::debug!(
            "{}: {:?} settled at {}, committed {:?}",
            entity.name,
            completion.property,
            completion.value,
            logical
        );
        self.registry.set_state(
            completion.entity,
            EntityState {
                logical,
                phase: TogglePhase::Idle,
            },
        )?;
        Ok(())
    }

    pub fn status(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for entity in self.registry.entities() {
            let state = self.registry.get_state(entity.id);
            if state.is_some_and(|state| state.is_transitioning()) {
                summary.transitioning += 1;
            }
            match (&entity.resources, state.map(|state| state.logical)) {
                (VisualResources::Room(_), Some(LogicalState::Lit(lit))) => {
                    summary.rooms += 1;
                    if lit {
                        summary.lit_rooms += 1;
                    }
                }
                (VisualResources::Floor(surface), Some(LogicalState::Surface(slot))) => {
                    summary
                        .floors
                        .push((entity.name.clone(), surface.material(slot).name.clone()));
                }
                _ => {}
            }
        }
        summary
    }
}
