//! Transition engine
//!
//! Animates one scalar property per entity (light intensity or floor
//! opacity) against a clock advanced only by `update`. At most one
//! transition runs per entity; starting another cancels the running one,
//! snapping its property to the cancelled target, and bumps the entity's
//! generation. Completions carry the generation they were started under so
//! that anything superseded in the meantime can be detected and dropped.

mod tween;

use tween::Tween;

use crate::scene::{EntityId, MaterialSlot, SceneRegistry};
use std::collections::{BTreeMap, HashMap};

/// Fallback for zero, negative or non-finite durations.
pub const DEFAULT_MIN_DURATION_MS: f32 = 16.0;

/// Per-entity counter, bumped on every transition start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    LightIntensity,
    SurfaceOpacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Single,
    FadeOut,
    FadeIn,
}

impl Phase {
    /// Whether finishing this phase ends the whole toggle.
    pub fn is_final(self) -> bool {
        !matches!(self, Phase::FadeOut)
    }
}

/// What happens when a phase completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowUp {
    /// Assign `next` while invisible, then fade opacity back in.
    SwapAndFadeIn { next: MaterialSlot, duration_ms: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionState {
    Idle,
    Running {
        target: f32,
        start_ms: f64,
        duration_ms: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub entity: EntityId,
    pub property: Property,
    pub phase: Phase,
    pub generation: Generation,
    pub value: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("entity {0:?} is not registered")]
    UnknownEntity(EntityId),
    #[error("entity {0:?} has no {1:?} property")]
    MissingProperty(EntityId, Property),
    #[error("stale completion for {entity:?}: generation {completed:?} superseded by {current:?}")]
    StaleCompletion {
        entity: EntityId,
        completed: Generation,
        current: Generation,
    },
}

pub type Result<T> = std::result::Result<T, TransitionError>;

#[derive(Debug, Clone, Copy)]
struct Running {
    property: Property,
    phase: Phase,
    tween: Tween,
    generation: Generation,
    follow_up: Option<FollowUp>,
}

#[derive(Default)]
pub struct TransitionEngine {
    clock_ms: f64,
    running: BTreeMap<EntityId, Running>,
    generations: HashMap<EntityId, Generation>,
    completions: Vec<Completion>,
}

pub fn normalize_duration(duration_ms: f32) -> f32 {
    if duration_ms.is_finite() && duration_ms > 0.0 {
        duration_ms
    } else {
        log::debug!(
            "invalid duration {}ms, using {}ms",
            duration_ms,
            DEFAULT_MIN_DURATION_MS
        );
        DEFAULT_MIN_DURATION_MS
    }
}

fn read_property(registry: &SceneRegistry, entity: EntityId, property: Property) -> Result<f32> {
    let resolved = registry
        .get(entity)
        .ok_or(TransitionError::UnknownEntity(entity))?;
    let value = match property {
        Property::LightIntensity => resolved.light().map(|light| light.intensity()),
        Property::SurfaceOpacity => resolved.surface().map(|surface| surface.opacity()),
    };
    value.ok_or(TransitionError::MissingProperty(entity, property))
}

fn write_property(
    registry: &mut SceneRegistry,
    entity: EntityId,
    property: Property,
    value: f32,
) -> Result<()> {
    let resolved = registry
        .get_mut(entity)
        .ok_or(TransitionError::UnknownEntity(entity))?;
    let written = match property {
        Property::LightIntensity => resolved
            .light_mut()
            .map(|light| light.set_intensity(value)),
        Property::SurfaceOpacity => resolved
            .surface_mut()
            .map(|surface| surface.set_opacity(value)),
    };
    written.ok_or(TransitionError::MissingProperty(entity, property))
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn generation(&self, entity: EntityId) -> Generation {
        self.generations.get(&entity).copied().unwrap_or_default()
    }

    pub fn state(&self, entity: EntityId) -> TransitionState {
        match self.running.get(&entity) {
            Some(running) => TransitionState::Running {
                target: running.tween.to,
                start_ms: running.tween.start_ms,
                duration_ms: running.tween.duration_ms,
            },
            None => TransitionState::Idle,
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, entity: EntityId) -> bool {
        self.running.contains_key(&entity)
    }

    #[cfg(test)]
    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Start animating `property` of `entity` from its current value to
    /// `target`. A transition already running on the entity is cancelled
    /// first and its property left at that transition's target.
    pub fn start(
        &mut self,
        registry: &mut SceneRegistry,
        entity: EntityId,
        property: Property,
        target: f32,
        duration_ms: f32,
        follow_up: Option<FollowUp>,
    ) -> Result<Generation> {
        // Validate before touching anything so a bad request cancels nothing.
        read_property(registry, entity, property)?;

        if let Some(cancelled) = self.running.remove(&entity) {
            write_property(registry, entity, cancelled.property, cancelled.tween.to)?;
            log::debug!(
                "{:?}: cancelled {:?} {:?} at target {}",
                entity,
                cancelled.property,
                cancelled.phase,
                cancelled.tween.to
            );
        }

        let from = read_property(registry, entity, property)?;
        let generation = self.generation(entity).next();
        self.generations.insert(entity, generation);
        let phase = if follow_up.is_some() {
            Phase::FadeOut
        } else {
            Phase::Single
        };
        let tween = Tween::new(from, target, self.clock_ms, normalize_duration(duration_ms));
        self.running.insert(
            entity,
            Running {
                property,
                phase,
                tween,
                generation,
                follow_up,
            },
        );
        log::debug!(
            "{:?}: {:?} {} -> {} over {}ms ({:?})",
            entity,
            property,
            from,
            target,
            tween.duration_ms,
            generation
        );
        Ok(generation)
    }

    /// Two-phase opacity swap: fade out, assign `next`, fade in.
    pub fn start_swap(
        &mut self,
        registry: &mut SceneRegistry,
        entity: EntityId,
        next: MaterialSlot,
        phase_ms: f32,
    ) -> Result<Generation> {
        self.start(
            registry,
            entity,
            Property::SurfaceOpacity,
            0.0,
            phase_ms,
            Some(FollowUp::SwapAndFadeIn {
                next,
                duration_ms: phase_ms,
            }),
        )
    }

    /// Advance the clock and write every running value into the registry.
    /// Zero, negative or non-finite elapsed times change nothing.
    pub fn update(&mut self, registry: &mut SceneRegistry, elapsed_ms: f32) {
        if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return;
        }
        self.clock_ms += elapsed_ms as f64;
        let now = self.clock_ms;

        let entities: Vec<EntityId> = self.running.keys().copied().collect();
        for entity in entities {
            if let Err(err) = self.advance(registry, entity, now) {
                log::error!("{:?}: transition dropped: {}", entity, err);
                self.running.remove(&entity);
            }
        }
    }

    fn advance(&mut self, registry: &mut SceneRegistry, entity: EntityId, now: f64) -> Result<()> {
        while let Some(running) = self.running.get(&entity).copied() {
            if !running.tween.is_finished(now) {
                write_property(registry, entity, running.property, running.tween.sample(now))?;
                return Ok(());
            }

            write_property(registry, entity, running.property, running.tween.to)?;
            self.completions.push(Completion {
                entity,
                property: running.property,
                phase: running.phase,
                generation: running.generation,
                value: running.tween.to,
            });

            match running.follow_up {
                Some(FollowUp::SwapAndFadeIn { next, duration_ms }) => {
                    let surface = registry
                        .get_mut(entity)
                        .and_then(|resolved| resolved.surface_mut())
                        .ok_or(TransitionError::MissingProperty(entity, running.property))?;
                    surface.assign(next);
                    surface.set_opacity(0.0);
                    log::debug!("{:?}: swapped material to {:?}", entity, next);
                    // Phase two starts where phase one ended so leftover frame time carries over.
                    self.running.insert(
                        entity,
                        Running {
                            property: Property::SurfaceOpacity,
                            phase: Phase::FadeIn,
                            tween: Tween::new(
                                0.0,
                                1.0,
                                running.tween.end_ms(),
                                normalize_duration(duration_ms),
                            ),
                            generation: running.generation,
                            follow_up: None,
                        },
                    );
                }
                None => {
                    self.running.remove(&entity);
                }
            }
        }
        Ok(())
    }

    /// Drain completions emitted since the last call, in emission order.
    pub fn take_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.completions)
    }

    /// Reject completions whose generation has since been superseded.
    pub fn validate(&self, completion: &Completion) -> Result<()> {
        let current = self.generation(completion.entity);
        if completion.generation != current {
            return Err(TransitionError::StaleCompletion {
                entity: completion.entity,
                completed: completion.generation,
                current,
            });
        }
        Ok(())
    }
}
