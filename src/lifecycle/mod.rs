//! Generic lifecycle engine.
//!
//! Entities with a state machine (trackings, reminders) share one hook
//! mechanism: ordered handler lists for create/update/delete events and for
//! the two sides of a state change. Handlers run strictly in registration
//! order; the first failing handler aborts the remaining ones and the error
//! propagates to the caller.
//!
//! A state change is deliberately split in three phases:
//!
//! 1. [`Lifecycle::transition`] validates the change and runs the
//!    before-handlers. It never mutates the entity.
//! 2. The caller persists the new state.
//! 3. The caller invokes [`Lifecycle::after_state_change`], so after-handlers
//!    always observe a durably committed state.

mod reminder;
mod tracking;

use anyhow::Result;
use thiserror::Error;

pub(crate) use reminder::{ReminderLifecycle, validate_status_value};
pub(crate) use tracking::TrackingLifecycle;

/// Handler invoked when an entity is created, updated or deleted.
pub(crate) type EntityHook<E> = Box<dyn Fn(&E) -> Result<()>>;
/// Handler invoked around a state change with `(entity, from, to)`.
pub(crate) type ChangeHook<E, S> = Box<dyn Fn(&E, S, S) -> Result<()>>;

#[derive(Debug, Error)]
pub(crate) enum LifecycleError {
    /// The requested transition is not in the allowed set. The entity is
    /// left unchanged.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    /// A registered handler failed; the remaining handlers were skipped.
    #[error("lifecycle hook failed: {0}")]
    Hook(#[source] anyhow::Error),
}

/// Ordered handler lists for one entity type.
pub(crate) struct LifecycleHooks<E, S> {
    on_create: Vec<EntityHook<E>>,
    on_update: Vec<EntityHook<E>>,
    on_delete: Vec<EntityHook<E>>,
    before_state_change: Vec<ChangeHook<E, S>>,
    after_state_change: Vec<ChangeHook<E, S>>,
}

impl<E, S> LifecycleHooks<E, S> {
    pub fn new() -> Self {
        Self {
            on_create: Vec::new(),
            on_update: Vec::new(),
            on_delete: Vec::new(),
            before_state_change: Vec::new(),
            after_state_change: Vec::new(),
        }
    }

    pub fn on_create(&mut self, hook: EntityHook<E>) {
        self.on_create.push(hook);
    }

    pub fn on_update(&mut self, hook: EntityHook<E>) {
        self.on_update.push(hook);
    }

    pub fn on_delete(&mut self, hook: EntityHook<E>) {
        self.on_delete.push(hook);
    }

    pub fn before_state_change(&mut self, hook: ChangeHook<E, S>) {
        self.before_state_change.push(hook);
    }

    pub fn after_state_change(&mut self, hook: ChangeHook<E, S>) {
        self.after_state_change.push(hook);
    }
}

impl<E, S> Default for LifecycleHooks<E, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A concrete lifecycle supplies the state accessor and transition rules the
/// engine leaves abstract; the engine supplies hook execution on top.
pub(crate) trait Lifecycle {
    type Entity;
    type State: Copy;

    fn hooks(&self) -> &LifecycleHooks<Self::Entity, Self::State>;
    fn current_state(&self, entity: &Self::Entity) -> Self::State;
    fn validate_transition(&self, from: Self::State, to: Self::State)
    -> Result<(), LifecycleError>;

    /// Runs the on-create handlers for a freshly persisted entity.
    fn created(&self, entity: &Self::Entity) -> Result<(), LifecycleError> {
        run_entity_hooks(&self.hooks().on_create, entity)
    }

    /// Runs the on-update handlers after a field update.
    fn updated(&self, entity: &Self::Entity) -> Result<(), LifecycleError> {
        run_entity_hooks(&self.hooks().on_update, entity)
    }

    /// Runs the on-delete handlers after an entity is removed.
    fn deleted(&self, entity: &Self::Entity) -> Result<(), LifecycleError> {
        run_entity_hooks(&self.hooks().on_delete, entity)
    }

    /// Validates the transition and runs the before-handlers. Returns the
    /// state the entity is transitioning from.
    ///
    /// The entity is not mutated and the after-handlers do not run here: the
    /// caller persists the new state first and then invokes
    /// [`after_state_change`](Self::after_state_change).
    fn transition(
        &self,
        entity: &Self::Entity,
        to: Self::State,
    ) -> Result<Self::State, LifecycleError> {
        let from = self.current_state(entity);
        self.validate_transition(from, to)?;
        for hook in &self.hooks().before_state_change {
            hook(entity, from, to).map_err(LifecycleError::Hook)?;
        }
        Ok(from)
    }

    /// Runs the after-handlers once the new state is durably persisted.
    fn after_state_change(
        &self,
        entity: &Self::Entity,
        from: Self::State,
        to: Self::State,
    ) -> Result<(), LifecycleError> {
        for hook in &self.hooks().after_state_change {
            hook(entity, from, to).map_err(LifecycleError::Hook)?;
        }
        Ok(())
    }
}

fn run_entity_hooks<E>(hooks: &[EntityHook<E>], entity: &E) -> Result<(), LifecycleError> {
    for hook in hooks {
        hook(entity).map_err(LifecycleError::Hook)?;
    }
    Ok(())
}
