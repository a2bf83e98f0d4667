use std::borrow::Cow;

use masterror::{AppError, Error};

use crate::{event_bus::EventBusError, module_context::ModuleContext};

pub mod clock;
pub mod weather;

/// Errors that can occur while registering a module.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Propagates failures originating from the event bus.
    #[error("module event bus interaction failed: {source}")]
    EventBus { source: EventBusError },
    /// Domain-specific registration failures surfaced by the module.
    #[error("module registration failed: {reason}")]
    Registration { reason: Cow<'static, str> },
}

impl ModuleError {
    /// Construct a registration error with the provided reason.
    pub fn registration(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Registration {
            reason: reason.into(),
        }
    }
}

impl From<EventBusError> for ModuleError {
    fn from(source: EventBusError) -> Self {
        Self::EventBus { source }
    }
}

impl From<ModuleError> for AppError {
    fn from(err: ModuleError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// Lifecycle shared by the dashboard's background modules.
///
/// [`register`](Module::register) is the mount hook: it receives the shared
/// [`ModuleContext`] and may spawn background work on its runtime handle.
/// [`teardown`](Module::teardown) must stop that work; implementations also
/// call it from `Drop` so a module cannot outlive its owner's tasks.
pub trait Module {
    /// Register the module with the shared runtime context.
    fn register(&mut self, ctx: &ModuleContext) -> Result<(), ModuleError>;

    /// Stop any background work. Calling it more than once is a no-op.
    fn teardown(&mut self);
}
