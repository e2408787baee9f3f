//! ECS error types.

use thiserror::Error;

use crate::{entity::Entity, pool::SlotHandle};

/// ECS error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// A pool was asked to release a slot it does not consider live.
    #[error("invalid pool handle: {handle:?}")]
    InvalidHandle {
        /// The rejected handle.
        handle: SlotHandle,
    },

    /// The entity does not carry the requested component.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity that was looked up.
        entity: Entity,
        /// Type name of the requested component.
        component: &'static str,
    },

    /// A resource was expected to be absent but is already set.
    #[error("resource {resource} already exists")]
    DuplicateResource {
        /// Type name of the resource.
        resource: &'static str,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
