//! Event marker trait.
//!
//! The Event trait marks a type as being usable on the [`EventBus`].
//!
//! [`EventBus`]: crate::EventBus

/// Marker trait for event payloads.
///
/// Any `'static` type can be written to the bus. The bus keeps at most one
/// value per event type.
pub trait Event: 'static {
    /// Get the name of this event type, used in logs.
    fn event_name() -> &'static str {
        core::any::type_name::<Self>()
    }
}

// Blanket implementation: any 'static type can be an event
impl<T: 'static> Event for T {}
