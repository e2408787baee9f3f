//! One-slot-per-type event bus with delayed visibility.
//!
//! Each event type owns a channel with two cells: the *live* value readers
//! see, and the *pending* value written during the current step. Writes never
//! touch the live cell. At the end of every step the scheduler calls
//! [`EventBus::swap`], which:
//!
//! 1. clears every channel published by the previous swap
//! 2. remembers the channels written this step as the next ones to clear
//! 3. publishes those pending values into their live cells
//!
//! A value written during step N is therefore invisible during N, visible
//! throughout N + 1, and gone after N + 1 unless it was written again.

use std::{
    any::{Any, TypeId},
    fmt,
    marker::PhantomData,
    mem,
};

use hashbrown::HashMap;

use crate::event::Event;

/// Type-erased channel operations used by [`EventBus::swap`].
trait ErasedChannel: Any {
    fn name(&self) -> &'static str;
    fn expire(&mut self);
    fn publish(&mut self);
    fn is_live(&self) -> bool;
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Channel<E> {
    live: Option<E>,
    pending: Option<E>,
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self {
            live: None,
            pending: None,
        }
    }
}

impl<E: Event> ErasedChannel for Channel<E> {
    fn name(&self) -> &'static str {
        E::event_name()
    }

    fn expire(&mut self) {
        self.live = None;
    }

    fn publish(&mut self) {
        if let Some(value) = self.pending.take() {
            self.live = Some(value);
        }
    }

    fn is_live(&self) -> bool {
        self.live.is_some()
    }

    fn clear(&mut self) {
        self.live = None;
        self.pending = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Shared event bus of a world.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<TypeId, Box<dyn ErasedChannel>>,
    /// Types written since the last swap.
    written: Vec<TypeId>,
    /// Types published by the last swap, cleared by the next one.
    expiring: Vec<TypeId>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `value` for publication at the next swap.
    ///
    /// A second write of the same type before the swap replaces the first.
    pub fn write<E: Event>(&mut self, value: E) {
        let type_id = TypeId::of::<E>();
        let channel = self
            .channels
            .entry(type_id)
            .or_insert_with(|| Box::new(Channel::<E>::default()))
            .as_any_mut()
            .downcast_mut::<Channel<E>>()
            .expect("Type mismatch in event channel");

        if channel.pending.replace(value).is_none() {
            self.written.push(type_id);
        }
    }

    /// Read the live value of an event type.
    #[must_use]
    pub fn read<E: Event>(&self) -> Option<&E> {
        self.channel::<E>()?.live.as_ref()
    }

    /// Check if an event type currently has a live value.
    #[must_use]
    pub fn has<E: Event>(&self) -> bool {
        self.channel::<E>()
            .is_some_and(|channel| channel.live.is_some())
    }

    /// Typed read view for one event type.
    #[must_use]
    pub fn reader<E: Event>(&self) -> EventReader<'_, E> {
        EventReader {
            bus: self,
            _marker: PhantomData,
        }
    }

    /// Typed write view for one event type.
    pub fn writer<E: Event>(&mut self) -> EventWriter<'_, E> {
        EventWriter {
            bus: self,
            _marker: PhantomData,
        }
    }

    /// End-of-step swap. See the module docs for the exact order.
    pub fn swap(&mut self) {
        for type_id in mem::take(&mut self.expiring) {
            if let Some(channel) = self.channels.get_mut(&type_id) {
                channel.expire();
            }
        }

        self.expiring = mem::take(&mut self.written);

        for type_id in &self.expiring {
            if let Some(channel) = self.channels.get_mut(type_id) {
                tracing::trace!(event = channel.name(), "publishing event");
                channel.publish();
            }
        }

        if !self.expiring.is_empty() {
            tracing::debug!(published = self.expiring.len(), "swapped event buffers");
        }
    }

    /// Number of event types written since the last swap.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.written.len()
    }

    /// Number of event types currently readable.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.channels
            .values()
            .filter(|channel| channel.is_live())
            .count()
    }

    /// Drop every live and staged event.
    ///
    /// Channels stay allocated so later writes reuse them.
    pub fn clear(&mut self) {
        for channel in self.channels.values_mut() {
            channel.clear();
        }
        self.written.clear();
        self.expiring.clear();
    }

    fn channel<E: Event>(&self) -> Option<&Channel<E>> {
        self.channels
            .get(&TypeId::of::<E>())?
            .as_any()
            .downcast_ref::<Channel<E>>()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.len())
            .field("pending", &self.written.len())
            .field("live", &self.live_count())
            .finish()
    }
}

// ============================================================================
// Typed Views
// ============================================================================

/// Read view for one event type.
pub struct EventReader<'a, E: Event> {
    bus: &'a EventBus,
    _marker: PhantomData<fn() -> E>,
}

impl<'a, E: Event> EventReader<'a, E> {
    /// The live value, if any.
    #[must_use]
    pub fn read(&self) -> Option<&'a E> {
        self.bus.read::<E>()
    }

    /// Check if a live value exists.
    #[must_use]
    pub fn has(&self) -> bool {
        self.bus.has::<E>()
    }
}

impl<E: Event> fmt::Debug for EventReader<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventReader")
            .field("event", &E::event_name())
            .field("live", &self.has())
            .finish()
    }
}

/// Write view for one event type.
pub struct EventWriter<'a, E: Event> {
    bus: &'a mut EventBus,
    _marker: PhantomData<fn(E)>,
}

impl<E: Event> EventWriter<'_, E> {
    /// Stage a value for the next swap.
    pub fn write(&mut self, value: E) {
        self.bus.write(value);
    }
}

impl<E: Event> fmt::Debug for EventWriter<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWriter")
            .field("event", &E::event_name())
            .finish()
    }
}
