#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::missing_panics_doc)]

//! Tessera Event System
//!
//! A single bus shared by every system of a world, holding at most one value
//! per event type.
//!
//! # Visibility
//!
//! Events are double-buffered by step: a value written during step N is
//! readable throughout step N + 1 and then disappears. Systems that run after
//! the writer in step N do not see it yet, so every reader observes the same
//! value regardless of system order.
//!
//! # Example
//!
//! ```
//! use tessera_event::EventBus;
//!
//! struct Collision { depth: f32 }
//!
//! let mut bus = EventBus::new();
//!
//! // Step 1
//! bus.write(Collision { depth: 0.5 });
//! assert!(!bus.has::<Collision>());
//! bus.swap();
//!
//! // Step 2
//! assert_eq!(bus.read::<Collision>().map(|c| c.depth), Some(0.5));
//! bus.swap();
//!
//! // Step 3
//! assert!(!bus.has::<Collision>());
//! ```

mod bus;
mod event;

pub use bus::{EventBus, EventReader, EventWriter};
pub use event::Event;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Event, EventBus, EventReader, EventWriter};
}
