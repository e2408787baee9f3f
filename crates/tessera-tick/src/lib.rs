#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::missing_panics_doc)]

//! Step-based execution for Tessera worlds.
//!
//! # Step Model
//!
//! ```text
//! Step N:
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Phase 1: Run each system in registration order             │
//! │           (reads store, resources, live events;             │
//! │            records commands, stages events)                 │
//! │  Phase 2: Apply command buffers in registration order       │
//! │           (destroys, resource removals, spawns)             │
//! │  Phase 3: Swap event buffers                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Commands::set_resource` is the one write that lands during phase 1.
//!
//! # Example
//!
//! ```
//! use tessera_tick::World;
//!
//! struct Name(&'static str);
//! struct Ticks(u32);
//!
//! let mut world = World::new();
//! world
//!     .add_startup_system(|cmd| {
//!         cmd.spawn((Name("person1"),));
//!     })
//!     .set_resource(Ticks(0))
//!     .add_system(|_cmd, queryer, resources, _events| {
//!         let named = queryer.query::<(Name,)>().len() as u32;
//!         if let Some(mut ticks) = resources.get_mut::<Ticks>() {
//!             ticks.0 += named;
//!         }
//!     });
//!
//! world.startup();
//! world.run(2);
//! world.shutdown();
//! ```

mod world;

pub use world::{StartupSystem, UpdateSystem, World, WorldConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use tessera_ecs::prelude::*;
    pub use tessera_event::{Event, EventBus};

    pub use crate::{World, WorldConfig};
}
