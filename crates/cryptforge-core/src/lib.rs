//! CryptForge Core - Procedural Dungeon Layout Generator
//!
//! Grows a dungeon out of room and hallway modules joined at their
//! connectors, seals whatever is left open, and hands the finished layout to
//! navigation baking and other downstream consumers.
//!
//! # Architecture
//!
//! Placed modules live in a `hecs` world owned by [`layout::DungeonLayout`]:
//! - **Entities**: rooms, hallways, wall caps
//! - **Components**: module identity and pose, footprint bounds, connectors
//! - **Generation**: alignment, overlap tests, growth, reconciliation
//!
//! [`session::DungeonSession`] wraps generation in retries and bake hand-off.
//!
//! # Example
//!
//! ```rust,no_run
//! use cryptforge_core::prelude::*;
//!
//! let catalog = ModuleCatalog::standard().unwrap();
//! let mut session = DungeonSession::new(catalog, GenerationConfig::default(), ImmediateBaker::default());
//! session.on_layout_ready(|| println!("dungeon ready"));
//!
//! session.start(&SessionRequest::normal(12)).unwrap();
//! while !session.poll() {}
//!
//! let layout = session.layout().unwrap();
//! println!("{} rooms", layout.rooms().len());
//! ```

pub mod components;
pub mod generation;
pub mod layout;
pub mod lighting;
pub mod session;
pub mod snapshot;
pub mod spatial;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::generation::{DungeonGraphBuilder, ModuleCatalog};
    pub use crate::layout::DungeonLayout;
    pub use crate::session::{DungeonSession, ImmediateBaker, SessionRequest, SessionState};
    pub use cryptforge_logic::config::GenerationConfig;
}
