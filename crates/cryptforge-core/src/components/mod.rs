//! Component definitions for the module arena.
//!
//! Components are pure data attached to module and cap entities.
//! Placement, linking and capping live in `generation`.

mod connector;
mod module;

pub use connector::*;
pub use module::*;
