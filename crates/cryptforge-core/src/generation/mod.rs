//! Generation - catalog instantiation, alignment, growth and reconciliation.

mod align;
mod builder;
mod catalog;
mod reconcile;

pub use align::*;
pub use builder::*;
pub use catalog::*;
pub use reconcile::*;
