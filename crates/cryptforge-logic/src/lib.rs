//! Pure dungeon logic for CryptForge.
//!
//! Everything in this crate is independent of the module arena and of any
//! engine: functions take plain data and return results, so they can be unit
//! tested and reused by the generator, the harness and downstream tools.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Generation tunables, JSON loading and validation |
//! | [`graph`] | Module adjacency from connector links, BFS reachability |
//! | [`lamps`] | Wall lamp placement against an injected floor query |
//! | [`math`] | `Vec3`, `Aabb`, yaw-only `Pose` transforms |
//! | [`options`] | Dungeon choices offered between runs, room-count rolls |
//! | [`progress`] | Completed-dungeon tracking and boss unlock |
//! | [`rng`] | Seeded ChaCha streams and uniform picks |
//! | [`validation`] | Layout checks (start, connectivity, overlap, sealing, quota) |

pub mod config;
pub mod graph;
pub mod lamps;
pub mod math;
pub mod options;
pub mod progress;
pub mod rng;
pub mod validation;
