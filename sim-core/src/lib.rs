//! Hair strand placement and spring-damper simulation on a head mesh.
//!
//! Main components:
//! - [`mesh`]: read-only mesh snapshot and procedural head.
//! - [`kdtree`]: 3-D nearest-neighbour index used during placement.
//! - [`sampler`]: spawn-region extraction and uniform triangle sampling.
//! - [`field`]: rejection-sampled strand placement and render views.
//! - [`strand`]: per-strand state and ribbon anchor geometry.
//! - [`dynamics`]: per-frame spring-damper step with collision handling.
//! - [`collider`]: collision volumes.
//! - [`transform`]: rigid head pose.
//! - [`config`]: tunables and TOML loading.
//! - [`error`]: error type.
//! - [`types`]: shared index aliases.

pub mod collider;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod field;
pub mod kdtree;
pub mod mesh;
pub mod sampler;
pub mod strand;
pub mod transform;
pub mod types;

pub use config::Config;
pub use error::{HairError, Result};
