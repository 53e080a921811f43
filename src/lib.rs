//! Falling-sand style particle engine with continuous positions.
//!
//! Particles live in a fixed-capacity pool, are indexed each tick by a
//! uniform grid, interact through a small table of material rules and are
//! rasterized into an RGBA buffer. [`Simulation`] ties the pieces together.

pub mod config;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod material;
pub mod physics;
pub mod pool;
pub mod render;
pub mod scene;
pub mod simulation;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use material::{Material, MaterialDescriptor, Rgb};
pub use pool::{Particle, ParticleId};
pub use render::{Pixel, PixelBuffer};
pub use scene::ImportReport;
pub use simulation::{FrameStats, Simulation};
