//! Adjoint-capable Monte Carlo particle transport collision engine.
//!
//! The crate implements the collision layer of a radiation transport code:
//! shared immutable reaction data (energy grids, hash-indexed searchers,
//! per-channel cross sections), per-atom collision algorithms (analogue,
//! survival-biased, line-energy), material-level aggregation, and the
//! collision kernel that applies the adjoint weight correction before
//! delegating to the cell material.
//!
//! Everything built at setup time (`Atom`, `Material`, `FilledGeometry`,
//! `CollisionKernel`) is immutable afterwards and safe to share across
//! worker threads; the only per-call mutable state is the caller's
//! `Particle`, `ParticleBank` and random number stream.

pub mod atom;
pub mod atom_core;
pub mod bank;
pub mod config;
pub mod constants;
pub mod data;
pub mod distribution;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod interpolation;
pub mod kernel;
pub mod kinematics;
pub mod material;
pub mod particle;
pub mod reaction;
pub mod rng;

pub use atom::Atom;
pub use atom_core::{ReactionCore, ReactionMap};
pub use bank::ParticleBank;
pub use config::{CollisionMode, TransportSettings};
pub use data::{AtomRecord, DistributionRecord, ReactionCategory, ReactionRecord};
pub use error::DataError;
pub use geometry::FilledGeometry;
pub use grid::HashGridSearcher;
pub use interpolation::Interpolation;
pub use kernel::CollisionKernel;
pub use material::Material;
pub use particle::{Particle, ParticleType};
pub use reaction::{Reaction, ReactionType, Subshell};
pub use rng::HistoryRng;
