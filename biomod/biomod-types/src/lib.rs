//! Core types for bioMod kinematic trees.
//!
//! This crate provides the value types and the rigid-body arithmetic that
//! the tree builder is made of:
//!
//! - [`Segment`] - One rigid body of the tree and its bioMod text block
//! - [`Axes`] - Ordered degree-of-freedom axis sequences
//! - [`combine`] - Mass-weighted composition of several bodies into one
//! - [`linalg`] - Checked vector helpers (normalization, directions, rotations)
//!
//! # Design Philosophy
//!
//! These types are **pure data** plus pure functions. Nothing here knows
//! about anatomy or configuration files; that lives in `biomod-build`.
//!
//! # Coordinate System
//!
//! - X: lateral
//! - Y: anteroposterior
//! - Z: longitudinal (up)
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use biomod_types::{combine, MassProperties};
//! use nalgebra::{Matrix3, Vector3};
//!
//! let upper = MassProperties::new(2.0, Vector3::new(0.0, 0.0, 1.0), Matrix3::identity());
//! let lower = MassProperties::new(2.0, Vector3::new(0.0, 0.0, -1.0), Matrix3::identity());
//! let both = combine(&[upper, lower]).unwrap();
//!
//! assert_eq!(both.properties.mass, 4.0);
//! assert_eq!(both.properties.inertia[(0, 0)], 6.0);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod axes;
mod error;
mod inertia;
pub mod linalg;
mod segment;

pub use axes::{Axes, Axis};
pub use error::BiomodError;
pub use inertia::{combine, Composition, MassProperties, ALIGNMENT_TOLERANCE};
pub use segment::{Mesh, MeshFrame, Parent, Segment, ROOT_SENTINEL};

/// Result type for bioMod operations.
pub type Result<T> = std::result::Result<T, BiomodError>;
