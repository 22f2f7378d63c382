//! Human body model to bioMod kinematic tree.
//!
//! This crate turns the per-region output of an anthropometric body model
//! into a bioMod document:
//!
//! - [`body`] - Region catalog and the read-only [`BodyModel`] lookup
//! - [`config`] - Per-segment overrides and whole-body options
//! - [`factory`] - One builder per [`SegmentKind`]
//! - [`assemble`] - Layout selection, tree validation and rendering
//!
//! # Example
//!
//! ```no_run
//! use biomod_build::{assemble, BodySnapshot, Configuration};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let json = std::fs::read_to_string("body.json")?;
//! let body: BodySnapshot = serde_json::from_str(&json)?;
//! let document = assemble(&body, &Configuration::default())?;
//! print!("{document}");
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,        // Error docs added where non-obvious
    clippy::module_name_repetitions,   // SegmentKind in factory etc.
)]

pub mod assembler;
pub mod body;
pub mod config;
pub mod factory;
pub mod validation;

pub use assembler::{assemble, BiomodDocument, TreeLayout};
pub use body::{BodyModel, BodySnapshot, Chain, Region, RegionProperties, Side};
pub use config::{
    AlignmentPolicy, ArmLayout, Configuration, LegLayout, ModelOptions, ResolvedOptions,
    SegmentOptions,
};
pub use factory::SegmentKind;
pub use validation::{validate, ValidationResult};

pub use biomod_types::{BiomodError, Result, ROOT_SENTINEL};
