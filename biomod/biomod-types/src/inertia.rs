//! Rigid-body inertia composition.
//!
//! Combines several bodies into one by summing masses, taking the
//! mass-weighted center of mass and translating every inertia tensor to the
//! combined center with the tensor form of the parallel-axis theorem:
//!
//! ```text
//! I = Σ ( I_i + m_i (|r_i|² E − r_i r_iᵀ) ),   r_i = c_i − c
//! ```
//!
//! The sum is only exact when every `I_i` is expressed in the same axes.
//! [`combine`] does not rotate anything: it measures how far each body's
//! frame is from the first one and reports it in
//! [`Composition::misalignment`] so the caller can decide whether the
//! approximation is acceptable.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::error::BiomodError;
use crate::linalg::{angle_between, parallel_axis};
use crate::Result;

/// Frames closer than this (in radians) count as aligned.
pub const ALIGNMENT_TOLERANCE: f64 = 1e-9;

/// Mass properties of one body in a common (global) frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MassProperties {
    /// Mass in kg.
    pub mass: f64,
    /// Center of mass, global coordinates.
    pub center_of_mass: Vector3<f64>,
    /// Inertia about `center_of_mass`, expressed in `frame` axes.
    pub inertia: Matrix3<f64>,
    /// Orientation of the axes `inertia` is expressed in (local → global).
    pub frame: Rotation3<f64>,
}

impl MassProperties {
    /// Create mass properties expressed in global axes.
    #[must_use]
    pub fn new(mass: f64, center_of_mass: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        Self {
            mass,
            center_of_mass,
            inertia,
            frame: Rotation3::identity(),
        }
    }

    /// Set the frame the inertia tensor is expressed in.
    #[must_use]
    pub fn with_frame(mut self, frame: Rotation3<f64>) -> Self {
        self.frame = frame;
        self
    }
}

/// Result of composing several bodies into one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition {
    /// Combined mass properties. The inertia is about the combined center of
    /// mass, in the first constituent's frame.
    pub properties: MassProperties,
    /// Largest angle (radians) between any constituent frame and the shared
    /// frame. Zero for a consistent composition.
    pub misalignment: f64,
}

impl Composition {
    /// Whether all constituents shared the same axes.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.misalignment <= ALIGNMENT_TOLERANCE
    }
}

/// Compose bodies into a single rigid body.
///
/// # Errors
///
/// [`BiomodError::EmptyComposition`] for an empty slice and
/// [`BiomodError::DegenerateGeometry`] when the total mass is not positive.
pub fn combine(bodies: &[MassProperties]) -> Result<Composition> {
    let Some(first) = bodies.first() else {
        return Err(BiomodError::EmptyComposition);
    };
    let frame = first.frame;

    let mass: f64 = bodies.iter().map(|b| b.mass).sum();
    if !(mass > 0.0 && mass.is_finite()) {
        return Err(BiomodError::degenerate(format!(
            "composed mass must be positive, got {mass}"
        )));
    }

    // (c m) / m is not always c in floating point.
    if let [only] = bodies {
        return Ok(Composition {
            properties: *only,
            misalignment: 0.0,
        });
    }

    let center_of_mass = bodies
        .iter()
        .fold(Vector3::zeros(), |acc, b| acc + b.center_of_mass * b.mass)
        / mass;

    let mut inertia = Matrix3::zeros();
    let mut misalignment: f64 = 0.0;
    for body in bodies {
        // Offset from the combined center, in the shared axes.
        let offset = frame.inverse() * (body.center_of_mass - center_of_mass);
        inertia += body.inertia + parallel_axis(body.mass, &offset);
        misalignment = misalignment.max(angle_between(&frame, &body.frame));
    }

    Ok(Composition {
        properties: MassProperties {
            mass,
            center_of_mass,
            inertia,
            frame,
        },
        misalignment,
    })
}
