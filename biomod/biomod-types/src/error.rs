//! Error types for segment construction and model assembly.

use thiserror::Error;

/// Errors that can occur while building or rendering a bioMod tree.
///
/// Every variant is fatal for the current conversion: the input snapshot is
/// static, so there is nothing to retry and no partial document is emitted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BiomodError {
    /// The body model does not expose a region a builder needs.
    #[error("body model has no region {region} (needed by segment {segment})")]
    MissingAnatomicalRegion {
        /// Region code that was looked up.
        region: String,
        /// Segment whose builder asked for it.
        segment: String,
    },

    /// A region exists but lacks a landmark required for origin placement.
    #[error("region {region} has no {landmark} (needed by segment {segment})")]
    MissingLandmark {
        /// The missing landmark (`end_position` or `height`).
        landmark: &'static str,
        /// Region code that was looked up.
        region: String,
        /// Segment whose builder asked for it.
        segment: String,
    },

    /// A normalization or division hit a zero-length vector or zero mass.
    #[error("degenerate geometry: {context}")]
    DegenerateGeometry {
        /// What was being computed.
        context: String,
    },

    /// Inertia composition was invoked with no regions.
    #[error("cannot compose inertia of an empty region set")]
    EmptyComposition,

    /// Regions with differently oriented frames were composed under the
    /// strict alignment policy.
    #[error("segment {segment}: constituent frames differ by {angle} rad")]
    MisalignedComposition {
        /// Segment being composed.
        segment: String,
        /// Largest angle between a constituent frame and the shared frame.
        angle: f64,
    },

    /// One or more segments of the requested tree could not be built.
    #[error("incomplete tree, could not build {segments:?}: {source}")]
    IncompleteTree {
        /// Labels of every segment whose builder failed.
        segments: Vec<String>,
        /// The first builder failure.
        #[source]
        source: Box<BiomodError>,
    },

    /// Configuration references an unknown label or holds a malformed value.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the problem.
        reason: String,
    },

    /// Two segments share a label.
    #[error("duplicate segment label: {0}")]
    DuplicateSegment(String),

    /// A segment names a parent that is not in the tree.
    #[error("segment {segment} references undefined parent {parent}")]
    UndefinedParent {
        /// The child segment.
        segment: String,
        /// The parent label that does not resolve.
        parent: String,
    },

    /// No segment is attached to the root sentinel.
    #[error("no root segment found")]
    NoRootSegment,

    /// More than one segment is attached to the root sentinel.
    #[error("multiple root segments found: {0:?}")]
    MultipleRootSegments(Vec<String>),

    /// The parent graph contains a cycle.
    #[error("kinematic loop detected: {0}")]
    KinematicLoop(String),

    /// Non-positive or non-finite mass.
    #[error("invalid mass for segment {segment}: {mass}")]
    InvalidMass {
        /// The offending segment.
        segment: String,
        /// The invalid mass value.
        mass: f64,
    },

    /// Inertia tensor is not symmetric positive semi-definite.
    #[error("invalid inertia tensor for segment {segment}: {message}")]
    InvalidInertia {
        /// The offending segment.
        segment: String,
        /// Description of why the tensor is invalid.
        message: String,
    },
}

impl BiomodError {
    /// Create a missing region error.
    pub fn missing_region(region: impl ToString, segment: impl Into<String>) -> Self {
        Self::MissingAnatomicalRegion {
            region: region.to_string(),
            segment: segment.into(),
        }
    }

    /// Create a missing landmark error.
    pub fn missing_landmark(
        landmark: &'static str,
        region: impl ToString,
        segment: impl Into<String>,
    ) -> Self {
        Self::MissingLandmark {
            landmark,
            region: region.to_string(),
            segment: segment.into(),
        }
    }

    /// Create a degenerate geometry error.
    pub fn degenerate(context: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            context: context.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create an invalid inertia error.
    pub fn invalid_inertia(segment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInertia {
            segment: segment.into(),
            message: message.into(),
        }
    }

    /// Create an invalid mass error.
    pub fn invalid_mass(segment: impl Into<String>, mass: f64) -> Self {
        Self::InvalidMass {
            segment: segment.into(),
            mass,
        }
    }
}
