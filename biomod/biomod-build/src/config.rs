//! Per-segment option overrides and whole-body options.
//!
//! A configuration file maps segment labels to [`SegmentOptions`]; the
//! reserved key `Human` holds [`ModelOptions`]:
//!
//! ```toml
//! [Human]
//! legs = "fused"
//! gravity = [0.0, 0.0, -9.81]
//!
//! [RightUpperArm]
//! rotations = "xyz"
//! rangesQ = [[-3.14, 3.14], [-1.0, 1.0], [-1.57, 1.57]]
//!
//! [Thighs]
//! is_symmetric = true
//! ```
//!
//! Options are merged field by field over the defaults of each segment kind
//! by [`SegmentOptions::resolve`], which also rejects malformed values.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use biomod_types::{Axes, BiomodError, Mesh, MeshFrame, Result};

use crate::factory::SegmentKind;

// ============================================================================
// Whole-body options
// ============================================================================

/// How the legs are split into segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegLayout {
    /// Thigh, shank and foot per side.
    #[default]
    Separate,
    /// Thigh and one shank-and-foot segment per side.
    ShankAndFoot,
    /// One bilateral chain: thighs, shanks, feet.
    Fused,
}

/// How one arm is split into segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmLayout {
    /// Forearm and hand as two segments.
    #[default]
    Separate,
    /// A single forearm-and-hand segment.
    Fused,
}

/// What to do when composed regions are not expressed in the same axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Compose anyway and log a warning.
    #[default]
    Approximate,
    /// Fail with [`BiomodError::MisalignedComposition`].
    Strict,
}

/// Whole-body options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Leg segmentation.
    pub legs: LegLayout,
    /// Left arm segmentation.
    pub left_arm: ArmLayout,
    /// Right arm segmentation.
    pub right_arm: ArmLayout,
    /// Gravity vector written in the header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<[f64; 3]>,
    /// Frame alignment policy for inertia composition.
    pub alignment: AlignmentPolicy,
}

impl ModelOptions {
    /// Set the leg layout.
    #[must_use]
    pub fn with_legs(mut self, legs: LegLayout) -> Self {
        self.legs = legs;
        self
    }

    /// Set both arm layouts.
    #[must_use]
    pub fn with_arms(mut self, left: ArmLayout, right: ArmLayout) -> Self {
        self.left_arm = left;
        self.right_arm = right;
        self
    }

    /// Set the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = Some(gravity.into());
        self
    }

    /// Set the alignment policy.
    #[must_use]
    pub fn with_alignment(mut self, alignment: AlignmentPolicy) -> Self {
        self.alignment = alignment;
        self
    }
}

// ============================================================================
// Per-segment options
// ============================================================================

/// Overrides for one segment. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentOptions {
    /// Free translations, e.g. `"xyz"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<String>,
    /// Free rotations, e.g. `"zy"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotations: Option<String>,
    /// `[min, max]` per degree of freedom.
    #[serde(rename = "rangesQ", skip_serializing_if = "Option::is_none")]
    pub ranges_q: Option<Vec<[f64; 2]>>,
    /// Inline mesh vertices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<Vec<[f64; 3]>>,
    /// Mesh file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshfile: Option<String>,
    /// Mesh RGB color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshcolor: Option<[f64; 3]>,
    /// Mesh scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshscale: Option<[f64; 3]>,
    /// Mesh rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshrt: Option<[f64; 3]>,
    /// Mesh translation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshxyz: Option<[f64; 3]>,
    /// Patches as vertex-index triples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Vec<[usize; 3]>>,
    /// Zero the lateral and anteroposterior center of mass (fused segments).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_symmetric: Option<bool>,
}

/// Options of one segment after merging over its defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// Free translations.
    pub translations: Axes,
    /// Free rotations.
    pub rotations: Axes,
    /// Joint ranges, one per degree of freedom or empty.
    pub ranges_q: Vec<[f64; 2]>,
    /// Visual geometry.
    pub mesh: Option<Mesh>,
    /// Mesh color.
    pub mesh_color: Option<Vector3<f64>>,
    /// Mesh scale.
    pub mesh_scale: Option<Vector3<f64>>,
    /// Mesh placement.
    pub mesh_frame: Option<MeshFrame>,
    /// Patches.
    pub patches: Vec<[usize; 3]>,
    /// Symmetric center of mass.
    pub is_symmetric: bool,
}

impl ResolvedOptions {
    /// Defaults of `kind` with nothing overridden.
    #[must_use]
    pub fn defaults(kind: SegmentKind) -> Self {
        Self {
            translations: kind.default_translations(),
            rotations: kind.default_rotations(),
            ranges_q: Vec::new(),
            mesh: None,
            mesh_color: None,
            mesh_scale: None,
            mesh_frame: None,
            patches: Vec::new(),
            is_symmetric: false,
        }
    }
}

fn parse_axes(value: &str, field: &str, label: &str) -> Result<Axes> {
    value.parse().map_err(|e: BiomodError| {
        BiomodError::invalid_config(format!("{label}.{field}: {e}"))
    })
}

impl SegmentOptions {
    /// Merge over the defaults of `kind`.
    ///
    /// # Errors
    ///
    /// [`BiomodError::InvalidConfiguration`] for malformed axes, both `mesh`
    /// and `meshfile`, `is_symmetric` on a segment that is not fused, a
    /// range count that differs from the degree-of-freedom count, or a range
    /// with `min > max`.
    pub fn resolve(&self, kind: SegmentKind) -> Result<ResolvedOptions> {
        let label = kind.label();
        let mut resolved = ResolvedOptions::defaults(kind);

        if let Some(t) = &self.translations {
            resolved.translations = parse_axes(t, "translations", &label)?;
        }
        if let Some(r) = &self.rotations {
            resolved.rotations = parse_axes(r, "rotations", &label)?;
        }

        if let Some(ranges) = &self.ranges_q {
            let dof = resolved.translations.len() + resolved.rotations.len();
            if ranges.len() != dof {
                return Err(BiomodError::invalid_config(format!(
                    "{label}.rangesQ: {} ranges for {dof} degrees of freedom",
                    ranges.len()
                )));
            }
            if let Some([min, max]) = ranges.iter().find(|[min, max]| !(min <= max)) {
                return Err(BiomodError::invalid_config(format!(
                    "{label}.rangesQ: range [{min}, {max}] has min > max"
                )));
            }
            resolved.ranges_q.clone_from(ranges);
        }

        resolved.mesh = match (&self.mesh, &self.meshfile) {
            (Some(_), Some(_)) => {
                return Err(BiomodError::invalid_config(format!(
                    "{label}: mesh and meshfile are mutually exclusive"
                )));
            }
            (Some(vertices), None) => Some(Mesh::Vertices(
                vertices.iter().map(|v| Vector3::from(*v)).collect(),
            )),
            (None, Some(path)) => Some(Mesh::File(path.clone())),
            (None, None) => None,
        };
        resolved.mesh_color = self.meshcolor.map(Vector3::from);
        resolved.mesh_scale = self.meshscale.map(Vector3::from);
        if self.meshrt.is_some() || self.meshxyz.is_some() {
            resolved.mesh_frame = Some(MeshFrame {
                rt: self.meshrt.map_or_else(Vector3::zeros, Vector3::from),
                xyz: self.meshxyz.map_or_else(Vector3::zeros, Vector3::from),
            });
        }
        if let Some(patches) = &self.patch {
            resolved.patches.clone_from(patches);
        }

        if let Some(is_symmetric) = self.is_symmetric {
            if is_symmetric && !kind.is_fused() {
                return Err(BiomodError::invalid_config(format!(
                    "{label}: is_symmetric only applies to fused bilateral segments"
                )));
            }
            resolved.is_symmetric = is_symmetric;
        }

        Ok(resolved)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Whole-body options plus per-segment overrides keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Options stored under the reserved `Human` key.
    #[serde(rename = "Human", default)]
    pub model: ModelOptions,
    /// Per-segment overrides keyed by segment label.
    #[serde(flatten)]
    pub segments: BTreeMap<String, SegmentOptions>,
}

impl Configuration {
    /// Create a configuration with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the whole-body options.
    #[must_use]
    pub fn with_model(mut self, model: ModelOptions) -> Self {
        self.model = model;
        self
    }

    /// Set the options of one segment.
    #[must_use]
    pub fn with_segment(mut self, label: impl Into<String>, options: SegmentOptions) -> Self {
        self.segments.insert(label.into(), options);
        self
    }

    /// Resolve the options of every segment in `layout`.
    ///
    /// Runs before any region lookup. Labels that name no segment kind are
    /// errors. Options of kinds outside the layout are still validated, then
    /// ignored with a warning.
    ///
    /// # Errors
    ///
    /// [`BiomodError::InvalidConfiguration`] for an unknown label or any
    /// error from [`SegmentOptions::resolve`].
    pub fn resolve(&self, layout: &[SegmentKind]) -> Result<Vec<(SegmentKind, ResolvedOptions)>> {
        for (label, options) in &self.segments {
            let Some(kind) = SegmentKind::from_label(label) else {
                return Err(BiomodError::invalid_config(format!(
                    "unknown segment label '{label}'"
                )));
            };
            if !layout.contains(&kind) {
                options.resolve(kind)?;
                warn!(segment = %label, "options given for a segment outside the selected layout, ignoring");
            }
        }

        layout
            .iter()
            .map(|&kind| {
                let resolved = match self.segments.get(&kind.label()) {
                    Some(options) => options.resolve(kind)?,
                    None => ResolvedOptions::defaults(kind),
                };
                Ok((kind, resolved))
            })
            .collect()
    }
}
