//! Whole-body assembly and document rendering.

use std::fmt;

use nalgebra::Vector3;
use tracing::{debug, info};

use biomod_types::linalg::format_vec;
use biomod_types::{BiomodError, Result, Segment};

use crate::body::{BodyModel, Side};
use crate::config::{ArmLayout, Configuration, LegLayout, ModelOptions};
use crate::factory::SegmentKind;
use crate::validation::validate;

/// Which segments make up the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeLayout {
    /// Leg segmentation.
    pub legs: LegLayout,
    /// Left arm segmentation.
    pub left_arm: ArmLayout,
    /// Right arm segmentation.
    pub right_arm: ArmLayout,
}

impl From<&ModelOptions> for TreeLayout {
    fn from(options: &ModelOptions) -> Self {
        Self {
            legs: options.legs,
            left_arm: options.left_arm,
            right_arm: options.right_arm,
        }
    }
}

impl TreeLayout {
    /// Segment kinds in render order: pelvis, thorax, head, right arm, left
    /// arm, then legs with the right side first.
    #[must_use]
    pub fn segments(&self) -> Vec<SegmentKind> {
        let mut kinds = vec![SegmentKind::Pelvis, SegmentKind::Thorax, SegmentKind::Head];

        for side in Side::BOTH {
            kinds.extend([SegmentKind::Shoulder(side), SegmentKind::UpperArm(side)]);
            match self.arm(side) {
                ArmLayout::Separate => {
                    kinds.extend([SegmentKind::Forearm(side), SegmentKind::Hand(side)]);
                }
                ArmLayout::Fused => kinds.push(SegmentKind::ForearmAndHand(side)),
            }
        }

        match self.legs {
            LegLayout::Separate => {
                for side in Side::BOTH {
                    kinds.extend([
                        SegmentKind::Thigh(side),
                        SegmentKind::Shank(side),
                        SegmentKind::Foot(side),
                    ]);
                }
            }
            LegLayout::ShankAndFoot => {
                for side in Side::BOTH {
                    kinds.extend([SegmentKind::Thigh(side), SegmentKind::ShankAndFoot(side)]);
                }
            }
            LegLayout::Fused => {
                kinds.extend([SegmentKind::Thighs, SegmentKind::Shanks, SegmentKind::Feet]);
            }
        }

        kinds
    }

    fn arm(&self, side: Side) -> ArmLayout {
        match side {
            Side::Left => self.left_arm,
            Side::Right => self.right_arm,
        }
    }
}

/// A complete bioMod document.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomodDocument {
    /// Gravity line of the header.
    pub gravity: Option<Vector3<f64>>,
    /// Segments in render order.
    pub segments: Vec<Segment>,
}

impl BiomodDocument {
    /// Sum of segment masses.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.segments.iter().map(|s| s.mass).sum()
    }

    /// Find a segment by label.
    #[must_use]
    pub fn segment(&self, label: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.label == label)
    }
}

impl fmt::Display for BiomodDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version 4\n\nroot_actuated 0\nexternal_forces 0\n\n")?;
        if let Some(gravity) = &self.gravity {
            write!(f, "gravity {}\n\n", format_vec(gravity))?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Build, validate and collect every segment of the configured layout.
///
/// Configuration is resolved before the body model is read, so option errors
/// surface even when the body model is incomplete.
///
/// # Errors
///
/// [`BiomodError::InvalidConfiguration`] for bad options,
/// [`BiomodError::IncompleteTree`] when any builder fails, and the tree
/// validation errors when the built segments do not form a valid tree.
pub fn assemble(body: &dyn BodyModel, config: &Configuration) -> Result<BiomodDocument> {
    let layout = TreeLayout::from(&config.model);
    let resolved = config.resolve(&layout.segments())?;

    let mut segments = Vec::with_capacity(resolved.len());
    let mut failed = Vec::new();
    let mut first_error = None;
    for (kind, options) in &resolved {
        match kind.build(body, options, config.model.alignment) {
            Ok(segment) => segments.push(segment),
            Err(err) => {
                debug!(segment = %kind, error = %err, "segment builder failed");
                failed.push(kind.label());
                first_error.get_or_insert(err);
            }
        }
    }
    if let Some(source) = first_error {
        return Err(BiomodError::IncompleteTree {
            segments: failed,
            source: Box::new(source),
        });
    }

    let tree = validate(&segments)?;
    info!(
        root = %tree.root,
        segments = segments.len(),
        "assembled kinematic tree"
    );

    Ok(BiomodDocument {
        gravity: config.model.gravity.map(Vector3::from),
        segments,
    })
}
