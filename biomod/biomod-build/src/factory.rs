//! Per-segment builders.
//!
//! Every segment of the tree is one [`SegmentKind`]. A kind knows its parent,
//! the regions its inertia is composed of and the rule placing its origin.
//! [`SegmentKind::build`] turns those static tables into a [`Segment`]:
//!
//! 1. the global origin comes from the kind's own rule,
//! 2. `xyz` is that origin minus the parent's origin, recomputed from the
//!    parent's rule rather than read from an already built segment,
//! 3. mass, center of mass and inertia come from one region or from
//!    [`combine`] over the constituent list,
//! 4. the center of mass is re-expressed relative to the origin, in the
//!    composition frame.
//!
//! All global origins are measured from the pelvis center of mass.

use std::fmt;

use nalgebra::Vector3;
use tracing::{debug, warn};

use biomod_types::linalg::{direction, midpoint, rotation_between};
use biomod_types::{combine, Axes, Axis, BiomodError, Parent, Result, Segment};

use crate::body::{BodyModel, Region, Side};
use crate::config::{AlignmentPolicy, ResolvedOptions};

/// Side order in which fused bilateral kinds compose their regions.
const FUSED_ORDER: [Side; 2] = [Side::Left, Side::Right];

/// A named segment of the kinematic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentKind {
    /// Root of the tree, six degrees of freedom.
    Pelvis,
    /// Lowest front rib to acromion.
    Thorax,
    /// Beneath nose to top of head.
    Head,
    /// Shoulder joint centre to mid-arm.
    Shoulder(Side),
    /// Mid-arm to elbow.
    UpperArm(Side),
    /// Elbow to wrist.
    Forearm(Side),
    /// Wrist to fingernails.
    Hand(Side),
    /// Elbow to fingernails as one body.
    ForearmAndHand(Side),
    /// Hip joint centre to knee.
    Thigh(Side),
    /// Knee to ankle.
    Shank(Side),
    /// Ankle to toenails.
    Foot(Side),
    /// Knee to toenails as one body.
    ShankAndFoot(Side),
    /// Both thighs fused.
    Thighs,
    /// Both shanks fused.
    Shanks,
    /// Both feet fused.
    Feet,
}

impl SegmentKind {
    /// Every segment kind.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut kinds = vec![Self::Pelvis, Self::Thorax, Self::Head];
        for side in Side::BOTH {
            kinds.extend([
                Self::Shoulder(side),
                Self::UpperArm(side),
                Self::Forearm(side),
                Self::Hand(side),
                Self::ForearmAndHand(side),
                Self::Thigh(side),
                Self::Shank(side),
                Self::Foot(side),
                Self::ShankAndFoot(side),
            ]);
        }
        kinds.extend([Self::Thighs, Self::Shanks, Self::Feet]);
        kinds
    }

    /// Look up a kind by its label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.label() == label)
    }

    /// Segment label, unique within a tree.
    #[must_use]
    pub fn label(self) -> String {
        self.to_string()
    }

    /// Parent kind, `None` for the pelvis.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        let parent = match self {
            Self::Pelvis => return None,
            Self::Thorax | Self::Thigh(_) | Self::Thighs => Self::Pelvis,
            Self::Head | Self::Shoulder(_) => Self::Thorax,
            Self::UpperArm(side) => Self::Shoulder(side),
            Self::Forearm(side) | Self::ForearmAndHand(side) => Self::UpperArm(side),
            Self::Hand(side) => Self::Forearm(side),
            Self::Shank(side) | Self::ShankAndFoot(side) => Self::Thigh(side),
            Self::Foot(side) => Self::Shank(side),
            Self::Shanks => Self::Thighs,
            Self::Feet => Self::Shanks,
        };
        Some(parent)
    }

    /// Whether the kind fuses both sides of the body.
    #[must_use]
    pub fn is_fused(self) -> bool {
        matches!(self, Self::Thighs | Self::Shanks | Self::Feet)
    }

    /// Regions whose inertia makes up the segment, in composition order.
    #[must_use]
    pub fn constituents(self) -> Vec<Region> {
        match self {
            Self::Pelvis => vec![Region::Pelvis],
            Self::Thorax => (2..=4).map(Region::torso).collect(),
            Self::Head => (5..=7).map(Region::torso).collect(),
            Self::Shoulder(side) => vec![Region::arm(side, 0)],
            Self::UpperArm(side) => vec![Region::arm(side, 1)],
            Self::Forearm(side) => (2..=3).map(|i| Region::arm(side, i)).collect(),
            Self::Hand(side) => (4..=6).map(|i| Region::arm(side, i)).collect(),
            Self::ForearmAndHand(side) => vec![Region::ForearmHand(side)],
            Self::Thigh(side) => vec![Region::Thigh(side)],
            Self::Shank(side) => (3..=4).map(|i| Region::leg(side, i)).collect(),
            Self::Foot(side) => (5..=8).map(|i| Region::leg(side, i)).collect(),
            Self::ShankAndFoot(side) => vec![Region::ShankFoot(side)],
            Self::Thighs | Self::Shanks | Self::Feet => FUSED_ORDER
                .into_iter()
                .flat_map(|side| match self {
                    Self::Thighs => vec![Region::Thigh(side)],
                    Self::Shanks => (3..=4).map(|i| Region::leg(side, i)).collect(),
                    _ => (5..=8).map(|i| Region::leg(side, i)).collect(),
                })
                .collect(),
        }
    }

    /// Default free translations.
    #[must_use]
    pub fn default_translations(self) -> Axes {
        match self {
            Self::Pelvis => Axes::all(),
            _ => Axes::none(),
        }
    }

    /// Default free rotations.
    #[must_use]
    pub fn default_rotations(self) -> Axes {
        let axes: &[Axis] = match self {
            Self::Pelvis => &[Axis::X, Axis::Y, Axis::Z],
            Self::UpperArm(_) | Self::Forearm(_) | Self::ForearmAndHand(_) => &[Axis::Z, Axis::Y],
            Self::Thigh(_) | Self::Thighs => &[Axis::X, Axis::Y],
            Self::Shank(_) | Self::Foot(_) | Self::Shanks | Self::Feet => &[Axis::X],
            _ => &[],
        };
        // Static tables hold no duplicates.
        Axes::from_axes(axes.iter().copied()).unwrap_or_default()
    }

    /// Global origin of the segment, measured from the pelvis center of mass.
    pub fn origin(self, body: &dyn BodyModel) -> Result<Vector3<f64>> {
        let pelvis = body.require(Region::Pelvis, &self.label())?;
        Ok(self.raw_origin(body)? - pelvis.global_center_of_mass())
    }

    /// Global origin in the body-model frame.
    fn raw_origin(self, body: &dyn BodyModel) -> Result<Vector3<f64>> {
        let label = self.label();
        let position = |region: Region| body.require(region, &label).map(|p| p.position);
        match self {
            Self::Pelvis => Ok(body.require(Region::Pelvis, &label)?.global_center_of_mass()),
            Self::Thorax => position(Region::Thorax),
            Self::Head => position(Region::torso(5)),
            Self::Shoulder(side) => position(Region::arm(side, 0)),
            Self::UpperArm(side) => position(Region::arm(side, 1)),
            Self::Forearm(side) | Self::ForearmAndHand(side) => {
                position(Region::ForearmHand(side))
            }
            Self::Hand(side) => far_end(
                body,
                Region::ForearmHand(side),
                &[Region::arm(side, 2), Region::arm(side, 3)],
                &label,
            ),
            Self::Thigh(side) => position(Region::Thigh(side)),
            Self::Shank(side) | Self::ShankAndFoot(side) => position(Region::ShankFoot(side)),
            Self::Foot(side) => far_end(
                body,
                Region::ShankFoot(side),
                &[Region::leg(side, 3), Region::leg(side, 4)],
                &label,
            ),
            Self::Thighs => Ok(midpoint(
                &position(Region::Thigh(Side::Left))?,
                &position(Region::Thigh(Side::Right))?,
            )),
            Self::Shanks => Ok(midpoint(
                &position(Region::ShankFoot(Side::Left))?,
                &position(Region::ShankFoot(Side::Right))?,
            )),
            Self::Feet => Ok(midpoint(
                &Self::Foot(Side::Left).raw_origin(body)?,
                &Self::Foot(Side::Right).raw_origin(body)?,
            )),
        }
    }

    /// Build the segment from the body model.
    ///
    /// # Errors
    ///
    /// [`BiomodError::MissingAnatomicalRegion`] or
    /// [`BiomodError::MissingLandmark`] when the body model lacks data,
    /// [`BiomodError::DegenerateGeometry`] for a zero-length limb, and
    /// [`BiomodError::MisalignedComposition`] under
    /// [`AlignmentPolicy::Strict`].
    pub fn build(
        self,
        body: &dyn BodyModel,
        options: &ResolvedOptions,
        alignment: AlignmentPolicy,
    ) -> Result<Segment> {
        let label = self.label();

        let origin = self.origin(body)?;
        let (parent, xyz) = match self.parent() {
            Some(parent) => (Parent::segment(parent.label()), origin - parent.origin(body)?),
            None => (Parent::Root, origin),
        };

        let bodies = self
            .constituents()
            .into_iter()
            .map(|region| body.require(region, &label).map(|p| p.mass_properties()))
            .collect::<Result<Vec<_>>>()?;
        let composition = combine(&bodies)?;
        if !composition.is_aligned() {
            match alignment {
                AlignmentPolicy::Strict => {
                    return Err(BiomodError::MisalignedComposition {
                        segment: label,
                        angle: composition.misalignment,
                    });
                }
                AlignmentPolicy::Approximate => warn!(
                    segment = %label,
                    misalignment = composition.misalignment,
                    "composing regions expressed in different axes, inertia is approximate"
                ),
            }
        }
        let properties = composition.properties;

        let raw_origin = self.raw_origin(body)?;
        let mut center_of_mass =
            properties.frame.inverse() * (properties.center_of_mass - raw_origin);
        if options.is_symmetric {
            center_of_mass.x = 0.0;
            center_of_mass.y = 0.0;
        }

        debug!(
            segment = %label,
            mass = properties.mass,
            misalignment = composition.misalignment,
            "built segment"
        );
        if let Some(bend) = self.limb_bend(body) {
            debug!(segment = %label, bend, "limb bend relative to parent limb");
        }

        let mut segment = Segment::new(
            label,
            parent,
            xyz,
            center_of_mass,
            properties.mass,
            properties.inertia,
        )
        .with_translations(options.translations.clone())
        .with_rotations(options.rotations.clone())
        .with_ranges_q(options.ranges_q.clone())
        .with_patches(options.patches.clone());
        segment.mesh.clone_from(&options.mesh);
        segment.mesh_color = options.mesh_color;
        segment.mesh_scale = options.mesh_scale;
        segment.mesh_frame = options.mesh_frame;
        Ok(segment)
    }

    /// Angle between a length-placed segment's limb and its parent limb.
    ///
    /// Diagnostic only; `None` when either limb lacks an end landmark.
    fn limb_bend(self, body: &dyn BodyModel) -> Option<f64> {
        let (limb, parent_limb) = match self {
            Self::Hand(side) => (Region::ForearmHand(side), Region::UpperArm(side)),
            Self::Foot(side) => (Region::ShankFoot(side), Region::Thigh(side)),
            _ => return None,
        };
        let axis = |region: Region| {
            let p = body.region(region)?;
            Some(p.end_position? - p.position)
        };
        rotation_between(&axis(parent_limb)?, &axis(limb)?)
            .ok()
            .map(|r| r.angle())
    }
}

/// `R.position + (Σ heights) · unit(R.end_position − R.position)`.
fn far_end(
    body: &dyn BodyModel,
    limb: Region,
    spans: &[Region],
    segment: &str,
) -> Result<Vector3<f64>> {
    let props = body.require(limb, segment)?;
    let end = props
        .end_position
        .ok_or_else(|| BiomodError::missing_landmark("end_position", limb, segment))?;
    let mut length = 0.0;
    for &span in spans {
        length += body
            .require(span, segment)?
            .height
            .ok_or_else(|| BiomodError::missing_landmark("height", span, segment))?;
    }
    let dir = direction(&props.position, &end, &format!("{segment} limb direction ({limb})"))?;
    Ok(props.position + dir * length)
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pelvis => f.write_str("Pelvis"),
            Self::Thorax => f.write_str("Thorax"),
            Self::Head => f.write_str("Head"),
            Self::Shoulder(side) => write!(f, "{side}Shoulder"),
            Self::UpperArm(side) => write!(f, "{side}UpperArm"),
            Self::Forearm(side) => write!(f, "{side}Forearm"),
            Self::Hand(side) => write!(f, "{side}Hand"),
            Self::ForearmAndHand(side) => write!(f, "{side}ForearmAndHand"),
            Self::Thigh(side) => write!(f, "{side}Thigh"),
            Self::Shank(side) => write!(f, "{side}Shank"),
            Self::Foot(side) => write!(f, "{side}Foot"),
            Self::ShankAndFoot(side) => write!(f, "{side}ShankAndFoot"),
            Self::Thighs => f.write_str("Thighs"),
            Self::Shanks => f.write_str("Shanks"),
            Self::Feet => f.write_str("Feet"),
        }
    }
}
