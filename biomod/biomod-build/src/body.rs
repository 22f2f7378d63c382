//! Read-only access to the anthropometric body model.
//!
//! The body model is a key→record lookup: every anatomical [`Region`] maps to
//! the [`RegionProperties`] the external regression model computed for it.
//! Builders only read through [`BodyModel`], so any provider can be plugged
//! in. [`BodySnapshot`] is the in-memory provider used by the CLI and tests.
//!
//! # Region codes
//!
//! Whole body-model segments use the codes `P`, `T`, `C`, `A1`, `A2`, `B1`,
//! `B2`, `J1`, `J2`, `K1`, `K2`. The stacked solids they are made of use a
//! chain prefix and an index: `s0`..`s7` (torso), `a0`..`a6` / `b0`..`b6`
//! (left / right arm), `j0`..`j8` / `k0`..`k8` (left / right leg).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use biomod_types::{BiomodError, MassProperties, Result};

/// Tolerance on `RᵀR - I` when accepting an orientation matrix.
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Region identifiers
// ============================================================================

/// Body side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// Left side of the body.
    Left,
    /// Right side of the body.
    Right,
}

impl Side {
    /// Both sides, right first.
    pub const BOTH: [Side; 2] = [Side::Right, Side::Left];

    /// Label prefix used in segment names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stack of solids in the body model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chain {
    /// Pelvis, thorax, chest and head (`s`).
    Torso,
    /// One arm (`a` left, `b` right).
    Arm(Side),
    /// One leg (`j` left, `k` right).
    Leg(Side),
}

impl Chain {
    /// Every chain in catalog order.
    pub const ALL: [Chain; 5] = [
        Chain::Torso,
        Chain::Arm(Side::Left),
        Chain::Arm(Side::Right),
        Chain::Leg(Side::Left),
        Chain::Leg(Side::Right),
    ];

    /// Code prefix of the chain's solids.
    #[must_use]
    pub fn prefix(self) -> char {
        match self {
            Self::Torso => 's',
            Self::Arm(Side::Left) => 'a',
            Self::Arm(Side::Right) => 'b',
            Self::Leg(Side::Left) => 'j',
            Self::Leg(Side::Right) => 'k',
        }
    }

    /// Number of solids in the chain.
    #[must_use]
    pub fn len(self) -> u8 {
        match self {
            Self::Torso => 8,
            Self::Arm(_) => 7,
            Self::Leg(_) => 9,
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|chain| chain.prefix() == c)
    }
}

/// An anatomical region of the body model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    /// `P`: hip joint centre to lowest front rib.
    Pelvis,
    /// `T`: lowest front rib to nipple.
    Thorax,
    /// `C`: nipple to top of head.
    ChestHead,
    /// `A1` / `B1`: shoulder joint centre to elbow.
    UpperArm(Side),
    /// `A2` / `B2`: elbow to fingernails.
    ForearmHand(Side),
    /// `J1` / `K1`: hip joint centre to knee.
    Thigh(Side),
    /// `J2` / `K2`: knee to toenails.
    ShankFoot(Side),
    /// One stacked solid. Build with [`Region::solid`] to get a checked index.
    Solid(Chain, u8),
}

impl Region {
    /// A solid of `chain`, or `None` when `index` is out of range.
    #[must_use]
    pub fn solid(chain: Chain, index: u8) -> Option<Self> {
        (index < chain.len()).then_some(Self::Solid(chain, index))
    }

    /// Torso solid `s{index}`.
    pub(crate) fn torso(index: u8) -> Self {
        Self::Solid(Chain::Torso, index)
    }

    /// Arm solid `a{index}` / `b{index}`.
    pub(crate) fn arm(side: Side, index: u8) -> Self {
        Self::Solid(Chain::Arm(side), index)
    }

    /// Leg solid `j{index}` / `k{index}`.
    pub(crate) fn leg(side: Side, index: u8) -> Self {
        Self::Solid(Chain::Leg(side), index)
    }

    /// Every region of the catalog: whole segments first, then solids.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        let mut regions = vec![Self::Pelvis, Self::Thorax, Self::ChestHead];
        for side in [Side::Left, Side::Right] {
            regions.extend([
                Self::UpperArm(side),
                Self::ForearmHand(side),
                Self::Thigh(side),
                Self::ShankFoot(side),
            ]);
        }
        for chain in Chain::ALL {
            regions.extend((0..chain.len()).map(|i| Self::Solid(chain, i)));
        }
        regions
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pelvis => f.write_str("P"),
            Self::Thorax => f.write_str("T"),
            Self::ChestHead => f.write_str("C"),
            Self::UpperArm(Side::Left) => f.write_str("A1"),
            Self::UpperArm(Side::Right) => f.write_str("B1"),
            Self::ForearmHand(Side::Left) => f.write_str("A2"),
            Self::ForearmHand(Side::Right) => f.write_str("B2"),
            Self::Thigh(Side::Left) => f.write_str("J1"),
            Self::Thigh(Side::Right) => f.write_str("K1"),
            Self::ShankFoot(Side::Left) => f.write_str("J2"),
            Self::ShankFoot(Side::Right) => f.write_str("K2"),
            Self::Solid(chain, index) => write!(f, "{}{index}", chain.prefix()),
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let region = match s {
            "P" => Self::Pelvis,
            "T" => Self::Thorax,
            "C" => Self::ChestHead,
            "A1" => Self::UpperArm(Side::Left),
            "B1" => Self::UpperArm(Side::Right),
            "A2" => Self::ForearmHand(Side::Left),
            "B2" => Self::ForearmHand(Side::Right),
            "J1" => Self::Thigh(Side::Left),
            "K1" => Self::Thigh(Side::Right),
            "J2" => Self::ShankFoot(Side::Left),
            "K2" => Self::ShankFoot(Side::Right),
            _ => {
                let mut chars = s.chars();
                let chain = chars.next().and_then(Chain::from_prefix);
                let index = chars.as_str().parse::<u8>().ok();
                match (chain, index) {
                    (Some(chain), Some(index)) if chars.as_str().len() == 1 => {
                        Self::solid(chain, index)
                            .ok_or_else(|| format!("unknown region code '{s}'"))?
                    }
                    _ => return Err(format!("unknown region code '{s}'")),
                }
            }
        };
        Ok(region)
    }
}

// ============================================================================
// Region properties
// ============================================================================

/// Inertial and geometric data of one region, as reported by the body model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionProperties {
    /// Mass in kg.
    pub mass: f64,
    /// Proximal landmark, global frame.
    pub position: Vector3<f64>,
    /// Center of mass relative to `position`, region axes.
    pub center_of_mass: Vector3<f64>,
    /// Inertia about the region's own center of mass, region axes.
    pub inertia: Matrix3<f64>,
    /// Region axes → global axes.
    pub orientation: Rotation3<f64>,
    /// Distal landmark, global frame.
    pub end_position: Option<Vector3<f64>>,
    /// Length along the region's long axis.
    pub height: Option<f64>,
}

impl RegionProperties {
    /// Create a region aligned with the global axes, without limb landmarks.
    #[must_use]
    pub fn new(
        mass: f64,
        position: Vector3<f64>,
        center_of_mass: Vector3<f64>,
        inertia: Matrix3<f64>,
    ) -> Self {
        Self {
            mass,
            position,
            center_of_mass,
            inertia,
            orientation: Rotation3::identity(),
            end_position: None,
            height: None,
        }
    }

    /// Set the region orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Rotation3<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set the distal landmark.
    #[must_use]
    pub fn with_end_position(mut self, end_position: Vector3<f64>) -> Self {
        self.end_position = Some(end_position);
        self
    }

    /// Set the region length.
    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Center of mass in the global frame.
    #[must_use]
    pub fn global_center_of_mass(&self) -> Vector3<f64> {
        self.position + self.orientation * self.center_of_mass
    }

    /// Mass properties for composition.
    #[must_use]
    pub fn mass_properties(&self) -> MassProperties {
        MassProperties::new(self.mass, self.global_center_of_mass(), self.inertia)
            .with_frame(self.orientation)
    }
}

// ============================================================================
// Body model
// ============================================================================

/// Read-only lookup of anatomical regions.
pub trait BodyModel {
    /// Properties of `region`, if the model provides it.
    fn region(&self, region: Region) -> Option<&RegionProperties>;

    /// Properties of `region`, failing with
    /// [`BiomodError::MissingAnatomicalRegion`] on behalf of `segment`.
    fn require(&self, region: Region, segment: &str) -> Result<&RegionProperties> {
        self.region(region)
            .ok_or_else(|| BiomodError::missing_region(region, segment))
    }
}

/// In-memory body model.
///
/// Serializes as `{"regions": {"<code>": {...}}}` with row-major matrices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord", into = "SnapshotRecord")]
pub struct BodySnapshot {
    regions: BTreeMap<Region, RegionProperties>,
}

impl BodySnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region, replacing any previous entry.
    #[must_use]
    pub fn with_region(mut self, region: Region, properties: RegionProperties) -> Self {
        self.insert(region, properties);
        self
    }

    /// Add a region, returning the previous entry.
    pub fn insert(
        &mut self,
        region: Region,
        properties: RegionProperties,
    ) -> Option<RegionProperties> {
        self.regions.insert(region, properties)
    }

    /// Remove a region.
    pub fn remove(&mut self, region: Region) -> Option<RegionProperties> {
        self.regions.remove(&region)
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the snapshot holds no region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate regions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Region, &RegionProperties)> {
        self.regions.iter().map(|(r, p)| (*r, p))
    }
}

impl BodyModel for BodySnapshot {
    fn region(&self, region: Region) -> Option<&RegionProperties> {
        self.regions.get(&region)
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegionRecord {
    mass: f64,
    position: [f64; 3],
    center_of_mass: [f64; 3],
    inertia: [[f64; 3]; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orientation: Option<[[f64; 3]; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_position: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotRecord {
    regions: BTreeMap<String, RegionRecord>,
}

fn matrix_from_rows(rows: &[[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| rows[r][c])
}

fn matrix_to_rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [0, 1, 2].map(|r| [m[(r, 0)], m[(r, 1)], m[(r, 2)]])
}

fn rotation_from_rows(code: &str, rows: &[[f64; 3]; 3]) -> std::result::Result<Rotation3<f64>, String> {
    let m = matrix_from_rows(rows);
    let drift = (m.transpose() * m - Matrix3::identity()).amax();
    if !(drift <= ORTHONORMAL_TOLERANCE) || m.determinant() <= 0.0 {
        return Err(format!(
            "region {code}: orientation is not a proper rotation matrix"
        ));
    }
    Ok(Rotation3::from_matrix_unchecked(m))
}

impl TryFrom<SnapshotRecord> for BodySnapshot {
    type Error = String;

    fn try_from(record: SnapshotRecord) -> std::result::Result<Self, Self::Error> {
        let mut snapshot = Self::new();
        for (code, r) in record.regions {
            let region: Region = code.parse()?;
            let orientation = match &r.orientation {
                Some(rows) => rotation_from_rows(&code, rows)?,
                None => Rotation3::identity(),
            };
            snapshot.insert(
                region,
                RegionProperties {
                    mass: r.mass,
                    position: Vector3::from(r.position),
                    center_of_mass: Vector3::from(r.center_of_mass),
                    inertia: matrix_from_rows(&r.inertia),
                    orientation,
                    end_position: r.end_position.map(Vector3::from),
                    height: r.height,
                },
            );
        }
        Ok(snapshot)
    }
}

impl From<BodySnapshot> for SnapshotRecord {
    fn from(snapshot: BodySnapshot) -> Self {
        let regions = snapshot
            .regions
            .into_iter()
            .map(|(region, p)| {
                let record = RegionRecord {
                    mass: p.mass,
                    position: p.position.into(),
                    center_of_mass: p.center_of_mass.into(),
                    inertia: matrix_to_rows(&p.inertia),
                    orientation: (p.orientation != Rotation3::identity())
                        .then(|| matrix_to_rows(p.orientation.matrix())),
                    end_position: p.end_position.map(Into::into),
                    height: p.height,
                };
                (region.to_string(), record)
            })
            .collect();
        Self { regions }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_region_codes_round_trip() {
        for region in Region::catalog() {
            let code = region.to_string();
            assert_eq!(code.parse::<Region>(), Ok(region), "code {code}");
        }
    }

    #[test]
    fn test_catalog_size() {
        // 11 whole segments + 8 + 7 + 7 + 9 + 9 solids.
        assert_eq!(Region::catalog().len(), 51);
    }

    #[test]
    fn test_region_codes() {
        assert_eq!(Region::UpperArm(Side::Left).to_string(), "A1");
        assert_eq!(Region::ShankFoot(Side::Right).to_string(), "K2");
        assert_eq!(Region::arm(Side::Right, 4).to_string(), "b4");
        assert_eq!(Region::torso(7).to_string(), "s7");
    }

    #[test]
    fn test_unknown_region_codes() {
        for code in ["", "X", "s8", "a7", "j9", "k10", "A3", "s"] {
            assert!(code.parse::<Region>().is_err(), "code {code}");
        }
    }

    #[test]
    fn test_solid_index_is_checked() {
        assert_eq!(Region::solid(Chain::Leg(Side::Left), 8), Some(Region::leg(Side::Left, 8)));
        assert_eq!(Region::solid(Chain::Leg(Side::Left), 9), None);
    }

    #[test]
    fn test_global_center_of_mass_uses_orientation() {
        let props = RegionProperties::new(
            1.0,
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.5),
            Matrix3::identity(),
        )
        .with_orientation(Rotation3::from_euler_angles(std::f64::consts::PI, 0.0, 0.0));
        assert_relative_eq!(
            props.global_center_of_mass(),
            Vector3::new(1.0, 0.0, -0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_require_reports_segment() {
        let snapshot = BodySnapshot::new();
        let err = snapshot
            .require(Region::torso(5), "Head")
            .expect_err("empty snapshot");
        assert_eq!(err, BiomodError::missing_region("s5", "Head"));
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "regions": {
                "P": {
                    "mass": 10.0,
                    "position": [0, 0, 0],
                    "center_of_mass": [0, 0, 0.1],
                    "inertia": [[1, 0, 0], [0, 2, 0], [0, 0, 3]]
                },
                "J2": {
                    "mass": 4.0,
                    "position": [0.1, 0, -0.4],
                    "center_of_mass": [0, 0, -0.2],
                    "inertia": [[0.1, 0.01, 0], [0.01, 0.1, 0], [0, 0, 0.02]],
                    "orientation": [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
                    "end_position": [0.1, 0, -0.9],
                    "height": 0.5
                }
            }
        }"#;
        let snapshot: BodySnapshot = serde_json::from_str(json).expect("valid snapshot");
        assert_eq!(snapshot.len(), 2);

        let pelvis = snapshot.region(Region::Pelvis).expect("P");
        assert_eq!(pelvis.mass, 10.0);
        assert_eq!(pelvis.inertia[(1, 1)], 2.0);
        assert_eq!(pelvis.end_position, None);

        let shank = snapshot.region(Region::ShankFoot(Side::Left)).expect("J2");
        assert_eq!(shank.inertia[(0, 1)], 0.01);
        assert_eq!(shank.height, Some(0.5));
        assert_eq!(shank.end_position, Some(Vector3::new(0.1, 0.0, -0.9)));
    }

    #[test]
    fn test_snapshot_rejects_unknown_region() {
        let json = r#"{"regions": {"Q": {
            "mass": 1.0, "position": [0, 0, 0], "center_of_mass": [0, 0, 0],
            "inertia": [[1, 0, 0], [0, 1, 0], [0, 0, 1]]
        }}}"#;
        let err = serde_json::from_str::<BodySnapshot>(json).expect_err("unknown code");
        assert!(err.to_string().contains("'Q'"));
    }

    #[test]
    fn test_snapshot_rejects_non_rotation() {
        let json = r#"{"regions": {"T": {
            "mass": 1.0, "position": [0, 0, 0], "center_of_mass": [0, 0, 0],
            "inertia": [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
            "orientation": [[2, 0, 0], [0, 1, 0], [0, 0, 1]]
        }}}"#;
        assert!(serde_json::from_str::<BodySnapshot>(json).is_err());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let snapshot = BodySnapshot::new().with_region(
            Region::arm(Side::Left, 2),
            RegionProperties::new(
                1.25,
                Vector3::new(0.2, 0.0, 0.3),
                Vector3::new(0.0, 0.0, -0.1),
                Matrix3::from_diagonal(&Vector3::new(0.01, 0.01, 0.002)),
            )
            .with_height(0.12),
        );
        let json = serde_json::to_string(&snapshot).expect("serialize");
        assert!(json.contains("\"a2\""));
        let back: BodySnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, snapshot);
    }
}
