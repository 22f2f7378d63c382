//! The kinematic-tree node and its bioMod text block.
//!
//! A [`Segment`] only stores values. All inertial computation happens before
//! construction; rendering writes the fields in a fixed order and skips every
//! optional block whose attribute is empty.

use std::fmt;

use nalgebra::{Matrix3, Vector3};

use crate::axes::Axes;
use crate::linalg::format_vec;

/// Parent label written for the root segment.
pub const ROOT_SENTINEL: &str = "ROOT";

// ============================================================================
// Parent reference
// ============================================================================

/// Where a segment attaches in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Parent {
    /// Attached to the world. Exactly one segment per tree.
    Root,
    /// Attached to the segment with this label.
    Segment(String),
}

impl Parent {
    /// Reference a parent segment by label.
    pub fn segment(label: impl Into<String>) -> Self {
        Self::Segment(label.into())
    }

    /// Parent label, or `None` for the root.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Segment(label) => Some(label),
        }
    }

    /// Whether this is the root sentinel.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_SENTINEL),
            Self::Segment(label) => f.write_str(label),
        }
    }
}

// ============================================================================
// Presentation metadata
// ============================================================================

/// Visual geometry attached to a segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mesh {
    /// Inline vertex list.
    Vertices(Vec<Vector3<f64>>),
    /// Path to a mesh file, written as-is.
    File(String),
}

/// Secondary placement of the mesh relative to the segment frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshFrame {
    /// Rotation angles.
    pub rt: Vector3<f64>,
    /// Translation.
    pub xyz: Vector3<f64>,
}

impl Default for MeshFrame {
    fn default() -> Self {
        Self {
            rt: Vector3::zeros(),
            xyz: Vector3::zeros(),
        }
    }
}

// ============================================================================
// Segment
// ============================================================================

/// One rigid body of the kinematic tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Unique label within the tree.
    pub label: String,
    /// Parent segment or root.
    pub parent: Parent,
    /// Static pre-rotation of the local frame. Always zero for now.
    pub rt: Vector3<f64>,
    /// Origin of the local frame, relative to the parent origin.
    pub xyz: Vector3<f64>,
    /// Free translations, in generalized-coordinate order.
    pub translations: Axes,
    /// Free rotations, in generalized-coordinate order.
    pub rotations: Axes,
    /// `[min, max]` range per degree of freedom.
    pub ranges_q: Vec<[f64; 2]>,
    /// Center of mass in the local frame.
    pub center_of_mass: Vector3<f64>,
    /// Mass in kg.
    pub mass: f64,
    /// Inertia about the center of mass, local axes.
    pub inertia: Matrix3<f64>,
    /// Visual geometry.
    pub mesh: Option<Mesh>,
    /// Mesh RGB color.
    pub mesh_color: Option<Vector3<f64>>,
    /// Mesh scale per axis.
    pub mesh_scale: Option<Vector3<f64>>,
    /// Mesh placement relative to the segment frame.
    pub mesh_frame: Option<MeshFrame>,
    /// Visualization patches as vertex-index triples.
    pub patches: Vec<[usize; 3]>,
}

impl Segment {
    /// Create a segment with no free degrees of freedom and no presentation
    /// metadata.
    pub fn new(
        label: impl Into<String>,
        parent: Parent,
        xyz: Vector3<f64>,
        center_of_mass: Vector3<f64>,
        mass: f64,
        inertia: Matrix3<f64>,
    ) -> Self {
        Self {
            label: label.into(),
            parent,
            rt: Vector3::zeros(),
            xyz,
            translations: Axes::none(),
            rotations: Axes::none(),
            ranges_q: Vec::new(),
            center_of_mass,
            mass,
            inertia,
            mesh: None,
            mesh_color: None,
            mesh_scale: None,
            mesh_frame: None,
            patches: Vec::new(),
        }
    }

    /// Set the free translations.
    #[must_use]
    pub fn with_translations(mut self, translations: Axes) -> Self {
        self.translations = translations;
        self
    }

    /// Set the free rotations.
    #[must_use]
    pub fn with_rotations(mut self, rotations: Axes) -> Self {
        self.rotations = rotations;
        self
    }

    /// Set the joint ranges.
    #[must_use]
    pub fn with_ranges_q(mut self, ranges_q: Vec<[f64; 2]>) -> Self {
        self.ranges_q = ranges_q;
        self
    }

    /// Attach visual geometry.
    #[must_use]
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Set the mesh color.
    #[must_use]
    pub fn with_mesh_color(mut self, color: Vector3<f64>) -> Self {
        self.mesh_color = Some(color);
        self
    }

    /// Set the mesh scale.
    #[must_use]
    pub fn with_mesh_scale(mut self, scale: Vector3<f64>) -> Self {
        self.mesh_scale = Some(scale);
        self
    }

    /// Set the mesh placement.
    #[must_use]
    pub fn with_mesh_frame(mut self, frame: MeshFrame) -> Self {
        self.mesh_frame = Some(frame);
        self
    }

    /// Set the visualization patches.
    #[must_use]
    pub fn with_patches(mut self, patches: Vec<[usize; 3]>) -> Self {
        self.patches = patches;
        self
    }

    /// Number of generalized coordinates introduced by this segment.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.translations.len() + self.rotations.len()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "segment {}", self.label)?;
        writeln!(f, "\tparent {}", self.parent)?;
        writeln!(
            f,
            "\trt {} xyz {}",
            format_vec(&self.rt),
            format_vec(&self.xyz)
        )?;
        if !self.translations.is_empty() {
            writeln!(f, "\ttranslations {}", self.translations)?;
        }
        if !self.rotations.is_empty() {
            writeln!(f, "\trotations {}", self.rotations)?;
        }
        if !self.ranges_q.is_empty() {
            writeln!(f, "\trangesQ")?;
            for [min, max] in &self.ranges_q {
                writeln!(f, "\t\t{min} {max}")?;
            }
        }
        writeln!(f, "\tcom {}", format_vec(&self.center_of_mass))?;
        writeln!(f, "\tmass {}", self.mass)?;
        writeln!(f, "\tinertia")?;
        for row in self.inertia.row_iter() {
            writeln!(f, "\t\t{} {} {}", row[0], row[1], row[2])?;
        }
        match &self.mesh {
            Some(Mesh::File(path)) => writeln!(f, "\tmeshfile {path}")?,
            Some(Mesh::Vertices(vertices)) => {
                for v in vertices {
                    writeln!(f, "\tmesh {}", format_vec(v))?;
                }
            }
            None => {}
        }
        if let Some(color) = &self.mesh_color {
            writeln!(f, "\tmeshcolor {}", format_vec(color))?;
        }
        if let Some(scale) = &self.mesh_scale {
            writeln!(f, "\tmeshscale {}", format_vec(scale))?;
        }
        if let Some(frame) = &self.mesh_frame {
            writeln!(
                f,
                "\tmeshrt {} xyz {}",
                format_vec(&frame.rt),
                format_vec(&frame.xyz)
            )?;
        }
        for [i, j, k] in &self.patches {
            writeln!(f, "\tpatch {i} {j} {k}")?;
        }
        writeln!(f, "endsegment")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn plain() -> Segment {
        Segment::new(
            "Thorax",
            Parent::segment("Pelvis"),
            Vector3::new(0.0, 0.0, 0.1),
            Vector3::new(0.0, 0.0, 0.2),
            10.0,
            Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 0.5)),
        )
    }

    #[test]
    fn test_plain_block() {
        let expected = "segment Thorax\n\
                        \tparent Pelvis\n\
                        \trt 0 0 0 xyz 0 0 0.1\n\
                        \tcom 0 0 0.2\n\
                        \tmass 10\n\
                        \tinertia\n\
                        \t\t1 0 0\n\
                        \t\t0 1 0\n\
                        \t\t0 0 0.5\n\
                        endsegment\n";
        assert_eq!(plain().to_string(), expected);
    }

    #[test]
    fn test_plain_block_omits_optional_lines() {
        let text = plain().to_string();
        for keyword in [
            "translations",
            "rotations",
            "rangesQ",
            "mesh",
            "meshfile",
            "meshcolor",
            "meshscale",
            "meshrt",
            "patch",
        ] {
            assert!(
                !text.lines().any(|l| l.trim_start().starts_with(keyword)),
                "unexpected {keyword} line"
            );
        }
        assert_eq!(text.lines().last(), Some("endsegment"));
    }

    #[test]
    fn test_root_parent_sentinel() {
        let mut seg = plain();
        seg.parent = Parent::Root;
        assert!(seg.to_string().contains("\tparent ROOT\n"));
        assert!(seg.parent.is_root());
        assert_eq!(seg.parent.label(), None);
    }

    #[test]
    fn test_full_block_field_order() {
        let seg = plain()
            .with_translations("xyz".parse().expect("axes"))
            .with_rotations("zy".parse().expect("axes"))
            .with_ranges_q(vec![[-1.0, 1.0], [-0.5, 2.5]])
            .with_mesh(Mesh::Vertices(vec![
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, 0.3),
            ]))
            .with_mesh_color(Vector3::new(1.0, 0.5, 0.0))
            .with_mesh_scale(Vector3::new(1.0, 1.0, 2.0))
            .with_mesh_frame(MeshFrame {
                rt: Vector3::new(0.0, 0.0, 1.5),
                xyz: Vector3::new(0.1, 0.0, 0.0),
            })
            .with_patches(vec![[0, 1, 2], [1, 2, 3]]);

        let expected = "segment Thorax\n\
                        \tparent Pelvis\n\
                        \trt 0 0 0 xyz 0 0 0.1\n\
                        \ttranslations xyz\n\
                        \trotations zy\n\
                        \trangesQ\n\
                        \t\t-1 1\n\
                        \t\t-0.5 2.5\n\
                        \tcom 0 0 0.2\n\
                        \tmass 10\n\
                        \tinertia\n\
                        \t\t1 0 0\n\
                        \t\t0 1 0\n\
                        \t\t0 0 0.5\n\
                        \tmesh 0 0 0\n\
                        \tmesh 0 0 0.3\n\
                        \tmeshcolor 1 0.5 0\n\
                        \tmeshscale 1 1 2\n\
                        \tmeshrt 0 0 1.5 xyz 0.1 0 0\n\
                        \tpatch 0 1 2\n\
                        \tpatch 1 2 3\n\
                        endsegment\n";
        assert_eq!(seg.to_string(), expected);
        assert_eq!(seg.dof_count(), 5);
    }

    #[test]
    fn test_meshfile_line() {
        let seg = plain().with_mesh(Mesh::File("meshes/thorax.vtp".to_string()));
        assert!(seg.to_string().contains("\tmeshfile meshes/thorax.vtp\n"));
        assert!(!seg.to_string().contains("\tmesh "));
    }

    #[test]
    fn test_inertia_rows_are_row_major() {
        let mut seg = plain();
        seg.inertia = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0);
        let text = seg.to_string();
        assert!(text.contains("\t\t1 2 3\n\t\t2 4 5\n\t\t3 5 6\n"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_keeps_axes_as_strings() {
        let seg = plain().with_rotations("zy".parse().expect("axes"));
        let json = serde_json::to_string(&seg).expect("serialize");
        assert!(json.contains("\"rotations\":\"zy\""));
        let back: Segment = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, seg);
    }

    #[test]
    fn test_shortest_round_trip_numbers() {
        let mut seg = plain();
        seg.mass = 0.1 + 0.2;
        assert!(seg.to_string().contains("\tmass 0.30000000000000004\n"));
    }
}
