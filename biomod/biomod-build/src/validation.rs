//! Kinematic tree validation.
//!
//! Validates the structure and physical properties of built segments before
//! they are rendered.

use std::collections::{HashMap, HashSet};

use biomod_types::linalg::is_symmetric;
use biomod_types::{BiomodError, Result, Segment};

/// Relative tolerance for inertia symmetry and eigenvalue checks.
const INERTIA_TOLERANCE: f64 = 1e-10;

/// Validation result containing the root and the tree structure.
#[derive(Debug)]
pub struct ValidationResult {
    /// Label of the segment attached to `ROOT`.
    pub root: String,
    /// Map from segment label to its children, in input order.
    pub children: HashMap<String, Vec<String>>,
    /// Topologically sorted labels (root first).
    pub sorted: Vec<String>,
}

/// Validate a list of segments as one tree.
///
/// This checks:
/// - No duplicate labels
/// - Every parent label resolves to a segment
/// - Exactly one segment attached to the root
/// - No kinematic loops (every segment reachable from the root)
/// - Positive finite masses and symmetric PSD inertia tensors
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate(segments: &[Segment]) -> Result<ValidationResult> {
    check_duplicates(segments)?;

    let labels: HashSet<&str> = segments.iter().map(|s| s.label.as_str()).collect();

    let mut children: HashMap<String, Vec<String>> = segments
        .iter()
        .map(|s| (s.label.clone(), Vec::new()))
        .collect();
    let mut roots = Vec::new();

    for segment in segments {
        match segment.parent.label() {
            None => roots.push(segment.label.clone()),
            Some(parent) => {
                if !labels.contains(parent) {
                    return Err(BiomodError::UndefinedParent {
                        segment: segment.label.clone(),
                        parent: parent.to_string(),
                    });
                }
                children
                    .entry(parent.to_string())
                    .or_default()
                    .push(segment.label.clone());
            }
        }
    }

    let root = match roots.len() {
        0 => return Err(BiomodError::NoRootSegment),
        1 => roots.remove(0),
        _ => return Err(BiomodError::MultipleRootSegments(roots)),
    };

    let sorted = topological_sort(&root, &children)?;
    if sorted.len() != segments.len() {
        let unreachable = segments
            .iter()
            .map(|s| s.label.as_str())
            .find(|label| !sorted.iter().any(|s| s == label))
            .unwrap_or_default();
        return Err(BiomodError::KinematicLoop(format!(
            "segment '{unreachable}' is not reachable from root '{root}'"
        )));
    }

    for segment in segments {
        validate_mass_properties(segment)?;
    }

    Ok(ValidationResult {
        root,
        children,
        sorted,
    })
}

/// Check for duplicate labels.
fn check_duplicates(segments: &[Segment]) -> Result<()> {
    let mut seen = HashSet::new();
    for segment in segments {
        if !seen.insert(&segment.label) {
            return Err(BiomodError::DuplicateSegment(segment.label.clone()));
        }
    }
    Ok(())
}

/// Depth-first sort from the root, failing on a cycle.
fn topological_sort(root: &str, children: &HashMap<String, Vec<String>>) -> Result<Vec<String>> {
    fn visit(
        label: &str,
        children: &HashMap<String, Vec<String>>,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        sorted: &mut Vec<String>,
    ) -> Result<()> {
        if visited.contains(label) {
            return Ok(());
        }
        if !visiting.insert(label.to_string()) {
            return Err(BiomodError::KinematicLoop(format!(
                "cycle detected involving segment '{label}'"
            )));
        }
        sorted.push(label.to_string());
        if let Some(kids) = children.get(label) {
            for child in kids {
                visit(child, children, visited, visiting, sorted)?;
            }
        }
        visiting.remove(label);
        visited.insert(label.to_string());
        Ok(())
    }

    let mut sorted = Vec::new();
    visit(
        root,
        children,
        &mut HashSet::new(),
        &mut HashSet::new(),
        &mut sorted,
    )?;
    Ok(sorted)
}

/// Validate mass and inertia of one segment.
fn validate_mass_properties(segment: &Segment) -> Result<()> {
    let label = &segment.label;
    if !(segment.mass > 0.0 && segment.mass.is_finite()) {
        return Err(BiomodError::invalid_mass(label, segment.mass));
    }

    let inertia = &segment.inertia;
    if !inertia.iter().all(|x| x.is_finite()) {
        return Err(BiomodError::invalid_inertia(
            label,
            "inertia values must be finite",
        ));
    }

    let scale = inertia.amax().max(f64::MIN_POSITIVE);
    if !is_symmetric(inertia, INERTIA_TOLERANCE * scale) {
        return Err(BiomodError::invalid_inertia(
            label,
            "inertia tensor must be symmetric",
        ));
    }

    // Physical inertia has non-negative principal moments.
    let eigenvalues = inertia.symmetric_eigenvalues();
    if eigenvalues.iter().any(|&e| e < -INERTIA_TOLERANCE * scale) {
        return Err(BiomodError::invalid_inertia(
            label,
            "inertia tensor must be positive semi-definite",
        ));
    }

    Ok(())
}
