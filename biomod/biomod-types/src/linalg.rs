//! Vector and matrix helpers on top of nalgebra.
//!
//! nalgebra already covers addition, scaling, norms and cross products. This
//! module adds the few operations the tree builder needs that can fail, and
//! makes every division by a zero length explicit.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

use crate::error::BiomodError;
use crate::Result;

/// Lengths below this are treated as zero.
pub const LENGTH_EPSILON: f64 = 1e-12;

/// Outer product `a bᵀ`.
#[inline]
#[must_use]
pub fn outer(a: &Vector3<f64>, b: &Vector3<f64>) -> Matrix3<f64> {
    a * b.transpose()
}

/// Midpoint of two points.
#[inline]
#[must_use]
pub fn midpoint(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    (a + b) * 0.5
}

/// Normalize `v`, failing with [`BiomodError::DegenerateGeometry`] when it
/// has (near) zero length.
pub fn unit(v: &Vector3<f64>, context: &str) -> Result<Vector3<f64>> {
    let n = v.norm();
    if n > LENGTH_EPSILON && n.is_finite() {
        Ok(v / n)
    } else {
        Err(BiomodError::degenerate(format!(
            "{context}: vector has zero length"
        )))
    }
}

/// Unit vector pointing from `from` to `to`.
pub fn direction(from: &Vector3<f64>, to: &Vector3<f64>, context: &str) -> Result<Vector3<f64>> {
    unit(&(to - from), context)
}

/// Rotation that maps the direction of `from` onto the direction of `to`.
///
/// Anti-parallel inputs yield a half turn about an axis orthogonal to
/// `from`. Zero-length inputs are degenerate.
pub fn rotation_between(from: &Vector3<f64>, to: &Vector3<f64>) -> Result<Rotation3<f64>> {
    let a = unit(from, "rotation source")?;
    let b = unit(to, "rotation target")?;

    let cos = a.dot(&b).clamp(-1.0, 1.0);
    let axis = a.cross(&b);
    if axis.norm() > 1e-9 {
        return Ok(Rotation3::from_axis_angle(
            &Unit::new_normalize(axis),
            cos.acos(),
        ));
    }
    if cos > 0.0 {
        return Ok(Rotation3::identity());
    }

    // Half turn about an axis orthogonal to `a`.
    let helper = if a.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let axis = Unit::new_normalize(a.cross(&helper));
    Ok(Rotation3::from_axis_angle(&axis, std::f64::consts::PI))
}

/// Angle (radians) of the relative rotation between two frames.
///
/// Uses `atan2` of the antisymmetric and trace parts, which stays accurate
/// for nearly identical frames where `acos` of the trace loses precision.
#[must_use]
pub fn angle_between(a: &Rotation3<f64>, b: &Rotation3<f64>) -> f64 {
    let m = (a.inverse() * b).into_inner();
    let axis = Vector3::new(
        m[(2, 1)] - m[(1, 2)],
        m[(0, 2)] - m[(2, 0)],
        m[(1, 0)] - m[(0, 1)],
    );
    let sin = 0.5 * axis.norm();
    let cos = (m.trace() - 1.0) * 0.5;
    sin.atan2(cos)
}

/// Parallel-axis correction `m (|r|² I − r rᵀ)` for a point mass at `r`.
///
/// Adding this to an inertia tensor taken about a body's center of mass
/// yields the tensor about a point located at `-r` from that center.
#[inline]
#[must_use]
pub fn parallel_axis(mass: f64, offset: &Vector3<f64>) -> Matrix3<f64> {
    mass * (Matrix3::identity() * offset.norm_squared() - outer(offset, offset))
}

/// Check that `m` is symmetric within `tolerance` (absolute, per element).
#[must_use]
pub fn is_symmetric(m: &Matrix3<f64>, tolerance: f64) -> bool {
    (0..3).all(|r| (0..3).all(|c| (m[(r, c)] - m[(c, r)]).abs() <= tolerance))
}

/// Format a vector as three space separated numbers.
#[must_use]
pub fn format_vec(v: &Vector3<f64>) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}
