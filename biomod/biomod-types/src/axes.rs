//! Degree-of-freedom axis sequences.
//!
//! A joint declares which translations and rotations are free as an ordered
//! sequence of axis labels (`"xyz"`, `"zy"`, ...). Order defines the
//! generalized-coordinate ordering downstream, so [`Axes`] keeps insertion
//! order and rejects duplicates.

use std::fmt;
use std::str::FromStr;

use crate::error::BiomodError;

/// One coordinate axis of a segment frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Lateral axis.
    X,
    /// Anteroposterior axis.
    Y,
    /// Longitudinal axis.
    Z,
}

impl Axis {
    /// Parse an axis label.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            _ => None,
        }
    }

    /// The axis label.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }
}

/// An ordered, duplicate-free sequence of axes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Axes(Vec<Axis>);

impl Axes {
    /// No free axes.
    #[must_use]
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// All three axes in `x`, `y`, `z` order.
    #[must_use]
    pub fn all() -> Self {
        Self(vec![Axis::X, Axis::Y, Axis::Z])
    }

    /// Build from a sequence, rejecting duplicates.
    pub fn from_axes(axes: impl IntoIterator<Item = Axis>) -> crate::Result<Self> {
        let mut out: Vec<Axis> = Vec::with_capacity(3);
        for axis in axes {
            if out.contains(&axis) {
                return Err(BiomodError::invalid_config(format!(
                    "axis '{}' listed twice",
                    axis.as_char()
                )));
            }
            out.push(axis);
        }
        Ok(Self(out))
    }

    /// Number of free axes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no axis is free.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Axis> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for Axes {
    type Err = BiomodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let axes = s
            .trim()
            .chars()
            .map(|c| {
                Axis::from_char(c.to_ascii_lowercase()).ok_or_else(|| {
                    BiomodError::invalid_config(format!(
                        "'{c}' in axis string \"{s}\" is not one of x, y, z"
                    ))
                })
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Self::from_axes(axes)
    }
}

impl TryFrom<String> for Axes {
    type Error = BiomodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Axes> for String {
    fn from(axes: Axes) -> Self {
        axes.to_string()
    }
}

impl fmt::Display for Axes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in &self.0 {
            write!(f, "{}", axis.as_char())?;
        }
        Ok(())
    }
}
