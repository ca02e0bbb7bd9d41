use nalgebra::{Point3, Vector3};
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TETRAHEDRAL_ANGLE_DEG: f64 = 109.47;
pub const DEFAULT_BENT_ANGLE_DEG: f64 = 104.5;
pub const DEFAULT_PYRAMIDAL_ANGLE_DEG: f64 = 107.0;

/// Target bond-angle shape around a central atom (VSEPR model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MolecularGeometry {
    Linear,
    TrigonalPlanar,
    Tetrahedral,
    Bent,
    TrigonalPyramidal,
    Octahedral,
}

static GEOMETRY_ALIASES: Map<&'static str, MolecularGeometry> = phf_map! {
    "linear" => MolecularGeometry::Linear,
    "sp" => MolecularGeometry::Linear,
    "trigonal_planar" => MolecularGeometry::TrigonalPlanar,
    "trigonal-planar" => MolecularGeometry::TrigonalPlanar,
    "trigonalplanar" => MolecularGeometry::TrigonalPlanar,
    "sp2" => MolecularGeometry::TrigonalPlanar,
    "tetrahedral" => MolecularGeometry::Tetrahedral,
    "sp3" => MolecularGeometry::Tetrahedral,
    "bent" => MolecularGeometry::Bent,
    "angular" => MolecularGeometry::Bent,
    "trigonal_pyramidal" => MolecularGeometry::TrigonalPyramidal,
    "trigonal-pyramidal" => MolecularGeometry::TrigonalPyramidal,
    "pyramidal" => MolecularGeometry::TrigonalPyramidal,
    "octahedral" => MolecularGeometry::Octahedral,
    "sp3d2" => MolecularGeometry::Octahedral,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown molecular geometry '{0}'")]
pub struct ParseGeometryError(pub String);

impl FromStr for MolecularGeometry {
    type Err = ParseGeometryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GEOMETRY_ALIASES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ParseGeometryError(s.to_string()))
    }
}

impl fmt::Display for MolecularGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Linear => "linear",
                Self::TrigonalPlanar => "trigonal_planar",
                Self::Tetrahedral => "tetrahedral",
                Self::Bent => "bent",
                Self::TrigonalPyramidal => "trigonal_pyramidal",
                Self::Octahedral => "octahedral",
            }
        )
    }
}

impl MolecularGeometry {
    /// Infers the geometry from the number of bonded neighbors.
    ///
    /// Returns `None` for fewer than two bonds, where no angle exists.
    pub fn from_bond_count(bond_count: usize) -> Option<Self> {
        match bond_count {
            2 => Some(Self::Linear),
            3 => Some(Self::TrigonalPlanar),
            4 => Some(Self::Tetrahedral),
            5 | 6 => Some(Self::Octahedral),
            _ => None,
        }
    }

    /// The number of bonded neighbors the geometry is defined for.
    pub fn expected_bond_count(&self) -> Option<usize> {
        match self {
            Self::Linear | Self::Bent => Some(2),
            Self::TrigonalPlanar | Self::TrigonalPyramidal => Some(3),
            Self::Tetrahedral => Some(4),
            Self::Octahedral => None,
        }
    }

    /// Ideal inter-bond angle in degrees.
    ///
    /// `element_angle` overrides the built-in value for the shapes whose angle
    /// depends on lone-pair compression (bent, trigonal pyramidal).
    pub fn ideal_angle_deg(&self, element_angle: Option<f64>) -> f64 {
        match self {
            Self::Linear => 180.0,
            Self::TrigonalPlanar => 120.0,
            Self::Tetrahedral => TETRAHEDRAL_ANGLE_DEG,
            Self::Bent => element_angle.unwrap_or(DEFAULT_BENT_ANGLE_DEG),
            Self::TrigonalPyramidal => element_angle.unwrap_or(DEFAULT_PYRAMIDAL_ANGLE_DEG),
            Self::Octahedral => 90.0,
        }
    }
}

/// Angle between two vectors in radians, robust against rounding outside [-1, 1].
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let na = a.norm();
    let nb = b.norm();
    if na < 1e-9 || nb < 1e-9 {
        return None;
    }
    let cos = (a.dot(b) / (na * nb)).clamp(-1.0, 1.0);
    Some(cos.acos())
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Axis-aligned bounding box of a point set, grown by `padding` on every side.
pub fn padded_bounds(
    points: impl IntoIterator<Item = Point3<f64>>,
    padding: f64,
) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let (min, max) = iter.fold((first, first), |(min, max), p| {
        (min.inf(&p), max.sup(&p))
    });
    let pad = Vector3::repeat(padding);
    Some((min - pad, max + pad))
}
