use crate::core::forcefield::estimation;
use crate::core::utils::geometry::MolecularGeometry;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

const BUILTIN_ELEMENTS: &str = include_str!("../../../data/elements.toml");

/// Electronegativity at or above which an element is never treated as a metal.
pub const METAL_ELECTRONEGATIVITY_LIMIT: f64 = 2.0;

/// Physical constants for one chemical element.
///
/// The optional radii, polarizability and angle fields are frequently absent
/// from element tables; the accessor methods fall back to estimates keyed by
/// atomic number so callers never see a missing value.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ElementProperties {
    /// Atomic number.
    pub number: u32,
    pub name: String,
    /// Atomic mass in daltons.
    pub mass: f64,
    /// Pauling electronegativity (0.0 for noble gases).
    pub electronegativity: f64,
    /// Maximum number of discrete bonds.
    pub valence: u32,
    /// Electron count per shell, innermost first.
    pub shells: Vec<u32>,
    pub category: String,
    pub radius_atomic_pm: f64,
    #[serde(default)]
    pub radius_covalent_pm: Option<f64>,
    #[serde(default)]
    pub vanderwaals_radius_pm: Option<f64>,
    #[serde(default)]
    pub polarizability_angstrom3: Option<f64>,
    #[serde(default)]
    pub ideal_bond_angle: Option<f64>,
    #[serde(default)]
    pub geometry_preference: Option<String>,
}

impl ElementProperties {
    pub fn covalent_radius_pm(&self) -> f64 {
        self.radius_covalent_pm
            .unwrap_or_else(|| estimation::covalent_radius_pm(self.number))
    }

    pub fn vanderwaals_radius_pm(&self) -> f64 {
        self.vanderwaals_radius_pm.unwrap_or_else(|| {
            estimation::vanderwaals_radius_pm(self.number, self.radius_covalent_pm)
        })
    }

    pub fn polarizability(&self) -> f64 {
        self.polarizability_angstrom3.unwrap_or_else(|| {
            estimation::polarizability_angstrom3(self.number, self.radius_covalent_pm)
        })
    }

    /// Optional fields this element leaves to the estimators.
    pub fn estimated_fields(&self) -> Vec<&'static str> {
        [
            ("radius_covalent_pm", self.radius_covalent_pm.is_none()),
            ("vanderwaals_radius_pm", self.vanderwaals_radius_pm.is_none()),
            ("polarizability_angstrom3", self.polarizability_angstrom3.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, missing)| missing.then_some(field))
        .collect()
    }

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    /// Electrons in the outermost shell.
    pub fn valence_electrons(&self) -> u32 {
        self.shells.last().copied().unwrap_or(0)
    }

    /// An element is a metal when its category names a metal (not a nonmetal
    /// or metalloid) and its electronegativity is below
    /// [`METAL_ELECTRONEGATIVITY_LIMIT`].
    pub fn is_metal(&self) -> bool {
        let category = self.category.to_ascii_lowercase();
        self.electronegativity < METAL_ELECTRONEGATIVITY_LIMIT
            && category.contains("metal")
            && !category.contains("nonmetal")
            && !category.contains("metalloid")
    }

    /// The declared VSEPR geometry, if the table provides a recognizable one.
    pub fn geometry(&self) -> Option<MolecularGeometry> {
        let raw = self.geometry_preference.as_deref()?;
        match raw.parse() {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                warn!(element = %self.name, "{}; inferring from bond count", e);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElementFile {
    elements: HashMap<String, ElementProperties>,
}

/// Read-only lookup from element symbol to [`ElementProperties`].
#[derive(Debug, Clone, Default)]
pub struct ElementTable {
    elements: HashMap<String, Arc<ElementProperties>>,
}

impl ElementTable {
    /// The table embedded in the crate.
    pub fn builtin() -> Self {
        Self::from_toml_str(BUILTIN_ELEMENTS).expect("embedded element table is valid TOML")
    }

    pub fn load(path: &Path) -> Result<Self, ElementLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ElementLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ElementLoadError::Toml { source, .. } => ElementLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ElementLoadError> {
        let file: ElementFile = toml::from_str(content).map_err(|e| ElementLoadError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;
        let elements = file
            .elements
            .into_iter()
            .map(|(symbol, props)| {
                let estimated = props.estimated_fields();
                if !estimated.is_empty() {
                    warn!(%symbol, fields = ?estimated, "Falling back to estimated element data");
                }
                (symbol, Arc::new(props))
            })
            .collect();
        Ok(Self { elements })
    }

    pub fn get(&self, symbol: &str) -> Option<&Arc<ElementProperties>> {
        self.elements.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.elements.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Symbols ordered by atomic number.
    pub fn symbols(&self) -> Vec<&str> {
        let mut entries: Vec<_> = self.elements.iter().collect();
        entries.sort_by_key(|(_, props)| props.number);
        entries.into_iter().map(|(s, _)| s.as_str()).collect()
    }
}

#[derive(Debug, Error)]
pub enum ElementLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}
