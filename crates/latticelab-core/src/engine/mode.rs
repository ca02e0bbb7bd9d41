use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicsMode {
    /// Stiff springs and strong damping; structures snap into textbook shapes.
    #[default]
    Pedagogical,
    /// Softer springs, light damping and Van der Waals attraction.
    Realistic,
}

#[derive(Debug, Error)]
#[error("Invalid physics mode '{0}'")]
pub struct ParsePhysicsModeError(String);

impl FromStr for PhysicsMode {
    type Err = ParsePhysicsModeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pedagogical" | "educational" => Ok(Self::Pedagogical),
            "realistic" => Ok(Self::Realistic),
            _ => Err(ParsePhysicsModeError(s.to_string())),
        }
    }
}

impl fmt::Display for PhysicsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Pedagogical => "pedagogical",
                Self::Realistic => "realistic",
            }
        )
    }
}

/// Settings a mode switch overwrites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModePreset {
    /// Simulation-wide factor applied to every bond spring.
    pub spring_multiplier: f64,
    pub friction: f64,
    pub vdw_enabled: bool,
    pub bond_angle_strength: f64,
}

impl PhysicsMode {
    pub fn preset(&self) -> ModePreset {
        match self {
            Self::Pedagogical => ModePreset {
                spring_multiplier: 1.0,
                friction: 0.98,
                vdw_enabled: false,
                bond_angle_strength: 0.05,
            },
            Self::Realistic => ModePreset {
                spring_multiplier: 0.3,
                friction: 0.995,
                vdw_enabled: true,
                bond_angle_strength: 0.02,
            },
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Pedagogical => Self::Realistic,
            Self::Realistic => Self::Pedagogical,
        }
    }
}

/// Tracks the active mode and the spring multiplier it implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeManager {
    mode: PhysicsMode,
}

impl ModeManager {
    pub fn new(mode: PhysicsMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> PhysicsMode {
        self.mode
    }

    pub fn spring_multiplier(&self) -> f64 {
        self.mode.preset().spring_multiplier
    }

    /// Switches mode and returns the preset the engine must apply.
    pub fn set_mode(&mut self, mode: PhysicsMode) -> ModePreset {
        self.mode = mode;
        mode.preset()
    }

    pub fn toggle(&mut self) -> ModePreset {
        self.set_mode(self.mode.toggled())
    }
}
