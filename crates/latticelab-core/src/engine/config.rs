use super::mode::PhysicsMode;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Parameter '{name}' must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("Frame interval for '{0}' must be at least 1")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid {kind} '{value}'")]
pub struct ParseModeError {
    pub kind: &'static str,
    pub value: String,
}

/// How electrons are drawn around each nucleus. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualizationMode {
    #[default]
    Clouds,
    Shells,
}

/// Which electrons are drawn. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElectronMode {
    #[default]
    All,
    Valence,
}

/// How an interaction layer should dispatch clicks; the engine only stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    #[default]
    Add,
    Delete,
}

macro_rules! impl_mode_strings {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ParseModeError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseModeError { kind: $kind, value: s.to_string() }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", match self { $(Self::$variant => $text,)+ })
            }
        }
    };
}

impl_mode_strings!(VisualizationMode, "visualization mode", {
    Clouds => "clouds",
    Shells => "shells",
});
impl_mode_strings!(ElectronMode, "electron mode", {
    All => "all",
    Valence => "valence",
});
impl_mode_strings!(InteractionMode, "interaction mode", {
    Add => "add",
    Delete => "delete",
});

/// Presentation and session settings owned by the simulation.
///
/// Atoms never look these up globally; they are handed a reference when a
/// renderer asks how to draw them.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub visualization_mode: VisualizationMode,
    pub electron_mode: ElectronMode,
    pub interaction_mode: InteractionMode,
    /// Seed for the free-electron animation RNG.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            visualization_mode: VisualizationMode::default(),
            electron_mode: ElectronMode::default(),
            interaction_mode: InteractionMode::default(),
            seed: 0x5eed,
        }
    }
}

/// Every tunable of the physics engine.
///
/// `Default` yields the pedagogical preset.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    pub mode: PhysicsMode,
    pub gravity_enabled: bool,
    /// User-facing 0-10 scale.
    pub gravity_strength: f64,
    pub gravity_constant: f64,
    pub floor_enabled: bool,
    pub floor_y: f64,
    pub restitution: f64,
    /// Per-frame velocity retention factor.
    pub friction: f64,
    pub terminal_velocity: f64,
    pub repulsion_enabled: bool,
    pub repulsion_strength: f64,
    pub repulsion_factor: f64,
    pub bond_angles_enabled: bool,
    pub bond_angle_strength: f64,
    pub vdw_enabled: bool,
    pub vdw_strength: f64,
    /// Pairs closer than this are evaluated every frame.
    pub vdw_cutoff: f64,
    /// Frames between evaluations of pairs beyond the cutoff.
    pub vdw_far_interval: u64,
    /// Frames between metallic-cloud lattice spring passes.
    pub cloud_lattice_interval: u64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            mode: PhysicsMode::Pedagogical,
            gravity_enabled: true,
            gravity_strength: 5.0,
            gravity_constant: 0.001,
            floor_enabled: true,
            floor_y: 0.0,
            restitution: 0.5,
            friction: 0.98,
            terminal_velocity: 2.0,
            repulsion_enabled: true,
            repulsion_strength: 2.0,
            repulsion_factor: 0.3,
            bond_angles_enabled: true,
            bond_angle_strength: 0.05,
            vdw_enabled: false,
            vdw_strength: 1.0,
            vdw_cutoff: 10.0,
            vdw_far_interval: 3,
            cloud_lattice_interval: 3,
        }
    }
}

#[derive(Default)]
pub struct PhysicsConfigBuilder {
    config: PhysicsConfig,
}

impl PhysicsConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: PhysicsMode) -> Self {
        self.config.mode = mode;
        self
    }
    pub fn gravity(mut self, enabled: bool, strength: f64) -> Self {
        self.config.gravity_enabled = enabled;
        self.config.gravity_strength = strength;
        self
    }
    pub fn gravity_constant(mut self, constant: f64) -> Self {
        self.config.gravity_constant = constant;
        self
    }
    pub fn floor(mut self, enabled: bool, floor_y: f64) -> Self {
        self.config.floor_enabled = enabled;
        self.config.floor_y = floor_y;
        self
    }
    pub fn restitution(mut self, restitution: f64) -> Self {
        self.config.restitution = restitution;
        self
    }
    pub fn friction(mut self, friction: f64) -> Self {
        self.config.friction = friction;
        self
    }
    pub fn terminal_velocity(mut self, cap: f64) -> Self {
        self.config.terminal_velocity = cap;
        self
    }
    pub fn repulsion(mut self, enabled: bool, strength: f64, factor: f64) -> Self {
        self.config.repulsion_enabled = enabled;
        self.config.repulsion_strength = strength;
        self.config.repulsion_factor = factor;
        self
    }
    pub fn bond_angles(mut self, enabled: bool, strength: f64) -> Self {
        self.config.bond_angles_enabled = enabled;
        self.config.bond_angle_strength = strength;
        self
    }
    pub fn van_der_waals(mut self, enabled: bool, strength: f64) -> Self {
        self.config.vdw_enabled = enabled;
        self.config.vdw_strength = strength;
        self
    }
    pub fn vdw_cutoff(mut self, cutoff: f64) -> Self {
        self.config.vdw_cutoff = cutoff;
        self
    }
    pub fn vdw_far_interval(mut self, frames: u64) -> Self {
        self.config.vdw_far_interval = frames;
        self
    }
    pub fn cloud_lattice_interval(mut self, frames: u64) -> Self {
        self.config.cloud_lattice_interval = frames;
        self
    }

    pub fn build(self) -> Result<PhysicsConfig, ConfigError> {
        let c = self.config;
        check_range("gravity_strength", c.gravity_strength, 0.0, 10.0)?;
        check_range("restitution", c.restitution, 0.0, 1.0)?;
        check_range("friction", c.friction, 0.0, 1.0)?;
        check_range("terminal_velocity", c.terminal_velocity, 0.0, f64::MAX)?;
        check_range("repulsion_strength", c.repulsion_strength, 0.0, f64::MAX)?;
        check_range("repulsion_factor", c.repulsion_factor, 0.0, f64::MAX)?;
        check_range("bond_angle_strength", c.bond_angle_strength, 0.0, f64::MAX)?;
        check_range("vdw_strength", c.vdw_strength, 0.0, f64::MAX)?;
        check_range("vdw_cutoff", c.vdw_cutoff, 0.0, f64::MAX)?;
        if c.vdw_far_interval == 0 {
            return Err(ConfigError::ZeroInterval("vdw_far_interval"));
        }
        if c.cloud_lattice_interval == 0 {
            return Err(ConfigError::ZeroInterval("cloud_lattice_interval"));
        }
        Ok(c)
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_pedagogical_preset() {
        let config = PhysicsConfigBuilder::new().build().unwrap();
        assert_eq!(config, PhysicsConfig::default());
        assert_eq!(config.mode, PhysicsMode::Pedagogical);
        assert!(!config.vdw_enabled);
    }

    #[test]
    fn builder_applies_overrides() {
        let config = PhysicsConfigBuilder::new()
            .gravity(false, 2.0)
            .floor(true, -5.0)
            .friction(0.9)
            .van_der_waals(true, 0.5)
            .vdw_far_interval(5)
            .build()
            .unwrap();
        assert!(!config.gravity_enabled);
        assert_eq!(config.gravity_strength, 2.0);
        assert_eq!(config.floor_y, -5.0);
        assert_eq!(config.friction, 0.9);
        assert!(config.vdw_enabled);
        assert_eq!(config.vdw_far_interval, 5);
    }

    #[test]
    fn builder_rejects_out_of_range_values() {
        let err = PhysicsConfigBuilder::new().restitution(1.5).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                name: "restitution",
                ..
            }
        ));
        assert!(PhysicsConfigBuilder::new().gravity(true, 11.0).build().is_err());
        assert!(PhysicsConfigBuilder::new().friction(f64::NAN).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_intervals() {
        assert_eq!(
            PhysicsConfigBuilder::new().vdw_far_interval(0).build(),
            Err(ConfigError::ZeroInterval("vdw_far_interval"))
        );
        assert_eq!(
            PhysicsConfigBuilder::new().cloud_lattice_interval(0).build(),
            Err(ConfigError::ZeroInterval("cloud_lattice_interval"))
        );
    }

    #[test]
    fn presentation_modes_parse_and_display() {
        assert_eq!("Shells".parse::<VisualizationMode>(), Ok(VisualizationMode::Shells));
        assert_eq!("valence".parse::<ElectronMode>(), Ok(ElectronMode::Valence));
        assert_eq!("DELETE".parse::<InteractionMode>(), Ok(InteractionMode::Delete));
        assert_eq!(VisualizationMode::Clouds.to_string(), "clouds");
        assert_eq!(ElectronMode::All.to_string(), "all");
        assert_eq!(InteractionMode::Add.to_string(), "add");

        let err = "wireframe".parse::<VisualizationMode>().unwrap_err();
        assert_eq!(err.kind, "visualization mode");
        assert_eq!(err.value, "wireframe");
    }

    #[test]
    fn simulation_config_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.visualization_mode, VisualizationMode::Clouds);
        assert_eq!(config.electron_mode, ElectronMode::All);
        assert_eq!(config.interaction_mode, InteractionMode::Add);
    }
}
