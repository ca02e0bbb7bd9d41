use crate::cli::SimulateArgs;
use crate::error::{CliError, Result};
use latticelab::engine::config::{
    ElectronMode, InteractionMode, PhysicsConfig, PhysicsConfigBuilder, SimulationConfig,
    VisualizationMode,
};
use latticelab::engine::mode::PhysicsMode;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_FRAMES: u64 = 600;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPhysicsConfig {
    mode: Option<PhysicsMode>,
    gravity: Option<bool>,
    gravity_strength: Option<f64>,
    gravity_constant: Option<f64>,
    floor: Option<bool>,
    floor_y: Option<f64>,
    restitution: Option<f64>,
    friction: Option<f64>,
    terminal_velocity: Option<f64>,
    repulsion: Option<bool>,
    repulsion_strength: Option<f64>,
    repulsion_factor: Option<f64>,
    bond_angles: Option<bool>,
    bond_angle_strength: Option<f64>,
    van_der_waals: Option<bool>,
    vdw_strength: Option<f64>,
    vdw_cutoff: Option<f64>,
    vdw_far_interval: Option<u64>,
    cloud_lattice_interval: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDisplayConfig {
    visualization: Option<VisualizationMode>,
    electrons: Option<ElectronMode>,
    interaction: Option<InteractionMode>,
}

/// The run configuration file as written by a user; every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialRunConfig {
    frames: Option<u64>,
    seed: Option<u64>,
    physics: Option<PartialPhysicsConfig>,
    display: Option<PartialDisplayConfig>,
}

/// Fully resolved settings for one headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub frames: u64,
    pub physics: PhysicsConfig,
    pub simulation: SimulationConfig,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Layers flags over the file over the mode preset over the defaults.
    pub fn merge_with_cli(self, args: &SimulateArgs) -> Result<RunSettings> {
        let physics = self.physics.unwrap_or_default();
        let display = self.display.unwrap_or_default();

        let mode = match &args.mode {
            Some(raw) => raw
                .parse::<PhysicsMode>()
                .map_err(|e| CliError::Argument(e.to_string()))?,
            None => physics.mode.unwrap_or_default(),
        };
        let preset = mode.preset();
        let defaults = PhysicsConfig::default();

        let physics = PhysicsConfigBuilder::new()
            .mode(mode)
            .gravity(
                !args.no_gravity && physics.gravity.unwrap_or(defaults.gravity_enabled),
                physics.gravity_strength.unwrap_or(defaults.gravity_strength),
            )
            .gravity_constant(physics.gravity_constant.unwrap_or(defaults.gravity_constant))
            .floor(
                physics.floor.unwrap_or(defaults.floor_enabled),
                physics.floor_y.unwrap_or(defaults.floor_y),
            )
            .restitution(physics.restitution.unwrap_or(defaults.restitution))
            .friction(physics.friction.unwrap_or(preset.friction))
            .terminal_velocity(physics.terminal_velocity.unwrap_or(defaults.terminal_velocity))
            .repulsion(
                physics.repulsion.unwrap_or(defaults.repulsion_enabled),
                physics.repulsion_strength.unwrap_or(defaults.repulsion_strength),
                physics.repulsion_factor.unwrap_or(defaults.repulsion_factor),
            )
            .bond_angles(
                physics.bond_angles.unwrap_or(defaults.bond_angles_enabled),
                physics.bond_angle_strength.unwrap_or(preset.bond_angle_strength),
            )
            .van_der_waals(
                args.vdw || physics.van_der_waals.unwrap_or(preset.vdw_enabled),
                physics.vdw_strength.unwrap_or(defaults.vdw_strength),
            )
            .vdw_cutoff(physics.vdw_cutoff.unwrap_or(defaults.vdw_cutoff))
            .vdw_far_interval(physics.vdw_far_interval.unwrap_or(defaults.vdw_far_interval))
            .cloud_lattice_interval(
                physics
                    .cloud_lattice_interval
                    .unwrap_or(defaults.cloud_lattice_interval),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let base = SimulationConfig::default();
        let simulation = SimulationConfig {
            visualization_mode: display.visualization.unwrap_or(base.visualization_mode),
            electron_mode: display.electrons.unwrap_or(base.electron_mode),
            interaction_mode: display.interaction.unwrap_or(base.interaction_mode),
            seed: args.seed.or(self.seed).unwrap_or(base.seed),
        };

        Ok(RunSettings {
            frames: args.frames.or(self.frames).unwrap_or(DEFAULT_FRAMES),
            physics,
            simulation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn args() -> SimulateArgs {
        SimulateArgs {
            scene: PathBuf::from("scene.toml"),
            config: None,
            elements: None,
            frames: None,
            mode: None,
            seed: None,
            no_gravity: false,
            vdw: false,
            no_progress: true,
        }
    }

    fn parse(content: &str) -> PartialRunConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn empty_config_yields_defaults() {
        let settings = PartialRunConfig::default().merge_with_cli(&args()).unwrap();
        assert_eq!(settings.frames, DEFAULT_FRAMES);
        assert_eq!(settings.physics, PhysicsConfig::default());
        assert_eq!(settings.simulation, SimulationConfig::default());
    }

    #[test]
    fn realistic_mode_applies_preset_before_overrides() {
        let settings = parse("[physics]\nmode = \"realistic\"\n")
            .merge_with_cli(&args())
            .unwrap();
        let preset = PhysicsMode::Realistic.preset();
        assert_eq!(settings.physics.mode, PhysicsMode::Realistic);
        assert_eq!(settings.physics.friction, preset.friction);
        assert_eq!(settings.physics.vdw_enabled, preset.vdw_enabled);

        let settings = parse("[physics]\nmode = \"realistic\"\nfriction = 0.9\n")
            .merge_with_cli(&args())
            .unwrap();
        assert_eq!(settings.physics.friction, 0.9);
    }

    #[test]
    fn flags_override_file_values() {
        let config = parse(
            "frames = 50\nseed = 1\n[physics]\nmode = \"pedagogical\"\ngravity = true\n",
        );
        let mut args = args();
        args.frames = Some(7);
        args.seed = Some(99);
        args.mode = Some("realistic".to_string());
        args.no_gravity = true;
        args.vdw = true;

        let settings = config.merge_with_cli(&args).unwrap();
        assert_eq!(settings.frames, 7);
        assert_eq!(settings.simulation.seed, 99);
        assert_eq!(settings.physics.mode, PhysicsMode::Realistic);
        assert!(!settings.physics.gravity_enabled);
        assert!(settings.physics.vdw_enabled);
    }

    #[test]
    fn display_section_sets_presentation_modes() {
        let settings = parse("[display]\nvisualization = \"shells\"\nelectrons = \"valence\"\n")
            .merge_with_cli(&args())
            .unwrap();
        assert_eq!(settings.simulation.visualization_mode, VisualizationMode::Shells);
        assert_eq!(settings.simulation.electron_mode, ElectronMode::Valence);
        assert_eq!(settings.simulation.interaction_mode, InteractionMode::Add);
    }

    #[test]
    fn out_of_range_values_are_config_errors() {
        let result = parse("[physics]\nrestitution = 1.5\n").merge_with_cli(&args());
        assert!(matches!(result, Err(CliError::Config(_))));

        let result = parse("[physics]\nvdw-far-interval = 0\n").merge_with_cli(&args());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn unknown_mode_flag_is_an_argument_error() {
        let mut args = args();
        args.mode = Some("chaotic".to_string());
        let result = PartialRunConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[physics]\nwarp-speed = 9").unwrap();
        let result = PartialRunConfig::from_file(file.path());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PartialRunConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
