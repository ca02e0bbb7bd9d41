use crate::cli::SimulateArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::scene::SceneFile;
use crate::utils::progress::CliProgressHandler;
use latticelab::core::models::element::ElementTable;
use latticelab::engine::progress::ProgressReporter;
use latticelab::workflows::run::run_frames;
use latticelab::workflows::simulation::{Simulation, Stats};
use std::collections::BTreeMap;
use std::fmt::Write;
use tracing::info;

pub fn run(args: SimulateArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args)?;

    let elements = match &args.elements {
        Some(path) => {
            info!("Loading element table from {:?}", path);
            ElementTable::load(path)?
        }
        None => ElementTable::builtin(),
    };

    info!("Loading scene from {:?}", &args.scene);
    let scene = SceneFile::from_file(&args.scene)?;

    let mut sim = Simulation::new(elements, settings.physics, settings.simulation);
    let summary = scene.populate(&mut sim)?;
    println!(
        "Scene loaded: {} atoms, {} crystals, {} clouds ({} mode).",
        summary.atoms,
        summary.crystals,
        summary.clouds,
        sim.physics().mode()
    );

    let stats = if args.no_progress {
        run_frames(&mut sim, settings.frames, &ProgressReporter::new())
    } else {
        let progress_handler = CliProgressHandler::new();
        let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
        run_frames(&mut sim, settings.frames, &reporter)
    };

    print!("{}", render_report(&sim, &stats));
    Ok(())
}

/// Plain-text summary of a finished run: the counters plus a tally of
/// molecule formulas.
pub fn render_report(sim: &Simulation, stats: &Stats) -> String {
    let mut formulas: BTreeMap<String, usize> = BTreeMap::new();
    for molecule in sim.molecules() {
        *formulas.entry(molecule.formula(sim.atoms())).or_default() += 1;
    }

    let mut out = String::new();
    let _ = writeln!(out, "Frames simulated: {}", sim.frame());
    let _ = writeln!(out, "Atoms:     {}", stats.atom_count);
    let _ = writeln!(out, "Bonds:     {}", stats.bond_count);
    let _ = writeln!(out, "Molecules: {}", stats.molecule_count);
    let _ = writeln!(out, "Clouds:    {}", stats.cloud_count);
    if !formulas.is_empty() {
        let _ = writeln!(out, "Composition:");
        for (formula, count) in &formulas {
            let _ = writeln!(out, "  {:>4} x {}", count, formula);
        }
    }
    out
}
