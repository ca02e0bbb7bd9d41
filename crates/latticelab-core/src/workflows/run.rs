use crate::engine::progress::{Progress, ProgressReporter};
use crate::workflows::simulation::{Simulation, Stats};
use tracing::{debug, info, instrument};

/// Advances `sim` by `frames` frames and returns the final statistics.
///
/// A [`Progress::Message`] is emitted whenever the atom, bond or cloud count
/// changes between frames.
#[instrument(skip_all, name = "headless_run", fields(frames = frames))]
pub fn run_frames(sim: &mut Simulation, frames: u64, reporter: &ProgressReporter) -> Stats {
    reporter.report(Progress::RunStart {
        total_frames: frames,
    });
    let start = sim.stats();
    info!(
        atoms = start.atom_count,
        bonds = start.bond_count,
        clouds = start.cloud_count,
        "Starting headless run."
    );

    let mut last = start;
    for _ in 0..frames {
        sim.update();
        reporter.report(Progress::FrameAdvanced { frame: sim.frame() });

        let current = sim.stats();
        if structural_change(&last, &current) {
            debug!(frame = sim.frame(), ?current, "Structure changed");
            reporter.report(Progress::Message(format!(
                "Frame {}: {} atoms, {} bonds, {} clouds",
                sim.frame(),
                current.atom_count,
                current.bond_count,
                current.cloud_count
            )));
        }
        last = current;
    }

    reporter.report(Progress::RunFinish);
    info!(
        frame = sim.frame(),
        molecules = last.molecule_count,
        "Headless run finished."
    );
    last
}

fn structural_change(before: &Stats, after: &Stats) -> bool {
    before.atom_count != after.atom_count
        || before.bond_count != after.bond_count
        || before.cloud_count != after.cloud_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use std::sync::Mutex;

    fn recorded(sim: &mut Simulation, frames: u64) -> (Stats, Vec<Progress>) {
        let events = Mutex::new(Vec::new());
        let stats = {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            run_frames(sim, frames, &reporter)
        };
        (stats, events.into_inner().unwrap())
    }

    #[test]
    fn reports_start_every_frame_and_finish() {
        let mut sim = Simulation::default();
        sim.add_atom(Point3::new(0.0, 10.0, 0.0), "H").unwrap();

        let (_, events) = recorded(&mut sim, 5);

        assert_eq!(events.first(), Some(&Progress::RunStart { total_frames: 5 }));
        assert_eq!(events.last(), Some(&Progress::RunFinish));
        let frames: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Progress::FrameAdvanced { frame } => Some(*frame),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![1, 2, 3, 4, 5]);
        assert_eq!(sim.frame(), 5);
    }

    #[test]
    fn returns_final_statistics() {
        let mut sim = Simulation::default();
        sim.add_atom(Point3::new(0.0, 5.0, 0.0), "C").unwrap();
        sim.add_atom(Point3::new(1.5, 5.0, 0.0), "C").unwrap();
        sim.add_atom(Point3::new(30.0, 5.0, 0.0), "Ne").unwrap();

        let (stats, _) = recorded(&mut sim, 10);
        assert_eq!(stats, sim.stats());
        assert_eq!(stats.atom_count, 3);
        assert_eq!(stats.bond_count, 1);
        assert_eq!(stats.molecule_count, 2);
    }

    #[test]
    fn zero_frames_only_brackets_the_run() {
        let mut sim = Simulation::default();
        let (_, events) = recorded(&mut sim, 0);
        assert_eq!(events, vec![Progress::RunStart { total_frames: 0 }, Progress::RunFinish]);
    }

    #[test]
    fn silent_reporter_is_accepted() {
        let mut sim = Simulation::default();
        let stats = run_frames(&mut sim, 3, &ProgressReporter::new());
        assert_eq!(stats.atom_count, 0);
        assert_eq!(sim.frame(), 3);
    }
}
