/// Runs an expensive pass only on every `interval`-th frame.
///
/// The interval trades accuracy for frame time: distant Van der Waals pairs
/// and metallic lattice springs change slowly, so refreshing them every few
/// frames keeps hundreds of atoms interactive. An interval of 1 evaluates
/// every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchedule {
    interval: u64,
}

impl FrameSchedule {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: u64) {
        self.interval = interval.max(1);
    }

    #[inline]
    pub fn is_due(&self, frame: u64) -> bool {
        frame % self.interval == 0
    }
}

impl Default for FrameSchedule {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_fires_every_third_frame() {
        let schedule = FrameSchedule::default();
        let due: Vec<u64> = (0..10).filter(|&f| schedule.is_due(f)).collect();
        assert_eq!(due, vec![0, 3, 6, 9]);
    }

    #[test]
    fn zero_interval_is_clamped_to_every_frame() {
        let mut schedule = FrameSchedule::new(0);
        assert_eq!(schedule.interval(), 1);
        assert!((0..5).all(|f| schedule.is_due(f)));
        schedule.set_interval(4);
        assert!(!schedule.is_due(2));
        assert!(schedule.is_due(8));
    }
}
