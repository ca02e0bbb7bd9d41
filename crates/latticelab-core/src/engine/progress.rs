/// Events emitted while a headless run advances the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    RunStart { total_frames: u64 },
    FrameAdvanced { frame: u64 },
    RunFinish,

    /// A structural event worth surfacing to a user, e.g. a cloud split.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Optional sink for [`Progress`] events; silent when no callback is set.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
