use std::time::Instant;

use tracing::debug;

/// Emits the wall time of a sync stage at debug level when dropped.
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self { stage, start: Instant::now() }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        debug!(stage = self.stage, elapsed_ms = self.elapsed_ms() as u64, "stage finished");
    }
}

#[macro_export]
macro_rules! stage_timer {
    ($name:expr) => {
        let _stage_timer = $crate::debug::StageTimer::new($name);
    };
}
