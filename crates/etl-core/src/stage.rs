use std::time::Instant;

use etl_model::PipelineStage;
use tracing::{Span, debug, info_span};

/// Walks one customer through the stage sequence without skipping.
#[derive(Debug)]
pub(crate) struct StageTracker {
    current: PipelineStage,
    started: Instant,
}

impl StageTracker {
    pub(crate) fn new() -> Self {
        Self {
            current: PipelineStage::Pending,
            started: Instant::now(),
        }
    }

    pub(crate) fn current(&self) -> PipelineStage {
        self.current
    }

    /// Move to the next stage and return a span for its work.
    pub(crate) fn advance(&mut self) -> Span {
        let elapsed_ms = self.started.elapsed().as_millis();
        if let Some(next) = self.current.next() {
            debug!(from = %self.current, to = %next, elapsed_ms, "stage transition");
            self.current = next;
            self.started = Instant::now();
        }
        info_span!("stage", stage = %self.current)
    }
}
