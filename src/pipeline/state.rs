//! Run state machine and its progress schedule.

use serde::{Deserialize, Serialize};

use crate::progress::ProgressSink;

/// Percent reported when a run starts, before the first transition.
pub const START_PERCENT: u8 = 10;
const IMAGES_START_PERCENT: u8 = 50;
const IMAGES_SPAN_PERCENT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    GeneratingText,
    ExtractingPrompts,
    GeneratingImages,
    Finalizing,
    Done,
    Failed,
}

impl RunState {
    /// Percent reported on entering this state.
    pub fn percent(self) -> u8 {
        match self {
            RunState::Idle | RunState::Failed => 0,
            RunState::GeneratingText => 25,
            RunState::ExtractingPrompts => 40,
            RunState::GeneratingImages => IMAGES_START_PERCENT,
            RunState::Finalizing => 90,
            RunState::Done => 100,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// The only non-failure state reachable from `self`.
    pub fn successor(self) -> Option<RunState> {
        match self {
            RunState::Idle => Some(RunState::GeneratingText),
            RunState::GeneratingText => Some(RunState::ExtractingPrompts),
            RunState::ExtractingPrompts => Some(RunState::GeneratingImages),
            RunState::GeneratingImages => Some(RunState::Finalizing),
            RunState::Finalizing => Some(RunState::Done),
            RunState::Done | RunState::Failed => None,
        }
    }

    /// Strictly sequential; any non-terminal state may fail.
    pub fn can_transition_to(self, next: RunState) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == RunState::Failed || self.successor() == Some(next)
    }
}

/// Percent for image `number` (1-based) of `total`, spread over 50..=80.
pub fn image_percent(number: usize, total: usize) -> u8 {
    if total == 0 {
        return IMAGES_START_PERCENT;
    }
    let number = number.min(total);
    IMAGES_START_PERCENT + (IMAGES_SPAN_PERCENT * number / total) as u8
}

/// Walks one run through its states, reporting to a sink. Percentages never go
/// backwards except on failure, which resets to 0.
pub struct RunTracker<'a> {
    state: RunState,
    last_percent: u8,
    sink: &'a dyn ProgressSink,
}

impl<'a> RunTracker<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            state: RunState::Idle,
            last_percent: 0,
            sink,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Report the start of the run without leaving `Idle`.
    pub fn start(&mut self, message: &str) {
        self.report(START_PERCENT, message);
    }

    /// Move to `next` and emit exactly one event at its scheduled percent.
    pub fn advance(&mut self, next: RunState, message: &str) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        self.report(next.percent(), message);
    }

    /// Intermediate report inside the current state.
    pub fn step(&mut self, percent: u8, message: &str) {
        self.report(percent, message);
    }

    /// Enter `Failed` and reset progress to 0.
    pub fn fail(&mut self, message: &str) {
        self.state = RunState::Failed;
        self.last_percent = 0;
        self.sink.report(0, message);
    }

    fn report(&mut self, percent: u8, message: &str) {
        let percent = percent.max(self.last_percent);
        self.last_percent = percent;
        self.sink.report(percent, message);
    }
}
