use crate::config::*;

/// Receives the scores of a run as they become final, typically to persist them.
///
/// The engine does not wait for an acknowledgement. Implementations that talk to a
/// remote service are expected to queue and retry on their own.
pub trait ScoreSink {
    /// Called once for every group, right after its scores were accepted.
    fn group_finalized(&mut self, _stats: &GroupStats) {}

    /// Called once, when the run reaches its terminal state.
    fn run_completed(&mut self, _result: &VotingResult) {}
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSink;

impl ScoreSink for NoSink {}

/// Keeps the finalized groups in memory.
impl ScoreSink for Vec<GroupStats> {
    fn group_finalized(&mut self, stats: &GroupStats) {
        self.push(stats.clone());
    }
}
