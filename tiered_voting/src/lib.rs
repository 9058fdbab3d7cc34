mod aggregate;
mod board;
pub mod builder;
mod config;
pub mod manual;
mod partition;
mod quota;
mod run;
mod sink;
mod tally;

use log::{info, warn};

pub use crate::aggregate::{finalize, RoundScores};
pub use crate::board::{Group, QuotaStatus, ScoreBoard, ScoreDistribution};
pub use crate::config::*;
pub use crate::partition::{partition, BucketOrder, SECOND_ROUND_ORDER, THIRD_ROUND_ORDER};
pub use crate::run::RunState;
pub use crate::sink::{NoSink, ScoreSink};
pub use crate::tally::{tally_reports, ItemTally, TallySummary};

/// An action of a replayed session that the engine turned down.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Refusal {
    /// Position of the action in the script.
    pub index: usize,
    pub action: Action,
    pub error: VotingErrors,
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub state: RunState,
    pub refusals: Vec<Refusal>,
}

impl ReplayOutcome {
    pub fn result(&self) -> Option<&VotingResult> {
        self.state.result()
    }
}

/// Runs a recorded session of one voter.
///
/// Arguments:
/// * `items` the items to vote on, in presentation order
/// * `rules` the quota rules of the opening group
/// * `actions` the voter's requests, in order
/// * `sink` receives each group as it is finalized
///
/// A refused action (quota exceeded, incomplete group, ...) is recorded and the
/// replay goes on with the next one, exactly like a voter would see a refusal and
/// try something else. Only invalid inputs (no items, duplicate ids, bad rules)
/// stop the replay.
pub fn replay(
    items: &[Item],
    rules: &VoteRules,
    actions: &[Action],
    sink: &mut dyn ScoreSink,
) -> Result<ReplayOutcome, VotingErrors> {
    info!(
        "Replaying {} actions over {} items, rules: {:?}",
        actions.len(),
        items.len(),
        rules
    );
    let mut state = RunState::new(items, rules)?;
    let mut refusals: Vec<Refusal> = Vec::new();
    for (index, action) in actions.iter().enumerate() {
        let res = match action {
            Action::Assign { item, tier } => state.assign(*item, *tier).map(|_| ()),
            Action::Advance => state.advance_with(sink).map(|_| ()),
            Action::ResetGroup => state.reset_group(),
        };
        if let Err(error) = res {
            warn!("Action {} ({:?}) refused: {}", index, action, error);
            refusals.push(Refusal {
                index,
                action: *action,
                error,
            });
        }
    }
    if !state.is_complete() {
        if let Some(g) = state.active_group() {
            let (scored, total) = g.progress();
            warn!(
                "Replay ended before completion: {:?}, {}/{} items scored",
                state.phase(),
                scored,
                total
            );
        }
    }
    Ok(ReplayOutcome { state, refusals })
}
