use log::{debug, info};
use std::collections::{HashMap, HashSet};

use crate::aggregate::{finalize, RoundScores};
use crate::board::{Group, QuotaStatus};
use crate::config::*;
use crate::partition::{partition, SECOND_ROUND_ORDER, THIRD_ROUND_ORDER};
use crate::sink::{NoSink, ScoreSink};

/// The state of one voter's run, from the opening group to the final ranking.
///
/// Every operation either succeeds or returns an error and leaves the state as it was.
/// A `RunState` owns all its data: concurrent voters each get their own.
#[derive(Debug, Clone)]
pub struct RunState {
    rules: VoteRules,
    // In input order. Survivors and ties are always ordered by this.
    items: Vec<Item>,
    phase: RunPhase,
    // The groups of the current round.
    groups: Vec<Group>,
    round_scores: HashMap<ItemId, RoundScores>,
    cumulative: HashMap<ItemId, u32>,
    group_stats: Vec<GroupStats>,
    result: Option<VotingResult>,
}

impl RunState {
    /// Starts a run: round 1, a single quota group with every item.
    pub fn new(items: &[Item], rules: &VoteRules) -> Result<RunState, VotingErrors> {
        rules.quota.validate()?;
        if items.is_empty() {
            return Err(VotingErrors::EmptyRun);
        }
        let mut seen: HashSet<ItemId> = HashSet::new();
        for item in items.iter() {
            if !seen.insert(item.id) {
                return Err(VotingErrors::DuplicateItem(item.id));
            }
        }
        let ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
        let opening = Group::new(Round::First, GroupKey::Initial, true, &ids);
        let q = &rules.quota;
        info!(
            "Starting run with {} items (score 2: at most {}, score 1: at most {})",
            items.len(),
            q.max_allowed(Tier::Two, items.len()),
            q.max_allowed(Tier::One, items.len())
        );
        Ok(RunState {
            rules: *rules,
            items: items.to_vec(),
            phase: RunPhase::Active {
                round: Round::First,
                group: 0,
            },
            groups: vec![opening],
            round_scores: HashMap::new(),
            cumulative: HashMap::new(),
            group_stats: Vec::new(),
            result: None,
        })
    }

    pub fn rules(&self) -> &VoteRules {
        &self.rules
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == RunPhase::Complete
    }

    /// The groups of the current round. Empty once the run is complete.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn active_group(&self) -> Option<&Group> {
        match self.phase {
            RunPhase::Active { group, .. } => self.groups.get(group),
            RunPhase::Complete => None,
        }
    }

    fn active_group_mut(&mut self) -> Result<&mut Group, VotingErrors> {
        match self.phase {
            RunPhase::Active { group, .. } => self
                .groups
                .get_mut(group)
                .ok_or(VotingErrors::InvalidTransition(InvalidTransition::RunComplete)),
            RunPhase::Complete => Err(VotingErrors::InvalidTransition(
                InvalidTransition::RunComplete,
            )),
        }
    }

    /// The running total of an item over the finalized groups, None if it was never finalized.
    pub fn cumulative_score(&self, item: ItemId) -> Option<u32> {
        self.cumulative.get(&item).copied()
    }

    pub fn round_scores(&self, item: ItemId) -> Option<RoundScores> {
        self.round_scores.get(&item).copied()
    }

    /// Every group finalized so far, in voting order.
    pub fn group_stats(&self) -> &[GroupStats] {
        &self.group_stats
    }

    /// The final report, available once the run is complete.
    pub fn result(&self) -> Option<&VotingResult> {
        self.result.as_ref()
    }

    pub fn can_assign(&self, item: ItemId, tier: Tier) -> bool {
        self.active_group()
            .map(|g| g.can_assign(item, tier, &self.rules.quota))
            .unwrap_or(false)
    }

    pub fn quota_status(&self) -> Vec<QuotaStatus> {
        self.active_group()
            .map(|g| g.quota_status(&self.rules.quota))
            .unwrap_or_default()
    }

    /// Scores an item of the active group. Giving an item the score it already has clears it.
    pub fn assign(&mut self, item: ItemId, tier: Tier) -> Result<ScoreChange, VotingErrors> {
        let policy = self.rules.quota;
        let group = self.active_group_mut()?;
        let change = group.assign(item, tier, &policy)?;
        debug!(
            "assign: item {}: {:?} -> {:?}",
            item, change.previous, change.current
        );
        Ok(change)
    }

    /// Clears every score of the active group.
    pub fn reset_group(&mut self) -> Result<(), VotingErrors> {
        let group = self.active_group_mut()?;
        group.clear();
        debug!("reset_group: {} items cleared", group.len());
        Ok(())
    }

    /// Puts back previously saved scores into the active group.
    ///
    /// Scores are applied in order with the usual quota checks, except that a score
    /// already held is kept rather than toggled off. Either all of them apply or none.
    pub fn restore_scores(
        &mut self,
        saved: &[(ItemId, Tier)],
    ) -> Result<Vec<ScoreChange>, VotingErrors> {
        let policy = self.rules.quota;
        let group = self.active_group_mut()?;
        let mut staged = group.clone();
        let mut changes: Vec<ScoreChange> = Vec::new();
        for (item, tier) in saved.iter() {
            if staged.board().score(*item) == Some(*tier) {
                continue;
            }
            changes.push(staged.assign(*item, *tier, &policy)?);
        }
        *group = staged;
        debug!("restore_scores: {} scores restored", changes.len());
        Ok(changes)
    }

    pub fn advance(&mut self) -> Result<Transition, VotingErrors> {
        self.advance_with(&mut NoSink)
    }

    /// Finalizes the active group and moves to the next group, the next round, or completion.
    ///
    /// Refused while an item of the active group is unscored.
    pub fn advance_with(&mut self, sink: &mut dyn ScoreSink) -> Result<Transition, VotingErrors> {
        let (round, index) = match self.phase {
            RunPhase::Active { round, group } => (round, group),
            RunPhase::Complete => {
                return Err(VotingErrors::InvalidTransition(
                    InvalidTransition::RunComplete,
                ))
            }
        };
        let group = self
            .groups
            .get(index)
            .ok_or(VotingErrors::InvalidTransition(InvalidTransition::RunComplete))?;
        let scores = group
            .board()
            .check_submission(group.quota(&self.rules.quota))?;

        // Nothing below can fail.
        let stats = GroupStats {
            round,
            group: index,
            key: group.key,
            has_quota: group.has_quota,
            scores,
        };
        for (item, tier) in stats.scores.iter() {
            self.round_scores
                .entry(*item)
                .or_default()
                .set(round, *tier);
            *self.cumulative.entry(*item).or_insert(0) += tier.points();
        }
        info!(
            "{} group {} ({:?}) finalized: {:?}",
            round,
            index + 1,
            stats.key,
            stats
                .scores
                .iter()
                .map(|(id, t)| (id.0, t.points()))
                .collect::<Vec<(u32, u32)>>()
        );
        sink.group_finalized(&stats);
        self.group_stats.push(stats);

        if index + 1 < self.groups.len() {
            self.phase = RunPhase::Active {
                round,
                group: index + 1,
            };
            return Ok(Transition::NextGroup {
                round,
                group: index + 1,
            });
        }

        let next_groups = match round {
            Round::First => {
                let survivors = self.participants(Round::First);
                partition(
                    &survivors,
                    |id| self.points_in(id, Round::First),
                    SECOND_ROUND_ORDER,
                    Round::Second,
                )
            }
            Round::Second => {
                let survivors = self.participants(Round::Second);
                partition(
                    &survivors,
                    |id| self.cumulative_score(id).unwrap_or(0),
                    THIRD_ROUND_ORDER,
                    Round::Third,
                )
            }
            Round::Third => vec![],
        };

        let next_round = match round {
            Round::First => Some(Round::Second),
            Round::Second => Some(Round::Third),
            Round::Third => None,
        };
        match next_round {
            Some(next) if !next_groups.is_empty() => {
                let eliminated = self.participants(round).len()
                    - next_groups.iter().map(|g| g.len()).sum::<usize>();
                info!(
                    "Starting {} with {} groups ({} items did not continue)",
                    next,
                    next_groups.len(),
                    eliminated
                );
                let count = next_groups.len();
                self.groups = next_groups;
                self.phase = RunPhase::Active {
                    round: next,
                    group: 0,
                };
                Ok(Transition::NextRound {
                    round: next,
                    groups: count,
                })
            }
            _ => {
                self.complete(sink);
                Ok(Transition::Complete)
            }
        }
    }

    // Items finalized in `round`, in input order.
    fn participants(&self, round: Round) -> Vec<ItemId> {
        self.items
            .iter()
            .map(|i| i.id)
            .filter(|id| {
                self.round_scores
                    .get(id)
                    .and_then(|s| s.get(round))
                    .is_some()
            })
            .collect()
    }

    fn points_in(&self, item: ItemId, round: Round) -> u32 {
        self.round_scores
            .get(&item)
            .map(|s| s.points(round))
            .unwrap_or(0)
    }

    fn complete(&mut self, sink: &mut dyn ScoreSink) {
        let ranking = finalize(&self.items, &self.round_scores);
        let result = VotingResult {
            ranking,
            group_stats: self.group_stats.clone(),
        };
        if let Some(best) = result.ranking.first() {
            info!(
                "Run complete after {} groups, best item: {} ({}) with {} points",
                self.group_stats.len(),
                best.id,
                best.title,
                best.final_score
            );
        }
        sink.run_completed(&result);
        self.groups = Vec::new();
        self.phase = RunPhase::Complete;
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: u32) -> Vec<Item> {
        (1..=n)
            .map(|i| Item::new(i, &format!("Idea {}", i), "description"))
            .collect()
    }

    fn score_all(state: &mut RunState, scores: &[(u32, Tier)]) {
        for (id, tier) in scores {
            state.assign(ItemId(*id), *tier).unwrap();
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        assert_eq!(
            RunState::new(&[], &VoteRules::DEFAULT_RULES).err(),
            Some(VotingErrors::EmptyRun)
        );
        let dup = vec![Item::new(1, "a", ""), Item::new(1, "b", "")];
        assert_eq!(
            RunState::new(&dup, &VoteRules::DEFAULT_RULES).err(),
            Some(VotingErrors::DuplicateItem(ItemId(1)))
        );
        let mut rules = VoteRules::DEFAULT_RULES;
        rules.quota.mid_tier_percent = 150;
        assert!(matches!(
            RunState::new(&items(3), &rules),
            Err(VotingErrors::InvalidRules(_))
        ));
    }

    #[test]
    fn opening_state() {
        let state = RunState::new(&items(4), &VoteRules::DEFAULT_RULES).unwrap();
        assert_eq!(
            state.phase(),
            RunPhase::Active {
                round: Round::First,
                group: 0
            }
        );
        let g = state.active_group().unwrap();
        assert!(g.has_quota);
        assert_eq!(g.key, GroupKey::Initial);
        assert_eq!(g.len(), 4);
        assert!(state.result().is_none());
    }

    #[test]
    fn advance_refused_while_incomplete() {
        let mut state = RunState::new(&items(3), &VoteRules::DEFAULT_RULES).unwrap();
        score_all(&mut state, &[(1, Tier::One), (2, Tier::Zero)]);
        let before = format!("{:?}", state);
        assert_eq!(
            state.advance(),
            Err(VotingErrors::IncompleteGroup {
                scored: 2,
                total: 3
            })
        );
        assert_eq!(format!("{:?}", state), before);
    }

    #[test]
    fn everything_zero_completes_after_round_one() {
        let mut state = RunState::new(&items(3), &VoteRules::DEFAULT_RULES).unwrap();
        score_all(&mut state, &[(1, Tier::Zero), (2, Tier::Zero), (3, Tier::Zero)]);
        assert_eq!(state.advance(), Ok(Transition::Complete));
        assert!(state.is_complete());
        assert!(state.groups().is_empty());
        let result = state.result().unwrap();
        assert!(result.ranking.iter().all(|s| s.final_score == 0));
        assert_eq!(
            state.advance(),
            Err(VotingErrors::InvalidTransition(
                InvalidTransition::RunComplete
            ))
        );
        assert_eq!(
            state.assign(ItemId(1), Tier::One),
            Err(VotingErrors::InvalidTransition(
                InvalidTransition::RunComplete
            ))
        );
    }

    #[test]
    fn no_finalists_completes_after_round_two() {
        let mut state = RunState::new(&items(5), &VoteRules::DEFAULT_RULES).unwrap();
        score_all(
            &mut state,
            &[
                (1, Tier::One),
                (2, Tier::One),
                (3, Tier::Zero),
                (4, Tier::Zero),
                (5, Tier::Zero),
            ],
        );
        assert_eq!(
            state.advance(),
            Ok(Transition::NextRound {
                round: Round::Second,
                groups: 1
            })
        );
        // Best possible after round 2 is 1 + 1.
        score_all(&mut state, &[(1, Tier::One), (2, Tier::Zero)]);
        assert_eq!(state.advance(), Ok(Transition::Complete));
        assert_eq!(state.cumulative_score(ItemId(1)), Some(2));
        assert_eq!(state.cumulative_score(ItemId(3)), Some(0));
    }

    #[test]
    fn rounds_after_the_first_have_no_quota() {
        let mut state = RunState::new(&items(10), &VoteRules::DEFAULT_RULES).unwrap();
        // 10 items: two 2s and four 1s allowed.
        score_all(
            &mut state,
            &[
                (1, Tier::Two),
                (2, Tier::Two),
                (3, Tier::One),
                (4, Tier::One),
                (5, Tier::One),
                (6, Tier::One),
            ],
        );
        assert!(!state.can_assign(ItemId(7), Tier::Two));
        assert!(state.assign(ItemId(7), Tier::One).is_err());
        score_all(
            &mut state,
            &[
                (7, Tier::Zero),
                (8, Tier::Zero),
                (9, Tier::Zero),
                (10, Tier::Zero),
            ],
        );
        state.advance().unwrap();
        let g = state.active_group().unwrap();
        assert!(!g.has_quota);
        assert_eq!(g.key, GroupKey::Score(2));
        score_all(&mut state, &[(1, Tier::Two), (2, Tier::Two)]);
        assert_eq!(
            state.advance(),
            Ok(Transition::NextGroup {
                round: Round::Second,
                group: 1
            })
        );
        assert!(state.quota_status().is_empty());
        score_all(
            &mut state,
            &[(3, Tier::Two), (4, Tier::Two), (5, Tier::Two), (6, Tier::Two)],
        );
        assert_eq!(
            state.advance(),
            Ok(Transition::NextRound {
                round: Round::Third,
                groups: 2
            })
        );
        let keys: Vec<GroupKey> = state.groups().iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![GroupKey::Score(4), GroupKey::Score(3)]);
    }

    #[test]
    fn reset_and_restore() {
        let mut state = RunState::new(&items(5), &VoteRules::DEFAULT_RULES).unwrap();
        score_all(&mut state, &[(1, Tier::Two), (2, Tier::One)]);
        state.reset_group().unwrap();
        assert_eq!(state.active_group().unwrap().progress(), (0, 5));

        let changes = state
            .restore_scores(&[(ItemId(1), Tier::Two), (ItemId(2), Tier::One), (ItemId(3), Tier::Zero)])
            .unwrap();
        assert_eq!(changes.len(), 3);
        // Restoring the same scores again keeps them.
        let changes = state.restore_scores(&[(ItemId(1), Tier::Two)]).unwrap();
        assert!(changes.is_empty());
        assert_eq!(
            state.active_group().unwrap().board().score(ItemId(1)),
            Some(Tier::Two)
        );

        // 5 items allow a single 2: the whole restore is refused.
        let before = state.active_group().cloned();
        let res = state.restore_scores(&[(ItemId(4), Tier::Zero), (ItemId(5), Tier::Two)]);
        assert!(matches!(res, Err(VotingErrors::QuotaExceeded { .. })));
        assert_eq!(state.active_group().cloned(), before);
    }

    #[test]
    fn sink_sees_every_group_and_the_result() {
        struct Recorder {
            groups: Vec<(Round, usize)>,
            completed: usize,
        }
        impl ScoreSink for Recorder {
            fn group_finalized(&mut self, stats: &GroupStats) {
                self.groups.push((stats.round, stats.group));
            }
            fn run_completed(&mut self, _result: &VotingResult) {
                self.completed += 1;
            }
        }
        let mut rec = Recorder {
            groups: vec![],
            completed: 0,
        };
        let mut state = RunState::new(&items(2), &VoteRules::DEFAULT_RULES).unwrap();
        // ceil(2 * 0.2) = 1 slot for a 2.
        score_all(&mut state, &[(1, Tier::Two), (2, Tier::One)]);
        state.advance_with(&mut rec).unwrap();
        score_all(&mut state, &[(1, Tier::Two)]);
        state.advance_with(&mut rec).unwrap();
        score_all(&mut state, &[(2, Tier::Zero)]);
        state.advance_with(&mut rec).unwrap();
        score_all(&mut state, &[(1, Tier::One)]);
        assert_eq!(state.advance_with(&mut rec), Ok(Transition::Complete));
        assert_eq!(
            rec.groups,
            vec![
                (Round::First, 0),
                (Round::Second, 0),
                (Round::Second, 1),
                (Round::Third, 0)
            ]
        );
        assert_eq!(rec.completed, 1);
        assert_eq!(state.result().unwrap().ranking[0].final_score, 5);
    }
}
