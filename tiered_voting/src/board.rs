use log::debug;

use crate::config::*;

/// Count of items holding each score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ScoreDistribution {
    pub zero: usize,
    pub one: usize,
    pub two: usize,
}

impl ScoreDistribution {
    pub fn count(&self, tier: Tier) -> usize {
        match tier {
            Tier::Zero => self.zero,
            Tier::One => self.one,
            Tier::Two => self.two,
        }
    }

    pub(crate) fn record(&mut self, tier: Tier) {
        match tier {
            Tier::Zero => self.zero += 1,
            Tier::One => self.one += 1,
            Tier::Two => self.two += 1,
        }
    }

    pub fn total_points(&self) -> u32 {
        (self.one + 2 * self.two) as u32
    }
}

/// How much of a quota is already used.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct QuotaStatus {
    pub tier: Tier,
    pub used: usize,
    pub max_allowed: usize,
}

/// The scores given inside one group, in presentation order.
///
/// Tier counts are always recomputed from the entries, there is no cached counter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoreBoard {
    entries: Vec<(ItemId, Option<Tier>)>,
}

impl ScoreBoard {
    pub(crate) fn new(members: &[ItemId]) -> ScoreBoard {
        ScoreBoard {
            entries: members.iter().map(|id| (*id, None)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn members(&self) -> Vec<ItemId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.position(item).is_some()
    }

    /// The current score of an item, None if unscored or not a member.
    pub fn score(&self, item: ItemId) -> Option<Tier> {
        self.position(item).and_then(|idx| self.entries[idx].1)
    }

    pub fn scores(&self) -> &[(ItemId, Option<Tier>)] {
        &self.entries
    }

    pub fn tier_count(&self, tier: Tier) -> usize {
        self.entries
            .iter()
            .filter(|(_, s)| *s == Some(tier))
            .count()
    }

    fn tier_count_excluding(&self, tier: Tier, item: ItemId) -> usize {
        self.entries
            .iter()
            .filter(|(id, s)| *id != item && *s == Some(tier))
            .count()
    }

    pub fn scored_count(&self) -> usize {
        self.entries.iter().filter(|(_, s)| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|(_, s)| s.is_some())
    }

    pub fn distribution(&self) -> ScoreDistribution {
        let mut d = ScoreDistribution::default();
        for tier in self.entries.iter().filter_map(|(_, s)| *s) {
            d.record(tier);
        }
        d
    }

    fn position(&self, item: ItemId) -> Option<usize> {
        self.entries.iter().position(|(id, _)| *id == item)
    }

    fn not_a_member(item: ItemId) -> VotingErrors {
        VotingErrors::InvalidTransition(InvalidTransition::NotInActiveGroup(item))
    }

    /// Checks the quota for giving `tier` to `item`, ignoring the item's own current score.
    fn check_quota(
        &self,
        item: ItemId,
        tier: Tier,
        quota: Option<&QuotaPolicy>,
    ) -> Result<(), VotingErrors> {
        let policy = match quota {
            Some(p) if tier != Tier::Zero => p,
            _ => return Ok(()),
        };
        let max_allowed = policy.max_allowed(tier, self.len());
        let used = self.tier_count_excluding(tier, item);
        if used >= max_allowed {
            debug!(
                "check_quota: item {} refused score {}: {} used, {} allowed",
                item, tier, used, max_allowed
            );
            return Err(VotingErrors::QuotaExceeded { tier, max_allowed });
        }
        Ok(())
    }

    /// Tells whether `assign(item, tier, quota)` would succeed, without changing anything.
    pub fn check_assign(
        &self,
        item: ItemId,
        tier: Tier,
        quota: Option<&QuotaPolicy>,
    ) -> Result<(), VotingErrors> {
        let idx = self.position(item).ok_or_else(|| Self::not_a_member(item))?;
        if self.entries[idx].1 == Some(tier) {
            // Toggling off is always allowed.
            return Ok(());
        }
        self.check_quota(item, tier, quota)
    }

    /// Gives `tier` to `item`, or clears the score if the item already holds `tier`.
    ///
    /// On error the board is unchanged.
    pub fn assign(
        &mut self,
        item: ItemId,
        tier: Tier,
        quota: Option<&QuotaPolicy>,
    ) -> Result<ScoreChange, VotingErrors> {
        let idx = self.position(item).ok_or_else(|| Self::not_a_member(item))?;
        let previous = self.entries[idx].1;
        if previous == Some(tier) {
            self.entries[idx].1 = None;
            return Ok(ScoreChange {
                item,
                previous,
                current: None,
            });
        }
        self.check_quota(item, tier, quota)?;
        self.entries[idx].1 = Some(tier);
        Ok(ScoreChange {
            item,
            previous,
            current: Some(tier),
        })
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.1 = None;
        }
    }

    /// Whole-board check done before the scores of a group are accepted: every item
    /// must be scored and no positive tier may exceed its ceiling.
    ///
    /// Returns the scores in presentation order.
    pub fn check_submission(
        &self,
        quota: Option<&QuotaPolicy>,
    ) -> Result<Vec<(ItemId, Tier)>, VotingErrors> {
        let scores: Vec<(ItemId, Tier)> = self
            .entries
            .iter()
            .filter_map(|(id, s)| s.map(|t| (*id, t)))
            .collect();
        if scores.len() != self.len() {
            return Err(VotingErrors::IncompleteGroup {
                scored: scores.len(),
                total: self.len(),
            });
        }
        if let Some(policy) = quota {
            let distribution = self.distribution();
            for tier in [Tier::Two, Tier::One] {
                let max_allowed = policy.max_allowed(tier, self.len());
                if distribution.count(tier) > max_allowed {
                    return Err(VotingErrors::QuotaExceeded { tier, max_allowed });
                }
            }
        }
        Ok(scores)
    }
}

/// A set of items voted on together within one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Group {
    pub round: Round,
    pub key: GroupKey,
    pub has_quota: bool,
    board: ScoreBoard,
}

impl Group {
    pub(crate) fn new(round: Round, key: GroupKey, has_quota: bool, members: &[ItemId]) -> Group {
        Group {
            round,
            key,
            has_quota,
            board: ScoreBoard::new(members),
        }
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn members(&self) -> Vec<ItemId> {
        self.board.members()
    }

    pub fn len(&self) -> usize {
        self.board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }

    /// The policy to enforce in this group, if any.
    pub fn quota<'a>(&self, policy: &'a QuotaPolicy) -> Option<&'a QuotaPolicy> {
        if self.has_quota {
            Some(policy)
        } else {
            None
        }
    }

    pub(crate) fn assign(
        &mut self,
        item: ItemId,
        tier: Tier,
        policy: &QuotaPolicy,
    ) -> Result<ScoreChange, VotingErrors> {
        let quota = self.quota(policy);
        self.board.assign(item, tier, quota)
    }

    pub fn can_assign(&self, item: ItemId, tier: Tier, policy: &QuotaPolicy) -> bool {
        self.board
            .check_assign(item, tier, self.quota(policy))
            .is_ok()
    }

    /// Usage of the positive tiers. Empty for groups without a quota.
    pub fn quota_status(&self, policy: &QuotaPolicy) -> Vec<QuotaStatus> {
        match self.quota(policy) {
            Some(p) => [Tier::Two, Tier::One]
                .iter()
                .map(|tier| QuotaStatus {
                    tier: *tier,
                    used: self.board.tier_count(*tier),
                    max_allowed: p.max_allowed(*tier, self.len()),
                })
                .collect(),
            None => vec![],
        }
    }

    /// (scored, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.board.scored_count(), self.len())
    }

    pub(crate) fn clear(&mut self) {
        self.board.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<ItemId> {
        (1..=n).map(ItemId).collect()
    }

    fn quota_group(n: u32) -> Group {
        Group::new(Round::First, GroupKey::Initial, true, &ids(n))
    }

    const RULES: VoteRules = VoteRules::DEFAULT_RULES;

    #[test]
    fn fifth_top_score_is_refused_in_twenty() {
        let mut g = quota_group(20);
        for i in 1..=4 {
            g.assign(ItemId(i), Tier::Two, &RULES.quota).unwrap();
        }
        let before = g.clone();
        let res = g.assign(ItemId(5), Tier::Two, &RULES.quota);
        assert_eq!(
            res,
            Err(VotingErrors::QuotaExceeded {
                tier: Tier::Two,
                max_allowed: 4
            })
        );
        assert_eq!(g, before);
    }

    #[test]
    fn mid_tier_allows_eight_in_twenty() {
        let mut g = quota_group(20);
        for i in 1..=8 {
            g.assign(ItemId(i), Tier::One, &RULES.quota).unwrap();
        }
        assert!(g.assign(ItemId(9), Tier::One, &RULES.quota).is_err());
        // Zero is never limited.
        for i in 9..=20 {
            g.assign(ItemId(i), Tier::Zero, &RULES.quota).unwrap();
        }
        assert!(g.board().is_complete());
    }

    #[test]
    fn toggle_off_and_back_on() {
        let mut g = quota_group(5);
        // ceil(5 * 0.2) = 1 slot for a 2.
        g.assign(ItemId(1), Tier::Two, &RULES.quota).unwrap();
        let off = g.assign(ItemId(1), Tier::Two, &RULES.quota).unwrap();
        assert_eq!(off.previous, Some(Tier::Two));
        assert_eq!(off.current, None);
        assert_eq!(g.board().score(ItemId(1)), None);
        let on = g.assign(ItemId(1), Tier::Two, &RULES.quota).unwrap();
        assert_eq!(on.current, Some(Tier::Two));
        assert_eq!(g.board().tier_count(Tier::Two), 1);
    }

    #[test]
    fn toggle_off_is_never_quota_checked() {
        // A board filled past its ceiling (no quota at the time) can still be toggled off.
        let mut board = ScoreBoard::new(&ids(3));
        for i in 1..=3 {
            board.assign(ItemId(i), Tier::Two, None).unwrap();
        }
        let quota = Some(&RULES.quota);
        let change = board.assign(ItemId(2), Tier::Two, quota).unwrap();
        assert_eq!(change.current, None);
        assert!(board.check_assign(ItemId(1), Tier::Two, quota).is_ok());
    }

    #[test]
    fn moving_between_tiers_counts_net_of_own_slot() {
        let mut g = quota_group(5);
        g.assign(ItemId(1), Tier::Two, &RULES.quota).unwrap();
        // Tier 2 is full, tier 1 has 2 slots.
        assert!(!g.can_assign(ItemId(2), Tier::Two, &RULES.quota));
        g.assign(ItemId(1), Tier::One, &RULES.quota).unwrap();
        assert_eq!(g.board().tier_count(Tier::Two), 0);
        g.assign(ItemId(2), Tier::Two, &RULES.quota).unwrap();
        g.assign(ItemId(3), Tier::One, &RULES.quota).unwrap();
        assert!(!g.can_assign(ItemId(4), Tier::One, &RULES.quota));
        // Item 3 already holds a 1, so asking for it again is a toggle.
        assert!(g.can_assign(ItemId(3), Tier::One, &RULES.quota));
    }

    #[test]
    fn groups_without_quota_accept_anything() {
        let mut g = Group::new(Round::Second, GroupKey::Score(2), false, &ids(3));
        for i in 1..=3 {
            g.assign(ItemId(i), Tier::Two, &RULES.quota).unwrap();
        }
        assert_eq!(g.board().tier_count(Tier::Two), 3);
        assert!(g.quota_status(&RULES.quota).is_empty());
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut g = quota_group(3);
        assert_eq!(
            g.assign(ItemId(42), Tier::Zero, &RULES.quota),
            Err(VotingErrors::InvalidTransition(
                InvalidTransition::NotInActiveGroup(ItemId(42))
            ))
        );
    }

    #[test]
    fn submission_requires_every_score() {
        let mut g = quota_group(3);
        g.assign(ItemId(1), Tier::Zero, &RULES.quota).unwrap();
        assert_eq!(
            g.board().check_submission(g.quota(&RULES.quota)),
            Err(VotingErrors::IncompleteGroup {
                scored: 1,
                total: 3
            })
        );
        g.assign(ItemId(2), Tier::One, &RULES.quota).unwrap();
        g.assign(ItemId(3), Tier::Two, &RULES.quota).unwrap();
        let scores = g.board().check_submission(g.quota(&RULES.quota)).unwrap();
        assert_eq!(
            scores,
            vec![
                (ItemId(1), Tier::Zero),
                (ItemId(2), Tier::One),
                (ItemId(3), Tier::Two)
            ]
        );
    }

    #[test]
    fn submission_rechecks_ceilings() {
        let mut board = ScoreBoard::new(&ids(4));
        for i in 1..=4 {
            board.assign(ItemId(i), Tier::Two, None).unwrap();
        }
        assert_eq!(
            board.check_submission(Some(&RULES.quota)),
            Err(VotingErrors::QuotaExceeded {
                tier: Tier::Two,
                max_allowed: 1
            })
        );
        assert!(board.check_submission(None).is_ok());
    }

    #[test]
    fn distribution_and_status() {
        let mut g = quota_group(10);
        g.assign(ItemId(1), Tier::Two, &RULES.quota).unwrap();
        g.assign(ItemId(2), Tier::One, &RULES.quota).unwrap();
        g.assign(ItemId(3), Tier::One, &RULES.quota).unwrap();
        g.assign(ItemId(4), Tier::Zero, &RULES.quota).unwrap();
        let d = g.board().distribution();
        assert_eq!((d.zero, d.one, d.two), (1, 2, 1));
        assert_eq!(d.total_points(), 4);
        assert_eq!(g.progress(), (4, 10));
        assert_eq!(
            g.quota_status(&RULES.quota),
            vec![
                QuotaStatus {
                    tier: Tier::Two,
                    used: 1,
                    max_allowed: 2
                },
                QuotaStatus {
                    tier: Tier::One,
                    used: 2,
                    max_allowed: 4
                }
            ]
        );
        g.clear();
        assert_eq!(g.progress(), (0, 10));
    }
}
