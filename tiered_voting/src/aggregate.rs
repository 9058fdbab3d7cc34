use log::debug;
use std::collections::HashMap;

use crate::config::*;

/// The finalized score of an item in each round it took part in.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct RoundScores {
    scores: [Option<Tier>; 3],
}

impl RoundScores {
    pub fn get(&self, round: Round) -> Option<Tier> {
        self.scores[round.index()]
    }

    pub(crate) fn set(&mut self, round: Round, tier: Tier) {
        self.scores[round.index()] = Some(tier);
    }

    /// Points of a round, 0 when the round was not reached.
    pub fn points(&self, round: Round) -> u32 {
        self.get(round).map(Tier::points).unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        Round::ALL.iter().map(|r| self.points(*r)).sum()
    }

    pub fn rounds_played(&self) -> u32 {
        self.scores.iter().filter(|s| s.is_some()).count() as u32
    }
}

/// Builds the final ranking of all the original items.
///
/// The ranking is sorted by final score, highest first. Items with the same final
/// score keep their input order (`sort_by` is stable), and share the same rank.
pub fn finalize(items: &[Item], per_round: &HashMap<ItemId, RoundScores>) -> Vec<ScoredItem> {
    let mut ranking: Vec<ScoredItem> = items
        .iter()
        .map(|item| {
            let scores = per_round.get(&item.id).copied().unwrap_or_default();
            ScoredItem {
                id: item.id,
                title: item.title.clone(),
                description: item.description.clone(),
                round1_score: scores.points(Round::First),
                round2_score: scores.points(Round::Second),
                round3_score: scores.points(Round::Third),
                final_score: scores.total(),
                rounds_played: scores.rounds_played(),
                rank: 0,
            }
        })
        .collect();
    ranking.sort_by(|a, b| b.final_score.cmp(&a.final_score));

    let mut previous: Option<(u32, usize)> = None;
    for (idx, scored) in ranking.iter_mut().enumerate() {
        scored.rank = match previous {
            Some((score, rank)) if score == scored.final_score => rank,
            _ => idx + 1,
        };
        previous = Some((scored.final_score, scored.rank));
    }
    debug!(
        "finalize: {:?}",
        ranking
            .iter()
            .map(|s| (s.id.0, s.final_score))
            .collect::<Vec<(u32, u32)>>()
    );
    ranking
}
