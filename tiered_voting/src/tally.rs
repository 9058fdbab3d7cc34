use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::board::ScoreDistribution;
use crate::config::*;

/// How one item fared across all the voters.
#[derive(PartialEq, Debug, Clone)]
pub struct ItemTally {
    pub id: ItemId,
    pub title: String,
    /// Number of reports that contain the item.
    pub votes: usize,
    pub total_score: u32,
    pub average_score: f64,
}

/// The combined outcome of several completed runs, one per voter.
#[derive(PartialEq, Debug, Clone)]
pub struct TallySummary {
    pub total_votes: usize,
    /// Best average first. Equal averages keep the order of first appearance.
    pub items: Vec<ItemTally>,
    /// Round-1 scores over all the voters.
    pub first_round_distribution: ScoreDistribution,
}

// Compares a/b against c/d without going through floating point.
fn cmp_ratio(a: u32, b: usize, c: u32, d: usize) -> Ordering {
    (a as u64 * d as u64).cmp(&(c as u64 * b as u64))
}

/// Combines the final reports of several voters.
pub fn tally_reports(reports: &[VotingResult]) -> Result<TallySummary, VotingErrors> {
    if reports.is_empty() {
        return Err(VotingErrors::EmptyTally);
    }
    let mut order: Vec<ItemId> = Vec::new();
    let mut per_item: HashMap<ItemId, (String, usize, u32)> = HashMap::new();
    let mut distribution = ScoreDistribution::default();

    for (idx, report) in reports.iter().enumerate() {
        debug!(
            "tally_reports: report {} with {} items",
            idx,
            report.ranking.len()
        );
        for scored in report.ranking.iter() {
            distribution.record(Tier::from_points(scored.round1_score)?);
            let e = per_item.entry(scored.id).or_insert_with(|| {
                order.push(scored.id);
                (scored.title.clone(), 0, 0)
            });
            e.1 += 1;
            e.2 += scored.final_score;
        }
    }

    let mut items: Vec<ItemTally> = order
        .iter()
        .filter_map(|id| {
            per_item.get(id).map(|(title, votes, total)| ItemTally {
                id: *id,
                title: title.clone(),
                votes: *votes,
                total_score: *total,
                average_score: *total as f64 / *votes as f64,
            })
        })
        .collect();
    items.sort_by(|a, b| cmp_ratio(b.total_score, b.votes, a.total_score, a.votes));

    info!(
        "Tallied {} reports over {} items",
        reports.len(),
        items.len()
    );
    Ok(TallySummary {
        total_votes: reports.len(),
        items,
        first_round_distribution: distribution,
    })
}
