// Items, recorded actions and past summaries in JSON format.

use serde::Deserialize;
use tiered_voting::builder::{describe, ItemsBuilder};

use crate::session::*;

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
struct JsonItem {
    id: Option<u32>,
    title: String,
    description: Option<String>,
}

/// One recorded request of the voter.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptStep {
    Assign { item: u32, score: u32 },
    Advance,
    Reset,
}

// The ranking entries of a summary written by `build_summary_js`.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
struct RankingEntry {
    rank: usize,
    id: u32,
    title: String,
    round1: u32,
    round2: u32,
    round3: u32,
    #[serde(rename = "finalScore")]
    final_score: u32,
    #[serde(rename = "roundsPlayed")]
    rounds_played: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct SummaryFile {
    phase: String,
    ranking: Vec<RankingEntry>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> SessionResult<T> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu { path })
}

pub fn read_json_items(path: &str) -> SessionResult<Vec<Item>> {
    let parsed: Vec<JsonItem> = read_json(path)?;
    build_items(&parsed)
}

fn build_items(parsed: &[JsonItem]) -> SessionResult<Vec<Item>> {
    let mut builder = ItemsBuilder::new();
    for ji in parsed.iter() {
        let description = match &ji.description {
            Some(d) if !d.is_empty() => d.clone(),
            _ => describe(&ji.title),
        };
        let added = match ji.id {
            Some(id) => builder.add_item(id, &ji.title, &description),
            None => builder.add_next(&ji.title, &description),
        };
        added.context(VotingSnafu {})?;
    }
    builder.build().context(VotingSnafu {})
}

pub fn read_actions(path: &str) -> SessionResult<Vec<Action>> {
    let steps: Vec<ScriptStep> = read_json(path)?;
    info!("Read {} actions from {}", steps.len(), path);
    to_actions(&steps)
}

fn to_actions(steps: &[ScriptStep]) -> SessionResult<Vec<Action>> {
    steps
        .iter()
        .map(|step| match step {
            ScriptStep::Assign { item, score } => Ok(Action::Assign {
                item: ItemId(*item),
                tier: Tier::from_points(*score).context(VotingSnafu {})?,
            }),
            ScriptStep::Advance => Ok(Action::Advance),
            ScriptStep::Reset => Ok(Action::ResetGroup),
        })
        .collect()
}

/// Reads back the final ranking of a summary. Only completed sessions can be tallied.
pub fn read_report(path: &str) -> SessionResult<VotingResult> {
    let summary: SummaryFile = read_json(path)?;
    if summary.phase != "complete" {
        whatever!(
            "The session in {} is not complete ({}), it cannot be tallied",
            path,
            summary.phase
        );
    }
    let ranking: Vec<ScoredItem> = summary
        .ranking
        .into_iter()
        .map(|e| ScoredItem {
            id: ItemId(e.id),
            title: e.title,
            description: String::new(),
            round1_score: e.round1,
            round2_score: e.round2,
            round3_score: e.round3,
            final_score: e.final_score,
            rounds_played: e.rounds_played,
            rank: e.rank,
        })
        .collect();
    debug!("read_report: {} items from {}", ranking.len(), path);
    Ok(VotingResult {
        ranking,
        group_stats: vec![],
    })
}
