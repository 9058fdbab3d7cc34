use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use tiered_voting::builder::sample_items;
use tiered_voting::*;

use std::fs::{self, File};
use std::io::BufWriter;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::session::config_reader::*;
use crate::session::sink::JsonLinesSink;

pub mod config_reader;
mod io_csv;
mod io_json;
mod sink;

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the {what} to JSON"))]
    SerializingJson {
        source: serde_json::Error,
        what: String,
    },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file has too few columns"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file: {value:?} is not a valid item id"))]
    CsvBadId { lineno: usize, value: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Voting error: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

fn action_label(action: &Action) -> String {
    match action {
        Action::Assign { item, tier } => format!("assign {} -> {}", item, tier),
        Action::Advance => "advance".to_string(),
        Action::ResetGroup => "reset".to_string(),
    }
}

fn phase_label(phase: RunPhase) -> String {
    match phase {
        RunPhase::Active { round, group } => format!("{}, group {}", round, group + 1),
        RunPhase::Complete => "complete".to_string(),
    }
}

fn rounding_label(rounding: QuotaRounding) -> &'static str {
    match rounding {
        QuotaRounding::Floor => "floor",
        QuotaRounding::Ceiling => "ceiling",
    }
}

fn rules_to_json(rules: &VoteRules) -> JSValue {
    json!({
        "topTierPercent": rules.quota.top_tier_percent,
        "midTierPercent": rules.quota.mid_tier_percent,
        "quotaRounding": rounding_label(rules.quota.rounding),
    })
}

/// One finalized group. Scores are listed in the order the group presented its items.
pub(crate) fn group_to_json(stats: &GroupStats) -> JSValue {
    let scores: Vec<JSValue> = stats
        .scores
        .iter()
        .map(|(item, tier)| json!({ "id": item.0, "score": tier.points() }))
        .collect();
    let key = match stats.key {
        GroupKey::Initial => json!("initial"),
        GroupKey::Score(s) => json!(s),
    };
    json!({
        "round": stats.round.number(),
        "group": stats.group + 1,
        "key": key,
        "hasQuota": stats.has_quota,
        "scores": scores,
    })
}

fn ranking_to_json(result: Option<&VotingResult>) -> Vec<JSValue> {
    let ranking = match result {
        Some(r) => &r.ranking,
        None => return vec![],
    };
    ranking
        .iter()
        .map(|s| {
            json!({
                "rank": s.rank,
                "id": s.id.0,
                "title": s.title,
                "round1": s.round1_score,
                "round2": s.round2_score,
                "round3": s.round3_score,
                "finalScore": s.final_score,
                "roundsPlayed": s.rounds_played,
            })
        })
        .collect()
}

fn refusals_to_json(refusals: &[Refusal]) -> Vec<JSValue> {
    refusals
        .iter()
        .map(|r| {
            json!({
                "index": r.index,
                "action": action_label(&r.action),
                "error": r.error.to_string(),
            })
        })
        .collect()
}

fn build_summary_js(config: &SessionConfig, rules: &VoteRules, outcome: &ReplayOutcome) -> JSValue {
    let rounds: Vec<JSValue> = outcome
        .state
        .group_stats()
        .iter()
        .map(group_to_json)
        .collect();
    json!({
        "config": {
            "contest": config.output_settings.contest_name,
            "items": outcome.state.items().len(),
            "rules": rules_to_json(rules),
        },
        "phase": phase_label(outcome.state.phase()),
        "ranking": ranking_to_json(outcome.result()),
        "rounds": rounds,
        "refusals": refusals_to_json(&outcome.refusals),
    })
}

fn tally_to_json(summary: &TallySummary) -> JSValue {
    let items: Vec<JSValue> = summary
        .items
        .iter()
        .map(|t| {
            json!({
                "id": t.id.0,
                "title": t.title,
                "votes": t.votes,
                "totalScore": t.total_score,
                "averageScore": t.average_score,
            })
        })
        .collect();
    let d = summary.first_round_distribution;
    json!({
        "totalVotes": summary.total_votes,
        "items": items,
        "firstRoundDistribution": { "0": d.zero, "1": d.one, "2": d.two },
    })
}

fn read_items(source: &ItemSource) -> SessionResult<Vec<Item>> {
    info!(
        "Attempting to read items from {:?} ({})",
        source.file_path, source.provider
    );
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_items(&source.file_path),
        "json" => io_json::read_json_items(&source.file_path),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn gather_items(config: &SessionConfig, sample: bool) -> SessionResult<Vec<Item>> {
    if config.item_sources.is_empty() {
        if sample {
            info!("No item source, using the built-in example ideas");
            return Ok(sample_items());
        }
        whatever!("No item source: pass --items, --sample or a configuration with itemSources");
    }
    let mut items: Vec<Item> = Vec::new();
    for source in config.item_sources.iter() {
        let mut file_items = read_items(source)?;
        items.append(&mut file_items);
    }
    debug!("items: {:?}", items);
    Ok(items)
}

/// Replays the session described by the configuration and returns its summary.
pub fn replay_config(config: &SessionConfig, sample: bool) -> SessionResult<JSValue> {
    let rules = validate_rules(&config.rules)?;
    let items = gather_items(config, sample)?;
    let actions = match &config.actions_path {
        Some(p) => io_json::read_actions(p)?,
        None => {
            warn!("No recorded actions, the session will stay on its opening group");
            vec![]
        }
    };

    let outcome = match &config.output_settings.scores_log_path {
        Some(p) => {
            let file = File::create(p).context(WritingFileSnafu { path: p.clone() })?;
            let mut sink = JsonLinesSink::new(BufWriter::new(file), p);
            let outcome = replay(&items, &rules, &actions, &mut sink).context(VotingSnafu {})?;
            let lines = sink.finish()?;
            info!("Wrote {} finalized groups to {}", lines, p);
            outcome
        }
        None => replay(&items, &rules, &actions, &mut NoSink).context(VotingSnafu {})?,
    };
    if !outcome.refusals.is_empty() {
        warn!("{} actions were refused", outcome.refusals.len());
    }
    Ok(build_summary_js(config, &rules, &outcome))
}

fn pretty_json<T: serde::Serialize + ?Sized>(value: &T, what: &str) -> SessionResult<String> {
    serde_json::to_string_pretty(value).context(SerializingJsonSnafu { what })
}

fn write_summary(js: &JSValue, out: Option<&str>) -> SessionResult<String> {
    let pretty = pretty_json(js, "summary")?;
    match out {
        None | Some("stdout") => println!("{}", pretty),
        Some(p) => {
            info!("Writing summary to {}", p);
            fs::write(p, &pretty).context(WritingFileSnafu { path: p })?;
        }
    }
    Ok(pretty)
}

fn check_reference(pretty_js: &str, reference_path: &str) -> SessionResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref = pretty_json(&summary_ref, "reference summary")?;
    if pretty_js_summary_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between the computed summary and the reference summary")
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

fn run_tally(paths: &[String]) -> SessionResult<JSValue> {
    let mut reports: Vec<VotingResult> = Vec::new();
    for p in paths.iter() {
        reports.push(io_json::read_report(p)?);
    }
    let summary = tally_reports(&reports).context(VotingSnafu {})?;
    if let Some(best) = summary.items.first() {
        info!(
            "Best idea over {} voters: {} ({:.2} on average)",
            summary.total_votes, best.title, best.average_score
        );
    }
    Ok(tally_to_json(&summary))
}

pub fn run_session(args: &Args) -> SessionResult<()> {
    let (js, out) = if !args.tally.is_empty() {
        (run_tally(&args.tally)?, args.out.clone())
    } else {
        let mut config = match &args.config {
            Some(p) => read_config(p)?,
            None => SessionConfig::default(),
        };
        config.apply_args(args);
        info!("config: {:?}", config);
        let js = replay_config(&config, args.sample)?;
        (js, config.output_settings.output_path)
    };
    let pretty = write_summary(&js, out.as_deref())?;

    if let Some(reference) = &args.reference {
        check_reference(&pretty, reference)?;
    }
    Ok(())
}
