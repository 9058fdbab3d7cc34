use crate::args::Args;
use crate::session::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName", default)]
    pub contest_name: String,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "scoresLogPath")]
    pub scores_log_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ItemSource {
    /// `csv` or `json`
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// `default` or `legacy`. The other fields override the preset.
    pub preset: Option<String>,
    #[serde(rename = "topTierPercent")]
    pub top_tier_percent: Option<u32>,
    #[serde(rename = "midTierPercent")]
    pub mid_tier_percent: Option<u32>,
    #[serde(rename = "quotaRounding")]
    pub quota_rounding: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "itemSources", default)]
    pub item_sources: Vec<ItemSource>,
    pub rules: Option<RulesConfig>,
    #[serde(rename = "actionsPath")]
    pub actions_path: Option<String>,
}

fn resolve(root: &Path, p: &str) -> String {
    root.join(p).display().to_string()
}

impl SessionConfig {
    // Paths in the file are relative to the file.
    fn resolve_paths(&mut self, root: &Path) {
        for source in self.item_sources.iter_mut() {
            source.file_path = resolve(root, &source.file_path);
        }
        self.actions_path = self.actions_path.as_deref().map(|p| resolve(root, p));
        let settings = &mut self.output_settings;
        settings.output_path = settings.output_path.as_deref().map(|p| match p {
            "stdout" => p.to_string(),
            _ => resolve(root, p),
        });
        settings.scores_log_path = settings
            .scores_log_path
            .as_deref()
            .map(|p| resolve(root, p));
    }

    /// Command line flags take precedence over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(items) = &args.items {
            let provider = args
                .items_type
                .clone()
                .unwrap_or_else(|| guess_provider(items));
            self.item_sources = vec![ItemSource {
                provider,
                file_path: items.clone(),
            }];
        }
        if let Some(p) = &args.actions {
            self.actions_path = Some(p.clone());
        }
        if let Some(p) = &args.out {
            self.output_settings.output_path = Some(p.clone());
        }
        if let Some(p) = &args.scores_log {
            self.output_settings.scores_log_path = Some(p.clone());
        }
    }
}

fn guess_provider(path: &str) -> String {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => "json".to_string(),
        _ => "csv".to_string(),
    }
}

pub fn read_config(path: &str) -> SessionResult<SessionConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let mut config: SessionConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    let root = Path::new(path).parent().context(MissingParentDirSnafu {})?;
    config.resolve_paths(root);
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn validate_rules(rules: &Option<RulesConfig>) -> SessionResult<VoteRules> {
    let rules = match rules {
        Some(r) => r,
        None => return Ok(VoteRules::DEFAULT_RULES),
    };
    let mut res = match rules.preset.as_deref() {
        None | Some("default") => VoteRules::DEFAULT_RULES,
        Some("legacy") => VoteRules::LEGACY_RULES,
        Some(x) => whatever!("Unknown rules preset {:?}", x),
    };
    if let Some(p) = rules.top_tier_percent {
        res.quota.top_tier_percent = p;
    }
    if let Some(p) = rules.mid_tier_percent {
        res.quota.mid_tier_percent = p;
    }
    res.quota.rounding = match rules.quota_rounding.as_deref() {
        None => res.quota.rounding,
        Some("floor") => QuotaRounding::Floor,
        Some("ceiling") => QuotaRounding::Ceiling,
        Some(x) => whatever!("Unknown quota rounding {:?}: expected floor or ceiling", x),
    };
    res.quota.validate().context(VotingSnafu {})?;
    Ok(res)
}

pub fn read_summary(path: &str) -> SessionResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
