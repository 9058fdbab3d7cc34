use clap::Parser;

/// This program replays idea elimination sessions and reports the final ranking.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the session: items, rules, recorded actions.
    /// Paths inside the file are relative to the file itself. See the manual for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, tvote will check that the
    /// computed summary matches it and print the differences otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the
    /// given location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The items to vote on. Setting this option overrides the item sources of
    /// the --config option.
    #[clap(short, long, value_parser)]
    pub items: Option<String>,

    /// (csv or json) The type of the --items file. Guessed from the file extension when missing.
    #[clap(long, value_parser)]
    pub items_type: Option<String>,

    /// If passed as an argument, the twenty built-in example ideas are used when no item source is given.
    #[clap(long, takes_value = false)]
    pub sample: bool,

    /// (file path or empty) The recorded actions of the voter, as a JSON list. Overrides the actionsPath
    /// of the --config option.
    #[clap(short, long, value_parser)]
    pub actions: Option<String>,

    /// (file path or empty) If specified, every finalized group is written to this file, one JSON
    /// object per line.
    #[clap(long, value_parser)]
    pub scores_log: Option<String>,

    /// (file paths) Summaries of completed sessions to combine into averages. When given, no session
    /// is replayed. Can be repeated.
    #[clap(long, value_parser)]
    pub tally: Vec<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
