// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// Stable identifier of an item. It must be unique across the whole run.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct ItemId(pub u32);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An idea being voted on.
///
/// The title and the description are carried along for reporting and are never
/// interpreted by the scoring algorithm.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: String,
}

impl Item {
    pub fn new(id: u32, title: &str, description: &str) -> Item {
        Item {
            id: ItemId(id),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// One of the three score values a voter can give to an item.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Tier {
    Zero,
    One,
    Two,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Zero, Tier::One, Tier::Two];

    pub fn points(self) -> u32 {
        match self {
            Tier::Zero => 0,
            Tier::One => 1,
            Tier::Two => 2,
        }
    }

    pub fn from_points(points: u32) -> Result<Tier, VotingErrors> {
        match points {
            0 => Ok(Tier::Zero),
            1 => Ok(Tier::One),
            2 => Ok(Tier::Two),
            x => Err(VotingErrors::InvalidScore(x)),
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.points())
    }
}

/// The three voting rounds of a run.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Round {
    First,
    Second,
    Third,
}

impl Round {
    pub const ALL: [Round; 3] = [Round::First, Round::Second, Round::Third];

    pub fn number(self) -> u32 {
        match self {
            Round::First => 1,
            Round::Second => 2,
            Round::Third => 3,
        }
    }

    pub(crate) fn index(self) -> usize {
        (self.number() - 1) as usize
    }
}

impl Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round {}", self.number())
    }
}

/// Where a run currently stands.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RunPhase {
    /// Voting on the group at index `group` of `round`.
    Active { round: Round, group: usize },
    /// Terminal: the final ranking is available.
    Complete,
}

/// The value a group was split on.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum GroupKey {
    /// The single opening group holding every item.
    Initial,
    /// Round 2: the round-1 score. Round 3: the cumulative score.
    Score(u32),
}

/// A single voter request, used when replaying a recorded session.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Action {
    Assign { item: ItemId, tier: Tier },
    Advance,
    ResetGroup,
}

// ******** Output data structures *********

/// The effect of a successful assignment on the active group.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ScoreChange {
    pub item: ItemId,
    pub previous: Option<Tier>,
    /// None when the assignment toggled the previous score off.
    pub current: Option<Tier>,
}

/// What `advance` did.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Transition {
    /// Moved on to the next group of the same round.
    NextGroup { round: Round, group: usize },
    /// Opened a new round with the given number of groups.
    NextRound { round: Round, groups: usize },
    Complete,
}

/// The finalized scores of one group.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupStats {
    pub round: Round,
    /// Position of the group within its round.
    pub group: usize,
    pub key: GroupKey,
    pub has_quota: bool,
    pub scores: Vec<(ItemId, Tier)>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScoredItem {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub round1_score: u32,
    pub round2_score: u32,
    pub round3_score: u32,
    pub final_score: u32,
    /// Number of rounds the item took part in.
    pub rounds_played: u32,
    /// Competition rank: tied items share the rank of the first of them.
    pub rank: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingResult {
    /// Every original item, best first.
    pub ranking: Vec<ScoredItem>,
    pub group_stats: Vec<GroupStats>,
}

/// Reasons for refusing a transition. The run is left unchanged.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InvalidTransition {
    RunComplete,
    NotInActiveGroup(ItemId),
}

/// Errors returned by the scoring engine.
///
/// None of them is fatal: the state that produced the error is left as it was.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    EmptyRun,
    DuplicateItem(ItemId),
    /// No id is left above the largest one in use.
    IdSpaceExhausted,
    InvalidRules(String),
    InvalidScore(u32),
    QuotaExceeded { tier: Tier, max_allowed: usize },
    IncompleteGroup { scored: usize, total: usize },
    InvalidTransition(InvalidTransition),
    EmptyTally,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyRun => write!(f, "a run needs at least one item"),
            VotingErrors::DuplicateItem(id) => write!(f, "item id {} appears more than once", id),
            VotingErrors::IdSpaceExhausted => {
                write!(f, "no item id is left after {}", u32::MAX)
            }
            VotingErrors::InvalidRules(msg) => write!(f, "invalid rules: {}", msg),
            VotingErrors::InvalidScore(x) => write!(f, "{} is not a valid score (0, 1 or 2)", x),
            VotingErrors::QuotaExceeded { tier, max_allowed } => write!(
                f,
                "score {} can only be given to {} items in this group",
                tier, max_allowed
            ),
            VotingErrors::IncompleteGroup { scored, total } => write!(
                f,
                "every item must be scored before moving on (scored: {}/{})",
                scored, total
            ),
            VotingErrors::InvalidTransition(InvalidTransition::RunComplete) => {
                write!(f, "the run is already complete")
            }
            VotingErrors::InvalidTransition(InvalidTransition::NotInActiveGroup(id)) => {
                write!(f, "item {} is not part of the active group", id)
            }
            VotingErrors::EmptyTally => write!(f, "no results to tally"),
        }
    }
}

// ********* Configuration **********

/// How a quota fraction is turned into a whole number of items.
///
/// Both positive tiers always use the same mode.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum QuotaRounding {
    Floor,
    Ceiling,
}

/// Upper bounds on how many items of a quota group may receive a positive score.
///
/// Fractions are integer percentages of the group size.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct QuotaPolicy {
    /// Share of the group that may receive a 2.
    pub top_tier_percent: u32,
    /// Share of the group that may receive a 1.
    pub mid_tier_percent: u32,
    pub rounding: QuotaRounding,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct VoteRules {
    /// Applied to groups flagged with a quota (the opening group).
    pub quota: QuotaPolicy,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        quota: QuotaPolicy {
            top_tier_percent: 20,
            mid_tier_percent: 40,
            rounding: QuotaRounding::Ceiling,
        },
    };

    /// The limits of the first deployment: 40% of the group may get a 2,
    /// 30% may get a 1, rounded down.
    pub const LEGACY_RULES: VoteRules = VoteRules {
        quota: QuotaPolicy {
            top_tier_percent: 40,
            mid_tier_percent: 30,
            rounding: QuotaRounding::Floor,
        },
    };
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}
