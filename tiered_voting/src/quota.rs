use crate::config::*;

impl QuotaPolicy {
    /// The configured percentage for a tier. Tier 0 has no limit.
    pub fn percent(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::Zero => None,
            Tier::One => Some(self.mid_tier_percent),
            Tier::Two => Some(self.top_tier_percent),
        }
    }

    /// The maximum number of items of a group of `total_count` items that may hold `tier`.
    ///
    /// Integer arithmetic only, so the result always lies in `0..=total_count` and
    /// never decreases when the group grows.
    pub fn max_allowed(&self, tier: Tier, total_count: usize) -> usize {
        let percent = match self.percent(tier) {
            Some(p) => p.min(100) as usize,
            None => return total_count,
        };
        let scaled = total_count * percent;
        match self.rounding {
            QuotaRounding::Floor => scaled / 100,
            QuotaRounding::Ceiling => (scaled + 99) / 100,
        }
    }

    pub fn validate(&self) -> Result<(), VotingErrors> {
        for tier in [Tier::One, Tier::Two] {
            if let Some(p) = self.percent(tier) {
                if p > 100 {
                    return Err(VotingErrors::InvalidRules(format!(
                        "the share for score {} is {}%, it cannot exceed 100%",
                        tier, p
                    )));
                }
            }
        }
        Ok(())
    }
}
