pub use crate::config::*;
use crate::run::RunState;

use std::collections::HashSet;

const SAMPLE_TITLES: [&str; 20] = [
    "Implement AI-powered customer support",
    "Create mobile app for inventory management",
    "Develop blockchain-based voting system",
    "Build automated testing framework",
    "Design new user onboarding flow",
    "Create data analytics dashboard",
    "Implement real-time collaboration tools",
    "Build API gateway for microservices",
    "Develop machine learning recommendation engine",
    "Create cross-platform desktop application",
    "Implement advanced security protocols",
    "Build scalable cloud infrastructure",
    "Develop IoT device management system",
    "Create interactive learning platform",
    "Build automated deployment pipeline",
    "Implement voice recognition features",
    "Develop virtual reality training module",
    "Create social media analytics tool",
    "Build predictive maintenance system",
    "Implement multi-language support",
];

/// The default description for an item that only has a title.
pub fn describe(title: &str) -> String {
    format!("A comprehensive solution for {}.", title.to_lowercase())
}

/// Twenty example ideas with ids 1 to 20.
pub fn sample_items() -> Vec<Item> {
    SAMPLE_TITLES
        .iter()
        .enumerate()
        .map(|(idx, title)| Item::new((idx + 1) as u32, title, &describe(title)))
        .collect()
}

/// A builder for the list of items of a run.
///
/// ```
/// use tiered_voting::builder::ItemsBuilder;
/// use tiered_voting::VoteRules;
/// # use tiered_voting::VotingErrors;
///
/// let mut builder = ItemsBuilder::new();
/// builder.add_item(10, "Dark mode", "Let users switch themes")?;
/// builder.add_titled("Offline support")?;
/// let run = builder.start(&VoteRules::DEFAULT_RULES)?;
/// assert_eq!(run.items().len(), 2);
///
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct ItemsBuilder {
    pub(crate) _items: Vec<Item>,
    pub(crate) _ids: HashSet<ItemId>,
}

impl ItemsBuilder {
    pub fn new() -> ItemsBuilder {
        ItemsBuilder::default()
    }

    /// Adds an item with an explicit id. Ids must be unique.
    pub fn add_item(
        &mut self,
        id: u32,
        title: &str,
        description: &str,
    ) -> Result<ItemId, VotingErrors> {
        let item = Item::new(id, title, description);
        if !self._ids.insert(item.id) {
            return Err(VotingErrors::DuplicateItem(item.id));
        }
        self._items.push(item);
        Ok(ItemId(id))
    }

    /// Adds an item with the next free id and the default description.
    pub fn add_titled(&mut self, title: &str) -> Result<ItemId, VotingErrors> {
        let description = describe(title);
        self.add_next(title, &description)
    }

    /// Adds an item with the next free id (one more than the largest id so far).
    pub fn add_next(&mut self, title: &str, description: &str) -> Result<ItemId, VotingErrors> {
        let next = match self._ids.iter().map(|id| id.0).max() {
            None => 1,
            Some(m) => m.checked_add(1).ok_or(VotingErrors::IdSpaceExhausted)?,
        };
        self.add_item(next, title, description)
    }

    pub fn len(&self) -> usize {
        self._items.len()
    }

    pub fn is_empty(&self) -> bool {
        self._items.is_empty()
    }

    pub fn build(self) -> Result<Vec<Item>, VotingErrors> {
        if self._items.is_empty() {
            return Err(VotingErrors::EmptyRun);
        }
        Ok(self._items)
    }

    pub fn start(self, rules: &VoteRules) -> Result<RunState, VotingErrors> {
        let items = self.build()?;
        RunState::new(&items, rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_items_have_descriptions() {
        let items = sample_items();
        assert_eq!(items.len(), 20);
        assert_eq!(items[0].id, ItemId(1));
        assert_eq!(
            items[0].description,
            "A comprehensive solution for implement ai-powered customer support."
        );
        assert_eq!(items[19].id, ItemId(20));
    }

    #[test]
    fn builder_assigns_next_ids() {
        let mut b = ItemsBuilder::new();
        assert_eq!(b.add_titled("a"), Ok(ItemId(1)));
        assert_eq!(b.add_item(5, "b", ""), Ok(ItemId(5)));
        assert_eq!(b.add_next("c", "d"), Ok(ItemId(6)));
        assert_eq!(
            b.add_item(5, "e", ""),
            Err(VotingErrors::DuplicateItem(ItemId(5)))
        );
        let items = b.build().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2].description, "d");
    }

    #[test]
    fn next_id_after_the_largest_id_is_refused() {
        let mut b = ItemsBuilder::new();
        b.add_item(u32::MAX, "a", "").unwrap();
        assert_eq!(b.add_titled("b"), Err(VotingErrors::IdSpaceExhausted));
        assert_eq!(b.len(), 1);
        assert_eq!(b.add_item(7, "c", ""), Ok(ItemId(7)));
    }

    #[test]
    fn empty_builder_cannot_start() {
        assert_eq!(
            ItemsBuilder::new().start(&VoteRules::DEFAULT_RULES).err(),
            Some(VotingErrors::EmptyRun)
        );
    }
}
