//! Variations and scenario descriptions

use crate::config::DEFAULT_SEPARATOR;
use crate::state::ScenarioState;
use serde::Serialize;
use std::fmt;

/// One discrete choice a step made at its position in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScenarioVariation {
    step_name: String,
    display: bool,
}

impl ScenarioVariation {
    /// Variation whose label appears in the sub-test name
    #[inline]
    pub fn new(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            display: true,
        }
    }

    /// Variation kept out of the sub-test name
    #[inline]
    pub fn hidden(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            display: false,
        }
    }

    /// Variation label
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.step_name
    }

    /// Whether the label contributes to the sub-test name
    #[inline]
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        self.display
    }
}

/// Ordered variations, one per pipeline step
///
/// The rendered form (displayed labels joined by a separator) names the
/// sub-test, so it must be unique across a pipeline's scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ScenarioDescription {
    variations: Vec<ScenarioVariation>,
}

impl ScenarioDescription {
    /// Empty description
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps covered
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.variations.len()
    }

    /// True if no step is covered yet
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }

    /// Variation chosen for step `index`
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ScenarioVariation> {
        self.variations.get(index)
    }

    /// Variations in step order
    pub fn iter(&self) -> impl Iterator<Item = &ScenarioVariation> {
        self.variations.iter()
    }

    /// Append a variation
    #[inline]
    pub fn push(&mut self, variation: ScenarioVariation) {
        self.variations.push(variation);
    }

    /// Copy of this description extended by one variation
    #[must_use]
    pub fn with(&self, variation: ScenarioVariation) -> Self {
        let mut next = self.clone();
        next.push(variation);
        next
    }

    /// Displayed labels of the first `len` variations joined by `separator`
    #[must_use]
    pub fn render_prefix(&self, len: usize, separator: &str) -> String {
        self.variations
            .iter()
            .take(len)
            .filter(|v| v.display)
            .map(ScenarioVariation::name)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Displayed labels joined by `separator`
    #[inline]
    #[must_use]
    pub fn render(&self, separator: &str) -> String {
        self.render_prefix(self.variations.len(), separator)
    }
}

impl fmt::Display for ScenarioDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_SEPARATOR))
    }
}

impl FromIterator<ScenarioVariation> for ScenarioDescription {
    fn from_iter<I: IntoIterator<Item = ScenarioVariation>>(iter: I) -> Self {
        Self {
            variations: iter.into_iter().collect(),
        }
    }
}

/// A variation paired with the state that taking it would produce
///
/// Only used during discovery.
#[derive(Debug, Clone)]
pub struct MockedVariation {
    /// The choice
    pub variation: ScenarioVariation,
    /// State after the choice
    pub state: ScenarioState,
}

impl MockedVariation {
    /// Pair a variation with its resulting state
    #[inline]
    #[must_use]
    pub fn new(variation: ScenarioVariation, state: ScenarioState) -> Self {
        Self { variation, state }
    }
}

/// What a step reports during discovery
#[derive(Debug, Clone)]
pub enum Discovery {
    /// Variations the step could take from the given state
    ///
    /// An empty list prunes the branch exactly like [`Discovery::Impossible`].
    Variations(Vec<MockedVariation>),

    /// The combination reaching this step cannot work; prune the branch
    Impossible(String),
}

impl Discovery {
    /// Exactly one variation
    #[inline]
    #[must_use]
    pub fn single(variation: ScenarioVariation, state: ScenarioState) -> Self {
        Self::Variations(vec![MockedVariation::new(variation, state)])
    }

    /// Prune the branch with a reason
    #[inline]
    pub fn impossible(reason: impl Into<String>) -> Self {
        Self::Impossible(reason.into())
    }

    /// True if the branch ends here
    #[must_use]
    pub fn is_pruned(&self) -> bool {
        match self {
            Self::Variations(variations) => variations.is_empty(),
            Self::Impossible(_) => true,
        }
    }

    /// Reported variations (empty when impossible)
    #[must_use]
    pub fn into_variations(self) -> Vec<MockedVariation> {
        match self {
            Self::Variations(variations) => variations,
            Self::Impossible(_) => Vec::new(),
        }
    }
}

impl From<Vec<MockedVariation>> for Discovery {
    fn from(variations: Vec<MockedVariation>) -> Self {
        Self::Variations(variations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn description(labels: &[(&str, bool)]) -> ScenarioDescription {
        labels
            .iter()
            .map(|(name, shown)| {
                if *shown {
                    ScenarioVariation::new(*name)
                } else {
                    ScenarioVariation::hidden(*name)
                }
            })
            .collect()
    }

    #[test]
    fn render_skips_hidden_labels() {
        let desc = description(&[("Blob", true), ("setup", false), ("File", true)]);

        assert_eq!(desc.render("-"), "Blob-File");
        assert_eq!(desc.render("->"), "Blob->File");
        assert_eq!(desc.to_string(), "Blob-File");
    }

    #[test]
    fn render_prefix_stops_early() {
        let desc = description(&[("Red", true), ("Small", true)]);
        assert_eq!(desc.render_prefix(1, "-"), "Red");
        assert_eq!(desc.render_prefix(0, "-"), "");
        assert_eq!(desc.render_prefix(10, "-"), "Red-Small");
    }

    #[test]
    fn with_leaves_original_untouched() {
        let base = description(&[("Red", true)]);
        let extended = base.with(ScenarioVariation::new("Small"));

        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.get(1).map(ScenarioVariation::name), Some("Small"));
    }

    #[test]
    fn discovery_pruning() {
        assert!(Discovery::impossible("local to local").is_pruned());
        assert!(Discovery::Variations(Vec::new()).is_pruned());

        let single = Discovery::single(ScenarioVariation::new("x"), ScenarioState::new("root"));
        assert!(!single.is_pruned());
        assert_eq!(single.into_variations().len(), 1);
    }
}
