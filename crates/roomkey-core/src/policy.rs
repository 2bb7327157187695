use crate::model::{PhotoContext, Selections};
use serde::{Deserialize, Serialize};

pub const NO_POLICY_KEY: &str = "none";

/// Extra predicate over the current selections: the subcategory must be
/// selected, and when `option_ids` is non-empty the chosen option must be
/// one of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionMatcher {
    pub subcategory: String,
    #[serde(default)]
    pub option_ids: Vec<String>,
}

impl SelectionMatcher {
    fn matches(&self, selections: &Selections) -> bool {
        let Some(option_id) = selections.get(&self.subcategory) else {
            return false;
        };
        self.option_ids.is_empty() || self.option_ids.iter().any(|id| id == option_id)
    }
}

/// One per-photo generation-policy rule. Empty matcher lists are wildcards;
/// non-empty lists must all match. The resolved `key` is folded into the
/// cache key so a policy change regenerates affected photos only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub key: String,
    #[serde(default)]
    pub org_slugs: Vec<String>,
    #[serde(default)]
    pub floorplan_slugs: Vec<String>,
    #[serde(default)]
    pub step_slugs: Vec<String>,
    #[serde(default)]
    pub image_suffixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_selected: Option<SelectionMatcher>,
}

impl PolicyRule {
    fn matches(&self, photo: &PhotoContext, selections: &Selections) -> bool {
        if !matches_list(&self.org_slugs, photo.org_slug.as_deref()) {
            return false;
        }
        if !matches_list(&self.floorplan_slugs, photo.floorplan_slug.as_deref()) {
            return false;
        }
        if !matches_list(&self.step_slugs, photo.step_slug.as_deref()) {
            return false;
        }
        if !self.image_suffixes.is_empty()
            && !self
                .image_suffixes
                .iter()
                .any(|suffix| photo.image_path.ends_with(suffix.as_str()))
        {
            return false;
        }
        match &self.when_selected {
            Some(matcher) => matcher.matches(selections),
            None => true,
        }
    }
}

fn matches_list(expected: &[String], actual: Option<&str>) -> bool {
    if expected.is_empty() {
        return true;
    }
    match actual {
        Some(value) => expected.iter().any(|e| e == value),
        None => false,
    }
}

/// First matching rule wins; photos outside every rule resolve to the fixed
/// no-policy key so their fingerprints stay stable when rules are added for
/// other photos.
pub fn resolve_policy_key(
    photo: &PhotoContext,
    selections: &Selections,
    rules: &[PolicyRule],
) -> String {
    rules
        .iter()
        .find(|rule| rule.matches(photo, selections))
        .map(|rule| rule.key.clone())
        .unwrap_or_else(|| NO_POLICY_KEY.to_string())
}
