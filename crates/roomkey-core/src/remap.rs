use crate::model::{PhotoContext, Selections};
use serde::{Deserialize, Serialize};

/// Room-context predicate: a photo matches on any configured identifier
/// substring or an exact step tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextMatcher {
    #[serde(default)]
    pub image_substrings: Vec<String>,
    #[serde(default)]
    pub step_slugs: Vec<String>,
}

impl ContextMatcher {
    pub fn matches(&self, photo: &PhotoContext) -> bool {
        let image_path = photo.image_path.to_lowercase();
        if self
            .image_substrings
            .iter()
            .any(|s| image_path.contains(&s.to_lowercase()))
        {
            return true;
        }
        match &photo.step_slug {
            Some(step) => self.step_slugs.iter().any(|s| s == step),
            None => false,
        }
    }
}

/// Reinterprets an accent-zone selection as its whole-surface counterpart in
/// room contexts that have no accent-designated zone. The option id keeps its
/// suffix and swaps prefix ("accent-red" -> "wall-red").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemapRule {
    pub context: ContextMatcher,
    pub from_subcategory: String,
    pub to_subcategory: String,
    pub option_prefix_from: String,
    pub option_prefix_to: String,
}

impl RemapRule {
    fn derive_option(&self, option_id: &str) -> String {
        let suffix = option_id
            .strip_prefix(self.option_prefix_from.as_str())
            .unwrap_or(option_id);
        format!("{}{}", self.option_prefix_to, suffix)
    }
}

/// Applies every matching remap rule; outside a rule's context the map passes
/// through unchanged. An explicit selection for the target subcategory wins
/// over the derived one, but the accent entry is still removed.
pub fn apply_remaps(
    selections: &Selections,
    photo: &PhotoContext,
    rules: &[RemapRule],
) -> Selections {
    let mut resolved = selections.clone();

    for rule in rules {
        if !rule.context.matches(photo) {
            continue;
        }
        let Some(option_id) = resolved.remove(&rule.from_subcategory) else {
            continue;
        };
        if !resolved.contains_key(&rule.to_subcategory) {
            resolved.insert(rule.to_subcategory.clone(), rule.derive_option(&option_id));
        }
    }

    resolved
}

/// Bedroom flooring conflict: a bedroom-context photo must receive exactly
/// one floor-material instruction, so either the carpet color or the
/// main-area flooring color is dropped depending on whether the selected
/// flooring type extends hard surface into bedrooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlooringRule {
    pub carpet_subcategory: String,
    pub flooring_type_subcategory: String,
    pub flooring_color_subcategory: String,
    #[serde(default)]
    pub bedroom_keywords: Vec<String>,
    #[serde(default)]
    pub no_carpet_markers: Vec<String>,
    #[serde(default)]
    pub hard_surface_markers: Vec<String>,
}

impl FlooringRule {
    fn is_bedroom_context(&self, context_text: &str) -> bool {
        self.bedroom_keywords
            .iter()
            .any(|k| context_text.contains(&k.to_lowercase()))
    }

    fn bedroom_uses_hard_surface(
        &self,
        flooring_type_option: Option<&str>,
        carpet_option: &str,
    ) -> bool {
        if self.no_carpet_markers.iter().any(|m| carpet_option.contains(m.as_str())) {
            return true;
        }
        let Some(flooring_type) = flooring_type_option else {
            return false;
        };
        self.hard_surface_markers
            .iter()
            .any(|m| flooring_type.contains(m.as_str()))
    }
}

pub fn resolve_flooring(
    selections: &Selections,
    context_text: &str,
    rule: &FlooringRule,
) -> Selections {
    let mut resolved = selections.clone();
    if !rule.is_bedroom_context(context_text) {
        return resolved;
    }

    let Some(carpet_option) = resolved.get(&rule.carpet_subcategory).cloned() else {
        return resolved;
    };
    if !resolved.contains_key(&rule.flooring_color_subcategory) {
        return resolved;
    }

    let flooring_type = resolved.get(&rule.flooring_type_subcategory).cloned();
    if rule.bedroom_uses_hard_surface(flooring_type.as_deref(), &carpet_option) {
        resolved.remove(&rule.carpet_subcategory);
    } else {
        resolved.remove(&rule.flooring_color_subcategory);
    }

    resolved
}
