use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Buyer selections: subcategory id -> chosen option id.
///
/// A `BTreeMap` so iteration is always key-ordered; the hash input never
/// depends on the order entries were inserted by the UI layer.
pub type Selections = BTreeMap<String, String>;

/// Identity of the source photo a render is anchored to, as declared by the
/// catalog collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoContext {
    pub photo_id: String,
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floorplan_slug: Option<String>,
}

impl PhotoContext {
    /// Lowercased free-text haystack for substring predicates (room-context
    /// matching is substring-based, not structured).
    pub fn context_text(&self) -> String {
        let mut text = self.image_path.to_lowercase();
        if let Some(step) = &self.step_slug {
            text.push(' ');
            text.push_str(&step.to_lowercase());
        }
        text
    }
}

/// Prompt-affecting context forwarded from the scene-analysis and catalog
/// collaborators. Passed through to the render backend unmodified; its
/// deterministic signature participates in the cache key so a changed hint
/// or generation rule invalidates stale renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_baseline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_spatial_hint: Option<String>,
    /// Per-subcategory placement hints ("apply to the island front panels").
    #[serde(default)]
    pub spatial_hints: BTreeMap<String, String>,
    /// Fixed-geometry rules attached to a subcategory; only rules for
    /// currently selected subcategories are folded into the signature.
    #[serde(default)]
    pub subcategory_rules: BTreeMap<String, Vec<String>>,
    /// Same, keyed by option id.
    #[serde(default)]
    pub option_rules: BTreeMap<String, Vec<String>>,
}

impl PromptContext {
    /// Deterministic serialization of every prompt-affecting field.
    /// `BTreeMap` iteration keeps hint and rule order stable regardless of
    /// how the collaborator assembled them.
    pub fn signature(&self, selections: &Selections) -> String {
        let hints = self
            .spatial_hints
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join("|");

        let mut rule_parts = Vec::new();
        for (sub_id, opt_id) in selections {
            if let Some(rules) = self.subcategory_rules.get(sub_id) {
                if !rules.is_empty() {
                    rule_parts.push(format!("s:{}:{}", sub_id, rules.join(";")));
                }
            }
            if let Some(rules) = self.option_rules.get(opt_id) {
                if !rules.is_empty() {
                    rule_parts.push(format!("o:{}:{}", opt_id, rules.join(";")));
                }
            }
        }

        [
            format!("scene:{}", self.scene_description.as_deref().unwrap_or("")),
            format!("baseline:{}", self.photo_baseline.as_deref().unwrap_or("")),
            format!("layout:{}", self.photo_spatial_hint.as_deref().unwrap_or("")),
            format!("hints:{hints}"),
            format!("rules:{}", rule_parts.join("|")),
        ]
        .join("||")
    }

    pub fn is_empty(&self) -> bool {
        self.scene_description.is_none()
            && self.photo_baseline.is_none()
            && self.photo_spatial_hint.is_none()
            && self.spatial_hints.is_empty()
            && self.subcategory_rules.is_empty()
            && self.option_rules.is_empty()
    }
}

/// Everything the render backend needs, plus the key the result will be
/// stored under. Built once by the planner and used verbatim by both the
/// cache-check path and the generate path.
#[derive(Debug, Clone, Serialize)]
pub struct RenderJob {
    /// Cache key: full fingerprint hex, or the short photo-anchored key when
    /// the source photo is buyer-supplied.
    pub cache_key: String,
    pub fingerprint: Fingerprint,
    /// Scoped, remapped, visibility-filtered selections.
    pub effective_selections: Selections,
    pub model: String,
    pub cache_version: String,
    pub policy_key: String,
    pub photo: PhotoContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptContext>,
}

/// A completed render as stored by the persistence collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct CachedRender {
    pub cache_key: String,
    pub asset_path: String,
    pub model: String,
    pub cache_version: String,
    pub photo_id: Option<String>,
    pub created_at: String,
}
