use crate::policy::PolicyRule;
use crate::remap::{ContextMatcher, FlooringRule, RemapRule};
use crate::scope::ScopeSafeguard;
use crate::visibility::SurfaceBinding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Generation parameters that participate in every cache key. Passed into
/// the fingerprint builder explicitly, never read from ambient state, so a
/// model or prompt-semantics change is a config change and historical keys
/// stay reproducible under the version they were computed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    /// Bump when prompt semantics materially change so old cached renders
    /// are not reused.
    pub cache_version: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-image-1.5".to_string(),
            cache_version: "v15".to_string(),
        }
    }
}

/// The per-tenant rule tables: surface bindings, scope safeguards, context
/// remaps, the flooring conflict rule, and generation-policy matchers. All
/// data, no branching code; a new tenant or surface extends these tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub surfaces: Vec<SurfaceBinding>,
    #[serde(default)]
    pub scope_safeguards: Vec<ScopeSafeguard>,
    #[serde(default)]
    pub remaps: Vec<RemapRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flooring: Option<FlooringRule>,
    #[serde(default)]
    pub policies: Vec<PolicyRule>,
}

impl RuleSet {
    /// The rules shipped for the stock tenant layouts.
    pub fn builtin() -> Self {
        Self {
            surfaces: Vec::new(),
            scope_safeguards: vec![ScopeSafeguard {
                image_substrings: vec![
                    "greatroom-wide.webp".to_string(),
                    "kitchen-greatroom.webp".to_string(),
                ],
                step_slugs: vec!["set-your-style".to_string()],
                trigger: "kitchen-faucet".to_string(),
                companions: vec![
                    "cabinet-style-whole-house".to_string(),
                    "kitchen-cabinet-color".to_string(),
                    "kitchen-island-cabinet-color".to_string(),
                    "kitchen-cabinet-hardware".to_string(),
                ],
            }],
            remaps: vec![RemapRule {
                context: ContextMatcher {
                    image_substrings: vec![
                        "kitchen-close.webp".to_string(),
                        "kitchen-greatroom.webp".to_string(),
                    ],
                    step_slugs: vec!["design-your-kitchen".to_string()],
                },
                from_subcategory: "accent-color".to_string(),
                to_subcategory: "common-wall-paint".to_string(),
                option_prefix_from: "accent-".to_string(),
                option_prefix_to: "wall-".to_string(),
            }],
            flooring: Some(FlooringRule {
                carpet_subcategory: "carpet-color".to_string(),
                flooring_type_subcategory: "main-area-flooring-type".to_string(),
                flooring_color_subcategory: "main-area-flooring-color".to_string(),
                bedroom_keywords: vec!["bedroom".to_string()],
                no_carpet_markers: vec!["carpet-none".to_string()],
                hard_surface_markers: vec!["primary".to_string(), "whole".to_string()],
            }),
            policies: vec![
                PolicyRule {
                    key: "stonemartin:kinkade:kitchen-close:v1".to_string(),
                    org_slugs: vec!["stonemartin".to_string()],
                    floorplan_slugs: vec!["kinkade".to_string()],
                    step_slugs: vec!["design-your-kitchen".to_string()],
                    image_suffixes: vec!["kitchen-close.webp".to_string()],
                    when_selected: None,
                },
                PolicyRule {
                    key: "stonemartin:kinkade:greatroom-wide:v1".to_string(),
                    org_slugs: vec!["stonemartin".to_string()],
                    floorplan_slugs: vec!["kinkade".to_string()],
                    step_slugs: vec!["set-your-style".to_string()],
                    image_suffixes: vec!["greatroom-wide.webp".to_string()],
                    when_selected: None,
                },
            ],
        }
    }
}

/// Top-level engine configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub rules: RuleSet,
}

impl EngineConfig {
    pub fn builtin() -> Self {
        Self {
            generation: GenerationConfig::default(),
            rules: RuleSet::builtin(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let de = serde_yaml::Deserializer::from_str(&raw);
        let mut ignored = Vec::new();
        let config: EngineConfig =
            serde_ignored::deserialize(de, |ignored_path| ignored.push(ignored_path.to_string()))
                .with_context(|| format!("failed to parse config YAML: {}", path.display()))?;

        for key in &ignored {
            tracing::warn!(key = %key, config = %path.display(), "ignoring unknown config key");
        }

        Ok(config)
    }
}
