use crate::config::{EngineConfig, GenerationConfig, RuleSet};
use crate::fingerprint;
use crate::model::{PhotoContext, PromptContext, RenderJob, Selections};
use crate::policy::resolve_policy_key;
use crate::remap::{apply_remaps, resolve_flooring};
use crate::scope::{apply_safeguards, Scope};
use crate::visibility::{SurfaceVisibility, VisibilityIndex};
use serde::Serialize;

/// One render request as seen by the core: the raw selection map plus the
/// per-photo scoping and scene signals delivered by collaborators.
#[derive(Clone, Copy)]
pub struct PlanRequest<'a> {
    pub selections: &'a Selections,
    pub photo: &'a PhotoContext,
    /// Subcategory ids declared relevant to this photo.
    pub explicit_scope: &'a [String],
    /// Fallback ids from the enclosing step, used when the explicit list is
    /// empty.
    pub fallback_scope: &'a [String],
    pub visibility: Option<&'a SurfaceVisibility>,
    pub prompt: Option<&'a PromptContext>,
    /// Content hash of a buyer-supplied source photo; switches the key to
    /// the short photo-anchored variant.
    pub photo_hash: Option<&'a str>,
}

/// Outcome of planning. `NothingToRender` is a distinct non-error variant:
/// after scoping and visibility filtering no selection distinguishes this
/// render, so no cache lookup or generation may occur.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "plan")]
pub enum RenderPlan {
    NothingToRender { suppressed: Vec<String> },
    Render(RenderJob),
}

/// Derives cache keys from selections. The check path and the generate path
/// must both go through [`Planner::plan`]; keeping a single derivation site
/// is what makes a later lookup compute the key a stored render was written
/// under.
#[derive(Debug, Clone)]
pub struct Planner {
    generation: GenerationConfig,
    rules: RuleSet,
    visibility: VisibilityIndex,
}

impl Planner {
    pub fn new(config: EngineConfig) -> Self {
        let visibility = VisibilityIndex::new(&config.rules.surfaces);
        Self {
            generation: config.generation,
            rules: config.rules,
            visibility,
        }
    }

    pub fn builtin() -> Self {
        Self::new(EngineConfig::builtin())
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn visibility_index(&self) -> &VisibilityIndex {
        &self.visibility
    }

    pub fn plan(&self, req: PlanRequest<'_>) -> RenderPlan {
        // Scope first: drop selections that do not influence this photo,
        // after repairing known-incomplete scopes.
        let scope = Scope::resolve(req.explicit_scope, req.fallback_scope);
        let scope = apply_safeguards(scope, req.photo, &self.rules.scope_safeguards);
        let scoped = scope.apply(req.selections);

        // Context rewrites are part of scoping: they reinterpret what a
        // selection means for this particular photo.
        let mut resolved = apply_remaps(&scoped, req.photo, &self.rules.remaps);
        if let Some(flooring) = &self.rules.flooring {
            let mut context_text = req.photo.context_text();
            if let Some(scene) = req.prompt.and_then(|p| p.scene_description.as_deref()) {
                context_text.push(' ');
                context_text.push_str(&scene.to_lowercase());
            }
            resolved = resolve_flooring(&resolved, &context_text, flooring);
        }

        let effective = self.visibility.filter(&resolved, req.visibility);

        if effective.is_empty() {
            let suppressed = req
                .visibility
                .map(|v| self.visibility.hidden_subcategories(v))
                .unwrap_or_default();
            return RenderPlan::NothingToRender { suppressed };
        }

        // Policy resolution sees only the effective set: an option on an
        // invisible surface must not be able to flip a policy match and
        // fragment the cache.
        let policy_key = resolve_policy_key(req.photo, &effective, &self.rules.policies);
        let prompt_signature = req
            .prompt
            .filter(|p| !p.is_empty())
            .map(|p| p.signature(&effective));

        let fp = fingerprint::compute(fingerprint::Context {
            selections: &effective,
            model: &self.generation.model,
            cache_version: &self.generation.cache_version,
            photo_id: (!req.photo.photo_id.is_empty()).then_some(req.photo.photo_id.as_str()),
            policy_key: Some(&policy_key),
            prompt_signature: prompt_signature.as_deref(),
        });

        let cache_key = match req.photo_hash {
            Some(photo_hash) => fingerprint::anchored_key(photo_hash, &fp.hex),
            None => fp.hex.clone(),
        };

        RenderPlan::Render(RenderJob {
            cache_key,
            fingerprint: fp,
            effective_selections: effective,
            model: self.generation.model.clone(),
            cache_version: self.generation.cache_version.clone(),
            policy_key,
            photo: req.photo.clone(),
            prompt: req.prompt.cloned(),
        })
    }
}
