use crate::engine::planner::{PlanRequest, Planner, RenderPlan};
use crate::model::CachedRender;
use crate::providers::render::RenderBackend;
use crate::storage::{ClaimOutcome, Store};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

/// Claims older than this are treated as crashed generators and purged
/// before claiming. Comfortably above any single generation's latency.
pub const DEFAULT_STALE_CLAIM_SECS: i64 = 300;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CheckOutcome {
    NothingToRender { suppressed: Vec<String> },
    Hit(CachedRender),
    Miss { cache_key: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RenderOutcome {
    NothingToRender { suppressed: Vec<String> },
    /// Found in the cache; no generation occurred.
    Hit { cache_key: String, asset_path: String },
    /// Generated now and recorded under the same key a later check computes.
    Rendered { cache_key: String, asset_path: String },
    /// Another request holds the claim for this key; poll the cache later.
    InProgress { cache_key: String },
}

/// Cache-or-generate orchestration. Both entry points derive their key from
/// the same [`Planner::plan`] call, so the lookup key and the storage key can
/// never diverge.
pub struct Runner {
    pub store: Store,
    pub backend: Arc<dyn RenderBackend>,
    pub stale_claim_secs: i64,
}

impl Runner {
    pub fn new(store: Store, backend: Arc<dyn RenderBackend>) -> Self {
        Self {
            store,
            backend,
            stale_claim_secs: DEFAULT_STALE_CLAIM_SECS,
        }
    }

    /// Cache probe only; never claims, never generates.
    pub fn check(&self, planner: &Planner, req: PlanRequest<'_>) -> anyhow::Result<CheckOutcome> {
        match planner.plan(req) {
            RenderPlan::NothingToRender { suppressed } => {
                Ok(CheckOutcome::NothingToRender { suppressed })
            }
            RenderPlan::Render(job) => match self.store.get_render(&job.cache_key)? {
                Some(cached) => {
                    tracing::debug!(cache_key = %job.cache_key, "render cache hit");
                    Ok(CheckOutcome::Hit(cached))
                }
                None => Ok(CheckOutcome::Miss {
                    cache_key: job.cache_key,
                }),
            },
        }
    }

    /// Returns the cached render or generates one, converging concurrent
    /// misses for the same key on a single generation via the claim row.
    pub async fn render(
        &self,
        planner: &Planner,
        req: PlanRequest<'_>,
    ) -> anyhow::Result<RenderOutcome> {
        let job = match planner.plan(req) {
            RenderPlan::NothingToRender { suppressed } => {
                tracing::debug!(photo = %req.photo.photo_id, "no visible selections; skipping render");
                return Ok(RenderOutcome::NothingToRender { suppressed });
            }
            RenderPlan::Render(job) => job,
        };

        if let Some(cached) = self.store.get_render(&job.cache_key)? {
            tracing::info!(cache_key = %job.cache_key, "render cache hit");
            return Ok(RenderOutcome::Hit {
                cache_key: cached.cache_key,
                asset_path: cached.asset_path,
            });
        }

        match self.store.claim(&job, self.stale_claim_secs)? {
            ClaimOutcome::InProgress => {
                // The conflicting row may be a completed render that landed
                // between the probe and the claim.
                if let Some(cached) = self.store.get_render(&job.cache_key)? {
                    return Ok(RenderOutcome::Hit {
                        cache_key: cached.cache_key,
                        asset_path: cached.asset_path,
                    });
                }
                tracing::info!(cache_key = %job.cache_key, "render already in progress");
                return Ok(RenderOutcome::InProgress {
                    cache_key: job.cache_key,
                });
            }
            ClaimOutcome::Claimed => {}
        }

        tracing::info!(
            cache_key = %job.cache_key,
            model = %job.model,
            policy = %job.policy_key,
            selections = job.effective_selections.len(),
            "render cache miss; generating"
        );

        let rendered = match self.backend.render(&job).await {
            Ok(rendered) => rendered,
            Err(e) => {
                // Release so retries are not blocked until the stale purge.
                self.store.release(&job.cache_key)?;
                return Err(e).context("render backend failed");
            }
        };

        self.store
            .complete(&job, &rendered.asset_path)
            .context("failed to record completed render")?;

        Ok(RenderOutcome::Rendered {
            cache_key: job.cache_key,
            asset_path: rendered.asset_path,
        })
    }
}
