use crate::model::RenderJob;
use async_trait::async_trait;

/// Reference to a stored image asset, as returned by the generation
/// collaborator after it has persisted the binary.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub asset_path: String,
}

/// The image-generation collaborator. Implementations call the remote vision
/// model with the job's effective selections and prompt context; this crate
/// only guarantees that the job carries the exact key the result must be
/// stored under.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render(&self, job: &RenderJob) -> anyhow::Result<RenderedImage>;
}
