use crate::model::Selections;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Display length of the photo-anchored cache key. Stock-photo keys use the
/// full digest.
pub const ANCHORED_KEY_LEN: usize = 16;

#[derive(Debug, Clone, Serialize)]
pub struct Fingerprint {
    pub hex: String,
    /// Ordered hash-input parts, kept for audit/reproducibility.
    pub components: Vec<String>,
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Canonical hash of a bare selection map: key-sorted `k:v` entries joined
/// with `|`. An empty map is valid and hashes to a fixed value.
pub fn hash_selections(selections: &Selections) -> String {
    let joined = selections
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("|");
    sha256_hex(&joined)
}

/// Inputs for one cache-key computation. The selections are expected to be
/// already scoped and visibility-filtered; the builder only canonicalizes
/// and layers in the generation parameters.
pub struct Context<'a> {
    pub selections: &'a Selections,
    pub model: &'a str,
    pub cache_version: &'a str,
    pub photo_id: Option<&'a str>,
    pub policy_key: Option<&'a str>,
    pub prompt_signature: Option<&'a str>,
}

/// Computes the deterministic fingerprint for one render context.
///
/// Selection entries are namespaced (`sel=`) so a subcategory can never
/// collide with a generation parameter. No time, randomness, or ambient
/// state participates; equal inputs hash equally across process restarts.
pub fn compute(ctx: Context<'_>) -> Fingerprint {
    let mut parts = Vec::new();

    for (sub_id, opt_id) in ctx.selections {
        parts.push(format!("sel={sub_id}:{opt_id}"));
    }

    parts.push(format!("model={}", ctx.model));
    parts.push(format!("cache_version={}", ctx.cache_version));

    if let Some(photo_id) = ctx.photo_id {
        parts.push(format!("photo={photo_id}"));
    }
    if let Some(policy_key) = ctx.policy_key {
        parts.push(format!("policy={policy_key}"));
    }
    if let Some(sig) = ctx.prompt_signature {
        parts.push(format!("prompt_context={sig}"));
    }

    let raw = parts.join("\n");
    let hex = sha256_hex(&raw);

    Fingerprint {
        hex,
        components: parts,
    }
}

/// Combined key for buyer-supplied source photos: the photo's own content
/// hash and the selections fingerprint are concatenated and re-hashed so the
/// same selections against two different photos never collide.
pub fn anchored_key(photo_hash: &str, selections_hex: &str) -> String {
    let mut combined = sha256_hex(&format!("{photo_hash}|{selections_hex}"));
    combined.truncate(ANCHORED_KEY_LEN);
    combined
}
