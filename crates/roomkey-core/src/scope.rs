use crate::model::{PhotoContext, Selections};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which subcategories influence one photo.
///
/// `All` (no per-photo scoping declared) and `Only` of an empty set are
/// distinct values: the former filters nothing, the latter would exclude
/// everything. Conflating them would make a photo with a truly empty
/// explicit scope render every selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Only(BTreeSet<String>),
}

impl Scope {
    /// Precedence: explicit ids if any, else the enclosing step's fallback
    /// ids if any, else unscoped.
    pub fn resolve(explicit: &[String], fallback: &[String]) -> Scope {
        if !explicit.is_empty() {
            Scope::Only(explicit.iter().cloned().collect())
        } else if !fallback.is_empty() {
            Scope::Only(fallback.iter().cloned().collect())
        } else {
            Scope::All
        }
    }

    pub fn contains(&self, subcategory: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(ids) => ids.contains(subcategory),
        }
    }

    pub fn apply(&self, selections: &Selections) -> Selections {
        match self {
            Scope::All => selections.clone(),
            Scope::Only(ids) => selections
                .iter()
                .filter(|(sub_id, _)| ids.contains(sub_id.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Declarative scope repair for known layouts where an incomplete per-photo
/// scope would keep a dependent edit while excluding the surfaces it sits on
/// (a great-room view keeping faucet edits but dropping cabinet edits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeSafeguard {
    #[serde(default)]
    pub image_substrings: Vec<String>,
    #[serde(default)]
    pub step_slugs: Vec<String>,
    /// Subcategory whose presence in scope triggers the repair.
    pub trigger: String,
    /// Subcategories pulled into scope alongside the trigger.
    pub companions: Vec<String>,
}

impl ScopeSafeguard {
    fn matches(&self, photo: &PhotoContext) -> bool {
        let image_path = photo.image_path.to_lowercase();
        if self.image_substrings.iter().any(|s| image_path.contains(&s.to_lowercase())) {
            return true;
        }
        match &photo.step_slug {
            Some(step) => self.step_slugs.iter().any(|s| s == step),
            None => false,
        }
    }
}

/// Expands an explicit scope per the safeguard table. Unscoped photos are
/// left alone; there is nothing to repair when everything already applies.
pub fn apply_safeguards(
    scope: Scope,
    photo: &PhotoContext,
    safeguards: &[ScopeSafeguard],
) -> Scope {
    let mut ids = match scope {
        Scope::All => return Scope::All,
        Scope::Only(ids) => ids,
    };

    for safeguard in safeguards {
        if ids.contains(&safeguard.trigger) && safeguard.matches(photo) {
            for companion in &safeguard.companions {
                ids.insert(companion.clone());
            }
        }
    }

    Scope::Only(ids)
}
