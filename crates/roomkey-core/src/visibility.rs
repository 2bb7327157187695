use crate::model::Selections;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Physical surfaces the scene checker reports on. Closed set; subcategories
/// not bound to any surface have no visibility dependency at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Backsplash,
    Countertop,
    Cabinets,
    Island,
}

/// Per-photo scene-analysis verdict. A missing surface key means the checker
/// returned no signal, which is NOT the same as not-visible: only a confirmed
/// absence may suppress a selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceVisibility {
    pub surfaces: BTreeMap<Surface, bool>,
}

impl SurfaceVisibility {
    pub fn is_visible(&self, surface: Surface) -> bool {
        self.surfaces.get(&surface).copied() != Some(false)
    }
}

/// One subcategory -> surface binding. The built-in table covers the stock
/// kitchen surfaces; tenant config can extend it with more bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceBinding {
    pub subcategory: String,
    pub surface: Surface,
}

/// Lookup index over the surface bindings.
#[derive(Debug, Clone)]
pub struct VisibilityIndex {
    by_subcategory: BTreeMap<String, Surface>,
}

impl VisibilityIndex {
    pub fn new(bindings: &[SurfaceBinding]) -> Self {
        let mut by_subcategory = builtin_bindings();
        for b in bindings {
            by_subcategory.insert(b.subcategory.clone(), b.surface);
        }
        Self { by_subcategory }
    }

    pub fn builtin() -> Self {
        Self {
            by_subcategory: builtin_bindings(),
        }
    }

    pub fn surface_for(&self, subcategory: &str) -> Option<Surface> {
        self.by_subcategory.get(subcategory).copied()
    }

    pub fn is_subcategory_visible(
        &self,
        subcategory: &str,
        visibility: Option<&SurfaceVisibility>,
    ) -> bool {
        let Some(surface) = self.surface_for(subcategory) else {
            return true;
        };
        match visibility {
            Some(v) => v.is_visible(surface),
            None => true,
        }
    }

    /// Drops selections whose surface is confirmed absent from the photo.
    /// Without a scene verdict the map passes through as a copy.
    pub fn filter(
        &self,
        selections: &Selections,
        visibility: Option<&SurfaceVisibility>,
    ) -> Selections {
        let Some(visibility) = visibility else {
            return selections.clone();
        };

        selections
            .iter()
            .filter(|(sub_id, _)| self.is_subcategory_visible(sub_id.as_str(), Some(visibility)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Subcategory ids currently suppressed by a scene verdict, for
    /// diagnostics and picker UI.
    pub fn hidden_subcategories(&self, visibility: &SurfaceVisibility) -> Vec<String> {
        self.by_subcategory
            .iter()
            .filter(|(_, surface)| !visibility.is_visible(**surface))
            .map(|(sub_id, _)| sub_id.clone())
            .collect()
    }
}

fn builtin_bindings() -> BTreeMap<String, Surface> {
    BTreeMap::from([
        ("backsplash".to_string(), Surface::Backsplash),
        ("counter-top".to_string(), Surface::Countertop),
        ("kitchen-cabinet-color".to_string(), Surface::Cabinets),
        ("island-cabinet-color".to_string(), Surface::Island),
    ])
}
