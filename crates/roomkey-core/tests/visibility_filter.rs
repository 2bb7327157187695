//! Visibility filtering: only a confirmed-absent surface may suppress a
//! selection; a missing or unknown signal always defaults to visible.

use roomkey_core::model::Selections;
use roomkey_core::visibility::{Surface, SurfaceVisibility, VisibilityIndex};
use std::collections::BTreeMap;

fn selections(entries: &[(&str, &str)]) -> Selections {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn visibility(entries: &[(Surface, bool)]) -> SurfaceVisibility {
    SurfaceVisibility {
        surfaces: entries.iter().copied().collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn test_no_scene_verdict_passes_through() {
    let index = VisibilityIndex::builtin();
    let sel = selections(&[("backsplash", "subway-white"), ("counter-top", "quartz")]);
    assert_eq!(index.filter(&sel, None), sel);
}

#[test]
fn test_missing_surface_signal_defaults_to_visible() {
    let index = VisibilityIndex::builtin();
    // Verdict says nothing about the countertop.
    let vis = visibility(&[(Surface::Backsplash, true)]);
    let sel = selections(&[("counter-top", "quartz")]);
    assert_eq!(index.filter(&sel, Some(&vis)), sel);
}

#[test]
fn test_confirmed_absent_surface_suppresses() {
    let index = VisibilityIndex::builtin();
    let vis = visibility(&[(Surface::Countertop, false)]);
    let sel = selections(&[("counter-top", "quartz"), ("backsplash", "subway-white")]);

    let filtered = index.filter(&sel, Some(&vis));
    assert_eq!(filtered, selections(&[("backsplash", "subway-white")]));
}

#[test]
fn test_unbound_subcategory_is_always_visible() {
    let index = VisibilityIndex::builtin();
    let vis = visibility(&[
        (Surface::Backsplash, false),
        (Surface::Countertop, false),
        (Surface::Cabinets, false),
        (Surface::Island, false),
    ]);
    // Electrical options have no surface dependency.
    let sel = selections(&[("outlet-count", "3")]);
    assert_eq!(index.filter(&sel, Some(&vis)), sel);
}

#[test]
fn test_visible_signal_keeps_selection() {
    let index = VisibilityIndex::builtin();
    let vis = visibility(&[(Surface::Backsplash, true)]);
    let sel = selections(&[("backsplash", "subway-white")]);
    assert_eq!(index.filter(&sel, Some(&vis)), sel);
}

#[test]
fn test_hidden_subcategories_diagnostic() {
    let index = VisibilityIndex::builtin();
    let vis = visibility(&[(Surface::Backsplash, false), (Surface::Island, false)]);

    let hidden = index.hidden_subcategories(&vis);
    assert_eq!(hidden, vec!["backsplash".to_string(), "island-cabinet-color".to_string()]);
}

#[test]
fn test_all_surfaces_visible_hides_nothing() {
    let index = VisibilityIndex::builtin();
    let vis = visibility(&[(Surface::Backsplash, true), (Surface::Countertop, true)]);
    assert!(index.hidden_subcategories(&vis).is_empty());
}
