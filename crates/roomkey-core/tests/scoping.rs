//! Scope resolution, safeguards, and context-dependent selection rewrites.

use roomkey_core::config::RuleSet;
use roomkey_core::model::{PhotoContext, Selections};
use roomkey_core::remap::{apply_remaps, resolve_flooring};
use roomkey_core::scope::{apply_safeguards, Scope};
use std::collections::BTreeSet;

fn selections(entries: &[(&str, &str)]) -> Selections {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn kitchen_photo() -> PhotoContext {
    PhotoContext {
        photo_id: "kitchen-close".to_string(),
        image_path: "/rooms/kitchen-close.webp".to_string(),
        step_slug: Some("design-your-kitchen".to_string()),
        ..Default::default()
    }
}

fn bedroom_photo() -> PhotoContext {
    PhotoContext {
        photo_id: "primary-bedroom".to_string(),
        image_path: "/rooms/primary-bedroom.webp".to_string(),
        step_slug: Some("personalize-your-bedroom".to_string()),
        ..Default::default()
    }
}

// ==================== SCOPE PRECEDENCE ====================

#[test]
fn test_explicit_scope_wins_over_fallback() {
    let scope = Scope::resolve(&ids(&["x"]), &ids(&["y", "z"]));
    assert_eq!(scope, Scope::Only(BTreeSet::from(["x".to_string()])));
}

#[test]
fn test_fallback_used_when_explicit_empty() {
    let scope = Scope::resolve(&[], &ids(&["y"]));
    assert_eq!(scope, Scope::Only(BTreeSet::from(["y".to_string()])));
}

#[test]
fn test_both_empty_resolves_to_unscoped() {
    assert_eq!(Scope::resolve(&[], &[]), Scope::All);
}

#[test]
fn test_unscoped_is_not_an_empty_set() {
    let sel = selections(&[("a", "1"), ("b", "2")]);

    let unscoped = Scope::All.apply(&sel);
    assert_eq!(unscoped, sel, "unscoped must keep everything");

    let empty_scope = Scope::Only(BTreeSet::new()).apply(&sel);
    assert!(
        empty_scope.is_empty(),
        "an empty resolved scope excludes everything"
    );
}

#[test]
fn test_scope_filters_out_of_scope_entries() {
    let sel = selections(&[("cabinet-color", "oak"), ("outlet-count", "3")]);
    let scope = Scope::resolve(&ids(&["cabinet-color"]), &[]);
    let scoped = scope.apply(&sel);
    assert_eq!(scoped, selections(&[("cabinet-color", "oak")]));
}

// ==================== SCOPE SAFEGUARDS ====================

#[test]
fn test_greatroom_faucet_pulls_cabinets_into_scope() {
    let rules = RuleSet::builtin();
    let photo = PhotoContext {
        photo_id: "greatroom-wide".to_string(),
        image_path: "/rooms/greatroom-wide.webp".to_string(),
        step_slug: Some("set-your-style".to_string()),
        ..Default::default()
    };

    let scope = Scope::resolve(&ids(&["kitchen-faucet", "lighting"]), &[]);
    let repaired = apply_safeguards(scope, &photo, &rules.scope_safeguards);

    assert!(repaired.contains("kitchen-faucet"));
    assert!(repaired.contains("kitchen-cabinet-color"));
    assert!(repaired.contains("kitchen-island-cabinet-color"));
    assert!(repaired.contains("cabinet-style-whole-house"));
}

#[test]
fn test_safeguard_ignores_unrelated_photos() {
    let rules = RuleSet::builtin();
    let scope = Scope::resolve(&ids(&["kitchen-faucet"]), &[]);
    let repaired = apply_safeguards(scope.clone(), &bedroom_photo(), &rules.scope_safeguards);
    assert_eq!(repaired, scope);
}

#[test]
fn test_safeguard_requires_trigger_in_scope() {
    let rules = RuleSet::builtin();
    let photo = PhotoContext {
        photo_id: "greatroom-wide".to_string(),
        image_path: "/rooms/greatroom-wide.webp".to_string(),
        step_slug: Some("set-your-style".to_string()),
        ..Default::default()
    };
    let scope = Scope::resolve(&ids(&["lighting"]), &[]);
    let repaired = apply_safeguards(scope.clone(), &photo, &rules.scope_safeguards);
    assert_eq!(repaired, scope);
}

#[test]
fn test_safeguard_leaves_unscoped_photos_alone() {
    let rules = RuleSet::builtin();
    let photo = kitchen_photo();
    assert_eq!(
        apply_safeguards(Scope::All, &photo, &rules.scope_safeguards),
        Scope::All
    );
}

// ==================== CONTEXT REMAP ====================

#[test]
fn test_accent_remap_inside_context() {
    let rules = RuleSet::builtin();
    let sel = selections(&[("accent-color", "accent-red")]);
    let resolved = apply_remaps(&sel, &kitchen_photo(), &rules.remaps);

    assert_eq!(resolved, selections(&[("common-wall-paint", "wall-red")]));
    assert!(!resolved.contains_key("accent-color"));
}

#[test]
fn test_accent_remap_outside_context_is_identity() {
    let rules = RuleSet::builtin();
    let sel = selections(&[("accent-color", "accent-red")]);
    let resolved = apply_remaps(&sel, &bedroom_photo(), &rules.remaps);
    assert_eq!(resolved, sel);
}

#[test]
fn test_explicit_wall_selection_wins_over_remap() {
    let rules = RuleSet::builtin();
    let sel = selections(&[
        ("accent-color", "accent-red"),
        ("common-wall-paint", "wall-greige"),
    ]);
    let resolved = apply_remaps(&sel, &kitchen_photo(), &rules.remaps);

    assert_eq!(resolved, selections(&[("common-wall-paint", "wall-greige")]));
}

// ==================== FLOORING CONFLICT ====================

#[test]
fn test_bedroom_keeps_carpet_by_default() {
    let rule = RuleSet::builtin().flooring.unwrap();
    let sel = selections(&[
        ("carpet-color", "carpet-fog"),
        ("main-area-flooring-color", "lvp-driftwood"),
        ("main-area-flooring-type", "lvp-main-areas"),
    ]);
    let resolved = resolve_flooring(&sel, "primary-bedroom photo", &rule);

    assert!(resolved.contains_key("carpet-color"));
    assert!(!resolved.contains_key("main-area-flooring-color"));
}

#[test]
fn test_bedroom_hard_surface_drops_carpet() {
    let rule = RuleSet::builtin().flooring.unwrap();
    let sel = selections(&[
        ("carpet-color", "carpet-fog"),
        ("main-area-flooring-color", "lvp-driftwood"),
        ("main-area-flooring-type", "lvp-whole-house"),
    ]);
    let resolved = resolve_flooring(&sel, "primary-bedroom photo", &rule);

    assert!(!resolved.contains_key("carpet-color"));
    assert!(resolved.contains_key("main-area-flooring-color"));
}

#[test]
fn test_no_carpet_option_always_means_hard_surface() {
    let rule = RuleSet::builtin().flooring.unwrap();
    let sel = selections(&[
        ("carpet-color", "carpet-none"),
        ("main-area-flooring-color", "lvp-driftwood"),
    ]);
    let resolved = resolve_flooring(&sel, "guest bedroom", &rule);

    assert!(!resolved.contains_key("carpet-color"));
    assert!(resolved.contains_key("main-area-flooring-color"));
}

#[test]
fn test_flooring_untouched_outside_bedrooms() {
    let rule = RuleSet::builtin().flooring.unwrap();
    let sel = selections(&[
        ("carpet-color", "carpet-fog"),
        ("main-area-flooring-color", "lvp-driftwood"),
    ]);
    let resolved = resolve_flooring(&sel, "kitchen-greatroom photo", &rule);
    assert_eq!(resolved, sel);
}

#[test]
fn test_flooring_no_conflict_no_change() {
    let rule = RuleSet::builtin().flooring.unwrap();
    let sel = selections(&[("carpet-color", "carpet-fog")]);
    let resolved = resolve_flooring(&sel, "primary-bedroom", &rule);
    assert_eq!(resolved, sel);
}
