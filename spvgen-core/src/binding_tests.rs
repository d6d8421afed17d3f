//! Tests for binding and location occupancy tracking

use crate::binding::{BindingSet, LocationSet, ResourceCategory, MAX_LOCATIONS};

#[test]
fn test_use_binding_reports_category_clash() {
    let mut set = BindingSet::new();
    assert!(set.use_binding(0, 0, ResourceCategory::Image));
    assert!(!set.use_binding(0, 0, ResourceCategory::Image));
}

#[test]
fn test_image_and_sampler_may_share_a_slot() {
    let mut set = BindingSet::new();
    assert!(set.use_binding(2, 1, ResourceCategory::Image));
    assert!(set.use_binding(2, 1, ResourceCategory::Sampler));
    assert!(!set.use_binding(2, 1, ResourceCategory::Sampler));
    assert!(set.use_binding(2, 1, ResourceCategory::Other));
}

#[test]
fn test_sets_are_independent() {
    let mut set = BindingSet::new();
    assert!(set.use_binding(0, 0, ResourceCategory::Other));
    assert!(set.use_binding(0, 1, ResourceCategory::Other));
    assert!(set.is_used(0, 0, ResourceCategory::Other));
    assert!(!set.is_used(0, 2, ResourceCategory::Other));
}

#[test]
fn test_next_binding_skips_claimed_slots() {
    let mut set = BindingSet::new();
    set.use_binding(0, 0, ResourceCategory::Image);
    set.use_binding(2, 0, ResourceCategory::Image);

    assert_eq!(set.use_next_binding(0, 1, ResourceCategory::Image), Some(1));
    assert_eq!(set.use_next_binding(0, 1, ResourceCategory::Image), Some(3));
}

#[test]
fn test_next_binding_ignores_other_categories() {
    let mut set = BindingSet::new();
    set.use_binding(0, 0, ResourceCategory::Sampler);
    assert_eq!(set.use_next_binding(0, 1, ResourceCategory::Image), Some(0));
}

#[test]
fn test_next_binding_finds_a_free_run() {
    let mut set = BindingSet::new();
    set.use_binding(1, 0, ResourceCategory::Other);

    assert_eq!(set.use_next_binding(0, 3, ResourceCategory::Other), Some(2));
    for b in 2..5 {
        assert!(set.is_used(b, 0, ResourceCategory::Other));
    }
    assert_eq!(set.use_next_binding(0, 1, ResourceCategory::Other), Some(5));
}

#[test]
fn test_zero_count_claims_one_binding() {
    let mut set = BindingSet::new();
    assert_eq!(set.use_next_binding(3, 0, ResourceCategory::Other), Some(0));
    assert_eq!(set.use_next_binding(3, 0, ResourceCategory::Other), Some(1));
}

#[test]
fn test_location_indices_are_separate() {
    let mut locs = LocationSet::new();
    assert!(locs.use_location(0, 0));
    assert!(locs.use_location(0, 1));
    assert!(!locs.use_location(0, 1));
    assert!(locs.is_used(0, 0));
}

#[test]
fn test_location_out_of_range_is_never_free() {
    let mut locs = LocationSet::new();
    assert!(!LocationSet::is_valid(MAX_LOCATIONS));
    assert!(LocationSet::is_valid(MAX_LOCATIONS - 1));
    assert!(!locs.use_location(MAX_LOCATIONS, 0));
}

#[test]
fn test_next_locs_skip_explicit_claims() {
    let mut locs = LocationSet::new();
    locs.use_location(1, 0);

    assert_eq!(locs.use_next_locs(1), 0);
    assert_eq!(locs.use_next_locs(2), 2);
    assert_eq!(locs.use_next_locs(1), 4);
}
