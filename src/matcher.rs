//! Predicate evaluator: pure matching of filter criteria against a
//! stored listing.
//!
//! Total over all field combinations and side-effect free. Every
//! criterion left at its default is a wildcard, not a rejection.

use crate::model::FilterCriteria;
use crate::model::FloorCategory;
use crate::model::ListingModel;
use crate::normalize::canonical_property_type;

/// Whether a listing satisfies every constraint of the given criteria.
///
/// Criteria with inverted bounds (min > max, possible through legacy
/// data written before validation existed) match nothing.
pub fn matches(criteria: &FilterCriteria, listing: &ListingModel) -> bool {
    if !criteria.is_consistent() {
        return false;
    }

    criteria.price.accepts(listing.price)
        && criteria.rooms.accepts(listing.rooms)
        && criteria.area.accepts(listing.area)
        && criteria.year_built.accepts(listing.year_built)
        && criteria.floor.accepts(listing.floor_number)
        && criteria.total_floors.accepts(listing.total_floors)
        && city_matches(criteria.city.as_deref(), &listing.city)
        && class_matches(&criteria.property_types, listing.property_type.as_deref())
        && renovation_matches(&criteria.renovation_types, listing.renovation.as_deref())
        && floor_categories_match(&criteria.floor_categories, listing)
        && opt_in_passes(criteria.furnished, listing.furnished)
        && opt_in_passes(criteria.pets_allowed, listing.pets_allowed)
        && opt_in_passes(criteria.children_allowed, listing.children_friendly)
        && opt_in_passes(criteria.park_nearby, listing.park_nearby)
        && strict_absent_passes(criteria.no_commission, listing.agency_commission)
        && strict_absent_passes(criteria.no_noisy_roads, listing.noisy_roads_nearby)
}

/// Case-insensitive substring containment, not exact equality: a filter
/// city of "rom" matches "Roma".
fn city_matches(wanted: Option<&str>, city: &str) -> bool {
    match wanted {
        None => true,
        Some(wanted) if wanted.trim().is_empty() => true,
        Some(wanted) => city.to_lowercase().contains(&wanted.trim().to_lowercase()),
    }
}

/// Set membership after synonym expansion on both sides. An empty set
/// constrains nothing; a constrained set rejects unknown listing types.
fn class_matches(wanted: &[String], listing_type: Option<&str>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let Some(listing_type) = listing_type else {
        return false;
    };
    let listing_canonical = canonical_property_type(listing_type);
    wanted
        .iter()
        .any(|t| canonical_property_type(t) == listing_canonical)
}

fn renovation_matches(wanted: &[String], renovation: Option<&str>) -> bool {
    if wanted.is_empty() {
        return true;
    }
    let Some(renovation) = renovation else {
        return false;
    };
    wanted.iter().any(|t| t.eq_ignore_ascii_case(renovation))
}

/// OR semantics across the selected categories: passing any one is
/// enough, even if another selected category fails.
fn floor_categories_match(wanted: &[FloorCategory], listing: &ListingModel) -> bool {
    if wanted.is_empty() {
        return true;
    }
    wanted
        .iter()
        .any(|category| floor_category_satisfied(*category, listing))
}

fn floor_category_satisfied(category: FloorCategory, listing: &ListingModel) -> bool {
    let first = listing.is_first_floor;
    let top = listing.is_top_floor;
    match category {
        // Exclusion categories reject only a confirmed violation; an
        // unknown floor passes.
        FloorCategory::NotFirst => first != Some(true),
        FloorCategory::NotLast => top != Some(true),
        FloorCategory::NotFirstNotLast => first != Some(true) && top != Some(true),
        // Positive category requires confirmation; unknown fails.
        FloorCategory::OnlyLast => top == Some(true),
    }
}

/// Opt-in exclusion policy for pets/children/furnished/park requests:
/// the listing passes unless its value is explicitly false. Unknown
/// passes.
fn opt_in_passes(requested: Option<bool>, value: Option<bool>) -> bool {
    if requested != Some(true) {
        return true;
    }
    value != Some(false)
}

/// Strict policy for no_commission/no_noisy_roads: the listing attribute
/// must be explicitly confirmed absent. Unknown fails.
fn strict_absent_passes(requested: Option<bool>, value: Option<bool>) -> bool {
    if requested != Some(true) {
        return true;
    }
    value == Some(false)
}
