//! Write-time normalization for scraped listing fields.
//!
//! Floor classification and property-type canonicalization both happen
//! exactly once, at upsert, so the evaluator only ever compares
//! normalized values.

/// Floor markers that mean "top of the building" regardless of number.
const TOP_FLOOR_MARKERS: [&str; 6] = ["attico", "mansarda", "ultimo", "penthouse", "attic", "top"];

/// Floor markers that mean ground level (floor 0).
const GROUND_FLOOR_MARKERS: [&str; 4] = ["terra", "ground", "pt", "rialzato"];

/// Synonym classes for property types. The first member of each class is
/// the canonical name.
const PROPERTY_CLASSES: [&[&str]; 4] = [
    &["apartment", "appartamento", "flat", "piso"],
    &["house", "casa", "villa", "villetta"],
    &["studio", "monolocale", "loft"],
    &["room", "stanza", "camera"],
];

/// Derived floor fields. `None` always means unknown, never false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloorFacts {
    pub floor_number: Option<i64>,
    pub is_first_floor: Option<bool>,
    pub is_top_floor: Option<bool>,
}

/// Classifies a raw floor string.
///
/// A numeric floor yields `floor_number`; floor 1 is the first floor; a
/// top marker, or `floor_number == total_floors` when both are known,
/// marks the top floor. Unparsable strings leave every field unknown so
/// they can never produce a false match.
pub fn derive_floor(raw: Option<&str>, total_floors: Option<i64>) -> FloorFacts {
    let Some(raw) = raw else {
        return FloorFacts::default();
    };
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return FloorFacts::default();
    }

    let has_top_marker = TOP_FLOOR_MARKERS
        .iter()
        .any(|marker| contains_word(&normalized, marker));
    let has_ground_marker = GROUND_FLOOR_MARKERS
        .iter()
        .any(|marker| contains_word(&normalized, marker));

    let floor_number = if has_ground_marker {
        Some(0)
    } else {
        first_integer(&normalized)
    };

    let is_top_floor = if has_top_marker {
        Some(true)
    } else {
        match (floor_number, total_floors) {
            (Some(floor), Some(total)) => Some(floor == total),
            _ => None,
        }
    };

    FloorFacts {
        floor_number,
        is_first_floor: floor_number.map(|floor| floor == 1),
        is_top_floor,
    }
}

/// Canonical property type for a raw scraped string.
///
/// Members of a known synonym class map to the class canonical;
/// everything else keeps its lowercased raw value so unknown types still
/// compare by plain equality.
pub fn canonical_property_type(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    for class in PROPERTY_CLASSES {
        if class.contains(&normalized.as_str()) {
            return class[0].to_string();
        }
    }
    normalized
}

/// Whether two property-type strings belong to the same synonym class.
pub fn same_property_class(a: &str, b: &str) -> bool {
    canonical_property_type(a) == canonical_property_type(b)
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

fn first_integer(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
