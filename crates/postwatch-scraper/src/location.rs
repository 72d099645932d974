//! Location slugs accepted by the anonymous search adapter.
//!
//! Each slug maps to a search-service region code and a human-readable label
//! that is appended to the query as a quoted keyword.

struct Location {
    slug: &'static str,
    label: &'static str,
    region: &'static str,
}

const fn loc(slug: &'static str, label: &'static str, region: &'static str) -> Location {
    Location {
        slug,
        label,
        region,
    }
}

const LOCATIONS: &[Location] = &[
    loc("us", "United States", "us-en"),
    loc("alabama", "Alabama", "us-en"),
    loc("alaska", "Alaska", "us-en"),
    loc("arizona", "Arizona", "us-en"),
    loc("arkansas", "Arkansas", "us-en"),
    loc("california", "California", "us-en"),
    loc("colorado", "Colorado", "us-en"),
    loc("connecticut", "Connecticut", "us-en"),
    loc("delaware", "Delaware", "us-en"),
    loc("florida", "Florida", "us-en"),
    loc("georgia-us", "Georgia", "us-en"),
    loc("hawaii", "Hawaii", "us-en"),
    loc("idaho", "Idaho", "us-en"),
    loc("illinois", "Illinois", "us-en"),
    loc("indiana", "Indiana", "us-en"),
    loc("iowa", "Iowa", "us-en"),
    loc("kansas", "Kansas", "us-en"),
    loc("kentucky", "Kentucky", "us-en"),
    loc("louisiana", "Louisiana", "us-en"),
    loc("maine", "Maine", "us-en"),
    loc("maryland", "Maryland", "us-en"),
    loc("massachusetts", "Massachusetts", "us-en"),
    loc("michigan", "Michigan", "us-en"),
    loc("minnesota", "Minnesota", "us-en"),
    loc("mississippi", "Mississippi", "us-en"),
    loc("missouri", "Missouri", "us-en"),
    loc("montana", "Montana", "us-en"),
    loc("nebraska", "Nebraska", "us-en"),
    loc("nevada", "Nevada", "us-en"),
    loc("new-hampshire", "New Hampshire", "us-en"),
    loc("new-jersey", "New Jersey", "us-en"),
    loc("new-mexico", "New Mexico", "us-en"),
    loc("new-york", "New York", "us-en"),
    loc("north-carolina", "North Carolina", "us-en"),
    loc("north-dakota", "North Dakota", "us-en"),
    loc("ohio", "Ohio", "us-en"),
    loc("oklahoma", "Oklahoma", "us-en"),
    loc("oregon", "Oregon", "us-en"),
    loc("pennsylvania", "Pennsylvania", "us-en"),
    loc("rhode-island", "Rhode Island", "us-en"),
    loc("south-carolina", "South Carolina", "us-en"),
    loc("south-dakota", "South Dakota", "us-en"),
    loc("tennessee", "Tennessee", "us-en"),
    loc("texas", "Texas", "us-en"),
    loc("utah", "Utah", "us-en"),
    loc("vermont", "Vermont", "us-en"),
    loc("virginia", "Virginia", "us-en"),
    loc("washington", "Washington", "us-en"),
    loc("west-virginia", "West Virginia", "us-en"),
    loc("wisconsin", "Wisconsin", "us-en"),
    loc("wyoming", "Wyoming", "us-en"),
    loc("uk", "United Kingdom", "uk-en"),
    loc("canada", "Canada", "ca-en"),
    loc("australia", "Australia", "au-en"),
    loc("india", "India", "in-en"),
    loc("germany", "Germany", "de-de"),
    loc("france", "France", "fr-fr"),
    loc("brazil", "Brazil", "br-pt"),
    loc("mexico", "Mexico", "mx-es"),
    loc("spain", "Spain", "es-es"),
    loc("italy", "Italy", "it-it"),
    loc("netherlands", "Netherlands", "nl-nl"),
    loc("japan", "Japan", "jp-jp"),
    loc("south-korea", "South Korea", "kr-kr"),
    loc("singapore", "Singapore", "sg-en"),
    loc("ireland", "Ireland", "ie-en"),
    loc("sweden", "Sweden", "se-sv"),
    loc("switzerland", "Switzerland", "ch-de"),
    loc("israel", "Israel", "il-he"),
    loc("uae", "UAE", "ae-ar"),
    loc("south-africa", "South Africa", "za-en"),
    loc("nigeria", "Nigeria", "ng-en"),
    loc("philippines", "Philippines", "ph-en"),
    loc("indonesia", "Indonesia", "id-en"),
    loc("poland", "Poland", "pl-pl"),
];

fn find(slug: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|l| l.slug == slug)
}

fn is_unset(slug: &str) -> bool {
    slug.is_empty() || slug == "any"
}

/// Region code for the search service, if the slug is a known location.
#[must_use]
pub fn region_for(slug: &str) -> Option<&'static str> {
    if is_unset(slug) {
        return None;
    }
    find(slug).map(|l| l.region)
}

/// Keyword appended to the query for a location filter.
///
/// Unknown slugs are turned into a title-cased phrase (`"bay-area"` becomes
/// `"Bay Area"`).
#[must_use]
pub fn label_for(slug: &str) -> Option<String> {
    if is_unset(slug) {
        return None;
    }
    Some(find(slug).map_or_else(
        || crate::normalize::title_case(&slug.replace('-', " ")),
        |l| l.label.to_string(),
    ))
}
