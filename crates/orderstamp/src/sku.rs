//! SKU family markers.
//!
//! A marker matches when it appears anywhere in the SKU, ignoring case.

/// Two-sided products (cards): always a Front and an Inside design.
pub const TWO_SIDED_MARKER: &str = "CD";

/// Ready-made products whose designs can come from the pre-made folder.
pub const PREMADE_MARKER: &str = "CH";

/// Case-insensitive substring test used by every SKU rule in the crate.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(&needle.to_uppercase())
}

pub fn is_two_sided(sku: &str) -> bool {
    contains_ignore_case(sku, TWO_SIDED_MARKER)
}

pub fn is_premade_family(sku: &str) -> bool {
    contains_ignore_case(sku, PREMADE_MARKER)
}
