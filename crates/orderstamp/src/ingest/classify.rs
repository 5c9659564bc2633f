use std::sync::LazyLock;

use regex::Regex;

/// Title keywords that mark an order as personalised.
pub const CUSTOMIZATION_KEYWORDS: &[&str] =
    &["personalised", "customised", "personalized", "customized"];

static RE_IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S+\.(?:jpg|jpeg|png|gif|webp)").unwrap()
});

/// Returns true when the title names a personalisation keyword.
pub fn title_is_customized(title: &str) -> bool {
    let title = title.to_lowercase();
    CUSTOMIZATION_KEYWORDS.iter().any(|k| title.contains(k))
}

/// An order is customized when its title says so or the customer left a note.
pub fn is_customized(title: &str, customer_note: &str) -> bool {
    title_is_customized(title) || !customer_note.trim().is_empty()
}

/// Image links in free text, in order of appearance. Duplicates are kept.
pub fn extract_image_urls(text: &str) -> Vec<String> {
    RE_IMAGE_URL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
