//! Tab planning: how many design slots an order needs and what they are called.

use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::sku::is_two_sided;

/// Label of the only tab of a single-unit, single-line order.
pub const DEFAULT_TAB_LABEL: &str = "1";

/// Most design slots a single order may have.
pub const MAX_TABS_PER_ORDER: i64 = 100;

pub const FRONT_LABEL: &str = "Front";
pub const INSIDE_LABEL: &str = "Inside";

/// Where the order number goes, in screen space: origin at the top-left of
/// the rendered first page, y growing downward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StampPosition {
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

impl StampPosition {
    pub fn new(x: f64, y: f64, font_size: f64) -> Self {
        Self { x, y, font_size }
    }
}

/// A design file attached to a tab.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for AttachedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One upload slot of an order. Lives only in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTab {
    pub id: String,
    pub label: String,
    pub file: Option<AttachedFile>,
    /// Set once the order number has a position on this tab.
    pub placed: bool,
    pub position: Option<StampPosition>,
}

impl UploadTab {
    pub fn empty(index: usize, label: &str) -> Self {
        Self {
            id: format!("tab-{}", index),
            label: label.to_string(),
            file: None,
            placed: false,
            position: None,
        }
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_ready(&self) -> bool {
        self.file.is_some() && self.position.is_some()
    }
}

/// Labels for an order's tabs.
///
/// Two-sided SKUs always get `Front` and `Inside`. Everything else gets one
/// tab per unit per line, labelled `1..N`; non-positive counts count as 1.
/// Counts above [`MAX_TABS_PER_ORDER`] are clamped.
pub fn tab_labels(sku: &str, quantity: i64, number_of_lines: i64) -> Vec<String> {
    if is_two_sided(sku) {
        return vec![FRONT_LABEL.to_string(), INSIDE_LABEL.to_string()];
    }

    let requested = requested_tab_count(sku, quantity, number_of_lines);
    if requested > MAX_TABS_PER_ORDER {
        warn!(
            sku,
            requested,
            max = MAX_TABS_PER_ORDER,
            "Tab count clamped"
        );
    }
    let count = requested.min(MAX_TABS_PER_ORDER);

    (1..=count).map(|i| i.to_string()).collect()
}

/// Tabs an order asks for before any clamping.
pub fn requested_tab_count(sku: &str, quantity: i64, number_of_lines: i64) -> i64 {
    if is_two_sided(sku) {
        return 2;
    }
    quantity.max(1).saturating_mul(number_of_lines.max(1))
}

/// Empty tabs for an order.
pub fn compute_tabs(sku: &str, quantity: i64, number_of_lines: i64) -> Vec<UploadTab> {
    tab_labels(sku, quantity, number_of_lines)
        .iter()
        .enumerate()
        .map(|(i, label)| UploadTab::empty(i, label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sided_always_front_and_inside() {
        for (q, l) in [(1, 1), (3, 2), (0, 0), (10, 1)] {
            let tabs = compute_tabs("CD-100", q, l);
            let labels: Vec<&str> = tabs.iter().map(|t| t.label.as_str()).collect();
            assert_eq!(labels, vec!["Front", "Inside"], "q={} l={}", q, l);
        }
    }

    #[test]
    fn test_quantity_times_lines() {
        for q in 1..=4 {
            for l in 1..=3 {
                let labels = tab_labels("CH-200", q, l);
                let expected: Vec<String> = (1..=q * l).map(|i| i.to_string()).collect();
                assert_eq!(labels, expected);
            }
        }
    }

    #[test]
    fn test_huge_counts_are_clamped() {
        let labels = tab_labels("CH-1", 4_000_000_000, 4_000_000_000);
        assert_eq!(labels.len(), MAX_TABS_PER_ORDER as usize);
        assert_eq!(labels.last().unwrap(), "100");
        assert_eq!(
            requested_tab_count("CH-1", 4_000_000_000, 4_000_000_000),
            i64::MAX
        );
        assert_eq!(requested_tab_count("CD-1", 500, 500), 2);
    }

    #[test]
    fn test_non_positive_counts_clamp_to_one() {
        assert_eq!(tab_labels("CH-1", 0, 0), vec!["1"]);
        assert_eq!(tab_labels("CH-1", -3, 2), vec!["1", "2"]);
        assert_eq!(tab_labels("CH-1", 2, -1), vec!["1", "2"]);
    }

    #[test]
    fn test_tab_ids_and_empty_state() {
        let tabs = compute_tabs("BL-9", 1, 3);
        assert_eq!(tabs.len(), 3);
        assert_eq!(tabs[0].id, "tab-0");
        assert_eq!(tabs[2].id, "tab-2");
        assert!(tabs.iter().all(|t| !t.has_file() && !t.placed && t.position.is_none()));
    }

    #[test]
    fn test_ready_requires_file_and_position() {
        let mut tab = UploadTab::empty(0, "1");
        assert!(!tab.is_ready());
        tab.file = Some(AttachedFile {
            name: "a.pdf".to_string(),
            bytes: vec![1],
        });
        assert!(!tab.is_ready());
        tab.position = Some(StampPosition::new(1.0, 2.0, 12.0));
        assert!(tab.is_ready());
    }
}
