use crate::sku::is_two_sided;
use crate::tabs::DEFAULT_TAB_LABEL;

/// Output file name for one tab of an order.
///
/// Two-sided SKUs always carry the tab label; other orders carry it only
/// when there is more than one design (label other than `1`).
pub fn generate_filename(external_id: &str, tab_label: &str, sku: &str) -> String {
    if is_two_sided(sku) || tab_label != DEFAULT_TAB_LABEL {
        return format!("{}-{}.pdf", external_id, tab_label);
    }

    format!("{}.pdf", external_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sided_keeps_label() {
        assert_eq!(generate_filename("123", "Front", "CD-5"), "123-Front.pdf");
        assert_eq!(generate_filename("123", "Inside", "cd-5"), "123-Inside.pdf");
    }

    #[test]
    fn test_single_design_has_bare_name() {
        assert_eq!(generate_filename("123", "1", "CH-200"), "123.pdf");
    }

    #[test]
    fn test_numbered_designs() {
        assert_eq!(generate_filename("123", "2", "CH-200"), "123-2.pdf");
        assert_eq!(generate_filename("123", "10", "BL-1"), "123-10.pdf");
    }
}
