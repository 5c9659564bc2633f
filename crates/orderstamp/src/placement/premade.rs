//! Lookup of ready-made designs for non-personalised `CH` orders.

use std::path::Path;

use crate::bridge::FileBridge;
use crate::ingest::title_is_customized;
use crate::session::OrderWithTabs;
use crate::sku::{contains_ignore_case, is_premade_family};

/// A design file found for an order.
#[derive(Debug, Clone)]
pub struct PremadeCandidate {
    pub order_id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct PremadeLookup {
    pub candidates: Vec<PremadeCandidate>,
    /// Per-file or folder-level problems; the lookup itself never fails.
    pub errors: Vec<String>,
}

/// Orders eligible for a pre-made design: `CH` family, title without a
/// personalisation keyword and no file on any tab yet.
pub fn eligible(order: &OrderWithTabs) -> bool {
    is_premade_family(&order.item.sku)
        && !title_is_customized(&order.item.product_title)
        && order.tabs.iter().all(|tab| !tab.has_file())
}

/// First `.pdf` entry whose name contains the SKU, ignoring case.
pub fn match_file<'a>(sku: &str, pdf_files: &'a [String]) -> Option<&'a str> {
    pdf_files
        .iter()
        .find(|name| contains_ignore_case(name, sku))
        .map(String::as_str)
}

/// Lists `premade_folder` once and reads a matching file for each eligible order.
pub async fn find_premade_designs<B: FileBridge + ?Sized>(
    bridge: &B,
    premade_folder: &str,
    orders: &[OrderWithTabs],
) -> PremadeLookup {
    let mut lookup = PremadeLookup::default();

    if premade_folder.trim().is_empty() {
        lookup
            .errors
            .push("Pre-made folder path not configured".to_string());
        return lookup;
    }

    let eligible: Vec<&OrderWithTabs> = orders.iter().filter(|o| eligible(o)).collect();
    if eligible.is_empty() {
        return lookup;
    }

    let folder = Path::new(premade_folder);
    let entries = match bridge.list_directory(folder).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list pre-made folder");
            lookup
                .errors
                .push("Failed to read pre-made folder".to_string());
            return lookup;
        }
    };
    let pdf_files: Vec<String> = entries
        .into_iter()
        .filter(|name| name.to_lowercase().ends_with(".pdf"))
        .collect();

    for order in eligible {
        let Some(file_name) = match_file(&order.item.sku, &pdf_files) else {
            continue;
        };
        match bridge.read_file(&folder.join(file_name)).await {
            Ok(bytes) => lookup.candidates.push(PremadeCandidate {
                order_id: order.item.id.clone(),
                file_name: file_name.to_string(),
                bytes,
            }),
            Err(e) => lookup
                .errors
                .push(format!("Failed to load {}: {}", file_name, e)),
        }
    }

    tracing::info!(
        found = lookup.candidates.len(),
        errors = lookup.errors.len(),
        "Pre-made lookup finished"
    );
    lookup
}
