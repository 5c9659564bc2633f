//! Order list search, filters and status counts.

use serde::Serialize;

use crate::models::OrderStatus;
use crate::sku::{contains_ignore_case, PREMADE_MARKER, TWO_SIDED_MARKER};

use super::state::{AppState, OrderWithTabs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    #[default]
    All,
    Customized,
    /// Orders without customization.
    ReadyMade,
    Pending,
    Uploaded,
    Saved,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderWithTabs) -> bool {
        let item = &order.item;
        match self {
            OrderFilter::All => true,
            OrderFilter::Customized => item.is_customized,
            OrderFilter::ReadyMade => !item.is_customized,
            OrderFilter::Pending => item.status == OrderStatus::Pending,
            OrderFilter::Uploaded => item.status == OrderStatus::Uploaded,
            OrderFilter::Saved => item.status == OrderStatus::Saved,
        }
    }
}

const BL_MARKER: &str = "BL";

/// SKU families shown in the order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkuFamily {
    #[default]
    All,
    Ch,
    Cd,
    Bl,
    /// None of the known markers.
    Other,
}

impl SkuFamily {
    pub fn matches(&self, sku: &str) -> bool {
        let has = |marker| contains_ignore_case(sku, marker);
        match self {
            SkuFamily::All => true,
            SkuFamily::Ch => has(PREMADE_MARKER),
            SkuFamily::Cd => has(TWO_SIDED_MARKER),
            SkuFamily::Bl => has(BL_MARKER),
            SkuFamily::Other => ![PREMADE_MARKER, TWO_SIDED_MARKER, BL_MARKER]
                .into_iter()
                .any(has),
        }
    }
}

/// Search text plus the two filters. All three must match.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Case-insensitive substring of the order number, SKU or external id.
    pub search: String,
    pub filter: OrderFilter,
    pub family: SkuFamily,
}

impl OrderQuery {
    pub fn matches(&self, order: &OrderWithTabs) -> bool {
        let item = &order.item;
        let search = self.search.trim();
        let found = search.is_empty()
            || contains_ignore_case(&item.order_number, search)
            || contains_ignore_case(&item.sku, search)
            || contains_ignore_case(&item.external_id, search);
        found && self.filter.matches(order) && self.family.matches(&item.sku)
    }
}

/// Counts over every order of the session, regardless of any query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub customized: usize,
    pub ready_made: usize,
    pub pending: usize,
    pub uploaded: usize,
    pub saved: usize,
}

impl OrderStats {
    pub fn collect<'a>(orders: impl IntoIterator<Item = &'a OrderWithTabs>) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total += 1;
            if order.item.is_customized {
                stats.customized += 1;
            } else {
                stats.ready_made += 1;
            }
            match order.item.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Uploaded => stats.uploaded += 1,
                OrderStatus::Saved => stats.saved += 1,
            }
            stats
        })
    }
}

impl AppState {
    /// Orders matching `query`, in import order.
    pub fn filtered(&self, query: &OrderQuery) -> Vec<&OrderWithTabs> {
        self.orders.iter().filter(|o| query.matches(o)).collect()
    }

    pub fn stats(&self) -> OrderStats {
        OrderStats::collect(&self.orders)
    }
}
