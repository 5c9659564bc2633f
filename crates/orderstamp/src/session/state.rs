//! In-memory working state of the current session.
//!
//! All mutation goes through [`AppState::apply`] so the transitions can be
//! tested without a store or a bridge.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;
use crate::ingest::extract_image_urls;
use crate::models::{OrderItem, OrderStatus, ProcessingSession};
use crate::tabs::{compute_tabs, AttachedFile, StampPosition, UploadTab};

/// An order together with its upload tabs.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithTabs {
    pub item: OrderItem,
    #[serde(skip)]
    pub tabs: Vec<UploadTab>,
    /// Image links found in the note and additional options, in text order.
    pub image_urls: Vec<String>,
}

impl OrderWithTabs {
    /// Plans the tabs and extracts image links for a freshly imported item.
    pub fn new(item: OrderItem) -> Self {
        let tabs = compute_tabs(
            &item.sku,
            i64::from(item.quantity),
            i64::from(item.number_of_lines),
        );
        let image_urls = extract_image_urls(&format!(
            "{} {}",
            item.customer_note, item.additional_options
        ));
        Self {
            item,
            tabs,
            image_urls,
        }
    }

    pub fn tab(&self, tab_id: &str) -> Option<&UploadTab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn tab_mut(&mut self, tab_id: &str) -> Result<&mut UploadTab, ValidationError> {
        let order_id = self.item.id.clone();
        self.tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| ValidationError::UnknownTab {
                order_id,
                tab_id: tab_id.to_string(),
            })
    }

    /// Every tab has a file and a position.
    pub fn is_ready(&self) -> bool {
        !self.tabs.is_empty() && self.tabs.iter().all(UploadTab::is_ready)
    }

    pub fn files_attached(&self) -> usize {
        self.tabs.iter().filter(|t| t.has_file()).count()
    }

    pub fn positions_placed(&self) -> usize {
        self.tabs.iter().filter(|t| t.placed).count()
    }
}

/// State transitions.
#[derive(Debug, Clone)]
pub enum Action {
    SessionStarted {
        session: ProcessingSession,
        orders: Vec<OrderWithTabs>,
    },
    SelectOrder(Option<String>),
    /// `position` is the remembered SKU position, when there is one.
    FileAttached {
        order_id: String,
        tab_id: String,
        file: AttachedFile,
        position: Option<StampPosition>,
    },
    FileRemoved {
        order_id: String,
        tab_id: String,
    },
    PositionPlaced {
        order_id: String,
        tab_id: String,
        position: StampPosition,
    },
    PositionCleared {
        order_id: String,
        tab_id: String,
    },
    OrderSaved {
        order_id: String,
        saved_at: DateTime<Utc>,
        session: ProcessingSession,
    },
    Reset,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub session: Option<ProcessingSession>,
    pub orders: Vec<OrderWithTabs>,
    pub selected_order: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self, order_id: &str) -> Option<&OrderWithTabs> {
        self.orders.iter().find(|o| o.item.id == order_id)
    }

    fn order_mut(&mut self, order_id: &str) -> Result<&mut OrderWithTabs, ValidationError> {
        self.orders
            .iter_mut()
            .find(|o| o.item.id == order_id)
            .ok_or_else(|| ValidationError::UnknownOrder(order_id.to_string()))
    }

    pub fn selected(&self) -> Option<&OrderWithTabs> {
        self.selected_order.as_deref().and_then(|id| self.order(id))
    }

    pub fn saved_count(&self) -> usize {
        self.orders
            .iter()
            .filter(|o| o.item.status == OrderStatus::Saved)
            .count()
    }

    /// Applies one transition. Unknown orders or tabs leave the state untouched.
    pub fn apply(&mut self, action: Action) -> Result<(), ValidationError> {
        match action {
            Action::SessionStarted { session, orders } => {
                self.selected_order = orders.first().map(|o| o.item.id.clone());
                self.session = Some(session);
                self.orders = orders;
            }
            Action::SelectOrder(order_id) => {
                if let Some(id) = &order_id {
                    self.order_mut(id)?;
                }
                self.selected_order = order_id;
            }
            Action::FileAttached {
                order_id,
                tab_id,
                file,
                position,
            } => {
                let order = self.order_mut(&order_id)?;
                let tab = order.tab_mut(&tab_id)?;
                tab.file = Some(file);
                tab.placed = position.is_some();
                tab.position = position;
                if order.item.status == OrderStatus::Pending {
                    order.item.status = OrderStatus::Uploaded;
                }
            }
            Action::FileRemoved { order_id, tab_id } => {
                let tab = self.order_mut(&order_id)?.tab_mut(&tab_id)?;
                tab.file = None;
                tab.placed = false;
                tab.position = None;
            }
            Action::PositionPlaced {
                order_id,
                tab_id,
                position,
            } => {
                let tab = self.order_mut(&order_id)?.tab_mut(&tab_id)?;
                tab.position = Some(position);
                tab.placed = true;
            }
            Action::PositionCleared { order_id, tab_id } => {
                let tab = self.order_mut(&order_id)?.tab_mut(&tab_id)?;
                tab.position = None;
                tab.placed = false;
            }
            Action::OrderSaved {
                order_id,
                saved_at,
                session,
            } => {
                let order = self.order_mut(&order_id)?;
                order.item.status = OrderStatus::Saved;
                order.item.saved_at = Some(saved_at);
                self.session = Some(session);
            }
            Action::Reset => {
                *self = Self::default();
            }
        }
        Ok(())
    }
}
