use std::path::Path;

use chrono::Utc;
use tracing::{info, info_span, warn};

use super::state::{Action, AppState, OrderWithTabs};
use crate::bridge::FileBridge;
use crate::broadcast::{SessionEvent, SessionEventBroadcaster, SessionEventKind};
use crate::config::{Config, MAX_FONT_SIZE, MIN_FONT_SIZE};
use crate::error::{Result, ValidationError};
use crate::ingest::{accept_csv_filename, parse, to_order_items, validate_rows};
use crate::models::{OrderStatus, ProcessingSession, SessionStatus, SkuPosition};
use crate::placement::{
    find_premade_designs, FilePlacer, OverwritePrompt, PlacementReport, PremadeLookup,
};
use crate::sanitize::redact_path;
use crate::store::Store;
use crate::tabs::{AttachedFile, StampPosition};

/// Where a fresh placement starts when the SKU has no remembered position.
pub const DEFAULT_X: f64 = 50.0;
pub const DEFAULT_Y: f64 = 50.0;

/// Drives one operator session: import, attach, place, save.
pub struct SessionService<S, B> {
    pub(super) store: S,
    pub(super) bridge: B,
    pub(super) default_font_size: f64,
    pub(super) default_folders: Vec<String>,
    pub(super) state: AppState,
    pub(super) events: SessionEventBroadcaster,
}

impl<S: Store, B: FileBridge> SessionService<S, B> {
    pub fn new(store: S, bridge: B, config: &Config) -> Self {
        Self {
            store,
            bridge,
            default_font_size: config.default_font_size,
            default_folders: config.default_folders.clone(),
            state: AppState::new(),
            events: SessionEventBroadcaster::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn events(&self) -> &SessionEventBroadcaster {
        &self.events
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Imports a CSV as a new session. An unfinished current session is
    /// abandoned first.
    pub fn import_csv(&mut self, filename: &str, csv_text: &str) -> Result<ProcessingSession> {
        let _span = info_span!(
            "session.import",
            file = %redact_path(Path::new(filename))
        )
        .entered();

        accept_csv_filename(filename)?;
        let mapping = self.store.load_mapping()?;
        let rows = parse(csv_text, mapping.as_ref())?;
        validate_rows(&rows, mapping.as_ref())?;

        self.abandon_current()?;

        let session = ProcessingSession::new(filename, rows.len() as u32);
        self.store.insert_session(&session)?;

        let items = to_order_items(&rows, &session.id);
        self.store.insert_orders(&items)?;

        let orders: Vec<OrderWithTabs> = items.into_iter().map(OrderWithTabs::new).collect();
        let customized = orders.iter().filter(|o| o.item.is_customized).count();
        info!(
            orders = orders.len(),
            customized, "Imported CSV into new session"
        );

        self.state.apply(Action::SessionStarted {
            session: session.clone(),
            orders,
        })?;
        self.emit(
            SessionEvent::new(
                SessionEventKind::Imported,
                format!("Imported {} orders from {}", session.total_orders, filename),
            )
            .for_session(&session.id),
        );

        Ok(session)
    }

    /// Reloads a stored session and its orders. Tabs start empty; files and
    /// positions only ever live in memory.
    pub fn open_session(&mut self, session_id: &str) -> Result<ProcessingSession> {
        let session = self
            .store
            .find_session(session_id)?
            .ok_or_else(|| crate::db::DatabaseError::NotFound {
                entity: "Session",
                id: session_id.to_string(),
            })?;
        let orders = self
            .store
            .orders_for_session(session_id)?
            .into_iter()
            .map(OrderWithTabs::new)
            .collect();

        self.state.apply(Action::SessionStarted {
            session: session.clone(),
            orders,
        })?;
        Ok(session)
    }

    pub fn select_order(&mut self, order_id: Option<&str>) -> Result<()> {
        self.state
            .apply(Action::SelectOrder(order_id.map(str::to_string)))?;
        Ok(())
    }

    /// Attaches a design to a tab. The remembered position for the order's
    /// SKU, if any, is applied and returned.
    pub fn attach_file(
        &mut self,
        order_id: &str,
        tab_id: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<StampPosition>> {
        if !is_pdf(name, &bytes) {
            return Err(ValidationError::NotPdf(name.to_string()).into());
        }

        let order = self
            .state
            .order(order_id)
            .ok_or_else(|| ValidationError::UnknownOrder(order_id.to_string()))?;
        if order.tab(tab_id).is_none() {
            return Err(ValidationError::UnknownTab {
                order_id: order_id.to_string(),
                tab_id: tab_id.to_string(),
            }
            .into());
        }
        let was_pending = order.item.status == OrderStatus::Pending;
        let remembered = self
            .store
            .position_for_sku(&order.item.sku)?
            .map(|p| StampPosition::new(p.x_position, p.y_position, p.font_size));

        self.state.apply(Action::FileAttached {
            order_id: order_id.to_string(),
            tab_id: tab_id.to_string(),
            file: AttachedFile {
                name: name.to_string(),
                bytes,
            },
            position: remembered,
        })?;

        if was_pending {
            self.store
                .set_order_status(order_id, OrderStatus::Uploaded, None)?;
        }

        self.emit(
            SessionEvent::new(
                SessionEventKind::FileAttached,
                format!("Attached {} to {}", name, tab_id),
            )
            .for_order(order_id),
        );
        Ok(remembered)
    }

    /// Reads a design through the bridge and attaches it.
    pub async fn attach_file_from_path(
        &mut self,
        order_id: &str,
        tab_id: &str,
        path: &Path,
    ) -> Result<Option<StampPosition>> {
        let name = redact_path(path);
        let bytes = self.bridge.read_file(path).await?;
        self.attach_file(order_id, tab_id, &name, bytes)
    }

    pub fn remove_file(&mut self, order_id: &str, tab_id: &str) -> Result<()> {
        self.state.apply(Action::FileRemoved {
            order_id: order_id.to_string(),
            tab_id: tab_id.to_string(),
        })?;
        self.emit(
            SessionEvent::new(SessionEventKind::FileRemoved, format!("Removed file from {}", tab_id))
                .for_order(order_id),
        );
        Ok(())
    }

    /// Sets the order number position of a tab.
    pub fn place(&mut self, order_id: &str, tab_id: &str, position: StampPosition) -> Result<()> {
        validate_position(&position)?;
        self.state.apply(Action::PositionPlaced {
            order_id: order_id.to_string(),
            tab_id: tab_id.to_string(),
            position,
        })?;
        self.emit(
            SessionEvent::new(
                SessionEventKind::PositionPlaced,
                format!(
                    "Placed order number on {} at ({}, {}) size {}",
                    tab_id, position.x, position.y, position.font_size
                ),
            )
            .for_order(order_id),
        );
        Ok(())
    }

    pub fn clear_position(&mut self, order_id: &str, tab_id: &str) -> Result<()> {
        self.state.apply(Action::PositionCleared {
            order_id: order_id.to_string(),
            tab_id: tab_id.to_string(),
        })?;
        Ok(())
    }

    /// Starting point for placing on a tab of `order_id`: the remembered SKU
    /// position, else the default.
    pub fn suggested_position(&self, order_id: &str) -> Result<StampPosition> {
        let order = self
            .state
            .order(order_id)
            .ok_or_else(|| ValidationError::UnknownOrder(order_id.to_string()))?;
        let position = match self.store.position_for_sku(&order.item.sku)? {
            Some(p) => StampPosition::new(p.x_position, p.y_position, p.font_size),
            None => StampPosition::new(DEFAULT_X, DEFAULT_Y, self.default_font_size),
        };
        Ok(position)
    }

    /// Remembers `position` for every future order of `sku`.
    pub fn remember_position(&self, sku: &str, position: &StampPosition) -> Result<SkuPosition> {
        validate_position(position)?;
        let row = self
            .store
            .upsert_position(sku, position.x, position.y, position.font_size)?;
        info!(sku, "Remembered stamp position");
        Ok(row)
    }

    /// Stamps and writes every tab of the order, then updates the session
    /// counters. Files already written stay when a later write fails.
    pub async fn save_order(
        &mut self,
        order_id: &str,
        prompt: &dyn OverwritePrompt,
    ) -> Result<PlacementReport> {
        let order = self
            .state
            .order(order_id)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownOrder(order_id.to_string()))?;
        let settings = self.store.load_settings()?;
        let rules = self.store.active_rules()?;

        let placer = FilePlacer::new(&self.bridge, &self.store);
        let report = match placer
            .place_files(
                &order.item,
                &order.tabs,
                &settings.date_folder_path,
                &rules,
                prompt,
            )
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!(order = %order.item.external_id, error = %e, "Save failed");
                self.emit(
                    SessionEvent::new(SessionEventKind::SaveFailed, e.to_string())
                        .for_session(&order.item.session_id)
                        .for_order(order_id),
                );
                return Err(e.into());
            }
        };

        let session = self.recount_session(&order.item.session_id)?;
        self.state.apply(Action::OrderSaved {
            order_id: order_id.to_string(),
            saved_at: report.saved_at,
            session: session.clone(),
        })?;

        self.emit(
            SessionEvent::new(
                SessionEventKind::OrderSaved,
                format!(
                    "Saved {} file(s) to {}",
                    report.saved_paths.len(),
                    report.folder_name
                ),
            )
            .for_session(&session.id)
            .for_order(order_id),
        );
        if session.status == SessionStatus::Completed {
            self.emit(
                SessionEvent::new(
                    SessionEventKind::SessionCompleted,
                    format!("All {} orders saved", session.total_orders),
                )
                .for_session(&session.id),
            );
        }

        Ok(report)
    }

    /// Looks up pre-made designs for the eligible orders of the session.
    pub async fn find_premade(&self) -> Result<PremadeLookup> {
        let settings = self.store.load_settings()?;
        Ok(find_premade_designs(
            &self.bridge,
            &settings.premade_folder_path,
            &self.state.orders,
        )
        .await)
    }

    /// Attaches each candidate to the first tab of its order. Returns how
    /// many were attached; failures are logged and skipped.
    pub fn attach_premade(&mut self, lookup: PremadeLookup) -> usize {
        let mut attached = 0;
        for candidate in lookup.candidates {
            let Some(tab_id) = self
                .state
                .order(&candidate.order_id)
                .and_then(|o| o.tabs.first())
                .map(|t| t.id.clone())
            else {
                continue;
            };
            match self.attach_file(
                &candidate.order_id,
                &tab_id,
                &candidate.file_name,
                candidate.bytes,
            ) {
                Ok(_) => attached += 1,
                Err(e) => warn!(file = %candidate.file_name, error = %e, "Skipping pre-made design"),
            }
        }
        attached
    }

    /// Leaves the current session. An unfinished one is marked abandoned.
    pub fn new_session(&mut self) -> Result<()> {
        self.abandon_current()?;
        self.state.apply(Action::Reset)?;
        Ok(())
    }

    fn abandon_current(&mut self) -> Result<()> {
        let Some(mut session) = self.state.session.clone() else {
            return Ok(());
        };
        if session.is_finished() {
            return Ok(());
        }

        session.status = SessionStatus::Abandoned;
        self.store.update_session(&session)?;
        info!(session = %session.id, "Abandoned unfinished session");
        self.emit(
            SessionEvent::new(
                SessionEventKind::SessionAbandoned,
                format!(
                    "Abandoned with {}/{} orders saved",
                    session.completed_orders, session.total_orders
                ),
            )
            .for_session(&session.id),
        );
        self.state.session = Some(session);
        Ok(())
    }

    /// Recounts saved orders and completes the session when all are saved.
    fn recount_session(&self, session_id: &str) -> Result<ProcessingSession> {
        let mut session = match self.store.find_session(session_id)? {
            Some(session) => session,
            None => {
                return Err(crate::db::DatabaseError::NotFound {
                    entity: "Session",
                    id: session_id.to_string(),
                }
                .into())
            }
        };

        session.completed_orders = self
            .store
            .count_orders_with_status(session_id, OrderStatus::Saved)?;
        if session.total_orders > 0 && session.completed_orders >= session.total_orders {
            session.status = SessionStatus::Completed;
            session.completed_at = Some(Utc::now());
        }
        self.store.update_session(&session)?;
        Ok(session)
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        self.events.send(event);
    }
}

/// Bytes searched for the `%PDF` header. Readers accept junk before it.
const PDF_HEADER_WINDOW: usize = 1024;

/// `.pdf` name and a `%PDF` header within the first kilobyte.
pub fn is_pdf(name: &str, bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    name.to_lowercase().ends_with(".pdf") && head.windows(4).any(|w| w == b"%PDF")
}

/// Finite coordinates and a font size within the placement bounds.
pub fn validate_position(position: &StampPosition) -> std::result::Result<(), ValidationError> {
    if !position.x.is_finite() || !position.y.is_finite() {
        return Err(ValidationError::InvalidPosition(format!(
            "coordinates must be finite (x={}, y={})",
            position.x, position.y
        )));
    }
    if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&position.font_size) {
        return Err(ValidationError::FontSize(position.font_size));
    }
    Ok(())
}
