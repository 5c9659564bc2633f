//! Repository traits the session and placement layers depend on.
//!
//! `db::Database` implements all of them; tests and other hosts can swap in
//! their own implementations.

use chrono::{DateTime, Utc};

use crate::db::{
    mapping_repo, order_repo, position_repo, rule_repo, session_repo, settings_repo, Database,
    DatabaseError,
};
use crate::models::{
    AppSettings, ColumnMapping, OrderItem, OrderStatus, ProcessingSession, RoutingRule,
    SkuPosition,
};

pub trait RoutingRuleStore: Send + Sync {
    /// Every rule in store order (priority, creation time, id).
    fn list_rules(&self) -> Result<Vec<RoutingRule>, DatabaseError>;
    /// Active rules in store order.
    fn active_rules(&self) -> Result<Vec<RoutingRule>, DatabaseError>;
    fn find_rule(&self, id: &str) -> Result<Option<RoutingRule>, DatabaseError>;
    fn insert_rule(&self, rule: &RoutingRule) -> Result<(), DatabaseError>;
    fn update_rule(&self, rule: &RoutingRule) -> Result<(), DatabaseError>;
    fn delete_rule(&self, id: &str) -> Result<bool, DatabaseError>;
    fn set_rule_active(&self, id: &str, active: bool) -> Result<bool, DatabaseError>;
}

pub trait PositionStore: Send + Sync {
    fn position_for_sku(&self, sku: &str) -> Result<Option<SkuPosition>, DatabaseError>;
    fn list_positions(&self) -> Result<Vec<SkuPosition>, DatabaseError>;
    fn upsert_position(
        &self,
        sku: &str,
        x: f64,
        y: f64,
        font_size: f64,
    ) -> Result<SkuPosition, DatabaseError>;
    fn delete_position(&self, id: &str) -> Result<bool, DatabaseError>;
}

pub trait OrderStore: Send + Sync {
    fn insert_orders(&self, items: &[OrderItem]) -> Result<(), DatabaseError>;
    fn find_order(&self, id: &str) -> Result<Option<OrderItem>, DatabaseError>;
    fn orders_for_session(&self, session_id: &str) -> Result<Vec<OrderItem>, DatabaseError>;
    fn set_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        saved_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError>;
    fn count_orders_with_status(
        &self,
        session_id: &str,
        status: OrderStatus,
    ) -> Result<u32, DatabaseError>;
}

pub trait SessionStore: Send + Sync {
    fn insert_session(&self, session: &ProcessingSession) -> Result<(), DatabaseError>;
    fn update_session(&self, session: &ProcessingSession) -> Result<(), DatabaseError>;
    fn find_session(&self, id: &str) -> Result<Option<ProcessingSession>, DatabaseError>;
    fn recent_sessions(&self, limit: u32) -> Result<Vec<ProcessingSession>, DatabaseError>;
    fn latest_in_progress_session(&self) -> Result<Option<ProcessingSession>, DatabaseError>;
}

pub trait SettingsStore: Send + Sync {
    fn load_settings(&self) -> Result<AppSettings, DatabaseError>;
    fn save_settings(&self, settings: &AppSettings) -> Result<(), DatabaseError>;
}

pub trait ColumnMappingStore: Send + Sync {
    fn load_mapping(&self) -> Result<Option<ColumnMapping>, DatabaseError>;
    fn save_mapping(&self, mapping: &ColumnMapping) -> Result<(), DatabaseError>;
    fn clear_mapping(&self) -> Result<(), DatabaseError>;
}

/// Everything the session service needs from persistence.
pub trait Store:
    RoutingRuleStore + PositionStore + OrderStore + SessionStore + SettingsStore + ColumnMappingStore
{
}

impl<T> Store for T where
    T: RoutingRuleStore
        + PositionStore
        + OrderStore
        + SessionStore
        + SettingsStore
        + ColumnMappingStore
{
}

impl RoutingRuleStore for Database {
    fn list_rules(&self) -> Result<Vec<RoutingRule>, DatabaseError> {
        rule_repo::list_all(self)
    }

    fn active_rules(&self) -> Result<Vec<RoutingRule>, DatabaseError> {
        rule_repo::list_active(self)
    }

    fn find_rule(&self, id: &str) -> Result<Option<RoutingRule>, DatabaseError> {
        rule_repo::find_by_id(self, id)
    }

    fn insert_rule(&self, rule: &RoutingRule) -> Result<(), DatabaseError> {
        rule_repo::insert(self, rule)
    }

    fn update_rule(&self, rule: &RoutingRule) -> Result<(), DatabaseError> {
        rule_repo::update(self, rule)
    }

    fn delete_rule(&self, id: &str) -> Result<bool, DatabaseError> {
        rule_repo::delete(self, id)
    }

    fn set_rule_active(&self, id: &str, active: bool) -> Result<bool, DatabaseError> {
        rule_repo::set_active(self, id, active)
    }
}

impl PositionStore for Database {
    fn position_for_sku(&self, sku: &str) -> Result<Option<SkuPosition>, DatabaseError> {
        position_repo::find_by_sku(self, sku)
    }

    fn list_positions(&self) -> Result<Vec<SkuPosition>, DatabaseError> {
        position_repo::list_all(self)
    }

    fn upsert_position(
        &self,
        sku: &str,
        x: f64,
        y: f64,
        font_size: f64,
    ) -> Result<SkuPosition, DatabaseError> {
        position_repo::upsert(self, sku, x, y, font_size)
    }

    fn delete_position(&self, id: &str) -> Result<bool, DatabaseError> {
        position_repo::delete(self, id)
    }
}

impl OrderStore for Database {
    fn insert_orders(&self, items: &[OrderItem]) -> Result<(), DatabaseError> {
        order_repo::insert_many(self, items)
    }

    fn find_order(&self, id: &str) -> Result<Option<OrderItem>, DatabaseError> {
        order_repo::find_by_id(self, id)
    }

    fn orders_for_session(&self, session_id: &str) -> Result<Vec<OrderItem>, DatabaseError> {
        order_repo::list_by_session(self, session_id)
    }

    fn set_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        saved_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        order_repo::update_status(self, id, status, saved_at)
    }

    fn count_orders_with_status(
        &self,
        session_id: &str,
        status: OrderStatus,
    ) -> Result<u32, DatabaseError> {
        order_repo::count_by_status(self, session_id, status)
    }
}

impl SessionStore for Database {
    fn insert_session(&self, session: &ProcessingSession) -> Result<(), DatabaseError> {
        session_repo::insert(self, session)
    }

    fn update_session(&self, session: &ProcessingSession) -> Result<(), DatabaseError> {
        session_repo::update(self, session)
    }

    fn find_session(&self, id: &str) -> Result<Option<ProcessingSession>, DatabaseError> {
        session_repo::find_by_id(self, id)
    }

    fn recent_sessions(&self, limit: u32) -> Result<Vec<ProcessingSession>, DatabaseError> {
        session_repo::list_recent(self, limit)
    }

    fn latest_in_progress_session(&self) -> Result<Option<ProcessingSession>, DatabaseError> {
        session_repo::latest_in_progress(self)
    }
}

impl SettingsStore for Database {
    fn load_settings(&self) -> Result<AppSettings, DatabaseError> {
        settings_repo::load(self)
    }

    fn save_settings(&self, settings: &AppSettings) -> Result<(), DatabaseError> {
        settings_repo::save(self, settings)
    }
}

impl ColumnMappingStore for Database {
    fn load_mapping(&self) -> Result<Option<ColumnMapping>, DatabaseError> {
        mapping_repo::load(self)
    }

    fn save_mapping(&self, mapping: &ColumnMapping) -> Result<(), DatabaseError> {
        mapping_repo::save(self, mapping)
    }

    fn clear_mapping(&self) -> Result<(), DatabaseError> {
        mapping_repo::clear(self)
    }
}
