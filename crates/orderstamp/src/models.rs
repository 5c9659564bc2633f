//! Domain records shared by the store, the placement layer and the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of one order row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Uploaded,
    Saved,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Uploaded => "uploaded",
            OrderStatus::Saved => "saved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "uploaded" => Some(OrderStatus::Uploaded),
            "saved" => Some(OrderStatus::Saved),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one CSV import run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(SessionStatus::InProgress),
            "completed" => Some(SessionStatus::Completed),
            "abandoned" => Some(SessionStatus::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One CSV row after ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    pub session_id: String,
    /// Order identifier from the source CSV; names the output files.
    pub external_id: String,
    pub order_number: String,
    pub sku: String,
    pub product_title: String,
    pub quantity: u32,
    pub number_of_lines: u32,
    pub customer_note: String,
    pub additional_options: String,
    pub is_customized: bool,
    pub status: OrderStatus,
    pub saved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One CSV import run and its completion counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingSession {
    pub id: String,
    pub csv_filename: String,
    pub total_orders: u32,
    pub completed_orders: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl ProcessingSession {
    pub fn new(csv_filename: &str, total_orders: u32) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            csv_filename: csv_filename.to_string(),
            total_orders,
            completed_orders: 0,
            started_at: now,
            completed_at: None,
            status: SessionStatus::InProgress,
            created_at: now,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::InProgress
    }
}

/// Pattern -> folder mapping used to decide where stamped files go.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingRule {
    pub id: String,
    pub pattern: String,
    pub folder_name: String,
    /// Lower value wins.
    pub priority: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoutingRule {
    pub fn new(pattern: &str, folder_name: &str, priority: i32) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pattern: pattern.to_string(),
            folder_name: folder_name.to_string(),
            priority,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Remembered stamp coordinates for a SKU. One row per SKU.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkuPosition {
    pub id: String,
    pub sku: String,
    pub x_position: f64,
    pub y_position: f64,
    pub font_size: f64,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Header names for the eight logical CSV fields. `None` or blank entries
/// fall back to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMapping {
    pub external_id_column: Option<String>,
    pub order_number_column: Option<String>,
    pub sku_column: Option<String>,
    pub title_column: Option<String>,
    pub quantity_column: Option<String>,
    pub number_of_lines_column: Option<String>,
    pub customer_note_column: Option<String>,
    pub additional_options_column: Option<String>,
}

/// Folder settings stored as key/value rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    /// Base folder stamped files are routed under.
    pub date_folder_path: String,
    /// Folder holding ready-made designs.
    pub premade_folder_path: String,
}

pub const DATE_FOLDER_KEY: &str = "date_folder_path";
pub const PREMADE_FOLDER_KEY: &str = "premade_folder_path";
