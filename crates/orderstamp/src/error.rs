use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderstampError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("CSV import error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Stamping error: {0}")]
    Stamp(#[from] StampError),

    #[error("File bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Please upload a CSV file (got '{0}')")]
    NotCsv(String),

    #[error("CSV file is empty")]
    Empty,

    #[error("CSV file is missing required columns ({missing}). Please check your column mapping")]
    MissingRequiredColumns { missing: String },

    #[error(
        "Row {row} (order '{order_id}') asks for {count} designs; at most {} per order are supported",
        crate::tabs::MAX_TABS_PER_ORDER
    )]
    TooManyDesigns {
        row: usize,
        order_id: String,
        count: i64,
    },

    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("'{0}' is not a PDF file")]
    NotPdf(String),

    #[error("Font size {0} is outside the allowed range 8-72")]
    FontSize(f64),

    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Pattern and folder name are required")]
    MissingRuleFields,

    #[error("Invalid folder name '{name}': {reason}")]
    InvalidFolderName { name: String, reason: String },

    #[error("Order '{0}' is not part of the current session")]
    UnknownOrder(String),

    #[error("Tab '{tab_id}' does not exist on order '{order_id}'")]
    UnknownTab { order_id: String, tab_id: String },

    #[error("No active session")]
    NoSession,

    #[error("Path '{0}' does not exist")]
    PathNotFound(String),
}

#[derive(Error, Debug)]
pub enum StampError {
    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("PDF has no pages")]
    NoPages,

    #[error("Malformed PDF structure: {0}")]
    Malformed(String),

    #[error("Invalid stamp position: {0}")]
    InvalidPosition(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),
}

/// Failure reported by the host file bridge. The message is surfaced verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BridgeError {
    pub message: String,
}

impl BridgeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Date folder path not configured. Please configure it in Settings.")]
    BaseFolderNotConfigured,

    #[error("No routing rule found for SKU: {sku}")]
    NoRoute { sku: String },

    #[error("Order is not ready to save: {}", .reasons.join("; "))]
    IncompleteTabs { reasons: Vec<String> },

    #[error("File save cancelled by user ({filename} already exists in {folder})")]
    Cancelled { filename: String, folder: String },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to save file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to stamp tab '{label}': {source}")]
    Stamp {
        label: String,
        #[source]
        source: StampError,
    },

    #[error("Invalid routing target: {0}")]
    InvalidTarget(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] crate::db::DatabaseError),
}

pub type Result<T> = std::result::Result<T, OrderstampError>;
