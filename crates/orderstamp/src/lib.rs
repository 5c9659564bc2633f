pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod placement;
pub mod routing;
pub mod sanitize;
pub mod session;
pub mod sku;
pub mod stamp;
pub mod store;
pub mod tabs;

pub use bridge::{Dialogs, FileBridge, FileFilter, LocalFileBridge};
pub use broadcast::{SessionEvent, SessionEventBroadcaster, SessionEventKind};
pub use config::{load_config, load_config_or_default, Config};
pub use db::{Database, DatabaseError};
pub use error::{
    BridgeError, ConfigError, IngestError, OrderstampError, PlacementError, Result, StampError,
    ValidationError,
};
pub use models::{
    AppSettings, ColumnMapping, OrderItem, OrderStatus, ProcessingSession, RoutingRule,
    SessionStatus, SkuPosition,
};
pub use placement::{AlwaysOverwrite, NeverOverwrite, OverwritePrompt, PlacementReport};
pub use routing::{RouteResult, Router};
pub use session::{
    AppState, OrderFilter, OrderQuery, OrderStats, OrderWithTabs, SessionService, SkuFamily,
};
pub use store::Store;
pub use tabs::{StampPosition, UploadTab};
