//! Session orchestration: the explicit in-memory state and the service that
//! ties ingestion, placement and persistence together.

mod admin;
pub mod filter;
pub mod service;
pub mod state;

pub use filter::{OrderFilter, OrderQuery, OrderStats, SkuFamily};
pub use service::{is_pdf, validate_position, SessionService, DEFAULT_X, DEFAULT_Y};
pub use state::{Action, AppState, OrderWithTabs};
