pub mod matcher;

pub use matcher::{resolve_folder, validate_rule, RouteResult, Router};
