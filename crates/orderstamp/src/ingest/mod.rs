//! CSV ingestion: header-driven parsing, column mapping and order classification.

pub mod classify;
pub mod reader;

pub use classify::{extract_image_urls, is_customized, title_is_customized};
pub use reader::{
    accept_csv_filename, parse, parse_count, parse_headers, to_order_items, validate_rows, CsvRow,
    ResolvedColumns,
};
