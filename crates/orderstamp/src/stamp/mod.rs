//! Order-number stamping on the first page of a design PDF.

pub mod pdf;

pub use pdf::{first_page_size, screen_to_pdf_y, stamp, STAMP_FONT};
