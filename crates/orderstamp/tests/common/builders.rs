//! Builders for fixture CSV text and PDF bytes.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};

pub const HEADER: &str =
    "id,order_number,sku,title,quantity,number_of_lines,customer_note,additional_options";

/// Builder for order CSVs with the default headers.
#[derive(Default)]
pub struct CsvBuilder {
    rows: Vec<String>,
}

impl CsvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(mut self, id: &str, sku: &str, title: &str, quantity: u32) -> Self {
        self.rows
            .push(format!("{},#{},{},{},{},1,,", id, id, sku, title, quantity));
        self
    }

    pub fn row(mut self, raw: &str) -> Self {
        self.rows.push(raw.to_string());
        self
    }

    pub fn build(self) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        for row in self.rows {
            out.push_str(&row);
            out.push('\n');
        }
        out
    }
}

/// Builder for minimal PDFs with blank pages.
pub struct PdfBuilder {
    width: i64,
    height: i64,
    pages: usize,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            width: 595,
            height: 842,
            pages: 1,
        }
    }

    pub fn size(mut self, width: i64, height: i64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn pages(mut self, pages: usize) -> Self {
        self.pages = pages;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let kids: Vec<Object> = (0..self.pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                });
                Object::Reference(page_id)
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), self.width.into(), self.height.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("fixture PDF should serialize");
        buf
    }
}

/// Text shown with `Tj` on the first page, with the `Td` offset before it.
pub fn first_page_text(pdf: &[u8]) -> Vec<(String, f32, f32)> {
    let doc = Document::load_mem(pdf).expect("stamped PDF should load");
    let page_id = *doc.get_pages().get(&1).expect("first page");
    let content = Content::decode(&doc.get_page_content(page_id).expect("page content"))
        .expect("content should decode");

    let mut shown = Vec::new();
    let mut offset = (0.0, 0.0);
    for op in &content.operations {
        match op.operator.as_str() {
            "Td" => {
                let coord = |i: usize| op.operands[i].as_float().unwrap_or(0.0);
                offset = (coord(0), coord(1));
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    shown.push((
                        String::from_utf8_lossy(bytes).into_owned(),
                        offset.0,
                        offset.1,
                    ));
                }
            }
            _ => {}
        }
    }
    shown
}
