use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::StampError;
use crate::tabs::StampPosition;

/// Standard 14 font used for every stamp.
pub const STAMP_FONT: &str = "Helvetica-Bold";

/// Resource name prefix for the stamp font on a page.
const FONT_RESOURCE_PREFIX: &str = "FStamp";

/// Parent chains deeper than this are treated as malformed.
const MAX_INHERITANCE_DEPTH: usize = 64;

/// Converts a screen-space y (from the top of the page) into PDF space (from the bottom).
pub fn screen_to_pdf_y(page_height: f64, screen_y: f64) -> f64 {
    page_height - screen_y
}

/// Width and height of the first page, from its (possibly inherited) MediaBox.
pub fn first_page_size(pdf_bytes: &[u8]) -> Result<(f64, f64), StampError> {
    let doc = Document::load_mem(pdf_bytes).map_err(|e| StampError::Load(e.to_string()))?;
    let page_id = first_page_id(&doc)?;
    page_dimensions(&doc, page_id)
}

/// Draws `text` on the first page at `position` and returns the new document.
///
/// The text uses Helvetica-Bold in solid black. Existing page content is
/// wrapped in `q`/`Q` so its graphics state cannot move the stamp; other
/// pages are untouched.
pub fn stamp(pdf_bytes: &[u8], text: &str, position: &StampPosition) -> Result<Vec<u8>, StampError> {
    let _span = tracing::debug_span!("stamp.pdf", bytes = pdf_bytes.len()).entered();

    validate_position(position)?;

    let mut doc = Document::load_mem(pdf_bytes).map_err(|e| StampError::Load(e.to_string()))?;
    let page_id = first_page_id(&doc)?;
    let (_, page_height) = page_dimensions(&doc, page_id)?;

    let pdf_x = position.x;
    let pdf_y = screen_to_pdf_y(page_height, position.y);

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => STAMP_FONT,
        "Encoding" => "WinAnsiEncoding",
    });

    let mut resources = inherited_resources(&doc, page_id)?;
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(|o| o.as_dict())
            .map_err(|e| StampError::Malformed(format!("font resources: {}", e)))?
            .clone(),
        Ok(_) => {
            return Err(StampError::Malformed(
                "font resources are not a dictionary".to_string(),
            ))
        }
        Err(_) => Dictionary::new(),
    };
    let font_name = unused_font_name(&fonts);
    fonts.set(font_name.as_bytes().to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let existing = existing_contents(&doc, page_id)?;
    let wraps_existing = !existing.is_empty();

    let mut operations = Vec::new();
    if wraps_existing {
        operations.push(Operation::new("Q", vec![]));
    }
    operations.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "rg",
            vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(font_name.as_bytes().to_vec()),
                Object::Real(position.font_size as f32),
            ],
        ),
        Operation::new(
            "Td",
            vec![Object::Real(pdf_x as f32), Object::Real(pdf_y as f32)],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]);
    let stamp_bytes = Content { operations }
        .encode()
        .map_err(|e| StampError::Save(e.to_string()))?;
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), stamp_bytes));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if wraps_existing {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
    }
    contents.push(Object::Reference(stamp_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| StampError::Malformed(format!("page dictionary: {}", e)))?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| StampError::Save(e.to_string()))?;

    tracing::debug!(pdf_x, pdf_y, font_size = position.font_size, "Stamped first page");
    Ok(out)
}

fn validate_position(position: &StampPosition) -> Result<(), StampError> {
    if !position.x.is_finite() || !position.y.is_finite() {
        return Err(StampError::InvalidPosition(format!(
            "coordinates must be finite (x={}, y={})",
            position.x, position.y
        )));
    }
    if !position.font_size.is_finite() || position.font_size <= 0.0 {
        return Err(StampError::InvalidPosition(format!(
            "font size must be positive, got {}",
            position.font_size
        )));
    }
    Ok(())
}

fn first_page_id(doc: &Document) -> Result<ObjectId, StampError> {
    doc.get_pages()
        .into_iter()
        .next()
        .map(|(_, id)| id)
        .ok_or(StampError::NoPages)
}

/// Page size from MediaBox, walking up `Parent` links when the page inherits it.
fn page_dimensions(doc: &Document, page_id: ObjectId) -> Result<(f64, f64), StampError> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        if depth > MAX_INHERITANCE_DEPTH {
            break;
        }
        depth += 1;

        let dict = doc
            .get_object(id)
            .and_then(|o| o.as_dict())
            .map_err(|e| StampError::Malformed(format!("page tree node: {}", e)))?;
        if let Some(size) = media_box_size(doc, dict) {
            return Ok(size);
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    Err(StampError::Malformed("first page has no MediaBox".to_string()))
}

fn media_box_size(doc: &Document, dict: &Dictionary) -> Option<(f64, f64)> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = number(&arr[0])?;
    let lly = number(&arr[1])?;
    let urx = number(&arr[2])?;
    let ury = number(&arr[3])?;
    Some(((urx - llx).abs(), (ury - lly).abs()))
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// The page's effective resources as an owned dictionary. Inherited
/// resources are copied onto the page so adding a font does not touch
/// other pages.
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, StampError> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        if depth > MAX_INHERITANCE_DEPTH {
            break;
        }
        depth += 1;

        let dict = doc
            .get_object(id)
            .and_then(|o| o.as_dict())
            .map_err(|e| StampError::Malformed(format!("page tree node: {}", e)))?;
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(res)) => return Ok(res.clone()),
            Ok(Object::Reference(res_id)) => {
                let res = doc
                    .get_object(*res_id)
                    .and_then(|o| o.as_dict())
                    .map_err(|e| StampError::Malformed(format!("page resources: {}", e)))?;
                return Ok(res.clone());
            }
            Ok(_) => {
                return Err(StampError::Malformed(
                    "page resources are not a dictionary".to_string(),
                ))
            }
            Err(_) => {}
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    Ok(Dictionary::new())
}

/// Content stream references of the page, flattened to a list.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, StampError> {
    let page = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| StampError::Malformed(format!("page dictionary: {}", e)))?;

    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(_) => Ok(vec![Object::Reference(*id)]),
            Err(e) => Err(StampError::Malformed(format!("page contents: {}", e))),
        },
        Ok(Object::Array(items)) => Ok(items.clone()),
        Ok(_) => Err(StampError::Malformed(
            "page contents are neither a stream nor an array".to_string(),
        )),
        Err(_) => Ok(Vec::new()),
    }
}

fn unused_font_name(fonts: &Dictionary) -> String {
    let mut counter = 0;
    loop {
        let name = if counter == 0 {
            FONT_RESOURCE_PREFIX.to_string()
        } else {
            format!("{}{}", FONT_RESOURCE_PREFIX, counter)
        };
        if !fonts.has(name.as_bytes()) {
            return name;
        }
        counter += 1;
    }
}

/// WinAnsiEncoding for the standard font. Printable ASCII and Latin-1 map to
/// themselves, the 0x80..=0x9F block holds typographic characters, and
/// anything else (control characters included) becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-page document; MediaBox and Resources live on the Pages node.
    fn sample_pdf(width: i64, height: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for label in ["first", "second"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(label)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn page_operations(pdf: &[u8], page_number: u32) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = *doc.get_pages().get(&page_number).unwrap();
        let bytes = doc.get_page_content(page_id).unwrap();
        Content::decode(&bytes).unwrap().operations
    }

    fn stamp_td(ops: &[Operation]) -> (f32, f32) {
        let td = ops
            .iter()
            .filter(|op| op.operator == "Td")
            .last()
            .expect("Td operation");
        (
            td.operands[0].as_float().unwrap(),
            td.operands[1].as_float().unwrap(),
        )
    }

    #[test]
    fn test_screen_to_pdf_y() {
        assert_eq!(screen_to_pdf_y(800.0, 50.0), 750.0);
        assert_eq!(screen_to_pdf_y(842.0, 0.0), 842.0);
        assert_eq!(screen_to_pdf_y(842.0, 842.0), 0.0);
    }

    #[test]
    fn test_first_page_size_inherited() {
        let pdf = sample_pdf(600, 800);
        assert_eq!(first_page_size(&pdf).unwrap(), (600.0, 800.0));
    }

    #[test]
    fn test_stamp_flips_y() {
        let pdf = sample_pdf(600, 800);
        let out = stamp(&pdf, "1001", &StampPosition::new(40.0, 50.0, 14.0)).unwrap();

        let ops = page_operations(&out, 1);
        assert_eq!(stamp_td(&ops), (40.0, 750.0));

        let tj = ops.iter().filter(|op| op.operator == "Tj").last().unwrap();
        assert_eq!(tj.operands[0].as_str().unwrap(), b"1001");

        let tf = ops.iter().filter(|op| op.operator == "Tf").last().unwrap();
        assert_eq!(tf.operands[1].as_float().unwrap(), 14.0);
    }

    #[test]
    fn test_stamp_uses_bold_font_resource() {
        let pdf = sample_pdf(600, 800);
        let out = stamp(&pdf, "1001", &StampPosition::new(10.0, 10.0, 12.0)).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();

        // Original font is still available to the existing content.
        assert!(fonts.has(b"F1"));
        let stamp_font_id = fonts.get(b"FStamp").unwrap().as_reference().unwrap();
        let stamp_font = doc.get_object(stamp_font_id).unwrap().as_dict().unwrap();
        assert_eq!(
            stamp_font.get(b"BaseFont").unwrap().as_name().unwrap(),
            STAMP_FONT.as_bytes()
        );
    }

    #[test]
    fn test_existing_content_wrapped_and_preserved() {
        let pdf = sample_pdf(600, 800);
        let out = stamp(&pdf, "1001", &StampPosition::new(10.0, 10.0, 12.0)).unwrap();
        let ops = page_operations(&out, 1);

        let operators: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(operators.first(), Some(&"q"));
        assert_eq!(operators.last(), Some(&"Q"));
        let original = ops
            .iter()
            .find(|op| op.operator == "Tj")
            .and_then(|op| op.operands[0].as_str().ok())
            .unwrap();
        assert_eq!(original, b"first");
    }

    #[test]
    fn test_other_pages_untouched() {
        let pdf = sample_pdf(600, 800);
        let before = page_operations(&pdf, 2);
        let out = stamp(&pdf, "1001", &StampPosition::new(10.0, 10.0, 12.0)).unwrap();
        let after = page_operations(&out, 2);

        assert_eq!(before.len(), after.len());
        assert!(after.iter().all(|op| op.operator != "rg"));
    }

    #[test]
    fn test_same_position_same_placement() {
        let pdf = sample_pdf(595, 842);
        let position = StampPosition::new(72.5, 100.25, 20.0);
        let a = stamp(&pdf, "42", &position).unwrap();
        let b = stamp(&pdf.clone(), "42", &position).unwrap();
        assert_eq!(stamp_td(&page_operations(&a, 1)), stamp_td(&page_operations(&b, 1)));
    }

    #[test]
    fn test_restamp_picks_fresh_font_name() {
        let pdf = sample_pdf(600, 800);
        let once = stamp(&pdf, "1", &StampPosition::new(10.0, 10.0, 12.0)).unwrap();
        let twice = stamp(&once, "2", &StampPosition::new(20.0, 20.0, 12.0)).unwrap();

        let doc = Document::load_mem(&twice).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let fonts = page
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(fonts.has(b"FStamp"));
        assert!(fonts.has(b"FStamp1"));
    }

    #[test]
    fn test_garbage_input_is_an_error() {
        let result = stamp(b"not a pdf", "1", &StampPosition::new(0.0, 0.0, 12.0));
        assert!(matches!(result, Err(StampError::Load(_))));
    }

    #[test]
    fn test_invalid_position_rejected_before_load() {
        let result = stamp(b"not a pdf", "1", &StampPosition::new(0.0, 0.0, 0.0));
        assert!(matches!(result, Err(StampError::InvalidPosition(_))));

        let result = stamp(b"", "1", &StampPosition::new(f64::NAN, 0.0, 12.0));
        assert!(matches!(result, Err(StampError::InvalidPosition(_))));
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("A(1)"), b"A(1)".to_vec());
        assert_eq!(encode_win_ansi("é"), vec![0xE9]);
        assert_eq!(encode_win_ansi("✓"), vec![b'?']);
    }

    #[test]
    fn test_encode_win_ansi_typographic_block() {
        assert_eq!(encode_win_ansi("€5"), vec![0x80, b'5']);
        assert_eq!(
            encode_win_ansi("\u{201C}Mum\u{2019}s\u{201D}"),
            vec![0x93, b'M', b'u', b'm', 0x92, b's', 0x94]
        );
        assert_eq!(encode_win_ansi("Œ™"), vec![0x8C, 0x99]);
        // C1 and C0 controls are not valid WinAnsi text.
        assert_eq!(encode_win_ansi("a\u{85}b\u{9F}\n"), b"a?b??".to_vec());
    }

    #[test]
    fn test_parentheses_survive_round_trip() {
        let pdf = sample_pdf(600, 800);
        let out = stamp(&pdf, "#10(a)\\", &StampPosition::new(1.0, 1.0, 9.0)).unwrap();
        let ops = page_operations(&out, 1);
        let tj = ops.iter().filter(|op| op.operator == "Tj").last().unwrap();
        assert_eq!(tj.operands[0].as_str().unwrap(), b"#10(a)\\");
    }
}
