use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::ingest::classify::is_customized;
use crate::models::{ColumnMapping, OrderItem, OrderStatus};
use crate::tabs::{requested_tab_count, MAX_TABS_PER_ORDER};

/// One CSV row, still as text, keyed by logical field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvRow {
    pub id: String,
    pub order_number: String,
    pub sku: String,
    pub title: String,
    pub quantity: String,
    pub number_of_lines: String,
    pub customer_note: String,
    pub additional_options: String,
}

/// Header names actually used for each logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub id: String,
    pub order_number: String,
    pub sku: String,
    pub title: String,
    pub quantity: String,
    pub number_of_lines: String,
    pub customer_note: String,
    pub additional_options: String,
}

impl Default for ResolvedColumns {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            order_number: "order_number".to_string(),
            sku: "sku".to_string(),
            title: "title".to_string(),
            quantity: "quantity".to_string(),
            number_of_lines: "number_of_lines".to_string(),
            customer_note: "customer_note".to_string(),
            additional_options: "additional_options".to_string(),
        }
    }
}

impl ResolvedColumns {
    /// Applies a stored mapping over the defaults. Blank entries keep the default.
    pub fn from_mapping(mapping: Option<&ColumnMapping>) -> Self {
        let defaults = Self::default();
        let Some(mapping) = mapping else {
            return defaults;
        };

        fn pick(custom: &Option<String>, default: String) -> String {
            match custom {
                Some(name) if !name.trim().is_empty() => name.clone(),
                _ => default,
            }
        }

        Self {
            id: pick(&mapping.external_id_column, defaults.id),
            order_number: pick(&mapping.order_number_column, defaults.order_number),
            sku: pick(&mapping.sku_column, defaults.sku),
            title: pick(&mapping.title_column, defaults.title),
            quantity: pick(&mapping.quantity_column, defaults.quantity),
            number_of_lines: pick(&mapping.number_of_lines_column, defaults.number_of_lines),
            customer_note: pick(&mapping.customer_note_column, defaults.customer_note),
            additional_options: pick(
                &mapping.additional_options_column,
                defaults.additional_options,
            ),
        }
    }
}

/// Rejects anything that is not named like a CSV file.
pub fn accept_csv_filename(filename: &str) -> Result<(), IngestError> {
    if filename.to_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(IngestError::NotCsv(filename.to_string()))
    }
}

/// Parses CSV text into rows, reading each logical field from its mapped header.
///
/// Missing cells read as empty text; an empty quantity or line count reads as `"1"`.
/// Rows whose cells are all blank are skipped.
pub fn parse(csv_text: &str, mapping: Option<&ColumnMapping>) -> Result<Vec<CsvRow>, IngestError> {
    let columns = ResolvedColumns::from_mapping(mapping);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, header) in reader.headers()?.iter().enumerate() {
        index.entry(header.to_string()).or_insert(i);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let field = |header: &str| -> String {
            index
                .get(header)
                .and_then(|&i| record.get(i))
                .unwrap_or("")
                .to_string()
        };
        let count_field = |header: &str| -> String {
            let value = field(header);
            if value.is_empty() {
                "1".to_string()
            } else {
                value
            }
        };

        rows.push(CsvRow {
            id: field(&columns.id),
            order_number: field(&columns.order_number),
            sku: field(&columns.sku),
            title: field(&columns.title),
            quantity: count_field(&columns.quantity),
            number_of_lines: count_field(&columns.number_of_lines),
            customer_note: field(&columns.customer_note),
            additional_options: field(&columns.additional_options),
        });
    }

    Ok(rows)
}

/// Reads only the header row, for building a column mapping.
pub fn parse_headers(csv_text: &str) -> Result<Vec<String>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Rejects an empty import, one whose first row lacks id, order number or
/// SKU, and any row asking for more than [`MAX_TABS_PER_ORDER`] designs.
pub fn validate_rows(rows: &[CsvRow], mapping: Option<&ColumnMapping>) -> Result<(), IngestError> {
    let first = rows.first().ok_or(IngestError::Empty)?;
    let columns = ResolvedColumns::from_mapping(mapping);

    let missing: Vec<&str> = [
        (first.id.as_str(), columns.id.as_str()),
        (first.order_number.as_str(), columns.order_number.as_str()),
        (first.sku.as_str(), columns.sku.as_str()),
    ]
    .into_iter()
    .filter(|(value, _)| value.is_empty())
    .map(|(_, header)| header)
    .collect();

    if !missing.is_empty() {
        return Err(IngestError::MissingRequiredColumns {
            missing: missing.join(", "),
        });
    }

    for (index, row) in rows.iter().enumerate() {
        let count = requested_tab_count(
            &row.sku,
            i64::from(parse_count(&row.quantity)),
            i64::from(parse_count(&row.number_of_lines)),
        );
        if count > MAX_TABS_PER_ORDER {
            return Err(IngestError::TooManyDesigns {
                row: index + 1,
                order_id: row.id.clone(),
                count,
            });
        }
    }
    Ok(())
}

/// Reads a count the way a lenient integer parse would: leading digits only,
/// anything missing, invalid or below 1 becomes 1.
pub fn parse_count(text: &str) -> u32 {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let leading: String = digits.chars().take_while(|c| c.is_ascii_digit()).collect();

    match leading.parse::<u64>() {
        Ok(n) if !negative && n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Builds pending order items for a session from parsed rows.
pub fn to_order_items(rows: &[CsvRow], session_id: &str) -> Vec<OrderItem> {
    rows.iter()
        .map(|row| {
            let now = Utc::now();
            OrderItem {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                external_id: row.id.clone(),
                order_number: row.order_number.clone(),
                sku: row.sku.clone(),
                product_title: row.title.clone(),
                quantity: parse_count(&row.quantity),
                number_of_lines: parse_count(&row.number_of_lines),
                customer_note: row.customer_note.clone(),
                additional_options: row.additional_options.clone(),
                is_customized: is_customized(&row.title, &row.customer_note),
                status: OrderStatus::Pending,
                saved_at: None,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}
