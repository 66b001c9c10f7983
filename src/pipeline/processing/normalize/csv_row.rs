use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use super::ExtractedFields;
use crate::common::error::Result;
use crate::pipeline::processing::datetime::{parse_date, parse_time, split_iso_datetime};
use crate::pipeline::processing::extractors::ExtractionSettings;
use crate::pipeline::processing::text::clean_text;

/// Columns read from an imported row; anything else is ignored
pub const RECOGNIZED_COLUMNS: &[&str] =
    &["title", "url", "description", "date", "time", "venue", "price"];

/// Map one CSV row onto extracted fields.
///
/// Column names match case-insensitively. Cells are trimmed and stripped of
/// wrapping quotes; a missing or blank cell is absent. The city is never read
/// from the row but looked up in venue, description and title.
pub fn fields_from_row(row: &HashMap<String, String>, settings: &ExtractionSettings) -> ExtractedFields {
    let cells: HashMap<String, &str> = row
        .iter()
        .map(|(column, value)| (column.trim().to_lowercase(), value.as_str()))
        .filter(|(column, _)| RECOGNIZED_COLUMNS.contains(&column.as_str()))
        .collect();
    let cell = |name: &str| cells.get(name).and_then(|value| clean_cell(value));

    let raw_date = cell("date");
    let iso = raw_date.as_deref().and_then(split_iso_datetime);
    let date = raw_date
        .as_deref()
        .and_then(|text| parse_date(text, &settings.date_formats))
        .or(iso.map(|(date, _)| date));
    let time = cell("time")
        .as_deref()
        .and_then(parse_time)
        .or(iso.and_then(|(_, time)| time));

    let title = cell("title");
    let venue = cell("venue");
    let description = cell("description");

    let city_text = [venue.as_deref(), description.as_deref(), title.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let city = settings.cities.find(&city_text);

    ExtractedFields {
        title,
        url: cell("url"),
        date,
        time,
        venue,
        city,
        price: cell("price"),
        description,
    }
}

/// Read every row of a CSV file as a column-to-cell map.
///
/// Rows that fail to decode are logged and skipped; only an unreadable file
/// is an error.
pub fn read_rows(path: impl AsRef<Path>) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path.as_ref())?;

    let mut rows = Vec::new();
    for (line, record) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping unreadable CSV row {}: {}", line + 1, e),
        }
    }
    Ok(rows)
}

fn clean_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| trimmed.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(trimmed);
    clean_text(unquoted)
}
