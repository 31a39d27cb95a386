#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::error::{MappingError, MappingResult};
use crate::types::{Heading, Sheet};

/// Load one sheet of a workbook (`.xlsx`, `.xls`, `.ods`, etc.) into an in-memory [`Sheet`].
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - With `has_heading`, the first non-empty row is the heading and data starts below it
/// - Cells become their text form; dates become spreadsheet serial numbers
pub fn read_excel_from_path(
    path: impl AsRef<Path>,
    sheet_name: Option<&str>,
    has_heading: bool,
) -> MappingResult<Sheet> {
    let mut workbook = open_workbook_auto(path)?;
    let name = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| MappingError::InvalidSheet {
                message: "workbook has no sheets".to_string(),
            })?,
    };
    let range = workbook.worksheet_range(&name)?;
    let sheet = sheet_from_range(&range, has_heading).map_err(|e| match e {
        MappingError::InvalidSheet { message } => MappingError::InvalidSheet {
            message: format!("sheet '{name}': {message}"),
        },
        other => other,
    })?;
    tracing::debug!(sheet = %name, rows = sheet.row_count(), "workbook sheet loaded");
    Ok(sheet)
}

fn sheet_from_range(range: &Range<Data>, has_heading: bool) -> MappingResult<Sheet> {
    // Rows are reported with 1-based numbers as the workbook shows them.
    let origin = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let header_idx0 = if has_heading {
        let idx0 = range
            .rows()
            .position(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
            .ok_or_else(|| MappingError::InvalidSheet {
                message: "sheet has no non-empty rows (no header row found)".to_string(),
            })?;
        Some(idx0)
    } else {
        None
    };

    let heading = header_idx0.and_then(|idx0| {
        range
            .rows()
            .nth(idx0)
            .map(|row| Heading::new(row.iter().map(cell_to_header_string)))
    });
    let skip = header_idx0.map(|idx0| idx0 + 1).unwrap_or(0);
    let rows = range
        .rows()
        .skip(skip)
        .map(|row| row.iter().map(cell_to_text).collect())
        .collect();

    Ok(Sheet::new(heading, rows).with_first_row_number(origin + skip + 1))
}

fn cell_to_header_string(c: &Data) -> String {
    cell_to_text(c).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn cell_to_text(c: &Data) -> Option<String> {
    match c {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_text_forms() {
        assert_eq!(cell_to_text(&Data::Empty), None);
        assert_eq!(cell_to_text(&Data::String(String::new())), None);
        assert_eq!(cell_to_text(&Data::Float(2.0)).as_deref(), Some("2"));
        assert_eq!(cell_to_text(&Data::Float(2.5)).as_deref(), Some("2.5"));
        assert_eq!(cell_to_text(&Data::Int(7)).as_deref(), Some("7"));
        assert_eq!(cell_to_text(&Data::Bool(true)).as_deref(), Some("true"));
        assert_eq!(cell_to_header_string(&Data::String(" Name ".to_string())), "Name");
    }
}
