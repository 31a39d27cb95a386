//! CSV loading.

use std::io::Read;
use std::path::Path;

use crate::error::MappingResult;
use crate::types::{Heading, Sheet};

/// Load a CSV file into an in-memory [`Sheet`].
///
/// When `has_heading` is set, the first record becomes the sheet [`Heading`].
pub fn read_csv_from_path(path: impl AsRef<Path>, has_heading: bool) -> MappingResult<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_heading)
        .flexible(true)
        .from_path(path)?;
    read_csv_from_reader(&mut rdr)
}

/// Load CSV data from an existing CSV reader.
///
/// The reader's own `has_headers` setting decides whether a heading is read. Empty fields are
/// stored as absent cells; everything else is kept verbatim, whitespace included.
pub fn read_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> MappingResult<Sheet> {
    let heading = if rdr.has_headers() {
        Some(Heading::new(rdr.headers()?.iter()))
    } else {
        None
    };

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }

    tracing::debug!(rows = rows.len(), has_heading = heading.is_some(), "csv sheet loaded");
    Ok(Sheet::new(heading, rows))
}
