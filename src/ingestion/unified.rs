//! Unified sheet loading entrypoint.
//!
//! Most callers should use [`read_sheet_from_path`], which loads a file into an in-memory
//! [`crate::types::Sheet`] ready for [`crate::mapping::RowMapper`].
//!
//! - If [`SheetOptions::format`] is `None`, the format is inferred from the file extension.

use std::path::Path;

use crate::error::{MappingError, MappingResult};
use crate::types::Sheet;

use super::csv;

/// Supported sheet formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet/workbook formats (feature-gated behind `excel`).
    Excel,
}

impl SheetFormat {
    /// Parse a sheet format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Which sheet of a workbook to load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExcelSheetSelection {
    /// The first sheet (default).
    #[default]
    First,
    /// A single named sheet.
    Sheet(String),
}

/// Options controlling sheet loading.
///
/// Use [`Default`] for common cases: format from the extension, first row is the heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetOptions {
    /// If `None`, detect the format from the file extension.
    pub format: Option<SheetFormat>,
    /// Read the first (non-empty) row as the heading.
    pub has_heading: bool,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            format: None,
            has_heading: true,
            excel_sheet_selection: ExcelSheetSelection::default(),
        }
    }
}

/// Load a sheet from a path.
///
/// # Examples
///
/// ```no_run
/// use sheet_mapper::ingestion::{read_sheet_from_path, SheetOptions};
///
/// # fn main() -> Result<(), sheet_mapper::MappingError> {
/// // Uses `.csv` to select CSV loading.
/// let sheet = read_sheet_from_path("people.csv", &SheetOptions::default())?;
/// println!("rows={}", sheet.row_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Force a format explicitly (override extension inference)
///
/// ```no_run
/// use sheet_mapper::ingestion::{read_sheet_from_path, SheetFormat, SheetOptions};
///
/// # fn main() -> Result<(), sheet_mapper::MappingError> {
/// let opts = SheetOptions {
///     format: Some(SheetFormat::Csv),
///     has_heading: false,
///     ..Default::default()
/// };
/// let sheet = read_sheet_from_path("input_without_extension", &opts)?;
/// println!("rows={}", sheet.row_count());
/// # Ok(())
/// # }
/// ```
///
/// ## Excel (feature-gated)
///
/// To load workbooks, enable the `excel` feature in your `Cargo.toml`:
///
/// ```toml
/// sheet-mapper = { path = ".", features = ["excel"] }
/// ```
pub fn read_sheet_from_path(path: impl AsRef<Path>, options: &SheetOptions) -> MappingResult<Sheet> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    match fmt {
        SheetFormat::Csv => csv::read_csv_from_path(path, options.has_heading),
        SheetFormat::Excel => read_excel_dispatch(path, options),
    }
}

fn infer_format_from_path(path: &Path) -> MappingResult<SheetFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MappingError::InvalidSheet {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    SheetFormat::from_extension(ext).ok_or_else(|| MappingError::InvalidSheet {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

fn read_excel_dispatch(path: &Path, options: &SheetOptions) -> MappingResult<Sheet> {
    // Avoid unused warnings when the feature is off.
    let _ = (path, options);

    #[cfg(feature = "excel")]
    {
        use super::excel;

        let name = match &options.excel_sheet_selection {
            ExcelSheetSelection::First => None,
            ExcelSheetSelection::Sheet(name) => Some(name.as_str()),
        };
        excel::read_excel_from_path(path, name, options.has_heading)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(MappingError::InvalidSheet {
            message: "excel loading not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(SheetFormat::from_extension("CSV"), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_extension("ods"), Some(SheetFormat::Excel));
        assert_eq!(SheetFormat::from_extension("json"), None);
    }

    #[test]
    fn unknown_extension_is_an_invalid_sheet() {
        let err = read_sheet_from_path("data.parquet", &SheetOptions::default()).unwrap_err();
        assert!(matches!(err, MappingError::InvalidSheet { .. }));
        let err = read_sheet_from_path("no_extension", &SheetOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no extension"));
    }
}
