//! Sheet loading entrypoints and implementations.
//!
//! Most callers should use [`read_sheet_from_path`] (from [`unified`]) which:
//!
//! - auto-detects format by file extension (or you can override via [`SheetOptions`])
//! - loads the rows into an in-memory [`crate::types::Sheet`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (requires the `excel` feature)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{read_sheet_from_path, ExcelSheetSelection, SheetFormat, SheetOptions};
