//! Raw sheet data model.
//!
//! The mapping pipeline only ever sees a sheet through [`RawCellSource`]: raw text for one column
//! of the current row, the column count, and (optionally) a [`Heading`] that resolves header names
//! to column indices. [`Sheet`] is an in-memory implementation filled by the loaders in
//! [`crate::ingestion`] or built directly from strings.

use std::collections::HashMap;

/// Header names of a sheet, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Heading {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Heading {
    /// Create a heading from header names in column order.
    ///
    /// Names are stored as given. If a name repeats, the first column with that name is the one
    /// returned by [`Heading::index_of`].
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    /// Column index of `name` (exact match).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Header name of `column`, if the heading has that many columns.
    pub fn name(&self, column: usize) -> Option<&str> {
        self.names.get(column).map(String::as_str)
    }

    /// Iterate header names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of header cells.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the heading has no cells.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Access to the raw cells of the row currently being mapped.
pub trait RawCellSource {
    /// 1-based row number used in error messages.
    fn row_number(&self) -> usize;

    /// Number of columns in the sheet. Index-based selectors are range-checked against this.
    fn column_count(&self) -> usize;

    /// Raw text of `column`, or `None` if the cell is absent.
    fn raw(&self, column: usize) -> Option<&str>;

    /// The sheet heading, if one has been read.
    fn heading(&self) -> Option<&Heading>;

    /// Returns `true` once a heading row has been read.
    fn heading_loaded(&self) -> bool {
        self.heading().is_some()
    }
}

/// In-memory sheet: an optional heading plus rows of raw cell text.
///
/// The column count is computed once when the sheet is built, so borrowing a row is O(1).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    heading: Option<Heading>,
    /// Row-major raw cells. `None` marks a cell that is absent in the source.
    rows: Vec<Vec<Option<String>>>,
    /// 1-based row number of the first data row (used for error messages).
    first_row_number: usize,
    column_count: usize,
}

impl Sheet {
    /// Create a sheet from a heading and raw rows.
    ///
    /// The first data row is numbered 2 when a heading is present and 1 otherwise.
    pub fn new(heading: Option<Heading>, rows: Vec<Vec<Option<String>>>) -> Self {
        let first_row_number = if heading.is_some() { 2 } else { 1 };
        let widest_row = rows.iter().map(Vec::len).max().unwrap_or(0);
        let column_count = heading.as_ref().map(Heading::len).unwrap_or(0).max(widest_row);
        Self {
            heading,
            rows,
            first_row_number,
            column_count,
        }
    }

    /// Number the first data row `number` instead, e.g. when the table starts lower in a workbook.
    pub fn with_first_row_number(mut self, number: usize) -> Self {
        self.first_row_number = number;
        self
    }

    /// Convenience constructor from string slices. Every cell is present.
    pub fn from_strings(heading: Option<&[&str]>, rows: &[&[&str]]) -> Self {
        let heading = heading.map(|names| Heading::new(names.iter().copied()));
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|c| Some((*c).to_string())).collect())
            .collect();
        Self::new(heading, rows)
    }

    /// Header names, if the sheet has a heading row.
    pub fn heading(&self) -> Option<&Heading> {
        self.heading.as_ref()
    }

    /// 1-based row number of the first data row.
    pub fn first_row_number(&self) -> usize {
        self.first_row_number
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count: the widest of the heading and every data row.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Borrow data row `idx0` (0-based) as a [`RawCellSource`].
    pub fn row(&self, idx0: usize) -> Option<RawRow<'_>> {
        self.rows.get(idx0).map(|cells| self.raw_row(idx0, cells))
    }

    /// Iterate data rows in order.
    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(move |(idx0, cells)| self.raw_row(idx0, cells))
    }

    fn raw_row<'a>(&'a self, idx0: usize, cells: &'a [Option<String>]) -> RawRow<'a> {
        RawRow {
            number: self.first_row_number + idx0,
            cells,
            column_count: self.column_count,
            heading: self.heading.as_ref(),
        }
    }
}

/// One borrowed row of a [`Sheet`].
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    number: usize,
    cells: &'a [Option<String>],
    column_count: usize,
    heading: Option<&'a Heading>,
}

impl<'a> RawRow<'a> {
    /// Build a row view over borrowed cells.
    pub fn new(
        number: usize,
        cells: &'a [Option<String>],
        column_count: usize,
        heading: Option<&'a Heading>,
    ) -> Self {
        Self {
            number,
            cells,
            column_count: column_count.max(cells.len()),
            heading,
        }
    }
}

impl RawCellSource for RawRow<'_> {
    fn row_number(&self) -> usize {
        self.number
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn raw(&self, column: usize) -> Option<&str> {
        self.cells.get(column).and_then(|c| c.as_deref())
    }

    fn heading(&self) -> Option<&Heading> {
        self.heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_count_is_widest_of_heading_and_rows() {
        let sheet = Sheet::from_strings(Some(&["a", "b"]), &[&["1", "2", "3"], &["4"]]);
        assert_eq!(sheet.column_count(), 3);

        let row = sheet.row(1).unwrap();
        assert_eq!(row.row_number(), 3);
        assert_eq!(row.column_count(), 3);
        assert_eq!(row.raw(0), Some("4"));
        assert_eq!(row.raw(2), None);
    }

    #[test]
    fn heading_keeps_first_duplicate() {
        let heading = Heading::new(["x", "y", "x"]);
        assert_eq!(heading.index_of("x"), Some(0));
        assert_eq!(heading.name(2), Some("x"));
        assert_eq!(heading.index_of("z"), None);
    }

    #[test]
    fn row_and_rows_agree() {
        let sheet = Sheet::from_strings(Some(&["a"]), &[&["1"], &["2", "3"]])
            .with_first_row_number(5);
        assert_eq!(sheet.first_row_number(), 5);
        assert_eq!(sheet.column_count(), 2);
        for (idx0, row) in sheet.rows().enumerate() {
            let single = sheet.row(idx0).unwrap();
            assert_eq!(single.row_number(), row.row_number());
            assert_eq!(single.column_count(), 2);
            assert_eq!(single.raw(0), row.raw(0));
        }
        assert_eq!(sheet.row(1).unwrap().row_number(), 6);
        assert!(sheet.row(2).is_none());
    }

    #[test]
    fn rows_without_heading_start_at_one() {
        let sheet = Sheet::from_strings(None, &[&["1"], &["2"]]);
        let numbers: Vec<usize> = sheet.rows().map(|r| r.row_number()).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(!sheet.row(0).unwrap().heading_loaded());
    }
}
