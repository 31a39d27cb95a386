//! `sheet-mapper` reads rows of a spreadsheet (CSV or Excel) into strongly typed Rust values,
//! driven by per-field configuration rather than hand-written parsing code.
//!
//! The primary entrypoint is [`mapping::RowMapper`], which maps one row, or a whole
//! [`types::Sheet`], into a target type using a [`mapping::ClassMap`]. Maps are either declared
//! explicitly with a builder or derived by convention through the [`mapping::AutoMap`] trait.
//!
//! ## What a field can do
//!
//! - **Choose its column(s):** by index, by candidate indices, by header name, by candidate names,
//!   by a predicate/regex over header names, or by the member name (the default). Selectors are
//!   tried in order and the first that resolves wins.
//! - **Convert the cell:** integers, floats, `bool`, `char`, `String`, chrono dates and times
//!   (text formats or spreadsheet serial numbers), fieldless enums ([`cell_enum!`]), `Option<_>`
//!   of any of these, or a custom [`mapping::Converter`].
//! - **Recover from bad cells:** an empty fallback, an invalid fallback, an `optional` flag for
//!   missing columns, and a class-wide [`mapping::EmptyValueStrategy`].
//! - **Build collections:** split one cell (`"1,2,3"`) or read one element per column, into
//!   `Vec`, `VecDeque`, arrays, sets, heaps, or header-keyed maps.
//! - **Nest:** a member can be mapped from the same row through its own class map.
//!
//! ## Quick example: map a CSV
//!
//! ```rust
//! use sheet_mapper::ingestion::csv::read_csv_from_reader;
//! use sheet_mapper::mapping::{AutoMap, AutoMapper, RowMapper};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     id: u64,
//!     name: String,
//!     score: Option<f64>,
//! }
//!
//! impl AutoMap for Person {
//!     fn auto_map(map: &mut AutoMapper<'_, Self>) {
//!         map.scalar("id", |p| &mut p.id);
//!         map.scalar("name", |p| &mut p.name);
//!         map.scalar("score", |p| &mut p.score);
//!     }
//! }
//!
//! # fn main() -> Result<(), sheet_mapper::MappingError> {
//! let data = "id,name,score\n1,Ada,98.5\n2,Grace,\n";
//! let mut rdr = csv::ReaderBuilder::new().from_reader(data.as_bytes());
//! let sheet = read_csv_from_reader(&mut rdr)?;
//!
//! let mapper = RowMapper::new();
//! let people: Vec<Person> = mapper.map_sheet(&sheet)?.collect::<Result<_, _>>()?;
//! assert_eq!(people.len(), 2);
//! assert_eq!(people[1].score, None);
//! # Ok(())
//! # }
//! ```
//!
//! ## Explicit maps and fallbacks
//!
//! ```rust
//! use sheet_mapper::mapping::{ClassMap, RowMapper, ScalarField};
//! use sheet_mapper::types::Sheet;
//!
//! #[derive(Debug, Default)]
//! struct Row {
//!     value: i32,
//! }
//!
//! let map = ClassMap::<Row>::builder()
//!     .field(
//!         ScalarField::new("value", |r: &mut Row| &mut r.value)
//!             .column_index(0)
//!             .empty_fallback(1)
//!             .invalid_fallback(10),
//!     )
//!     .build();
//!
//! let sheet = Sheet::from_strings(None, &[&["2"], &[""], &["abc"]]);
//! let values: Vec<i32> = RowMapper::new()
//!     .map_sheet_with(&map, &sheet)
//!     .map(|r| r.map(|row| row.value))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(values, vec![2, 1, 10]);
//! ```
//!
//! ## Errors
//!
//! Every failure is a [`MappingError`] naming the row, the member and (for cell errors) the
//! column. [`MappingError::kind`] separates bad data (empty or unparsable cells) from a bad
//! schema (missing columns) and from maps that can never work (cycles, unsupported targets).
//! A failing row never affects the rows around it.
//!
//! ## Modules
//!
//! - [`mapping`]: column resolution, conversion, fallbacks, collections, class maps and the mapper
//! - [`ingestion`]: loading CSV and Excel files into a [`types::Sheet`]
//! - [`types`]: the raw sheet model ([`types::RawCellSource`], [`types::Sheet`])
//! - [`error`]: error types used across mapping and loading
//!
//! ## Excel (feature-gated)
//!
//! Enable the `excel` feature to load `.xlsx`, `.xls`, `.xlsm`, `.xlsb` and `.ods` files through
//! [`ingestion::read_sheet_from_path`].

pub mod error;
pub mod ingestion;
pub mod mapping;
pub mod types;

pub use error::{MappingError, MappingErrorKind, MappingResult};
