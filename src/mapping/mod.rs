//! Type-driven mapping from raw rows to typed values.
//!
//! The pieces, leaves first:
//!
//! - [`column`]: resolving a field's selectors to column indices
//! - [`convert`], [`dates`], [`enums`]: converting one cell into one value ([`FromCell`])
//! - [`fallback`]: what happens when a column is missing or a cell is empty or unparsable
//! - [`collection`]: building collections and dictionaries from several cells
//! - [`field`] and [`class_map`]: the per-member configuration of a target type
//! - [`registry`]: built maps, shared across rows and threads
//! - [`row_mapper`]: the entry point
//!
//! ```rust
//! use sheet_mapper::mapping::{ClassMap, RowMapper, ScalarField};
//! use sheet_mapper::types::Sheet;
//!
//! #[derive(Debug, Default)]
//! struct Measurement {
//!     sensor: String,
//!     reading: Option<f64>,
//! }
//!
//! let map = ClassMap::<Measurement>::builder()
//!     .field(ScalarField::new("sensor", |m: &mut Measurement| &mut m.sensor).column_index(0))
//!     .field(
//!         ScalarField::new("reading", |m: &mut Measurement| &mut m.reading)
//!             .column_index(1)
//!             .invalid_fallback(None),
//!     )
//!     .build();
//!
//! let sheet = Sheet::from_strings(None, &[&["t1", "21.5"], &["t2", "n/a"]]);
//! let rows: Vec<Measurement> = RowMapper::new()
//!     .map_sheet_with(&map, &sheet)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(rows[0].reading, Some(21.5));
//! assert_eq!(rows[1].reading, None);
//! ```

pub mod class_map;
pub mod collection;
pub mod column;
pub mod convert;
pub mod dates;
pub mod enums;
pub mod fallback;
pub mod field;
pub mod observer;
pub mod registry;
pub mod row_mapper;

pub use class_map::{AutoMap, AutoMapper, ClassMap, ClassMapBuilder};
pub use collection::{CollectionKind, CollectionTarget, ElementSink, SplitOptions};
pub use column::{ColumnResolver, ColumnSelector, ColumnSet, ResolutionError};
pub use convert::{CellError, CellOptions, Converter, FromCell, NumberFormat, NumberStyle};
pub use fallback::{EmptyValueStrategy, FallbackOutcome, FallbackPolicy};
pub use field::{CollectionField, DictionaryField, FieldMapping, NestedField, ScalarField};
pub use observer::{CompositeObserver, MappingObserver, MappingSeverity, RowContext, TracingObserver};
pub use registry::ClassMapRegistry;
pub use row_mapper::RowMapper;
