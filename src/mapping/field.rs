//! Field mappings: one member of a target type and everything needed to fill it from a row.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use regex::Regex;

use super::class_map::ClassMap;
use super::collection::{
    materialize, materialize_dictionary, CollectionTarget, ElementError, ElementMapping, ElementSink,
    SplitOptions,
};
use super::column::{ColumnResolver, ColumnSelector, ColumnSet};
use super::convert::{CellError, CellOptions, Converter, FromCell, NumberFormat, NumberStyle};
use super::fallback::{EmptyValueStrategy, FallbackOutcome, FallbackPolicy};
use crate::error::{MappingError, MappingResult};
use crate::types::RawCellSource;

/// Mutable access to one member of `T`.
pub type Accessor<T, V> = Arc<dyn Fn(&mut T) -> &mut V + Send + Sync>;

/// One configured member of a [`ClassMap`].
///
/// Implementations are immutable once built and are shared by every row the map reads.
pub trait FieldMapping<T>: Send + Sync {
    /// Name of the mapped member.
    fn member(&self) -> &str;

    /// Read this member from `row` into `target`.
    fn apply(
        &self,
        target: &mut T,
        row: &dyn RawCellSource,
        strategy: EmptyValueStrategy,
    ) -> MappingResult<()>;
}

/// Turn a cell-level failure into a row-level [`MappingError`].
pub(crate) fn cell_failure(error: CellError, row: usize, column: usize, member: &str) -> MappingError {
    let member = member.to_string();
    match error {
        CellError::MissingColumn(source) => MappingError::ColumnResolution {
            row,
            member,
            source,
        },
        CellError::Empty => MappingError::EmptyValue {
            row,
            column,
            member,
        },
        CellError::Unparsable { raw, message } => MappingError::UnparsableValue {
            row,
            column,
            member,
            raw,
            message,
        },
        CellError::Construction(message) => MappingError::Construction {
            row,
            member,
            message,
        },
    }
}

fn element_failure(error: ElementError, row: usize, member: &str) -> MappingError {
    cell_failure(error.error, row, error.column, member)
}

/// Shared selector builders for the field types below.
macro_rules! selector_builders {
    () => {
        /// Read from the column at `index` (0-based).
        pub fn column_index(mut self, index: usize) -> Self {
            self.selectors.push(ColumnSelector::Index(index));
            self
        }

        /// Candidate column indices, see [`ColumnSelector::Indices`].
        pub fn column_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
            self.selectors
                .push(ColumnSelector::Indices(indices.into_iter().collect()));
            self
        }

        /// Read from the column with this header.
        pub fn column_name(mut self, name: impl Into<String>) -> Self {
            self.selectors.push(ColumnSelector::Name(name.into()));
            self
        }

        /// Candidate header names, see [`ColumnSelector::Names`].
        pub fn column_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
            self.selectors.push(ColumnSelector::Names(
                names.into_iter().map(Into::into).collect(),
            ));
            self
        }

        /// Columns whose header name and index satisfy `predicate`.
        pub fn columns_matching<F>(mut self, predicate: F) -> Self
        where
            F: Fn(&str, usize) -> bool + Send + Sync + 'static,
        {
            self.selectors.push(ColumnSelector::matching(predicate));
            self
        }

        /// Columns whose header name matches `pattern`.
        pub fn column_pattern(mut self, pattern: Regex) -> Self {
            self.selectors.push(ColumnSelector::pattern(pattern));
            self
        }

        /// Append an arbitrary selector. Selectors are tried in the order they were added.
        pub fn select(mut self, selector: impl Into<ColumnSelector>) -> Self {
            self.selectors.push(selector.into());
            self
        }
    };
}

/// Shared conversion option builders.
macro_rules! option_builders {
    ($($path:ident).+) => {
        /// Replace all conversion options.
        pub fn options(mut self, options: CellOptions) -> Self {
            self.$($path).+ = options;
            self
        }

        /// Keep string cells exactly as read.
        pub fn preserve_formatting(mut self) -> Self {
            self.$($path).+.preserve_formatting = true;
            self
        }

        pub fn number_style(mut self, style: NumberStyle) -> Self {
            self.$($path).+.number_style = style;
            self
        }

        pub fn number_format(mut self, format: NumberFormat) -> Self {
            self.$($path).+.number_format = format;
            self
        }

        /// Add a chrono format string. Configured formats replace the built-in set.
        pub fn date_format(mut self, format: impl Into<String>) -> Self {
            self.$($path).+.date_formats.push(format.into());
            self
        }

        /// Match enum variant names without regard to case.
        pub fn ignore_case(mut self) -> Self {
            self.$($path).+.ignore_case = true;
            self
        }
    };
}

/// A member read from a single cell.
///
/// ```rust
/// use sheet_mapper::mapping::{ClassMap, ScalarField};
///
/// #[derive(Default)]
/// struct Person {
///     age: u32,
/// }
///
/// let map = ClassMap::<Person>::builder()
///     .field(
///         ScalarField::new("age", |p: &mut Person| &mut p.age)
///             .column_name("Age")
///             .empty_fallback(0),
///     )
///     .build();
/// assert_eq!(map.members().collect::<Vec<_>>(), vec!["age"]);
/// ```
pub struct ScalarField<T, V> {
    member: String,
    selectors: Vec<ColumnSelector>,
    converter: Converter<V>,
    fallback: FallbackPolicy<V>,
    options: CellOptions,
    accessor: Accessor<T, V>,
}

impl<T, V: FromCell + 'static> ScalarField<T, V> {
    /// Map `member` with the built-in conversion for `V`.
    pub fn new<F>(member: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self::with_converter(member, accessor, Converter::new())
    }
}

impl<T, V> ScalarField<T, V> {
    /// Map `member` with a caller-supplied converter.
    pub fn with_converter<F>(member: impl Into<String>, accessor: F, converter: Converter<V>) -> Self
    where
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        Self {
            member: member.into(),
            selectors: Vec::new(),
            converter,
            fallback: FallbackPolicy::default(),
            options: CellOptions::default(),
            accessor: Arc::new(accessor),
        }
    }

    /// Replace the converter.
    pub fn converter(mut self, converter: Converter<V>) -> Self {
        self.converter = converter;
        self
    }

    /// Value used when the cell is empty.
    pub fn empty_fallback(mut self, value: V) -> Self {
        self.fallback.empty = Some(value);
        self
    }

    /// Value used when the cell cannot be parsed.
    pub fn invalid_fallback(mut self, value: V) -> Self {
        self.fallback.invalid = Some(value);
        self
    }

    /// Leave the member at its default when the column does not exist.
    pub fn optional(mut self) -> Self {
        self.fallback.optional = true;
        self
    }

    selector_builders!();
    option_builders!(options);
}

impl<T, V> fmt::Debug for ScalarField<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarField")
            .field("member", &self.member)
            .field("selectors", &self.selectors)
            .field("optional", &self.fallback.optional)
            .finish_non_exhaustive()
    }
}

impl<T, V> FieldMapping<T> for ScalarField<T, V>
where
    V: Clone + Default + Send + Sync,
{
    fn member(&self) -> &str {
        &self.member
    }

    fn apply(
        &self,
        target: &mut T,
        row: &dyn RawCellSource,
        strategy: EmptyValueStrategy,
    ) -> MappingResult<()> {
        let resolver = ColumnResolver::for_row(row, &self.member);
        let (column, result) = match resolver.resolve_single(&self.selectors) {
            Ok(column) => (column, self.converter.convert(row.raw(column), &self.options)),
            Err(e) => (0, Err(CellError::MissingColumn(e))),
        };
        match self
            .fallback
            .apply(result, self.converter.empty_value(), strategy)
        {
            FallbackOutcome::Value(v) => {
                *(self.accessor)(target) = v;
                Ok(())
            }
            FallbackOutcome::Default(v) => {
                tracing::trace!(member = %self.member, row = row.row_number(), "fallback value used");
                *(self.accessor)(target) = v;
                Ok(())
            }
            FallbackOutcome::Fail(e) => Err(cell_failure(e, row.row_number(), column, &self.member)),
        }
    }
}

/// A member holding a collection, filled by splitting one cell or by reading several columns.
pub struct CollectionField<T, C: CollectionTarget> {
    member: String,
    selectors: Vec<ColumnSelector>,
    element: ElementMapping<C::Element>,
    split: SplitOptions,
    required: bool,
    optional: bool,
    accessor: Accessor<T, C>,
}

impl<T, C> CollectionField<T, C>
where
    C: CollectionTarget,
    C::Element: FromCell + 'static,
{
    /// Map `member` with the built-in conversion for its element type.
    pub fn new<F>(member: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        Self::with_element_converter(member, accessor, Converter::new())
    }
}

impl<T, C: CollectionTarget> CollectionField<T, C> {
    /// Map `member`, converting each element with `converter`.
    pub fn with_element_converter<F>(
        member: impl Into<String>,
        accessor: F,
        converter: Converter<C::Element>,
    ) -> Self
    where
        F: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        Self {
            member: member.into(),
            selectors: Vec::new(),
            element: ElementMapping {
                converter,
                fallback: FallbackPolicy::default(),
                options: CellOptions::default(),
            },
            split: SplitOptions::default(),
            required: false,
            optional: false,
            accessor: Arc::new(accessor),
        }
    }

    /// Characters that separate elements in split mode. Replaces the default `,`.
    pub fn separators(mut self, separators: impl IntoIterator<Item = char>) -> Self {
        self.split.separators = separators.into_iter().collect();
        self
    }

    /// Drop blank tokens in split mode.
    pub fn remove_empty_entries(mut self) -> Self {
        self.split.remove_empty_entries = true;
        self
    }

    pub fn split_options(mut self, split: SplitOptions) -> Self {
        self.split = split;
        self
    }

    /// Fail on an empty source cell instead of producing an empty collection.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Produce an empty collection when the column(s) do not exist.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value used for each empty element.
    pub fn element_empty_fallback(mut self, value: C::Element) -> Self {
        self.element.fallback.empty = Some(value);
        self
    }

    /// Value used for each unparsable element.
    pub fn element_invalid_fallback(mut self, value: C::Element) -> Self {
        self.element.fallback.invalid = Some(value);
        self
    }

    selector_builders!();
    option_builders!(element.options);
}

impl<T, C: CollectionTarget> fmt::Debug for CollectionField<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionField")
            .field("member", &self.member)
            .field("selectors", &self.selectors)
            .field("kind", &C::KIND)
            .field("split", &self.split)
            .finish_non_exhaustive()
    }
}

fn empty_collection<C: CollectionTarget>(row: usize, member: &str) -> MappingResult<C> {
    C::sink(0).finish().map_err(|message| MappingError::Construction {
        row,
        member: member.to_string(),
        message,
    })
}

impl<T, C> FieldMapping<T> for CollectionField<T, C>
where
    C: CollectionTarget,
    C::Element: Clone + Default + Send + Sync,
{
    fn member(&self) -> &str {
        &self.member
    }

    fn apply(
        &self,
        target: &mut T,
        row: &dyn RawCellSource,
        strategy: EmptyValueStrategy,
    ) -> MappingResult<()> {
        let number = row.row_number();
        let columns = match ColumnResolver::for_row(row, &self.member).resolve_set(&self.selectors) {
            Ok(columns) => columns,
            Err(_) if self.optional => {
                *(self.accessor)(target) = empty_collection(number, &self.member)?;
                return Ok(());
            }
            Err(source) => {
                return Err(MappingError::ColumnResolution {
                    row: number,
                    member: self.member.clone(),
                    source,
                });
            }
        };
        let value = materialize::<C>(&columns, row, &self.element, &self.split, self.required, strategy)
            .map_err(|e| element_failure(e, number, &self.member))?;
        *(self.accessor)(target) = value;
        Ok(())
    }
}

/// A member holding a string-keyed map: one entry per column, keyed by header name.
pub struct DictionaryField<T, D, V> {
    member: String,
    selectors: Vec<ColumnSelector>,
    element: ElementMapping<V>,
    optional: bool,
    accessor: Accessor<T, D>,
}

impl<T, D, V: FromCell + 'static> DictionaryField<T, D, V>
where
    D: CollectionTarget<Element = (String, V)>,
{
    pub fn new<F>(member: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&mut T) -> &mut D + Send + Sync + 'static,
    {
        Self::with_value_converter(member, accessor, Converter::new())
    }
}

impl<T, D, V> DictionaryField<T, D, V>
where
    D: CollectionTarget<Element = (String, V)>,
{
    /// Map `member`, converting each value with `converter`.
    pub fn with_value_converter<F>(member: impl Into<String>, accessor: F, converter: Converter<V>) -> Self
    where
        F: Fn(&mut T) -> &mut D + Send + Sync + 'static,
    {
        Self {
            member: member.into(),
            selectors: Vec::new(),
            element: ElementMapping {
                converter,
                fallback: FallbackPolicy::default(),
                options: CellOptions::default(),
            },
            optional: false,
            accessor: Arc::new(accessor),
        }
    }

    /// Produce an empty map when the column(s) do not exist.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn value_empty_fallback(mut self, value: V) -> Self {
        self.element.fallback.empty = Some(value);
        self
    }

    pub fn value_invalid_fallback(mut self, value: V) -> Self {
        self.element.fallback.invalid = Some(value);
        self
    }

    selector_builders!();
    option_builders!(element.options);
}

impl<T, D, V> fmt::Debug for DictionaryField<T, D, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryField")
            .field("member", &self.member)
            .field("selectors", &self.selectors)
            .finish_non_exhaustive()
    }
}

impl<T, D, V> FieldMapping<T> for DictionaryField<T, D, V>
where
    D: CollectionTarget<Element = (String, V)>,
    V: Clone + Default + Send + Sync,
{
    fn member(&self) -> &str {
        &self.member
    }

    fn apply(
        &self,
        target: &mut T,
        row: &dyn RawCellSource,
        strategy: EmptyValueStrategy,
    ) -> MappingResult<()> {
        let number = row.row_number();
        let columns = match ColumnResolver::for_row(row, &self.member).resolve_set(&self.selectors) {
            Ok(ColumnSet::Single(c)) => ColumnSet::Multiple(vec![c]),
            Ok(columns) => columns,
            Err(_) if self.optional => {
                *(self.accessor)(target) = empty_collection(number, &self.member)?;
                return Ok(());
            }
            Err(source) => {
                return Err(MappingError::ColumnResolution {
                    row: number,
                    member: self.member.clone(),
                    source,
                });
            }
        };
        match materialize_dictionary::<D, V>(&columns, row, &self.element, strategy)
            .map_err(|e| element_failure(e, number, &self.member))?
        {
            Some(value) => {
                *(self.accessor)(target) = value;
                Ok(())
            }
            None => Err(MappingError::UnsupportedConstruction {
                member: self.member.clone(),
                message: "dictionary keys come from the heading, but the sheet has none".to_string(),
            }),
        }
    }
}

/// A member that is itself mapped from the same row by its own [`ClassMap`].
pub struct NestedField<T, N> {
    member: String,
    map: Arc<ClassMap<N>>,
    accessor: Accessor<T, N>,
    _target: PhantomData<fn(&mut T)>,
}

impl<T, N> NestedField<T, N> {
    pub fn new<F>(member: impl Into<String>, map: Arc<ClassMap<N>>, accessor: F) -> Self
    where
        F: Fn(&mut T) -> &mut N + Send + Sync + 'static,
    {
        Self {
            member: member.into(),
            map,
            accessor: Arc::new(accessor),
            _target: PhantomData,
        }
    }
}

impl<T, N> fmt::Debug for NestedField<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedField")
            .field("member", &self.member)
            .field("map", &self.map)
            .finish()
    }
}

impl<T, N: Default> FieldMapping<T> for NestedField<T, N> {
    fn member(&self) -> &str {
        &self.member
    }

    fn apply(
        &self,
        target: &mut T,
        row: &dyn RawCellSource,
        _strategy: EmptyValueStrategy,
    ) -> MappingResult<()> {
        *(self.accessor)(target) = self.map.map_row(row)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::MappingErrorKind;
    use crate::types::Sheet;

    #[derive(Debug, Default)]
    struct Item {
        code: String,
        qty: i32,
        tags: Vec<String>,
        extra: HashMap<String, i32>,
    }

    fn sheet() -> Sheet {
        Sheet::from_strings(
            Some(&["Code", "Qty", "Tags", "Extra1", "Extra2"]),
            &[&["A1", "x", "red; blue", "1", "2"]],
        )
    }

    #[test]
    fn scalar_field_reports_row_column_and_member() {
        let s = sheet();
        let row = s.row(0).unwrap();
        let field = ScalarField::new("qty", |i: &mut Item| &mut i.qty).column_name("Qty");
        let mut item = Item::default();
        let err = field
            .apply(&mut item, &row, EmptyValueStrategy::Fail)
            .unwrap_err();
        match err {
            MappingError::UnparsableValue {
                row, column, member, raw, ..
            } => {
                assert_eq!((row, column, member.as_str(), raw.as_str()), (2, 1, "qty", "x"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let field = field.invalid_fallback(-1);
        field.apply(&mut item, &row, EmptyValueStrategy::Fail).unwrap();
        assert_eq!(item.qty, -1);
    }

    #[test]
    fn missing_column_is_a_schema_error_unless_optional() {
        let s = sheet();
        let row = s.row(0).unwrap();
        let mut item = Item::default();
        let field = ScalarField::new("code", |i: &mut Item| &mut i.code)
            .column_name("Sku")
            .empty_fallback("none".to_string());
        let err = field
            .apply(&mut item, &row, EmptyValueStrategy::SetToDefault)
            .unwrap_err();
        assert_eq!(err.kind(), MappingErrorKind::Schema);

        let field = field.optional();
        field.apply(&mut item, &row, EmptyValueStrategy::Fail).unwrap();
        assert_eq!(item.code, "");
    }

    #[test]
    fn collection_and_dictionary_fields() {
        let s = sheet();
        let row = s.row(0).unwrap();
        let mut item = Item::default();

        CollectionField::new("tags", |i: &mut Item| &mut i.tags)
            .column_name("Tags")
            .separators([';'])
            .apply(&mut item, &row, EmptyValueStrategy::Fail)
            .unwrap();
        assert_eq!(item.tags, vec!["red".to_string(), "blue".to_string()]);

        DictionaryField::new("extra", |i: &mut Item| &mut i.extra)
            .columns_matching(|name, _| name.starts_with("Extra"))
            .apply(&mut item, &row, EmptyValueStrategy::Fail)
            .unwrap();
        assert_eq!(item.extra.len(), 2);
        assert_eq!(item.extra["Extra2"], 2);
    }

    #[test]
    fn dictionary_without_heading_is_unsupported() {
        let s = Sheet::from_strings(None, &[&["1", "2"]]);
        let row = s.row(0).unwrap();
        let mut item = Item::default();
        let err = DictionaryField::new("extra", |i: &mut Item| &mut i.extra)
            .column_indices([0, 1])
            .apply(&mut item, &row, EmptyValueStrategy::Fail)
            .unwrap_err();
        assert!(matches!(err, MappingError::UnsupportedConstruction { .. }));
    }
}
