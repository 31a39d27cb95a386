//! Collection and dictionary materialization.
//!
//! A collection member is filled in one of two modes, chosen by how its selectors resolved:
//!
//! - **split mode** ([`ColumnSet::Single`]): one cell is split into tokens, one element each;
//! - **multi-column mode** ([`ColumnSet::Multiple`]): each column contributes one element.
//!
//! Elements are pushed into an [`ElementSink`] in resolved order and the sink builds the target.

use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::column::ColumnSet;
use super::convert::{cell_text, CellError, CellOptions, Converter};
use super::fallback::{EmptyValueStrategy, FallbackPolicy};
use crate::types::RawCellSource;

/// How a collection target is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// All elements are collected, then the fixed-size target is allocated once.
    FixedArray,
    /// Elements are appended one at a time.
    Growable,
    /// All elements are buffered, then the target is built from the sequence in one call.
    FromSequence,
    /// One `(header, value)` entry per column.
    Dictionary,
}

/// Receives converted elements and builds the target collection.
pub trait ElementSink<E> {
    type Output;

    fn push(&mut self, element: E);

    fn finish(self) -> Result<Self::Output, String>;
}

/// A collection type a member can be materialized into.
pub trait CollectionTarget: Sized {
    type Element;
    type Sink: ElementSink<Self::Element, Output = Self>;

    const KIND: CollectionKind;

    fn sink(capacity: usize) -> Self::Sink;
}

/// Buffers every element, then builds the target with a single call.
pub struct BufferedSink<E, C> {
    items: Vec<E>,
    build: fn(Vec<E>) -> Result<C, String>,
    _target: PhantomData<fn() -> C>,
}

impl<E, C> BufferedSink<E, C> {
    pub fn new(capacity: usize, build: fn(Vec<E>) -> Result<C, String>) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            build,
            _target: PhantomData,
        }
    }
}

impl<E, C> ElementSink<E> for BufferedSink<E, C> {
    type Output = C;

    fn push(&mut self, element: E) {
        self.items.push(element);
    }

    fn finish(self) -> Result<C, String> {
        (self.build)(self.items)
    }
}

macro_rules! growable_target {
    ($coll:ident, $push:ident, |$cap:ident| $new:expr) => {
        impl<E> ElementSink<E> for $coll<E> {
            type Output = Self;

            fn push(&mut self, element: E) {
                self.$push(element);
            }

            fn finish(self) -> Result<Self, String> {
                Ok(self)
            }
        }

        impl<E> CollectionTarget for $coll<E> {
            type Element = E;
            type Sink = Self;

            const KIND: CollectionKind = CollectionKind::Growable;

            fn sink($cap: usize) -> Self {
                $new
            }
        }
    };
}

growable_target!(Vec, push, |capacity| Vec::with_capacity(capacity));
growable_target!(VecDeque, push_back, |capacity| VecDeque::with_capacity(capacity));
growable_target!(LinkedList, push_back, |_capacity| LinkedList::new());

impl<E> CollectionTarget for Box<[E]> {
    type Element = E;
    type Sink = BufferedSink<E, Self>;

    const KIND: CollectionKind = CollectionKind::FixedArray;

    fn sink(capacity: usize) -> Self::Sink {
        BufferedSink::new(capacity, |items| Ok(items.into_boxed_slice()))
    }
}

impl<E, const N: usize> CollectionTarget for [E; N] {
    type Element = E;
    type Sink = BufferedSink<E, Self>;

    const KIND: CollectionKind = CollectionKind::FixedArray;

    fn sink(capacity: usize) -> Self::Sink {
        BufferedSink::new(capacity, |items| {
            let got = items.len();
            <[E; N]>::try_from(items).map_err(|_| format!("expected exactly {N} elements, got {got}"))
        })
    }
}

impl<E: Ord> CollectionTarget for BTreeSet<E> {
    type Element = E;
    type Sink = BufferedSink<E, Self>;

    const KIND: CollectionKind = CollectionKind::FromSequence;

    fn sink(capacity: usize) -> Self::Sink {
        BufferedSink::new(capacity, |items| Ok(items.into_iter().collect()))
    }
}

impl<E: Eq + Hash> CollectionTarget for HashSet<E> {
    type Element = E;
    type Sink = BufferedSink<E, Self>;

    const KIND: CollectionKind = CollectionKind::FromSequence;

    fn sink(capacity: usize) -> Self::Sink {
        BufferedSink::new(capacity, |items| Ok(items.into_iter().collect()))
    }
}

impl<E: Ord> CollectionTarget for BinaryHeap<E> {
    type Element = E;
    type Sink = BufferedSink<E, Self>;

    const KIND: CollectionKind = CollectionKind::FromSequence;

    fn sink(capacity: usize) -> Self::Sink {
        BufferedSink::new(capacity, |items| Ok(BinaryHeap::from(items)))
    }
}

impl<V> ElementSink<(String, V)> for HashMap<String, V> {
    type Output = Self;

    fn push(&mut self, (key, value): (String, V)) {
        self.insert(key, value);
    }

    fn finish(self) -> Result<Self, String> {
        Ok(self)
    }
}

impl<V> CollectionTarget for HashMap<String, V> {
    type Element = (String, V);
    type Sink = Self;

    const KIND: CollectionKind = CollectionKind::Dictionary;

    fn sink(capacity: usize) -> Self {
        HashMap::with_capacity(capacity)
    }
}

impl<V> ElementSink<(String, V)> for BTreeMap<String, V> {
    type Output = Self;

    fn push(&mut self, (key, value): (String, V)) {
        self.insert(key, value);
    }

    fn finish(self) -> Result<Self, String> {
        Ok(self)
    }
}

impl<V> CollectionTarget for BTreeMap<String, V> {
    type Element = (String, V);
    type Sink = Self;

    const KIND: CollectionKind = CollectionKind::Dictionary;

    fn sink(_capacity: usize) -> Self {
        BTreeMap::new()
    }
}

/// How split mode tokenizes a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Any of these characters ends a token.
    pub separators: Vec<char>,
    /// Drop blank tokens instead of converting them as empty elements.
    pub remove_empty_entries: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            separators: vec![','],
            remove_empty_entries: false,
        }
    }
}

/// Per-element conversion and fallbacks.
#[derive(Debug, Clone)]
pub struct ElementMapping<E> {
    pub converter: Converter<E>,
    pub fallback: FallbackPolicy<E>,
    pub options: CellOptions,
}

impl<E: Clone + Default> ElementMapping<E> {
    fn convert(&self, raw: Option<&str>, strategy: EmptyValueStrategy) -> Result<E, CellError> {
        let result = self.converter.convert(raw, &self.options);
        self.fallback
            .apply(result, self.converter.empty_value(), strategy)
            .into_result()
    }
}

/// A failure while materializing, with the column it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementError {
    pub column: usize,
    pub error: CellError,
}

impl ElementError {
    fn new(column: usize, error: CellError) -> Self {
        Self { column, error }
    }
}

/// Materialize a collection member from its resolved columns.
///
/// In split mode an empty source cell gives an empty collection unless `required` is set.
pub fn materialize<C>(
    columns: &ColumnSet,
    row: &dyn RawCellSource,
    element: &ElementMapping<C::Element>,
    split: &SplitOptions,
    required: bool,
    strategy: EmptyValueStrategy,
) -> Result<C, ElementError>
where
    C: CollectionTarget,
    C::Element: Clone + Default,
{
    let mut sink;
    let last_column;
    match columns {
        ColumnSet::Single(column) => {
            last_column = *column;
            let raw = row.raw(*column);
            let text = cell_text(raw, &element.options, element.converter.is_text())
                .filter(|t| !t.is_empty());
            let Some(text) = text else {
                if required {
                    return Err(ElementError::new(*column, CellError::Empty));
                }
                return C::sink(0)
                    .finish()
                    .map_err(|m| ElementError::new(*column, CellError::Construction(m)));
            };
            let tokens: Vec<&str> = text
                .split(|c| split.separators.contains(&c))
                .filter(|t| !(split.remove_empty_entries && t.trim().is_empty()))
                .collect();
            sink = C::sink(tokens.len());
            for token in tokens {
                let value = element
                    .convert(Some(token), strategy)
                    .map_err(|e| ElementError::new(*column, e))?;
                sink.push(value);
            }
        }
        ColumnSet::Multiple(cols) => {
            last_column = cols.last().copied().unwrap_or_default();
            sink = C::sink(cols.len());
            for &column in cols {
                let value = element
                    .convert(row.raw(column), strategy)
                    .map_err(|e| ElementError::new(column, e))?;
                sink.push(value);
            }
        }
    }
    sink.finish()
        .map_err(|m| ElementError::new(last_column, CellError::Construction(m)))
}

/// Materialize a dictionary member: one entry per resolved column, keyed by its header name.
///
/// Returns `Ok(None)` when the sheet has no heading to take keys from.
pub fn materialize_dictionary<D, V>(
    columns: &ColumnSet,
    row: &dyn RawCellSource,
    element: &ElementMapping<V>,
    strategy: EmptyValueStrategy,
) -> Result<Option<D>, ElementError>
where
    D: CollectionTarget<Element = (String, V)>,
    V: Clone + Default,
{
    let Some(heading) = row.heading() else {
        return Ok(None);
    };
    let cols = columns.columns();
    let mut sink = D::sink(cols.len());
    for &column in cols {
        let Some(key) = heading.name(column) else {
            return Err(ElementError::new(
                column,
                CellError::Construction(format!("column {column} has no header name to use as a key")),
            ));
        };
        let key = key.to_string();
        let value = element
            .convert(row.raw(column), strategy)
            .map_err(|e| ElementError::new(column, e))?;
        sink.push((key, value));
    }
    sink.finish()
        .map(Some)
        .map_err(|m| ElementError::new(cols.last().copied().unwrap_or_default(), CellError::Construction(m)))
}
