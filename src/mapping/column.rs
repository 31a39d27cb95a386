//! Column selection and resolution.

use std::fmt;
use std::slice;
use std::sync::Arc;

use regex::Regex;
use thiserror::Error;

use crate::types::{Heading, RawCellSource};

/// Predicate over a header name and its column index.
pub type ColumnPredicate = Arc<dyn Fn(&str, usize) -> bool + Send + Sync>;

/// How a field chooses its column(s).
#[derive(Clone)]
pub enum ColumnSelector {
    /// A single 0-based column index.
    Index(usize),
    /// Candidate indices. A scalar field takes the first in-range index; a multi-column field
    /// reads every index.
    Indices(Vec<usize>),
    /// A header name (exact match).
    Name(String),
    /// Candidate header names. A scalar field takes the first that exists; a multi-column field
    /// reads every name.
    Names(Vec<String>),
    /// Every column whose header satisfies the predicate.
    Matching(ColumnPredicate),
    /// The header named after the mapped member.
    Default,
}

impl ColumnSelector {
    /// Select columns whose header name and index satisfy `predicate`.
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&str, usize) -> bool + Send + Sync + 'static,
    {
        Self::Matching(Arc::new(predicate))
    }

    /// Select columns whose header name matches `pattern`.
    pub fn pattern(pattern: Regex) -> Self {
        Self::matching(move |name, _| pattern.is_match(name))
    }

    fn needs_heading(&self) -> bool {
        matches!(
            self,
            Self::Name(_) | Self::Names(_) | Self::Matching(_) | Self::Default
        )
    }
}

impl fmt::Debug for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => f.debug_tuple("Index").field(i).finish(),
            Self::Indices(v) => f.debug_tuple("Indices").field(v).finish(),
            Self::Name(n) => f.debug_tuple("Name").field(n).finish(),
            Self::Names(v) => f.debug_tuple("Names").field(v).finish(),
            Self::Matching(_) => f.write_str("Matching(..)"),
            Self::Default => f.write_str("Default"),
        }
    }
}

impl From<usize> for ColumnSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Why a selector did not resolve against the current sheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("column index {index} is out of range (sheet has {column_count} columns)")]
    OutOfRange { index: usize, column_count: usize },

    #[error("no column named '{name}'")]
    NotFound { name: String },

    #[error("no column matched {selector}")]
    NoneMatched { selector: String },

    #[error("sheet has no heading row; cannot resolve {selector}")]
    NoHeading { selector: String },
}

/// Resolved column(s) for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSet {
    /// One column. Collection fields split its text into elements.
    Single(usize),
    /// Several columns, one element each, in resolved order.
    Multiple(Vec<usize>),
}

impl ColumnSet {
    /// Resolved column indices in order.
    pub fn columns(&self) -> &[usize] {
        match self {
            Self::Single(c) => slice::from_ref(c),
            Self::Multiple(cs) => cs,
        }
    }
}

/// Resolves [`ColumnSelector`]s against one sheet shape.
///
/// Resolution reads nothing but the column count and the heading, so resolving the same
/// selectors twice always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct ColumnResolver<'a> {
    column_count: usize,
    heading: Option<&'a Heading>,
    member: &'a str,
}

impl<'a> ColumnResolver<'a> {
    /// Create a resolver. `member` names the field and backs [`ColumnSelector::Default`].
    pub fn new(column_count: usize, heading: Option<&'a Heading>, member: &'a str) -> Self {
        Self {
            column_count,
            heading,
            member,
        }
    }

    /// Create a resolver for the sheet that `row` belongs to.
    pub fn for_row(row: &'a dyn RawCellSource, member: &'a str) -> Self {
        Self::new(row.column_count(), row.heading(), member)
    }

    /// Resolve one column for a scalar field. The first selector that resolves wins.
    pub fn resolve_single(&self, selectors: &[ColumnSelector]) -> Result<usize, ResolutionError> {
        self.first_success(selectors, |s| self.single(s))
    }

    /// Resolve the column set for a collection or dictionary field.
    pub fn resolve_set(&self, selectors: &[ColumnSelector]) -> Result<ColumnSet, ResolutionError> {
        self.first_success(selectors, |s| self.set(s))
    }

    fn first_success<R>(
        &self,
        selectors: &[ColumnSelector],
        mut resolve: impl FnMut(&ColumnSelector) -> Result<R, ResolutionError>,
    ) -> Result<R, ResolutionError> {
        if selectors.is_empty() {
            return resolve(&ColumnSelector::Default);
        }
        let mut last_err = None;
        for selector in selectors {
            match resolve(selector) {
                Ok(found) => return Ok(found),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| ResolutionError::NoneMatched {
            selector: "no selectors".to_string(),
        }))
    }

    fn single(&self, selector: &ColumnSelector) -> Result<usize, ResolutionError> {
        let heading = self.heading_for(selector)?;
        match selector {
            ColumnSelector::Index(i) => self.in_range(*i),
            ColumnSelector::Indices(indices) => indices
                .iter()
                .copied()
                .find(|&i| i < self.column_count)
                .ok_or_else(|| ResolutionError::NoneMatched {
                    selector: format!("indices {indices:?}"),
                }),
            ColumnSelector::Name(name) => lookup(heading, name),
            ColumnSelector::Names(names) => names
                .iter()
                .find_map(|n| heading.and_then(|h| h.index_of(n)))
                .ok_or_else(|| ResolutionError::NoneMatched {
                    selector: format!("names {names:?}"),
                }),
            ColumnSelector::Matching(predicate) => {
                self.matching_columns(heading, predicate)
                    .into_iter()
                    .next()
                    .ok_or_else(|| ResolutionError::NoneMatched {
                        selector: "predicate".to_string(),
                    })
            }
            ColumnSelector::Default => lookup(heading, self.member),
        }
    }

    fn set(&self, selector: &ColumnSelector) -> Result<ColumnSet, ResolutionError> {
        let heading = self.heading_for(selector)?;
        match selector {
            ColumnSelector::Indices(indices) => indices
                .iter()
                .map(|&i| self.in_range(i))
                .collect::<Result<Vec<_>, _>>()
                .map(ColumnSet::Multiple),
            ColumnSelector::Names(names) => names
                .iter()
                .map(|n| lookup(heading, n))
                .collect::<Result<Vec<_>, _>>()
                .map(ColumnSet::Multiple),
            ColumnSelector::Matching(predicate) => {
                let found = self.matching_columns(heading, predicate);
                if found.is_empty() {
                    Err(ResolutionError::NoneMatched {
                        selector: "predicate".to_string(),
                    })
                } else {
                    Ok(ColumnSet::Multiple(found))
                }
            }
            ColumnSelector::Index(_) | ColumnSelector::Name(_) | ColumnSelector::Default => {
                self.single(selector).map(ColumnSet::Single)
            }
        }
    }

    fn heading_for(
        &self,
        selector: &ColumnSelector,
    ) -> Result<Option<&'a Heading>, ResolutionError> {
        if selector.needs_heading() && self.heading.is_none() {
            return Err(ResolutionError::NoHeading {
                selector: match selector {
                    ColumnSelector::Default => format!("member '{}'", self.member),
                    other => format!("{other:?}"),
                },
            });
        }
        Ok(self.heading)
    }

    fn in_range(&self, index: usize) -> Result<usize, ResolutionError> {
        if index < self.column_count {
            Ok(index)
        } else {
            Err(ResolutionError::OutOfRange {
                index,
                column_count: self.column_count,
            })
        }
    }

    fn matching_columns(&self, heading: Option<&Heading>, predicate: &ColumnPredicate) -> Vec<usize> {
        heading
            .map(|h| {
                h.names()
                    .enumerate()
                    .filter(|&(i, name)| i < self.column_count && predicate(name, i))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn lookup(heading: Option<&Heading>, name: &str) -> Result<usize, ResolutionError> {
    heading
        .and_then(|h| h.index_of(name))
        .ok_or_else(|| ResolutionError::NotFound {
            name: name.to_string(),
        })
}
