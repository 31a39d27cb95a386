//! Fallback decisions for missing columns, empty cells and unparsable cells.

use serde::{Deserialize, Serialize};

use super::convert::CellError;

/// Class-level behavior for empty cells that no field-level fallback covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyValueStrategy {
    /// Report an empty value error.
    #[default]
    Fail,
    /// Use the member type's `Default` value.
    SetToDefault,
}

/// Result of applying a [`FallbackPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome<V> {
    /// The cell converted successfully.
    Value(V),
    /// A fallback supplied the value.
    Default(V),
    /// No fallback applied.
    Fail(CellError),
}

impl<V> FallbackOutcome<V> {
    /// Collapse `Value` and `Default` into `Ok`.
    pub fn into_result(self) -> Result<V, CellError> {
        match self {
            Self::Value(v) | Self::Default(v) => Ok(v),
            Self::Fail(e) => Err(e),
        }
    }

    /// Returns `true` if a fallback supplied the value.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Default(_))
    }
}

/// Field-level fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy<V> {
    /// Used when the cell is empty. `Some(None)` on a nullable member is an explicit null.
    pub empty: Option<V>,
    /// Used when the cell cannot be parsed.
    pub invalid: Option<V>,
    /// Tolerate the column not existing; the member then gets its default value.
    pub optional: bool,
}

impl<V> Default for FallbackPolicy<V> {
    fn default() -> Self {
        Self {
            empty: None,
            invalid: None,
            optional: false,
        }
    }
}

impl<V: Clone + Default> FallbackPolicy<V> {
    /// Decide the outcome for one conversion result.
    ///
    /// `type_empty` is the member type's own empty value (`Some(None)` for `Option` members).
    /// Precedence for empty cells: field fallback, then `type_empty`, then `strategy`.
    /// `optional` only covers missing columns and `strategy` only covers empty cells.
    pub fn apply(
        &self,
        result: Result<V, CellError>,
        type_empty: Option<V>,
        strategy: EmptyValueStrategy,
    ) -> FallbackOutcome<V> {
        match result {
            Ok(v) => FallbackOutcome::Value(v),
            Err(CellError::MissingColumn(_)) if self.optional => FallbackOutcome::Default(V::default()),
            Err(CellError::Empty) => {
                if let Some(v) = self.empty.clone() {
                    return FallbackOutcome::Default(v);
                }
                if let Some(v) = type_empty {
                    return FallbackOutcome::Default(v);
                }
                match strategy {
                    EmptyValueStrategy::SetToDefault => FallbackOutcome::Default(V::default()),
                    EmptyValueStrategy::Fail => FallbackOutcome::Fail(CellError::Empty),
                }
            }
            Err(CellError::Unparsable { raw, message }) => match self.invalid.clone() {
                Some(v) => {
                    tracing::trace!(%raw, %message, "unparsable cell replaced by invalid fallback");
                    FallbackOutcome::Default(v)
                }
                None => FallbackOutcome::Fail(CellError::Unparsable { raw, message }),
            },
            Err(other) => FallbackOutcome::Fail(other),
        }
    }
}
