use thiserror::Error;

use crate::mapping::column::ResolutionError;

/// Convenience result type for mapping and sheet loading operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Error type returned by row mapping and sheet loading.
///
/// Row-level variants carry the 1-based row number and the mapped member so a caller can report
/// exactly which cell was at fault. Use [`MappingError::kind`] to tell "bad data" apart from
/// "bad schema".
#[derive(Debug, Error)]
pub enum MappingError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Excel loading error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV loading error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The sheet itself could not be used (no rows, unknown sheet name, unknown format, ...).
    #[error("invalid sheet: {message}")]
    InvalidSheet { message: String },

    /// The column(s) for a member could not be found in the sheet.
    #[error("row {row}: cannot resolve column for member '{member}': {source}")]
    ColumnResolution {
        row: usize,
        member: String,
        #[source]
        source: ResolutionError,
    },

    /// A required cell was empty and no fallback applied.
    #[error("row {row} column {column}: empty value for member '{member}'")]
    EmptyValue {
        row: usize,
        column: usize,
        member: String,
    },

    /// A cell held text that cannot be converted into the member type.
    #[error(
        "row {row} column {column}: invalid value for member '{member}': {message} (raw='{raw}')"
    )]
    UnparsableValue {
        row: usize,
        column: usize,
        member: String,
        raw: String,
        message: String,
    },

    /// Converted values could not be assembled into the member type.
    #[error("row {row}: cannot construct member '{member}': {message}")]
    Construction {
        row: usize,
        member: String,
        message: String,
    },

    /// The member type cannot be constructed from a sheet at all.
    #[error("unsupported construction for member '{member}': {message}")]
    UnsupportedConstruction { member: String, message: String },

    /// The type graph refers back to a type whose map is still being built.
    #[error("recursive mapping detected: {}", chain.join(" -> "))]
    RecursiveMapping { chain: Vec<String> },

    /// A class map for the type already exists in the registry.
    #[error("a class map for '{type_name}' is already registered")]
    MapAlreadyRegistered { type_name: String },

    /// No class map has been registered or built for the type.
    #[error("no class map is registered for '{type_name}'")]
    MapNotRegistered { type_name: String },
}

/// Coarse classification of a [`MappingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingErrorKind {
    /// I/O, CSV or workbook failures while loading raw rows.
    Source,
    /// The sheet does not have the shape the class map expects.
    Schema,
    /// A cell was empty.
    EmptyValue,
    /// A cell held text that could not be converted.
    InvalidValue,
    /// The type or its configuration can never be mapped.
    Fatal,
}

impl MappingError {
    /// Classify this error.
    pub fn kind(&self) -> MappingErrorKind {
        match self {
            MappingError::Io(_) | MappingError::Csv(_) => MappingErrorKind::Source,
            #[cfg(feature = "excel")]
            MappingError::Excel(_) => MappingErrorKind::Source,
            MappingError::InvalidSheet { .. } | MappingError::ColumnResolution { .. } => {
                MappingErrorKind::Schema
            }
            MappingError::EmptyValue { .. } => MappingErrorKind::EmptyValue,
            MappingError::UnparsableValue { .. } => MappingErrorKind::InvalidValue,
            MappingError::Construction { .. }
            | MappingError::UnsupportedConstruction { .. }
            | MappingError::RecursiveMapping { .. }
            | MappingError::MapAlreadyRegistered { .. }
            | MappingError::MapNotRegistered { .. } => MappingErrorKind::Fatal,
        }
    }

    /// The member this error is about, if it is a row-level error.
    pub fn member(&self) -> Option<&str> {
        match self {
            MappingError::ColumnResolution { member, .. }
            | MappingError::EmptyValue { member, .. }
            | MappingError::UnparsableValue { member, .. }
            | MappingError::Construction { member, .. }
            | MappingError::UnsupportedConstruction { member, .. } => Some(member),
            _ => None,
        }
    }
}
