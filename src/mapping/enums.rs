//! Enum conversions.

use super::convert::CellOptions;

/// Parse `text` as one of `variants`, by name or by discriminant.
///
/// Used by [`cell_enum!`](crate::cell_enum); call it directly for hand-written
/// [`FromCell`](super::FromCell) impls.
pub fn parse_enum<E: Clone>(
    text: &str,
    options: &CellOptions,
    variants: &[(&str, i64, E)],
) -> Result<E, String> {
    let by_name = variants.iter().find(|(name, _, _)| {
        if options.ignore_case {
            name.eq_ignore_ascii_case(text)
        } else {
            *name == text
        }
    });
    if let Some((_, _, v)) = by_name {
        return Ok(v.clone());
    }
    if let Ok(n) = text.parse::<i64>() {
        return variants
            .iter()
            .find(|(_, d, _)| *d == n)
            .map(|(_, _, v)| v.clone())
            .ok_or_else(|| format!("{n} is not a defined value"));
    }
    let names: Vec<&str> = variants.iter().map(|(name, _, _)| *name).collect();
    Err(format!("unknown variant '{text}', expected one of {names:?}"))
}

/// Implement [`FromCell`](crate::mapping::FromCell) for a fieldless enum.
///
/// ```rust
/// use sheet_mapper::cell_enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Default)]
/// enum Status {
///     #[default]
///     Active,
///     Retired = 5,
/// }
///
/// cell_enum!(Status { Active, Retired });
/// ```
#[macro_export]
macro_rules! cell_enum {
    ($ty:ty { $($variant:ident),+ $(,)? }) => {
        impl $crate::mapping::FromCell for $ty {
            fn from_cell(
                text: &str,
                options: &$crate::mapping::CellOptions,
            ) -> ::std::result::Result<Self, ::std::string::String> {
                $crate::mapping::enums::parse_enum(
                    text,
                    options,
                    &[$((stringify!($variant), <$ty>::$variant as i64, <$ty>::$variant)),+],
                )
            }
        }
    };
}
