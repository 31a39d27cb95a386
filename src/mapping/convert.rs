//! Leaf conversion: one raw cell string into one typed value.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::column::ResolutionError;

/// Which characters a numeric cell may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    /// Sign, digits, group separators, one decimal separator and an exponent.
    #[default]
    Any,
    /// Sign and digits only.
    Integer,
    /// Sign, digits, one decimal separator and an exponent; no group separators.
    Float,
    /// Hexadecimal digits with an optional `0x` prefix. Integers only.
    HexNumber,
}

/// Culture-specific separators used when parsing numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub group_separator: char,
}

impl NumberFormat {
    /// `1,234.5`
    pub const fn invariant() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: ',',
        }
    }

    /// `1.234,5`
    pub const fn european() -> Self {
        Self {
            decimal_separator: ',',
            group_separator: '.',
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::invariant()
    }
}

/// Per-field conversion options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CellOptions {
    pub number_style: NumberStyle,
    pub number_format: NumberFormat,
    /// chrono format strings tried in order. Empty means the built-in set for the target type.
    pub date_formats: Vec<String>,
    /// Match enum variant names without regard to case.
    pub ignore_case: bool,
    /// Keep string cells exactly as read: no trimming, and `""` is a value rather than empty.
    pub preserve_formatting: bool,
    /// Extra spellings accepted as `true` (compared without case).
    pub true_values: Vec<String>,
    /// Extra spellings accepted as `false` (compared without case).
    pub false_values: Vec<String>,
}

/// Why a single cell did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// The column could not be resolved.
    MissingColumn(ResolutionError),
    /// The cell was absent or blank.
    Empty,
    /// The cell text could not be parsed.
    Unparsable { raw: String, message: String },
    /// Converted values could not be assembled into the target.
    Construction(String),
}

/// A type that can be read from one spreadsheet cell.
///
/// `from_cell` only ever sees non-empty text; empty cells are handled by [`FromCell::empty_value`]
/// and the field's fallback policy.
pub trait FromCell: Sized {
    /// String-like targets set this so that `preserve_formatting` keeps their raw text.
    const TEXT: bool = false;

    /// Parse non-empty cell text.
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String>;

    /// Value used for an empty cell when no explicit empty fallback is configured.
    fn empty_value() -> Option<Self> {
        None
    }
}

/// Reduce raw cell text to the text a converter should see, or `None` when the cell is empty.
pub fn cell_text<'a>(raw: Option<&'a str>, options: &CellOptions, text_target: bool) -> Option<&'a str> {
    let raw = raw?;
    if options.preserve_formatting && text_target {
        return Some(raw);
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

type ParseFn<V> = Arc<dyn Fn(&str, &CellOptions) -> Result<V, String> + Send + Sync>;

/// Converts one cell into `V`, either through [`FromCell`] or a caller-supplied function.
pub struct Converter<V> {
    parse: ParseFn<V>,
    empty: fn() -> Option<V>,
    text: bool,
}

impl<V> Clone for Converter<V> {
    fn clone(&self) -> Self {
        Self {
            parse: Arc::clone(&self.parse),
            empty: self.empty,
            text: self.text,
        }
    }
}

impl<V> fmt::Debug for Converter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("text", &self.text).finish()
    }
}

impl<V: FromCell + 'static> Converter<V> {
    /// The built-in conversion for `V`.
    pub fn new() -> Self {
        Self {
            parse: Arc::new(V::from_cell),
            empty: V::empty_value,
            text: V::TEXT,
        }
    }
}

impl<V: FromCell + 'static> Default for Converter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> Converter<V> {
    /// Convert non-empty cell text with `f`. Any error `f` returns is reported as an unparsable
    /// cell. Empty cells are left to the fallback policy.
    pub fn custom<F, E>(f: F) -> Self
    where
        F: Fn(&str) -> Result<V, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            parse: Arc::new(move |text: &str, _: &CellOptions| f(text).map_err(|e| e.to_string())),
            empty: || None,
            text: false,
        }
    }
}

impl<U: 'static> Converter<Option<U>> {
    /// Like [`Converter::custom`], for a nullable target: empty cells become `None`.
    pub fn custom_optional<F, E>(f: F) -> Self
    where
        F: Fn(&str) -> Result<U, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            parse: Arc::new(move |text: &str, _: &CellOptions| {
                f(text).map(Some).map_err(|e| e.to_string())
            }),
            empty: || Some(None),
            text: false,
        }
    }
}

impl<V> Converter<V> {
    /// Convert a raw cell.
    pub fn convert(&self, raw: Option<&str>, options: &CellOptions) -> Result<V, CellError> {
        let text = cell_text(raw, options, self.text).ok_or(CellError::Empty)?;
        (self.parse)(text, options).map_err(|message| CellError::Unparsable {
            raw: text.to_string(),
            message,
        })
    }

    /// The target type's own empty value (`None` for nullable targets).
    pub fn empty_value(&self) -> Option<V> {
        (self.empty)()
    }

    /// Whether the target is string-like.
    pub fn is_text(&self) -> bool {
        self.text
    }
}

impl FromCell for String {
    const TEXT: bool = true;

    fn from_cell(text: &str, _options: &CellOptions) -> Result<Self, String> {
        Ok(text.to_string())
    }
}

impl<V: FromCell> FromCell for Option<V> {
    const TEXT: bool = V::TEXT;

    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        V::from_cell(text, options).map(Some)
    }

    fn empty_value() -> Option<Self> {
        Some(None)
    }
}

impl FromCell for bool {
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        let lowered = text.to_lowercase();
        if options.true_values.iter().any(|v| v.to_lowercase() == lowered) {
            return Ok(true);
        }
        if options.false_values.iter().any(|v| v.to_lowercase() == lowered) {
            return Ok(false);
        }
        match lowered.as_str() {
            "true" | "t" | "1" | "yes" | "y" => Ok(true),
            "false" | "f" | "0" | "no" | "n" => Ok(false),
            _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
        }
    }
}

impl FromCell for char {
    const TEXT: bool = true;

    fn from_cell(text: &str, _options: &CellOptions) -> Result<Self, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err("expected a single character".to_string()),
        }
    }
}

/// Rewrite `text` into a form Rust's `parse` accepts, according to `style` and `format`.
pub(crate) fn normalize_number(text: &str, style: NumberStyle, format: NumberFormat) -> Result<String, String> {
    let allow_groups = style == NumberStyle::Any;
    let allow_fraction = matches!(style, NumberStyle::Any | NumberStyle::Float);
    let mut out = String::with_capacity(text.len());
    let mut seen_decimal = false;
    let mut seen_exponent = false;
    for (i, c) in text.char_indices() {
        match c {
            '0'..='9' => out.push(c),
            '+' | '-' if i == 0 || out.ends_with(|p: char| p == 'e' || p == 'E') => out.push(c),
            c if c == format.decimal_separator && allow_fraction && !seen_decimal && !seen_exponent => {
                seen_decimal = true;
                out.push('.');
            }
            c if c == format.group_separator && allow_groups && !seen_decimal && !seen_exponent => {}
            'e' | 'E' if allow_fraction && !seen_exponent && !out.is_empty() => {
                seen_exponent = true;
                out.push(c);
            }
            other => return Err(format!("unexpected character '{other}' for {style:?} number style")),
        }
    }
    if !out.bytes().any(|b| b.is_ascii_digit()) {
        return Err("expected a number".to_string());
    }
    Ok(out)
}

macro_rules! integer_from_cell {
    ($($t:ty),+ $(,)?) => {$(
        impl FromCell for $t {
            fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
                if options.number_style == NumberStyle::HexNumber {
                    let digits = text
                        .strip_prefix("0x")
                        .or_else(|| text.strip_prefix("0X"))
                        .unwrap_or(text);
                    return <$t>::from_str_radix(digits, 16).map_err(|e| e.to_string());
                }
                let normalized = normalize_number(text, options.number_style, options.number_format)?;
                match normalized.parse::<$t>() {
                    Ok(v) => Ok(v),
                    // Plain digits that do not fit are an overflow, not a decimal.
                    Err(e) if !normalized.contains(['.', 'e', 'E']) => Err(e.to_string()),
                    Err(e) => {
                        // Accept integral decimals such as "2.0" or "1e3".
                        let f = normalized.parse::<f64>().map_err(|_| e.to_string())?;
                        // `MAX as f64` can round up to a power of two, so the upper bound is exclusive.
                        if f.fract() != 0.0 {
                            Err(format!("expected integer (got non-integer number {f})"))
                        } else if f < <$t>::MIN as f64 || f >= <$t>::MAX as f64 + 1.0 {
                            Err(format!("number {f} is out of range for {}", stringify!($t)))
                        } else {
                            Ok(f as $t)
                        }
                    }
                }
            }
        }
    )+};
}

integer_from_cell!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_from_cell {
    ($($t:ty),+ $(,)?) => {$(
        impl FromCell for $t {
            fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
                if options.number_style == NumberStyle::HexNumber {
                    return Err("hex number style is only valid for integers".to_string());
                }
                let normalized = normalize_number(text, options.number_style, options.number_format)?;
                let v = normalized.parse::<$t>().map_err(|e| e.to_string())?;
                if v.is_finite() {
                    Ok(v)
                } else {
                    Err(format!("number is out of range for {}", stringify!($t)))
                }
            }
        }
    )+};
}

float_from_cell!(f32, f64);
