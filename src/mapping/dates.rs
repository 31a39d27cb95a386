//! Date and time conversions.
//!
//! Text is matched against the configured chrono formats (or a built-in set) in order. If no
//! format matches and the text is a number, it is read as a spreadsheet serial: days since
//! 1899-12-30, with the fractional part as time of day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};

use super::convert::{normalize_number, CellOptions, FromCell, NumberStyle};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%m/%d/%Y", "%d.%m.%Y"];

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Read `text` as a spreadsheet serial number.
fn parse_serial(text: &str, options: &CellOptions) -> Option<f64> {
    let normalized = normalize_number(text, NumberStyle::Float, options.number_format).ok()?;
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Convert a spreadsheet serial (days since 1899-12-30) into a timestamp.
pub fn serial_to_date_time(serial: f64) -> Option<NaiveDateTime> {
    let millis = (serial * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    serial_epoch().checked_add_signed(TimeDelta::try_milliseconds(millis as i64)?)
}

fn configured<'a>(options: &'a CellOptions, builtin: &'a [&'a str]) -> Vec<&'a str> {
    if options.date_formats.is_empty() {
        builtin.to_vec()
    } else {
        options.date_formats.iter().map(String::as_str).collect()
    }
}

fn no_match(text: &str, target: &str) -> String {
    format!("'{text}' does not match any {target} format and is not a serial number")
}

impl FromCell for NaiveDateTime {
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        let formats = if options.date_formats.is_empty() {
            DATE_TIME_FORMATS.iter().chain(DATE_FORMATS).copied().collect()
        } else {
            configured(options, &[])
        };
        for fmt in formats {
            if let Ok(v) = NaiveDateTime::parse_from_str(text, fmt) {
                return Ok(v);
            }
            if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
                return Ok(d.and_time(NaiveTime::MIN));
            }
        }
        parse_serial(text, options)
            .and_then(serial_to_date_time)
            .ok_or_else(|| no_match(text, "date-time"))
    }
}

impl FromCell for NaiveDate {
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        for fmt in configured(options, DATE_FORMATS) {
            if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
                return Ok(d);
            }
        }
        NaiveDateTime::from_cell(text, options).map(|dt| dt.date())
    }
}

impl FromCell for DateTime<Utc> {
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        if let Ok(v) = DateTime::parse_from_rfc3339(text) {
            return Ok(v.with_timezone(&Utc));
        }
        NaiveDateTime::from_cell(text, options).map(|dt| dt.and_utc())
    }
}

impl FromCell for NaiveTime {
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        for fmt in configured(options, TIME_FORMATS) {
            if let Ok(t) = NaiveTime::parse_from_str(text, fmt) {
                return Ok(t);
            }
        }
        let serial = parse_serial(text, options).ok_or_else(|| no_match(text, "time"))?;
        if !(0.0..1.0).contains(&serial) {
            return Err(format!(
                "serial {serial} is outside the time of day range 00:00:00-23:59:59"
            ));
        }
        // A serial just below 1.0 can round up to a full day; keep it on the last millisecond.
        let millis = (serial * MILLIS_PER_DAY).round().min(MILLIS_PER_DAY - 1.0) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(millis / 1000, (millis % 1000) * 1_000_000)
            .ok_or_else(|| no_match(text, "time"))
    }
}

impl FromCell for TimeDelta {
    fn from_cell(text: &str, options: &CellOptions) -> Result<Self, String> {
        if let Some(d) = parse_clock_duration(text) {
            return Ok(d);
        }
        let serial = parse_serial(text, options)
            .ok_or_else(|| format!("'{text}' is neither [-][d.]hh:mm:ss nor a serial number"))?;
        let millis = (serial * MILLIS_PER_DAY).round();
        if millis.abs() > i64::MAX as f64 {
            return Err(format!("duration serial {serial} is out of range"));
        }
        TimeDelta::try_milliseconds(millis as i64)
            .ok_or_else(|| format!("duration serial {serial} is out of range"))
    }
}

/// `[-][d.]hh:mm[:ss[.fff]]`
fn parse_clock_duration(text: &str) -> Option<TimeDelta> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, text),
    };
    let mut parts = rest.split(':');
    let head = parts.next()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() || !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    let (days, hours): (i64, i64) = match head.split_once('.') {
        Some((d, h)) => (d.parse().ok()?, h.parse().ok()?),
        None => (0, head.parse().ok()?),
    };
    if days < 0 || hours < 0 || (days > 0 && hours >= 24) {
        return None;
    }
    let millis = days
        .checked_mul(24)?
        .checked_add(hours)?
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60_000)?
        .checked_add((seconds * 1000.0).round() as i64)?;
    TimeDelta::try_milliseconds(if negative { -millis } else { millis })
}
