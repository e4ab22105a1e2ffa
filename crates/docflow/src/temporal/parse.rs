//! Strict parsing of locale-formatted timestamps.

use time::macros::format_description;
use time::parsing::Parsed;
use time::util::is_leap_year;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{Error, Result};

/// Years above this are Buddhist-era years.
const BUDDHIST_YEAR_THRESHOLD: i32 = 2400;

/// Buddhist era year minus Gregorian year.
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

const THAI_ZERO: u32 = 0x0E50;
const LEFT_TO_RIGHT_MARK: char = '\u{200E}';

/// Map a Thai numeral glyph (`๐`..`๙`) to its ASCII digit; other chars pass through.
pub fn thai_to_ascii_digit(c: char) -> char {
    match c {
        '\u{0E50}'..='\u{0E59}' => char::from(b'0' + (c as u32 - THAI_ZERO) as u8),
        _ => c,
    }
}

/// Map an ASCII digit to its Thai numeral glyph; other chars pass through.
pub fn ascii_to_thai_digit(c: char) -> char {
    match c {
        '0'..='9' => char::from_u32(THAI_ZERO + (c as u32 - '0' as u32)).unwrap_or(c),
        _ => c,
    }
}

/// Bring a raw timestamp into `DD-MM-YYYY HH:mm` shape.
///
/// Thai digits become ASCII, direction marks are dropped, `/` becomes `-`
/// and the first comma (the locale's date/time separator) is removed.
pub fn normalize(raw: &str) -> String {
    let ascii: String = raw
        .chars()
        .filter(|&c| c != LEFT_TO_RIGHT_MARK)
        .map(thai_to_ascii_digit)
        .collect();

    ascii.trim().replace('/', "-").replacen(',', "", 1)
}

/// Parse a raw creation timestamp into a wall-clock date and time.
///
/// The normalized string must match `DD-MM-YYYY HH:mm` exactly: two-digit
/// day, month, hour and minute, four-digit year, nothing trailing. The date
/// must exist in the year as written. Years above 2400 are then taken as
/// Buddhist era and shifted to Gregorian, keeping day and month; a day past
/// the end of the Gregorian month is clamped to its last day, so
/// `29-02-2564` reads as 28 February 2021.
pub fn parse_timestamp(raw: &str) -> Result<PrimitiveDateTime> {
    let unparseable = || Error::Unparseable {
        raw: raw.to_owned(),
    };

    let normalized = normalize(raw);
    let mut parsed = Parsed::new();
    let rest = parsed
        .parse_items(
            normalized.as_bytes(),
            format_description!("[day]-[month]-[year] [hour]:[minute]"),
        )
        .map_err(|_| unparseable())?;
    if !rest.is_empty() {
        return Err(unparseable());
    }

    let (Some(year), Some(month), Some(day), Some(hour), Some(minute)) = (
        parsed.year(),
        parsed.month(),
        parsed.day(),
        parsed.hour_24(),
        parsed.minute(),
    ) else {
        return Err(unparseable());
    };

    let date = Date::from_calendar_date(year, month, day.get()).map_err(|_| unparseable())?;
    let date = if year > BUDDHIST_YEAR_THRESHOLD {
        let year = year - BUDDHIST_ERA_OFFSET;
        // Only 29 February can fall off the end of a month when shifted.
        let day = match (month, date.day()) {
            (Month::February, 29) if !is_leap_year(year) => 28,
            (_, day) => day,
        };
        Date::from_calendar_date(year, month, day).map_err(|_| unparseable())?
    } else {
        date
    };
    let time = Time::from_hms(hour, minute, 0).map_err(|_| unparseable())?;
    Ok(PrimitiveDateTime::new(date, time))
}

/// Render an instant the way the locale formatter does: `DD-MM-YYYY HH:mm`
/// in the given offset, Buddhist-era year.
pub fn format_timestamp(instant: OffsetDateTime, offset: UtcOffset, thai_numerals: bool) -> String {
    let local = instant.to_offset(offset);
    let formatted = format!(
        "{:02}-{:02}-{} {:02}:{:02}",
        local.day(),
        u8::from(local.month()),
        local.year() + BUDDHIST_ERA_OFFSET,
        local.hour(),
        local.minute(),
    );

    if thai_numerals {
        formatted.chars().map(ascii_to_thai_digit).collect()
    } else {
        formatted
    }
}
