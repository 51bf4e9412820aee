//! Natural language date and time input.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Shorthands accepted when booking time, with what fuzzydate understands.
const SHORTHANDS: &[(&str, &str)] = &[
    ("tmr", "tomorrow"),
    ("tmrw", "tomorrow"),
    ("yday", "yesterday"),
    ("yest", "yesterday"),
    ("eod", "5pm"),
    ("lunch", "noon"),
    ("mon", "monday"),
    ("tue", "tuesday"),
    ("wed", "wednesday"),
    ("thu", "thursday"),
    ("fri", "friday"),
];

fn expand_abbreviations(input: &str) -> String {
    lowercase_words(input)
        .map(|word| {
            SHORTHANDS
                .iter()
                .find(|(short, _)| *short == word)
                .map(|(_, full)| full.to_string())
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn lowercase_words(input: &str) -> impl Iterator<Item = String> + '_ {
    input.split_whitespace().map(str::to_lowercase)
}

/// Whether the input names a time of day (am/pm, HH:MM, noon, midnight, "at 3").
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    let bytes = lower.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        // 6pm, 6 pm, 11am
        if (b == b'a' || b == b'p') && bytes.get(i + 1) == Some(&b'm') {
            if i > 0 && bytes[i - 1].is_ascii_digit() {
                return true;
            }
            if i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit() {
                return true;
            }
        }

        // 9:30
        if b == b':' {
            let digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let digit_after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if digit_before && digit_after {
                return true;
            }
        }
    }

    let after_at = lower
        .find(" at ")
        .map(|pos| &lower[pos + 4..])
        .or_else(|| lower.strip_prefix("at "));

    after_at.is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Parse a point in time. Time entries need a time of day, so a bare date is rejected.
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let expanded = expand_abbreviations(input);
    if !has_time_component(&expanded) {
        bail!("\"{}\" has no time of day, try e.g. \"today 9am\"", input);
    }

    fuzzydate::parse(&expanded)
        .map_err(|_| anyhow!("Could not parse date/time: \"{}\"", input))
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }

    let expanded = expand_abbreviations(input);
    fuzzydate::parse(&expanded)
        .map(|dt| dt.date())
        .map_err(|_| anyhow!("Could not parse date: \"{}\"", input))
}

/// Parse a time of day, `HH:MM` or anything fuzzydate understands ("9am").
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    if let Ok(time) = NaiveTime::parse_from_str(input.trim(), "%H:%M") {
        return Ok(time);
    }

    let expanded = format!("today {}", expand_abbreviations(input));
    fuzzydate::parse(&expanded)
        .map(|dt| dt.time())
        .map_err(|_| anyhow!("Could not parse time: \"{}\"", input))
}

/// Parse an end input: a duration ("90m", "1h 30m") first, then a date/time.
pub fn parse_end(input: &str, start: NaiveDateTime) -> Result<NaiveDateTime> {
    if let Ok(end) = apply_duration(start, input) {
        return Ok(end);
    }

    let cleaned = input
        .strip_prefix("until ")
        .or_else(|| input.strip_prefix("to "))
        .unwrap_or(input);

    // "to 17:00" means 17:00 on the start day
    if let Ok(time) = parse_time(cleaned) {
        return Ok(start.date().and_time(time));
    }

    parse_datetime(cleaned)
}

pub fn apply_duration(start: NaiveDateTime, input: &str) -> Result<NaiveDateTime> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    let duration = Duration::from_std(std_dur).context("Duration too large")?;

    Ok(start + duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nine() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_expand_abbreviations() {
        assert_eq!(expand_abbreviations("Fri 3pm"), "friday 3pm");
        assert_eq!(expand_abbreviations("tmrw  EOD"), "tomorrow 5pm");
        assert_eq!(expand_abbreviations("yday after lunch"), "yesterday after noon");
        assert_eq!(expand_abbreviations("monday 9:30"), "monday 9:30");
    }

    #[test]
    fn test_shorthand_counts_as_time_of_day() {
        assert!(!has_time_component("fri eod"));
        assert!(has_time_component(&expand_abbreviations("fri eod")));
        assert!(parse_datetime("tmrw").is_err());
    }

    #[test]
    fn test_has_time_component() {
        assert!(has_time_component("tomorrow 9am"));
        assert!(has_time_component("friday 3 pm"));
        assert!(has_time_component("2024-05-06 09:30"));
        assert!(has_time_component("monday at 10"));
        assert!(has_time_component("noon"));
        assert!(!has_time_component("tomorrow"));
        assert!(!has_time_component("2024-05-06"));
    }

    #[test]
    fn test_bare_date_is_not_a_start_time() {
        assert!(parse_datetime("tomorrow").is_err());
    }

    #[test]
    fn test_parse_end_accepts_durations() {
        let expected = nine() + Duration::minutes(90);
        assert_eq!(parse_end("90m", nine()).unwrap(), expected);
        assert_eq!(parse_end("1h 30m", nine()).unwrap(), expected);
    }

    #[test]
    fn test_parse_end_accepts_time_of_day() {
        let expected = nine().date().and_hms_opt(17, 0, 0).unwrap();
        assert_eq!(parse_end("17:00", nine()).unwrap(), expected);
        assert_eq!(parse_end("until 17:00", nine()).unwrap(), expected);
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_date("2024-05-06").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
        );
    }
}
