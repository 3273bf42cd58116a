//! Natural-language date resolution
//!
//! Turns expressions such as `tomorrow at 3pm`, `in 2 days`, `next friday`
//! or `dec 25th` into an absolute timestamp. Resolution is anchored to a
//! caller-supplied "now" and never reads a clock, so the same input always
//! yields the same output.
//!
//! Rules are tried in a fixed order:
//!
//! 1. Empty input and statements *about* time ("the time is wrong") are
//!    rejected outright.
//! 2. Named days (`today`, `tomorrow`, `yesterday`, `next week`) resolve to
//!    midnight unless the text carries a time of day.
//! 3. `in N days` resolves to midnight N days out.
//! 4. Everything else goes through a strict grammar (whole expression must
//!    match) and then a lenient scan that skips unknown words.
//!
//! Any result more than [`MAX_DISTANCE_DAYS`] from "now" is rejected rather
//! than clamped.

use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday,
};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Farthest a resolved timestamp may be from "now", in either direction
pub const MAX_DISTANCE_DAYS: i64 = 36_500;

/// Phrases that mark a complaint about the current time rather than a date
const STATEMENT_PHRASES: [&str; 12] = [
    "time is",
    "date is",
    "time was",
    "date was",
    "wrong time",
    "wrong date",
    "incorrect time",
    "incorrect date",
    "time wrong",
    "date wrong",
    "time incorrect",
    "date incorrect",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("'{0}' appears to be a statement about time/date, not a date specification")]
    NotADateStatement(String),

    #[error("Could not parse date '{input}': {reason}")]
    Unparseable { input: String, reason: String },
}

impl DateError {
    fn unparseable(input: &str, reason: impl Into<String>) -> Self {
        DateError::Unparseable {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

struct Patterns {
    clock: Regex,
    meridiem: Regex,
    at_hour: Regex,
    clock_hint: Regex,
    meridiem_hint: Regex,
    hour_word: Regex,
    hour_preposition: Regex,
    in_days: Regex,
    numeric_month_day: Regex,
    offset_in: Regex,
    offset_ago: Regex,
    offset_from_now: Regex,
    bare_clock: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

impl Patterns {
    fn new() -> Self {
        // All patterns are literals; a failure here is a programming error.
        let re = |p: &str| Regex::new(p).expect("invalid built-in date pattern");
        Self {
            // 15:00, 3:30pm, 10:30:15 am
            clock: re(r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*(am|pm))?\b"),
            // 3pm, 3 pm
            meridiem: re(r"\b(\d{1,2})\s*(am|pm)\b"),
            // at 5, at 17 (24-hour)
            at_hour: re(r"\bat (\d{1,2})\b"),
            clock_hint: re(r"\d{1,2}:\d{2}"),
            meridiem_hint: re(r"\d{1,2}\s*(am|pm)\b"),
            hour_word: re(r"\bhours?\b"),
            hour_preposition: re(r"\b(in|at|by)\b"),
            in_days: re(r"\bin\s+(\d+)\s+days?\b"),
            // 12/25
            numeric_month_day: re(r"^(\d{1,2})/(\d{1,2})$"),
            offset_in: re(r"^in (\d+|a|an|one) (minute|hour|day|week|month|year)s?$"),
            offset_ago: re(r"^(\d+|a|an|one) (minute|hour|day|week|month|year)s? ago$"),
            offset_from_now: re(r"^(\d+|a|an|one) (minute|hour|day|week|month|year)s? from now$"),
            bare_clock: re(r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s*(am|pm)?$"),
        }
    }
}

/// Resolves `expression` against `now`, returning a timestamp in `now`'s zone
pub fn resolve<Tz: TimeZone>(expression: &str, now: &DateTime<Tz>) -> Result<DateTime<Tz>, DateError> {
    let trimmed = expression.trim();
    let text = normalize(trimmed);

    if text.is_empty() {
        return Err(DateError::unparseable(trimmed, "empty expression"));
    }

    if is_statement_about_time(&text) {
        return Err(DateError::NotADateStatement(trimmed.to_string()));
    }

    let tz = now.timezone();
    let anchor = now.naive_local();

    let local = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(instant) => instant.with_timezone(&tz).naive_local(),
        Err(_) => resolve_local(&text, anchor).map_err(|reason| DateError::unparseable(trimmed, reason))?,
    };

    if (local - anchor).num_days().abs() > MAX_DISTANCE_DAYS {
        return Err(DateError::unparseable(
            trimmed,
            format!("{} is more than 100 years from now", local.date()),
        ));
    }

    let resolved = tz
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| DateError::unparseable(trimmed, format!("{local} does not exist in this time zone")))?;

    debug!(expression = trimmed, resolved = %local, "resolved date expression");
    Ok(resolved)
}

/// Returns true if the text contains an explicit time of day
pub fn has_time_spec(text: &str) -> bool {
    let p = patterns();
    let text = normalize(text);

    text.contains(" at ")
        || p.clock_hint.is_match(&text)
        || p.meridiem_hint.is_match(&text)
        || (p.hour_word.is_match(&text) && p.hour_preposition.is_match(&text))
}

/// Lower-cases, drops punctuation that carries no meaning here and collapses whitespace
fn normalize(s: &str) -> String {
    let lowered = s
        .to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
        .replace(',', " ");
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(['.', '!', '?'])
        .trim()
        .to_string()
}

fn is_statement_about_time(text: &str) -> bool {
    STATEMENT_PHRASES.iter().any(|phrase| text.contains(phrase))
}

/// Resolves normalized text to a wall-clock time in the anchor's zone
fn resolve_local(text: &str, anchor: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let with_time = has_time_spec(text);

    if let Some((date, rest)) = named_day(text, anchor.date()) {
        let date = date.ok_or("date out of range")?;
        if !with_time {
            return Ok(date.and_time(NaiveTime::MIN));
        }
        let time = extract_time(rest)?.unwrap_or(anchor.time());
        return Ok(date.and_time(time));
    }

    if let Some(caps) = patterns().in_days.captures(text) {
        let days: i64 = caps[1].parse().map_err(|_| "day offset out of range")?;
        let date = shift_days(anchor.date(), days).ok_or("day offset out of range")?;
        return Ok(date.and_time(NaiveTime::MIN));
    }

    let parsed = match parse_strict(text, anchor) {
        Some(dt) => dt,
        None => parse_lenient(text, anchor)?,
    };

    if !with_time && mentions_relative_day(text) {
        return Ok(parsed.date().and_time(NaiveTime::MIN));
    }
    Ok(parsed)
}

/// Matches `today`, `tomorrow`, `yesterday` and `next week`, returning the
/// date and whatever text follows the keyword
fn named_day(text: &str, today: NaiveDate) -> Option<(Option<NaiveDate>, &str)> {
    let keyword_rest = |keyword: &str| -> Option<&str> {
        let rest = text.strip_prefix(keyword)?;
        if rest.is_empty() || rest.starts_with(' ') {
            Some(rest.trim_start())
        } else {
            None
        }
    };

    if let Some(rest) = keyword_rest("today") {
        return Some((Some(today), rest));
    }
    if let Some(rest) = keyword_rest("tomorrow") {
        return Some((today.succ_opt(), rest));
    }
    if let Some(rest) = keyword_rest("yesterday") {
        return Some((today.pred_opt(), rest));
    }
    if let Some(rest) = keyword_rest("next week") {
        // Following Monday; a full week out when today is Monday
        let days_ahead = 7 - i64::from(today.weekday().num_days_from_monday());
        return Some((shift_days(today, days_ahead), rest));
    }
    None
}

fn mentions_relative_day(text: &str) -> bool {
    text.contains("today")
        || text.contains("tomorrow")
        || text.contains("yesterday")
        || (text.contains("day") && text.contains("in "))
}

/// Finds the first time of day anywhere in the text
///
/// Errors when something shaped like a clock time is out of range
/// (`25:00`, `13pm`, `at 24`).
fn extract_time(text: &str) -> Result<Option<NaiveTime>, String> {
    let p = patterns();

    if let Some(caps) = p.clock.captures(text) {
        let hour = caps[1].parse().unwrap_or(99);
        let minute = caps[2].parse().unwrap_or(99);
        let second = caps.get(3).map_or(Some(0), |s| s.as_str().parse().ok()).unwrap_or(99);
        let meridiem = caps.get(4).map(|m| m.as_str());
        return to_time(hour, minute, second, meridiem)
            .map(Some)
            .ok_or_else(|| format!("invalid time of day '{}'", &caps[0]));
    }

    if let Some(caps) = p.meridiem.captures(text) {
        let hour = caps[1].parse().unwrap_or(99);
        return to_time(hour, 0, 0, Some(&caps[2]))
            .map(Some)
            .ok_or_else(|| format!("invalid time of day '{}'", &caps[0]));
    }

    if let Some(caps) = p.at_hour.captures(text) {
        let hour = caps[1].parse().unwrap_or(99);
        return to_time(hour, 0, 0, None)
            .map(Some)
            .ok_or_else(|| format!("invalid time of day '{}'", &caps[0]));
    }

    if let Some(time) = ["end of day", "end of business"]
        .iter()
        .find(|phrase| text.contains(*phrase))
        .and_then(|phrase| named_time(phrase))
    {
        return Ok(Some(time));
    }

    Ok(text.split(' ').find_map(named_time))
}

fn to_time(hour: u32, minute: u32, second: u32, meridiem: Option<&str>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (m, hour) {
                ("am", 12) => 0,
                ("pm", 12) => 12,
                ("pm", h) => h + 12,
                (_, h) => h,
            }
        }
        None => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn named_time(s: &str) -> Option<NaiveTime> {
    match s {
        "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
        "morning" => NaiveTime::from_hms_opt(9, 0, 0),
        "noon" | "midday" | "lunch" => NaiveTime::from_hms_opt(12, 0, 0),
        "afternoon" => NaiveTime::from_hms_opt(13, 0, 0),
        "end of day" | "end of business" | "eod" | "eob" => NaiveTime::from_hms_opt(17, 0, 0),
        "evening" => NaiveTime::from_hms_opt(18, 0, 0),
        "night" | "tonight" => NaiveTime::from_hms_opt(21, 0, 0),
        _ => None,
    }
}

/// Parses a phrase that is *only* a time of day: `3pm`, `15:30`, `noon`
fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if let Some(time) = named_time(s) {
        return Some(time);
    }

    let caps = patterns().bare_clock.captures(s)?;
    // A bare number is a day or a year, not a time
    if caps.get(2).is_none() && caps.get(4).is_none() {
        return None;
    }
    let hour = caps[1].parse().ok()?;
    let minute = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
    to_time(hour, minute, second, caps.get(4).map(|m| m.as_str()))
}

// ── Strict grammar ──────────────────────────────────────────────────────────

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dt%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dt%H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Whole-expression grammar; fields the text leaves out come from `anchor`
fn parse_strict(text: &str, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
    if text == "now" {
        return Some(anchor);
    }

    if let Some(dt) = parse_offset(text, anchor) {
        return Some(dt);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }

    let (date_part, time) = split_time(text)?;
    let date = if date_part.is_empty() {
        anchor.date()
    } else {
        parse_date_phrase(date_part, anchor)?
    };

    Some(date.and_time(time.unwrap_or(anchor.time())))
}

/// Separates a time of day at either end of the text (`... at 3pm`,
/// `... 15:00`, `3pm ...`) from the date part
///
/// Returns `None` when an explicit `at` is followed by something that is
/// not a time.
fn split_time(text: &str) -> Option<(&str, Option<NaiveTime>)> {
    if let Some(time) = parse_clock(text) {
        return Some(("", Some(time)));
    }
    if let Some(rest) = text.strip_prefix("at ") {
        return Some(("", Some(parse_clock(rest)?)));
    }
    if let Some(idx) = text.rfind(" at ") {
        let time = parse_clock(&text[idx + 4..])?;
        return Some((text[..idx].trim(), Some(time)));
    }

    // Trailing time of one or two tokens: "dec 25 9am", "dec 25 9 am"
    let mut cut = text.len();
    for _ in 0..2 {
        let Some(idx) = text[..cut].rfind(' ') else {
            break;
        };
        if let Some(time) = parse_clock(&text[idx + 1..]) {
            return Some((text[..idx].trim(), Some(time)));
        }
        cut = idx;
    }

    // Leading time: "3pm tomorrow"
    if let Some((head, tail)) = text.split_once(' ') {
        if let Some(time) = parse_clock(head) {
            return Some((tail.trim(), Some(time)));
        }
    }

    Some((text, None))
}

fn parse_date_phrase(s: &str, anchor: NaiveDateTime) -> Option<NaiveDate> {
    let s = s.strip_prefix("on ").unwrap_or(s).trim();
    let today = anchor.date();

    match s {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        "yesterday" => return today.pred_opt(),
        _ => {}
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(date);
    }

    if let Some(caps) = patterns().numeric_month_day.captures(s) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }

    let words: Vec<&str> = s.split(' ').collect();
    match words.as_slice() {
        [weekday] if parse_weekday(weekday).is_some() => {
            weekday_date(today, parse_weekday(weekday)?, None)
        }
        [modifier @ ("next" | "this" | "last"), weekday] if parse_weekday(weekday).is_some() => {
            weekday_date(today, parse_weekday(weekday)?, Some(*modifier))
        }
        ["last", "week"] => shift_days(today, -7),
        ["next", "month"] => today.checked_add_months(Months::new(1)),
        ["last", "month"] => today.checked_sub_months(Months::new(1)),
        ["next", "year"] => today.checked_add_months(Months::new(12)),
        ["last", "year"] => today.checked_sub_months(Months::new(12)),
        _ => parse_month_date(&words, today),
    }
}

/// `december 25`, `dec 25th 2026`, `25 dec`, `the 25th of december`, `december 2026`
fn parse_month_date(words: &[&str], today: NaiveDate) -> Option<NaiveDate> {
    let words = match words {
        ["the", rest @ ..] => rest,
        _ => words,
    };

    let (month, day, year) = match words {
        [m, d] if parse_month(m).is_some() && parse_day(d).is_some() => {
            (parse_month(m)?, parse_day(d)?, None)
        }
        [m, y] if parse_month(m).is_some() && parse_year(y).is_some() => {
            (parse_month(m)?, today.day(), parse_year(y))
        }
        [m, d, y] if parse_month(m).is_some() => (parse_month(m)?, parse_day(d)?, Some(parse_year(y)?)),
        [d, m] | [d, "of", m] if parse_month(m).is_some() => (parse_month(m)?, parse_day(d)?, None),
        [d, m, y] | [d, "of", m, y] if parse_month(m).is_some() => {
            (parse_month(m)?, parse_day(d)?, Some(parse_year(y)?))
        }
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year.unwrap_or(today.year()), month, day)
}

/// `in 3 hours`, `2 weeks ago`, `a month from now`
fn parse_offset(text: &str, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
    let p = patterns();
    let (caps, sign) = if let Some(caps) = p.offset_in.captures(text) {
        (caps, 1)
    } else if let Some(caps) = p.offset_from_now.captures(text) {
        (caps, 1)
    } else if let Some(caps) = p.offset_ago.captures(text) {
        (caps, -1)
    } else {
        return None;
    };

    let amount: i64 = match &caps[1] {
        "a" | "an" | "one" => 1,
        n => n.parse().ok()?,
    };

    let months = |n: i64| Some(Months::new(u32::try_from(n).ok()?));
    match &caps[2] {
        "minute" => anchor.checked_add_signed(Duration::try_minutes(amount * sign)?),
        "hour" => anchor.checked_add_signed(Duration::try_hours(amount * sign)?),
        "day" => anchor.checked_add_signed(Duration::try_days(amount * sign)?),
        "week" => anchor.checked_add_signed(Duration::try_weeks(amount * sign)?),
        "month" if sign > 0 => anchor.checked_add_months(months(amount)?),
        "month" => anchor.checked_sub_months(months(amount)?),
        "year" if sign > 0 => anchor.checked_add_months(months(amount.checked_mul(12)?)?),
        "year" => anchor.checked_sub_months(months(amount.checked_mul(12)?)?),
        _ => None,
    }
}

// ── Lenient scan ────────────────────────────────────────────────────────────

#[derive(Default)]
struct DateParts<'a> {
    weekday: Option<(Weekday, Option<&'a str>)>,
    day_offset: Option<i64>,
    day: Option<u32>,
    month: Option<u32>,
    year: Option<i32>,
}

/// Picks date parts out of free text, ignoring words it does not know
fn parse_lenient(text: &str, anchor: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let p = patterns();
    let time = extract_time(text)?;

    // Keep the digits of "3:30" or "3pm" from being read as a day
    let without_clock = p.clock.replace_all(text, " ");
    let without_clock = p.meridiem.replace_all(&without_clock, " ");
    let without_clock = p.at_hour.replace_all(&without_clock, " ");

    let mut parts = DateParts::default();
    let mut modifier = None;

    for token in without_clock
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let pending = modifier.take();

        if let Some(weekday) = parse_weekday(token) {
            parts.weekday.get_or_insert((weekday, pending));
            continue;
        }

        match token {
            "next" | "this" | "last" => modifier = Some(token),
            "today" => {
                parts.day_offset.get_or_insert(0);
            }
            "tomorrow" => {
                parts.day_offset.get_or_insert(1);
            }
            "yesterday" => {
                parts.day_offset.get_or_insert(-1);
            }
            _ => {
                if let Some(month) = parse_month(token) {
                    parts.month.get_or_insert(month);
                } else if let Some(day) = parse_day(token).filter(|_| parts.day.is_none()) {
                    parts.day = Some(day);
                } else if let Some(year) = parse_year(token).filter(|_| parts.year.is_none()) {
                    parts.year = Some(year);
                }
            }
        }
    }

    let today = anchor.date();
    let date = if parts.day.is_some() || parts.month.is_some() || parts.year.is_some() {
        let year = parts.year.unwrap_or(today.year());
        let month = parts.month.unwrap_or(today.month());
        let day = parts.day.unwrap_or(today.day());
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| format!("invalid calendar date {year:04}-{month:02}-{day:02}"))?
    } else if let Some(offset) = parts.day_offset {
        shift_days(today, offset).ok_or("date out of range")?
    } else if let Some((weekday, modifier)) = parts.weekday {
        weekday_date(today, weekday, modifier).ok_or("date out of range")?
    } else if time.is_some() {
        today
    } else {
        return Err("no date or time found".to_string());
    };

    Ok(date.and_time(time.unwrap_or(anchor.time())))
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Date of `target` relative to `today`
///
/// - `next`: strictly after today, within a week
/// - `last`: strictly before today, within a week
/// - `this`: same Monday-based week, past or future
/// - bare: today or the upcoming occurrence
fn weekday_date(today: NaiveDate, target: Weekday, modifier: Option<&str>) -> Option<NaiveDate> {
    let current = i64::from(today.weekday().num_days_from_monday());
    let target = i64::from(target.num_days_from_monday());

    let offset = match modifier {
        Some("next") => match (target - current).rem_euclid(7) {
            0 => 7,
            d => d,
        },
        Some("last") => match (current - target).rem_euclid(7) {
            0 => -7,
            d => -d,
        },
        Some("this") => target - current,
        _ => (target - current).rem_euclid(7),
    };

    shift_days(today, offset)
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_month(s: &str) -> Option<u32> {
    match s {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

/// Day of month with optional ordinal suffix: `25`, `25th`, `1st`
fn parse_day(s: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| s.strip_suffix(suffix))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

/// Four-digit year
fn parse_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
