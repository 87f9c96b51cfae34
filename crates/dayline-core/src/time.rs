//! Time-of-day and weekday helpers
//!
//! Task times are stored as `HH:MM` strings and weekly templates carry one of
//! seven fixed weekday tokens. Nothing here depends on the display locale.

use chrono::{Datelike, NaiveDate, Weekday};

/// Weekday tokens in Monday-first order
pub const WEEKDAY_TOKENS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Convert an `HH:MM` string to minutes since midnight.
///
/// Both fields must be exactly two digits, hours 00-23 and minutes 00-59.
/// Anything else yields `None`.
pub fn time_to_minutes(t: &str) -> Option<u32> {
    let (h, m) = t.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Format minutes since midnight as `HH:MM`
pub fn minutes_to_time(min: u32) -> String {
    format!("{:02}:{:02}", min / 60, min % 60)
}

/// Shift an `HH:MM` time forward by one hour, wrapping past midnight.
///
/// Used to default a new task's end time from its start time.
pub fn add_one_hour(t: &str) -> Option<String> {
    let minutes = time_to_minutes(t)?;
    Some(minutes_to_time((minutes + 60) % (24 * 60)))
}

/// The token for a chrono weekday
pub fn weekday_token(day: Weekday) -> &'static str {
    WEEKDAY_TOKENS[day.num_days_from_monday() as usize]
}

/// The token for the weekday a date falls on
pub fn date_weekday_token(date: NaiveDate) -> &'static str {
    weekday_token(date.weekday())
}

/// Parse a weekday token, ignoring case and surrounding whitespace
pub fn parse_weekday_token(token: &str) -> Option<Weekday> {
    let token = token.trim().to_ascii_lowercase();
    match token.as_str() {
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        "sun" => Some(Weekday::Sun),
        _ => None,
    }
}
