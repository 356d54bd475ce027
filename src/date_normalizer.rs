use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use log::warn;
use regex::Regex;

use crate::cell_classifier::EMPTY_SENTINEL;
use crate::text_patterns::{TokenCategory, TokenPatterns};

/// Day name plus zero-padded `dd/mm/yyyy` pulled out of a day-label cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    pub day_name: String,
    pub date: String,
}

/// Turns the page's relative date labels and clock tokens into absolute
/// values. The page never prints a year, so the target year is supplied by
/// the caller; the timezone pair is optional and disables conversion when
/// unset.
pub struct DateNormalizer {
    year: i32,
    conversion: Option<(Tz, Tz)>,
    date_label: Regex,
    patterns: TokenPatterns,
}

impl DateNormalizer {
    pub fn new(year: i32, conversion: Option<(Tz, Tz)>) -> anyhow::Result<Self> {
        // The label spans render without whitespace between them ("MonJan 5"),
        // so the separators are optional.
        let date_label = Regex::new(
            r"(?i)\b(Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s*(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s*(\d{1,2})\b",
        )
        .context("invalid date label pattern")?;
        Ok(Self {
            year,
            conversion,
            date_label,
            patterns: TokenPatterns::new()?,
        })
    }

    /// `<Weekday> <Month-abbrev> <day-number>` anywhere in the label text,
    /// resolved against the configured year. `None` when the pattern is
    /// missing or the day is out of range for that month — callers keep
    /// whatever date they already had.
    pub fn extract_date_parts(&self, label: &str) -> Option<DateParts> {
        let caps = self.date_label.captures(label)?;
        let day_name = title_case(caps.get(1)?.as_str());
        let month = month_number(caps.get(2)?.as_str())?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;
        let date = NaiveDate::from_ymd_opt(self.year, month, day)?;
        Some(DateParts {
            day_name,
            date: date.format("%d/%m/%Y").to_string(),
        })
    }

    /// Rebase a clock time from the source zone to the target zone and
    /// format it 24-hour. Everything that is not a clock token ("All Day",
    /// "Tentative", "Day 2", ordinal ranges) passes through verbatim, as
    /// does everything when no zone pair is configured. A token that looks
    /// like a clock time but will not parse logs a warning and passes
    /// through — one bad cell must not abort the run.
    pub fn convert_time(&self, date: &str, time: &str) -> String {
        let Some((source, target)) = self.conversion else {
            return time.to_string();
        };
        if time.is_empty() || time == EMPTY_SENTINEL {
            return time.to_string();
        }
        match self.patterns.categorize(time) {
            Some(m) if m.category == TokenCategory::ClockTime => {}
            _ => return time.to_string(),
        }
        match rebase_clock(date, time, source, target) {
            Some(converted) => converted,
            None => {
                warn!("could not convert time {time:?} on {date:?}; keeping the source value");
                time.to_string()
            }
        }
    }
}

fn rebase_clock(date: &str, time: &str, source: Tz, target: Tz) -> Option<String> {
    let stamp = format!("{date} {time}");
    let naive = NaiveDateTime::parse_from_str(&stamp, "%d/%m/%Y %I:%M%p")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(&stamp, "%d/%m/%Y %I:%M %p").ok())?;
    // DST gaps/overlaps: prefer the earliest valid interpretation.
    let localized = source
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| source.from_local_datetime(&naive).latest())?;
    Some(localized.with_timezone(&target).format("%H:%M").to_string())
}

pub(crate) fn month_number(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
