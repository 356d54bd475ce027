use anyhow::Context;
use regex::Regex;

const WEEKDAYS: &str = r"\b(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)\b";
const MONTHS: &str = r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\b";
const CLOCK_TIME: &str = r"\d{1,2}:\d{2}(?:am|pm)";
const DAY_REFERENCE: &str = r"Day\s+\d+";
const DATE_RANGE: &str = r"\d{1,2}(?:st|nd|rd|th)\s*-\s*\d{1,2}(?:st|nd|rd|th)";
const TENTATIVE: &str = r"\bTentative\b";

/// Whole-word weekday/month abbreviation found inside cell text. Only a
/// weekday hit marks a new-day label row; a bare month token is not enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMonthMatch {
    pub token: String,
    pub is_weekday: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCategory {
    ClockTime,
    DayReference,
    DateRange,
    Tentative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub category: TokenCategory,
    pub token: String,
}

/// The token detectors used to pick apart short calendar cells. All
/// patterns are case-insensitive and compiled once per run.
pub struct TokenPatterns {
    day_or_month: Regex,
    weekday: Regex,
    clock_time: Regex,
    day_reference: Regex,
    date_range: Regex,
    any_token: Regex,
}

impl TokenPatterns {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            day_or_month: compile(&format!("(?:{WEEKDAYS}|{MONTHS})"))?,
            weekday: compile(WEEKDAYS)?,
            clock_time: compile(CLOCK_TIME)?,
            day_reference: compile(DAY_REFERENCE)?,
            date_range: compile(DATE_RANGE)?,
            // Alternation order doubles as match priority when sub-patterns
            // overlap at the same position.
            any_token: compile(&format!(
                "(?:{CLOCK_TIME}|{DAY_REFERENCE}|{DATE_RANGE}|{TENTATIVE})"
            ))?,
        })
    }

    /// First weekday or month abbreviation in the text, with whether it
    /// names a weekday reported distinctly.
    pub fn detect_day_or_month(&self, text: &str) -> Option<DayMonthMatch> {
        let token = self.day_or_month.find(text)?.as_str().to_string();
        let is_weekday = self.weekday.is_match(&token);
        Some(DayMonthMatch { token, is_weekday })
    }

    /// Categorize the first time-like token in the text: a clock time
    /// (`8:30am`), a "Day N" reference, an ordinal date range
    /// (`15th-17th`), or the literal "Tentative". Returns `None` when the
    /// text holds none of these.
    pub fn categorize(&self, text: &str) -> Option<TokenMatch> {
        let token = self.any_token.find(text)?.as_str().to_string();
        let category = if full_match(&self.clock_time, &token) {
            TokenCategory::ClockTime
        } else if full_match(&self.day_reference, &token) {
            TokenCategory::DayReference
        } else if full_match(&self.date_range, &token) {
            TokenCategory::DateRange
        } else {
            TokenCategory::Tentative
        };
        Some(TokenMatch { category, token })
    }
}

fn compile(pattern: &str) -> anyhow::Result<Regex> {
    Regex::new(&format!("(?i){pattern}")).context("invalid token pattern")
}

fn full_match(pattern: &Regex, token: &str) -> bool {
    pattern
        .find(token)
        .is_some_and(|m| m.start() == 0 && m.end() == token.len())
}
