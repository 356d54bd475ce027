use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Month, NaiveDate, Utc};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, de::DeserializeOwned};

use crate::cell_classifier::FieldKind;
use crate::date_normalizer::month_number;
use crate::row_reconstructor::CalendarRecord;

pub const DEFAULT_BASE_URL: &str = "https://www.forexfactory.com/calendar";

/// How the calendar page encodes its fields: which cell classes carry which
/// field, which are skipped outright, and which impact icons stand for which
/// color. `Default` carries the values observed on the live page. The tables
/// are threaded into the classifier explicitly, never ambient state.
#[derive(Debug, Clone)]
pub struct CalendarSchema {
    class_fields: HashMap<String, FieldKind>,
    excluded_classes: Vec<String>,
    icon_colors: HashMap<String, String>,
    pub allowed_currencies: Vec<String>,
    pub allowed_impacts: Vec<String>,
}

impl Default for CalendarSchema {
    fn default() -> Self {
        let class_fields = [
            // Day-breaker rows render their label in a bare calendar__cell.
            ("calendar__cell", FieldKind::Date),
            ("calendar__cell calendar__date", FieldKind::Date),
            ("calendar__cell calendar__time", FieldKind::Time),
            ("calendar__cell calendar__currency", FieldKind::Currency),
            ("calendar__cell calendar__impact", FieldKind::Impact),
            ("calendar__cell calendar__event event", FieldKind::Event),
            ("calendar__cell calendar__actual", FieldKind::Actual),
            ("calendar__cell calendar__forecast", FieldKind::Forecast),
            ("calendar__cell calendar__previous", FieldKind::Previous),
            ("calendar__cell calendar__detail", FieldKind::Detail),
        ]
        .into_iter()
        .map(|(class, field)| (class.to_string(), field))
        .collect();

        let icon_colors = [
            ("icon icon--ff-impact-yel", "yellow"),
            ("icon icon--ff-impact-ora", "orange"),
            ("icon icon--ff-impact-red", "red"),
            ("icon icon--ff-impact-gra", "gray"),
        ]
        .into_iter()
        .map(|(icon, color)| (icon.to_string(), color.to_string()))
        .collect();

        Self {
            class_fields,
            excluded_classes: vec!["calendar__cell calendar__graph".to_string()],
            icon_colors,
            allowed_currencies: ["CAD", "EUR", "GBP", "USD"].map(String::from).to_vec(),
            allowed_impacts: ["red", "orange", "gray"].map(String::from).to_vec(),
        }
    }
}

impl CalendarSchema {
    pub fn field_for_class(&self, class_name: &str) -> Option<FieldKind> {
        self.class_fields.get(class_name).copied()
    }

    pub fn is_excluded(&self, class_name: &str) -> bool {
        self.excluded_classes.iter().any(|class| class == class_name)
    }

    pub fn color_for_icon(&self, icon_class: &str) -> Option<&str> {
        self.icon_colors.get(icon_class).map(String::as_str)
    }
}

/// Which slice of the calendar to request, mirroring the page's query
/// string: a whole month (`month=this`, `month=sep.2025`) or a single day
/// (`day=aug25.2025`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarQuery {
    ThisMonth,
    Month { month: Month, year: i32 },
    Day { date: NaiveDate },
}

impl CalendarQuery {
    /// The query-string pair the page expects for this slice.
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            CalendarQuery::ThisMonth => ("month", "this".to_string()),
            CalendarQuery::Month { month, year } => (
                "month",
                format!("{}.{year}", month.name()[..3].to_lowercase()),
            ),
            CalendarQuery::Day { date } => {
                ("day", date.format("%b%d.%Y").to_string().to_lowercase())
            }
        }
    }

    pub fn url_for(&self, base_url: &str) -> String {
        let (key, value) = self.query_pair();
        format!("{base_url}?{key}={value}")
    }

    /// Identifier the sink uses to name persisted artifacts
    /// (`september2025_news.csv`, `aug25.2025_news.json`).
    pub fn artifact_id(&self) -> String {
        match self {
            CalendarQuery::ThisMonth => Utc::now().format("%B%Y").to_string().to_lowercase(),
            CalendarQuery::Month { month, year } => {
                format!("{}{year}", month.name().to_lowercase())
            }
            CalendarQuery::Day { .. } => self.query_pair().1,
        }
    }

    /// The year this query points at. The page never prints one, so date
    /// labels are resolved against this unless TARGET_YEAR overrides it.
    fn implied_year(&self) -> i32 {
        match self {
            CalendarQuery::ThisMonth => Utc::now().year(),
            CalendarQuery::Month { year, .. } => *year,
            CalendarQuery::Day { date } => date.year(),
        }
    }
}

/// The env vars steering a scrape run. Every field is optional: an empty
/// environment scrapes the current month, leaves times verbatim and writes
/// CSV under `news/`.
#[derive(Debug, Default, Deserialize)]
pub struct ScraperEnv {
    pub calendar_base_url: Option<String>,
    pub calendar_month: Option<String>,
    pub calendar_day: Option<String>,
    pub target_year: Option<i32>,
    pub source_timezone: Option<String>,
    pub target_timezone: Option<String>,
    pub output_dir: Option<String>,
    pub output_format: Option<String>,
    pub filter_currencies: Option<bool>,
    pub filter_impacts: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    Both,
}

impl OutputFormat {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "both" => Ok(OutputFormat::Both),
            other => Err(anyhow::anyhow!(
                "unknown output format {other:?} (expected csv, json or both)"
            )),
        }
    }

    pub fn wants_csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn wants_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

/// Post-hoc record filter applied after reconstruction, outside the core.
/// A record missing the value under test (holiday rows carry no currency,
/// some rows no impact icon at all) is kept rather than silently dropped.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    currencies: Option<Vec<String>>,
    impacts: Option<Vec<String>>,
}

impl RecordFilter {
    pub fn from_schema(schema: &CalendarSchema, currencies: bool, impacts: bool) -> Self {
        Self {
            currencies: currencies.then(|| schema.allowed_currencies.clone()),
            impacts: impacts.then(|| schema.allowed_impacts.clone()),
        }
    }

    pub fn keeps(&self, record: &CalendarRecord) -> bool {
        if let Some(currencies) = &self.currencies {
            if !record.currency.is_empty() && !currencies.contains(&record.currency) {
                return false;
            }
        }
        if let Some(impacts) = &self.impacts {
            if !record.impact.is_empty() && !impacts.contains(&record.impact) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, records: Vec<CalendarRecord>) -> Vec<CalendarRecord> {
        records.into_iter().filter(|r| self.keeps(r)).collect()
    }
}

/// Resolved run configuration.
#[derive(Debug)]
pub struct ScraperConfig {
    pub base_url: String,
    pub query: CalendarQuery,
    pub target_year: i32,
    pub conversion: Option<(Tz, Tz)>,
    pub output_dir: PathBuf,
    pub output_format: OutputFormat,
    pub filter: RecordFilter,
    pub schema: CalendarSchema,
}

impl ScraperConfig {
    pub fn new() -> anyhow::Result<Self> {
        Self::from_env(ScraperEnv::load_from_env()?)
    }

    pub fn from_env(env: ScraperEnv) -> anyhow::Result<Self> {
        let query = resolve_query(&env)?;
        let target_year = env.target_year.unwrap_or_else(|| query.implied_year());
        let conversion = resolve_conversion(
            env.source_timezone.as_deref(),
            env.target_timezone.as_deref(),
        )?;
        let output_format = match env.output_format.as_deref() {
            Some(value) => OutputFormat::parse(value)?,
            None => OutputFormat::Csv,
        };
        let schema = CalendarSchema::default();
        let filter = RecordFilter::from_schema(
            &schema,
            env.filter_currencies.unwrap_or(false),
            env.filter_impacts.unwrap_or(false),
        );
        Ok(Self {
            base_url: env
                .calendar_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            query,
            target_year,
            conversion,
            output_dir: PathBuf::from(env.output_dir.unwrap_or_else(|| "news".to_string())),
            output_format,
            filter,
            schema,
        })
    }
}

fn resolve_query(env: &ScraperEnv) -> anyhow::Result<CalendarQuery> {
    // A day slice is more specific than a month slice and wins when both
    // are configured.
    if let Some(day) = env.calendar_day.as_deref() {
        let date = NaiveDate::parse_from_str(day, "%b%d.%Y")
            .with_context(|| format!("CALENDAR_DAY {day:?} is not of the form aug25.2025"))?;
        return Ok(CalendarQuery::Day { date });
    }
    match env.calendar_month.as_deref() {
        None => Ok(CalendarQuery::ThisMonth),
        Some(month) if month.eq_ignore_ascii_case("this") => Ok(CalendarQuery::ThisMonth),
        Some(month) => parse_month_query(month),
    }
}

fn parse_month_query(value: &str) -> anyhow::Result<CalendarQuery> {
    let parsed = value.split_once('.').and_then(|(month_str, year_str)| {
        let month = Month::try_from(month_number(month_str)? as u8).ok()?;
        let year = year_str.parse().ok()?;
        Some(CalendarQuery::Month { month, year })
    });
    parsed.ok_or_else(|| {
        anyhow::anyhow!("CALENDAR_MONTH {value:?} is not \"this\" or of the form sep.2025")
    })
}

fn resolve_conversion(
    source: Option<&str>,
    target: Option<&str>,
) -> anyhow::Result<Option<(Tz, Tz)>> {
    match (source, target) {
        (Some(source), Some(target)) => Ok(Some((parse_zone(source)?, parse_zone(target)?))),
        (None, None) => Ok(None),
        _ => {
            warn!(
                "timezone conversion needs both SOURCE_TIMEZONE and TARGET_TIMEZONE; leaving times verbatim"
            );
            Ok(None)
        }
    }
}

fn parse_zone(name: &str) -> anyhow::Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("unknown timezone {name:?}: {e}"))
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config =
            envy::from_env::<Self>().context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
