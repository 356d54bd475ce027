mod calendar_scraper;
mod missing_table_error;
mod requests;

mod cell_classifier;
mod config;
mod date_normalizer;
mod row_reconstructor;
mod sink;
mod text_manipulators;
mod text_patterns;

pub use calendar_scraper::{CalendarScraper, extract_raw_rows};
pub use cell_classifier::{
    CellClassifier, ClassifiedCell, EMPTY_SENTINEL, FieldKind, IMPACT_FALLBACK, RawCell, RawRow,
};
pub use config::{
    CalendarQuery, CalendarSchema, DEFAULT_BASE_URL, LoadFromEnv, OutputFormat, RecordFilter,
    ScraperConfig, ScraperEnv,
};
pub use date_normalizer::{DateNormalizer, DateParts};
pub use missing_table_error::MissingTableError;
pub use requests::RequestClient;
pub use row_reconstructor::{CalendarRecord, RowReconstructor, ScraperState};
pub use sink::{artifact_path, records_to_csv, write_csv, write_json};
pub use text_patterns::{DayMonthMatch, TokenCategory, TokenMatch, TokenPatterns};
