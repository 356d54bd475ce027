use chrono_tz::Tz;
use serde::Serialize;

use crate::cell_classifier::{CellClassifier, ClassifiedCell, EMPTY_SENTINEL, FieldKind, RawRow};
use crate::config::CalendarSchema;
use crate::date_normalizer::DateNormalizer;
use crate::text_patterns::TokenPatterns;

/// Carry-forward state threaded through the row walk. The page prints the
/// date once per day group and the time once per time group; every row in
/// between inherits the last value seen above it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScraperState {
    pub current_date: String,
    pub current_day_name: String,
    pub current_time: String,
}

/// One fully reconstructed calendar event. String-typed throughout: the
/// page mixes figures ("5.9K", "0.3%"), blanks and free text in the same
/// columns, and downstream consumers get the cell values as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarRecord {
    pub day: String,
    pub date: String,
    pub time: String,
    pub currency: String,
    pub impact: String,
    pub event: String,
    pub actual: String,
    pub forecast: String,
    pub previous: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
}

/// Rebuilds complete records from rows that only carry their date and time
/// labels once per group. A single forward pass over the rows, threading
/// [`ScraperState`] through; nothing ever flows backward into rows already
/// emitted.
pub struct RowReconstructor {
    classifier: CellClassifier,
    patterns: TokenPatterns,
    normalizer: DateNormalizer,
}

impl RowReconstructor {
    pub fn new(
        schema: CalendarSchema,
        target_year: i32,
        conversion: Option<(Tz, Tz)>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            classifier: CellClassifier::new(schema),
            patterns: TokenPatterns::new()?,
            normalizer: DateNormalizer::new(target_year, conversion)?,
        })
    }

    /// Fold the rows into records, starting from fresh state every call so
    /// the same rows always reconstruct to the same records.
    pub fn reconstruct(&self, rows: &[RawRow]) -> anyhow::Result<Vec<CalendarRecord>> {
        if rows.is_empty() {
            return Err(anyhow::anyhow!(
                "the calendar table has no rows to reconstruct"
            ));
        }
        let mut state = ScraperState::default();
        let mut records = Vec::new();
        for row in rows {
            let cells = self.classifier.assemble_row(row);
            if let Some(record) = self.fold_row(&mut state, &cells) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// One row against the running state: update the state from any label
    /// cells first, then decide whether the row is an event row worth a
    /// record. Label-only rows (day breakers, stray time groups) update
    /// state and emit nothing.
    fn fold_row(
        &self,
        state: &mut ScraperState,
        cells: &[ClassifiedCell],
    ) -> Option<CalendarRecord> {
        if let Some(label) = field_value(cells, FieldKind::Date) {
            // Only a whole-word weekday token marks a new-day label; month
            // names float around in event titles too. A label that matches
            // the gate but will not resolve to a real date keeps the
            // previous date rather than blanking it.
            if self
                .patterns
                .detect_day_or_month(label)
                .is_some_and(|m| m.is_weekday)
            {
                if let Some(parts) = self.normalizer.extract_date_parts(label) {
                    state.current_date = parts.date;
                    state.current_day_name = parts.day_name;
                }
            }
        }

        if let Some(time) = field_value(cells, FieldKind::Time) {
            if time != EMPTY_SENTINEL {
                state.current_time = time.to_string();
            }
        }

        if cells.len() < 2 {
            return None;
        }

        Some(CalendarRecord {
            day: state.current_day_name.clone(),
            date: state.current_date.clone(),
            time: self
                .normalizer
                .convert_time(&state.current_date, &state.current_time),
            currency: own_field(cells, FieldKind::Currency),
            impact: own_field(cells, FieldKind::Impact),
            event: own_field(cells, FieldKind::Event),
            actual: own_field(cells, FieldKind::Actual),
            forecast: own_field(cells, FieldKind::Forecast),
            previous: own_field(cells, FieldKind::Previous),
            detail_url: field_value(cells, FieldKind::Detail)
                .filter(|value| *value != EMPTY_SENTINEL)
                .map(str::to_string),
        })
    }
}

/// First cell of the given kind. Lookup is by field, never by position:
/// the page drops cells freely (day breakers span the whole row, holiday
/// rows skip columns), so positions shift from row to row.
fn field_value(cells: &[ClassifiedCell], field: FieldKind) -> Option<&str> {
    cells
        .iter()
        .find(|cell| cell.field == field)
        .map(|cell| cell.value.as_str())
}

/// A field the record owns outright: absent cells and blank cells both
/// read as the empty string.
fn own_field(cells: &[ClassifiedCell], field: FieldKind) -> String {
    match field_value(cells, field) {
        Some(value) if value != EMPTY_SENTINEL => value.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_classifier::RawCell;
    use chrono_tz::UTC;

    fn reconstructor() -> RowReconstructor {
        RowReconstructor::new(CalendarSchema::default(), 2025, Some((UTC, UTC))).unwrap()
    }

    fn cell(class_name: &str, text: &str) -> RawCell {
        RawCell {
            class_name: class_name.to_string(),
            text: text.to_string(),
            icon_classes: vec![],
        }
    }

    fn date_row(label: &str) -> RawRow {
        vec![cell("calendar__cell", label)]
    }

    fn event_row(
        time: &str,
        currency: &str,
        icon: &str,
        event: &str,
        actual: &str,
        forecast: &str,
        previous: &str,
    ) -> RawRow {
        let impact = RawCell {
            class_name: "calendar__cell calendar__impact".to_string(),
            text: String::new(),
            icon_classes: vec![icon.to_string()],
        };
        vec![
            cell("calendar__cell calendar__time", time),
            cell("calendar__cell calendar__currency", currency),
            impact,
            cell("calendar__cell calendar__event event", event),
            cell("calendar__cell calendar__actual", actual),
            cell("calendar__cell calendar__forecast", forecast),
            cell("calendar__cell calendar__previous", previous),
        ]
    }

    #[test]
    fn reconstructs_a_full_event_row() {
        let rows = vec![
            date_row("Mon Jan 5"),
            event_row(
                "8:30am",
                "USD",
                "icon icon--ff-impact-red",
                "Employment Change",
                "",
                "5.9K",
                "5.4K",
            ),
        ];
        let records = reconstructor().reconstruct(&rows).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.day, "Mon");
        assert_eq!(record.date, "05/01/2025");
        assert_eq!(record.time, "08:30");
        assert_eq!(record.currency, "USD");
        assert_eq!(record.impact, "red");
        assert_eq!(record.event, "Employment Change");
        assert_eq!(record.actual, "");
        assert_eq!(record.forecast, "5.9K");
        assert_eq!(record.previous, "5.4K");
        assert_eq!(record.detail_url, None);
    }

    #[test]
    fn dates_fill_forward_and_never_backward() {
        let rows = vec![
            event_row("8:30am", "EUR", "", "Early Bird", "", "", ""),
            date_row("Mon Jan 5"),
            event_row("9:00am", "USD", "", "First", "", "", ""),
            event_row("", "GBP", "", "Second", "", "", ""),
        ];
        let records = reconstructor().reconstruct(&rows).unwrap();
        assert_eq!(records.len(), 3);
        // A row above the first day label has nothing to inherit, and the
        // label never reaches back to it.
        assert_eq!(records[0].date, "");
        assert_eq!(records[0].day, "");
        assert_eq!(records[0].time, "8:30am");
        assert_eq!(records[1].date, "05/01/2025");
        assert_eq!(records[1].time, "09:00");
        // The blank time cell inherits the 9:00am group.
        assert_eq!(records[2].date, "05/01/2025");
        assert_eq!(records[2].time, "09:00");
    }

    #[test]
    fn label_rows_emit_no_records() {
        let rows = vec![
            date_row("Mon Jan 5"),
            vec![cell("calendar__cell calendar__time", "9:15am")],
            event_row("", "USD", "", "Inherits The Label", "", "", ""),
        ];
        let records = reconstructor().reconstruct(&rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, "Inherits The Label");
        assert_eq!(records[0].time, "09:15");
    }

    #[test]
    fn malformed_day_labels_keep_the_previous_date() {
        let rows = vec![
            date_row("Mon Jan 5"),
            event_row("8:30am", "USD", "", "First", "", "", ""),
            date_row("Sun"),
            event_row("", "USD", "", "Second", "", "", ""),
        ];
        let records = reconstructor().reconstruct(&rows).unwrap();
        assert_eq!(records[1].date, "05/01/2025");
        assert_eq!(records[1].day, "Mon");
    }

    #[test]
    fn bare_month_tokens_are_not_day_labels() {
        let rows = vec![
            date_row("Mon Jan 5"),
            date_row("Jan 9"),
            event_row("8:30am", "USD", "", "Event", "", "", ""),
        ];
        let records = reconstructor().reconstruct(&rows).unwrap();
        assert_eq!(records[0].date, "05/01/2025");
    }

    #[test]
    fn a_row_can_carry_its_own_labels() {
        let mut row = event_row("2:00pm", "USD", "", "FOMC Member Speaks", "", "", "");
        row.insert(0, cell("calendar__cell calendar__date", "Wed Jan 7"));
        let records = reconstructor().reconstruct(&[row]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].day, "Wed");
        assert_eq!(records[0].date, "07/01/2025");
        assert_eq!(records[0].time, "14:00");
    }

    #[test]
    fn detail_links_ride_along_when_present() {
        let mut row = event_row("8:30am", "USD", "", "Event", "", "", "");
        row.push(cell(
            "calendar__cell calendar__detail",
            "https://www.forexfactory.com/calendar?day=jan5.2025#detail=1001",
        ));
        let mut bare = event_row("", "EUR", "", "No Detail", "", "", "");
        bare.push(cell("calendar__cell calendar__detail", ""));
        let records = reconstructor()
            .reconstruct(&[date_row("Mon Jan 5"), row, bare])
            .unwrap();
        assert_eq!(
            records[0].detail_url.as_deref(),
            Some("https://www.forexfactory.com/calendar?day=jan5.2025#detail=1001")
        );
        assert_eq!(records[1].detail_url, None);
    }

    #[test]
    fn reconstruction_is_deterministic() {
        let rows = vec![
            date_row("Mon Jan 5"),
            event_row("8:30am", "USD", "icon icon--ff-impact-red", "A", "", "", ""),
            event_row("", "EUR", "icon icon--ff-impact-yel", "B", "", "", ""),
        ];
        let r = reconstructor();
        assert_eq!(r.reconstruct(&rows).unwrap(), r.reconstruct(&rows).unwrap());
    }

    #[test]
    fn an_empty_row_stream_is_a_hard_error() {
        assert!(reconstructor().reconstruct(&[]).is_err());
    }
}
