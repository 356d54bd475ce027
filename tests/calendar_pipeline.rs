// tests/calendar_pipeline.rs
use std::fs;
use std::path::PathBuf;

use chrono_tz::UTC;

use ffcal::{
    CalendarQuery, CalendarRecord, CalendarSchema, DEFAULT_BASE_URL, RowReconstructor,
    artifact_path, extract_raw_rows, records_to_csv, write_csv, write_json,
};

/// A trimmed capture of the calendar markup: two day-breaker rows, three
/// event rows (one with a blank time cell, one with a Tentative time and no
/// detail link), graph cells that must be skipped.
const CALENDAR_PAGE: &str = r#"<html><body>
<table class="calendar__table">
  <tr class="calendar__row calendar__row--day-breaker">
    <td class="calendar__cell" colspan="10">Mon<span>Jan 5</span></td>
  </tr>
  <tr class="calendar__row">
    <td class="calendar__cell calendar__date"></td>
    <td class="calendar__cell calendar__time">8:30am</td>
    <td class="calendar__cell calendar__currency">USD</td>
    <td class="calendar__cell calendar__impact"><span class="icon icon--ff-impact-red" title="High Impact Expected"></span></td>
    <td class="calendar__cell calendar__event event">Employment Change</td>
    <td class="calendar__cell calendar__actual"></td>
    <td class="calendar__cell calendar__forecast">5.9K</td>
    <td class="calendar__cell calendar__previous">5.4K</td>
    <td class="calendar__cell calendar__detail"><a href="/calendar?day=jan5.2025#detail=1001"><span class="calendar__detail-icon"></span></a></td>
    <td class="calendar__cell calendar__graph"><span class="sparkline"></span></td>
  </tr>
  <tr class="calendar__row">
    <td class="calendar__cell calendar__date"></td>
    <td class="calendar__cell calendar__time"></td>
    <td class="calendar__cell calendar__currency">EUR</td>
    <td class="calendar__cell calendar__impact"><span class="icon icon--ff-impact-yel" title="Low Impact Expected"></span></td>
    <td class="calendar__cell calendar__event event">German Buba Monthly Report</td>
    <td class="calendar__cell calendar__actual"></td>
    <td class="calendar__cell calendar__forecast"></td>
    <td class="calendar__cell calendar__previous"></td>
    <td class="calendar__cell calendar__detail"><a href="/calendar?day=jan5.2025#detail=1002"><span class="calendar__detail-icon"></span></a></td>
    <td class="calendar__cell calendar__graph"></td>
  </tr>
  <tr class="calendar__row calendar__row--day-breaker">
    <td class="calendar__cell" colspan="10">Tue<span>Jan 6</span></td>
  </tr>
  <tr class="calendar__row">
    <td class="calendar__cell calendar__date"></td>
    <td class="calendar__cell calendar__time">Tentative</td>
    <td class="calendar__cell calendar__currency">GBP</td>
    <td class="calendar__cell calendar__impact"><span class="icon icon--ff-impact-ora" title="Medium Impact Expected"></span></td>
    <td class="calendar__cell calendar__event event">BOE Gov Speaks</td>
    <td class="calendar__cell calendar__actual"></td>
    <td class="calendar__cell calendar__forecast"></td>
    <td class="calendar__cell calendar__previous"></td>
    <td class="calendar__cell calendar__detail"></td>
    <td class="calendar__cell calendar__graph"></td>
  </tr>
</table>
</body></html>"#;

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("ffcal_e2e_{}", name));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

fn reconstruct_fixture() -> Vec<CalendarRecord> {
    let rows = extract_raw_rows(CALENDAR_PAGE, DEFAULT_BASE_URL).unwrap();
    let reconstructor =
        RowReconstructor::new(CalendarSchema::default(), 2025, Some((UTC, UTC))).unwrap();
    reconstructor.reconstruct(&rows).unwrap()
}

#[test]
fn fixture_page_reconstructs_to_records() {
    let records = reconstruct_fixture();
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.day, "Mon");
    assert_eq!(first.date, "05/01/2025");
    assert_eq!(first.time, "08:30");
    assert_eq!(first.currency, "USD");
    assert_eq!(first.impact, "red");
    assert_eq!(first.event, "Employment Change");
    assert_eq!(first.actual, "");
    assert_eq!(first.forecast, "5.9K");
    assert_eq!(first.previous, "5.4K");
    assert_eq!(
        first.detail_url.as_deref(),
        Some("https://www.forexfactory.com/calendar?day=jan5.2025#detail=1001")
    );

    // The blank time cell inherits the 8:30am group above it.
    let second = &records[1];
    assert_eq!(second.date, "05/01/2025");
    assert_eq!(second.time, "08:30");
    assert_eq!(second.currency, "EUR");
    assert_eq!(second.impact, "yellow");

    // Tentative is not a clock time and passes through untouched.
    let third = &records[2];
    assert_eq!(third.day, "Tue");
    assert_eq!(third.date, "06/01/2025");
    assert_eq!(third.time, "Tentative");
    assert_eq!(third.impact, "orange");
    assert_eq!(third.detail_url, None);
}

#[test]
fn fixture_page_renders_to_stable_csv() {
    let csv = records_to_csv(&reconstruct_fixture()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "day,date,time,currency,impact,event,actual,forecast,previous,detail_url"
    );
    assert_eq!(csv.lines().count(), 4);

    // Same page, fresh state: byte-identical output.
    let rerun = records_to_csv(&reconstruct_fixture()).unwrap();
    assert_eq!(csv, rerun);
}

#[test]
fn artifacts_land_under_the_output_dir() {
    let dir = tmp_dir("artifacts");
    let records = reconstruct_fixture();
    let query = CalendarQuery::Month {
        month: chrono::Month::January,
        year: 2025,
    };
    let identifier = query.artifact_id();

    let csv_path = artifact_path(&dir, &identifier, "csv");
    let json_path = artifact_path(&dir, &identifier, "json");
    write_csv(&records, &csv_path).unwrap();
    write_json(&records, &json_path).unwrap();

    assert!(csv_path.ends_with("january2025_news.csv"));
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("day,date,time,"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[2]["event"], "BOE Gov Speaks");
    assert!(json[2].get("detail_url").is_none());
}
