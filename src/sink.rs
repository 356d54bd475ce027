use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use csv::Writer;

use crate::row_reconstructor::CalendarRecord;

/// Column order downstream consumers rely on. Never reordered; `detail_url`
/// is appended after these iff any record in the run carries one, so the
/// column shape stays uniform within an artifact.
const COLUMNS: [&str; 9] = [
    "day",
    "date",
    "time",
    "currency",
    "impact",
    "event",
    "actual",
    "forecast",
    "previous",
];

/// `{identifier}_news.{extension}` under the output directory.
pub fn artifact_path(output_dir: &Path, identifier: &str, extension: &str) -> PathBuf {
    output_dir.join(format!("{identifier}_news.{extension}"))
}

pub fn records_to_csv(records: &[CalendarRecord]) -> anyhow::Result<String> {
    let with_detail = records.iter().any(|record| record.detail_url.is_some());
    let mut writer = Writer::from_writer(vec![]);

    let mut header: Vec<&str> = COLUMNS.to_vec();
    if with_detail {
        header.push("detail_url");
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.day.as_str(),
            record.date.as_str(),
            record.time.as_str(),
            record.currency.as_str(),
            record.impact.as_str(),
            record.event.as_str(),
            record.actual.as_str(),
            record.forecast.as_str(),
            record.previous.as_str(),
        ];
        if with_detail {
            row.push(record.detail_url.as_deref().unwrap_or(""));
        }
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("could not flush the csv buffer: {err}"))?;
    String::from_utf8(bytes).context("csv output was not valid utf-8")
}

pub fn write_csv(records: &[CalendarRecord], path: &Path) -> anyhow::Result<()> {
    let csv = records_to_csv(records)?;
    write_artifact(path, csv.as_bytes())
}

pub fn write_json(records: &[CalendarRecord], path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(records).context("serializing records to json")?;
    write_artifact(path, json.as_bytes())
}

fn write_artifact(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}
