use log::info;
use scraper::{ElementRef, Html, Selector};

use crate::cell_classifier::{RawCell, RawRow};
use crate::config::CalendarQuery;
use crate::missing_table_error::MissingTableError;
use crate::requests::RequestClient;
use crate::text_manipulators::{absolutize_href, extract_text};

/// Fetches one calendar page and reads its table into raw rows. All
/// interpretation of the rows happens downstream; this type only knows how
/// to find the table and what a cell physically contains.
#[derive(Debug)]
pub struct CalendarScraper {
    pub base_url: String,
    pub query: CalendarQuery,
}

impl CalendarScraper {
    pub fn new(base_url: String, query: CalendarQuery) -> Self {
        Self { base_url, query }
    }

    pub fn url(&self) -> String {
        self.query.url_for(&self.base_url)
    }

    pub async fn scrape(&self, client: &RequestClient) -> anyhow::Result<Vec<RawRow>> {
        let url = self.url();
        info!("Scraping calendar page: {url}");
        let html = client.fetch_url_body(&url).await?;
        let rows = extract_raw_rows(&html, &self.base_url)?;
        info!("Extracted {} raw rows", rows.len());
        Ok(rows)
    }
}

/// Walk the calendar table and collect every `<td>` as a [`RawCell`], in
/// document order. Rows without cells (`<thead>` markup) are dropped here;
/// everything else is kept for the reconstructor to sort out.
pub fn extract_raw_rows(html: &str, base_url: &str) -> Result<Vec<RawRow>, MissingTableError> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table.calendar__table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let table = document
        .select(&table_selector)
        .next()
        .ok_or(MissingTableError)?;

    let mut rows = Vec::new();
    for row_node in table.select(&row_selector) {
        let cells: RawRow = row_node
            .select(&cell_selector)
            .map(|cell_node| read_cell(cell_node, base_url))
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }
    Ok(rows)
}

fn read_cell(cell_node: ElementRef, base_url: &str) -> RawCell {
    let span_selector = Selector::parse("span").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    let class_name = cell_node.value().attr("class").unwrap_or("").to_string();
    let mut text = extract_text(cell_node);
    let icon_classes = cell_node
        .select(&span_selector)
        .filter_map(|span| span.value().attr("class"))
        .map(|class| class.to_string())
        .collect();

    // Detail cells render an icon, not text; their value is the link they
    // carry.
    if text.is_empty() && class_name.contains("calendar__detail") {
        if let Some(href) = cell_node
            .select(&link_selector)
            .next()
            .and_then(|link| link.value().attr("href"))
        {
            text = absolutize_href(base_url, href);
        }
    }

    RawCell {
        class_name,
        text,
        icon_classes,
    }
}
