use dotenv::dotenv;
use ffcal::{
    CalendarRecord, CalendarScraper, RawRow, RequestClient, RowReconstructor, ScraperConfig,
    artifact_path, write_csv, write_json,
};

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::{error, info, warn};

async fn run_calendar_page_scraper_job(config: &ScraperConfig) -> anyhow::Result<Vec<RawRow>> {
    let client = RequestClient::new()?;
    let scraper = CalendarScraper::new(config.base_url.clone(), config.query.clone());
    scraper.scrape(&client).await
}

fn run_row_reconstruction_job(
    config: &ScraperConfig,
    rows: &[RawRow],
) -> anyhow::Result<Vec<CalendarRecord>> {
    let reconstructor =
        RowReconstructor::new(config.schema.clone(), config.target_year, config.conversion)?;
    let records = reconstructor.reconstruct(rows)?;
    Ok(config.filter.apply(records))
}

fn run_sink_job(config: &ScraperConfig, records: &[CalendarRecord]) -> anyhow::Result<()> {
    let identifier = config.query.artifact_id();
    if config.output_format.wants_csv() {
        let path = artifact_path(&config.output_dir, &identifier, "csv");
        write_csv(records, &path)?;
        info!("Wrote {} records to {}", records.len(), path.display());
    }
    if config.output_format.wants_json() {
        let path = artifact_path(&config.output_dir, &identifier, "json");
        write_json(records, &path)?;
        info!("Wrote {} records to {}", records.len(), path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = match ScraperConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not resolve the scraper configuration: {e:#}");
            std::process::exit(1);
        }
    };

    let rows = match run_calendar_page_scraper_job(&config).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Scraping the calendar page failed: {e:#}");
            std::process::exit(1);
        }
    };

    let records = match run_row_reconstruction_job(&config, &rows) {
        Ok(records) => records,
        Err(e) => {
            error!("Reconstructing rows failed: {e:#}");
            std::process::exit(1);
        }
    };
    if records.is_empty() {
        warn!("No records survived reconstruction and filtering");
    }

    if let Err(e) = run_sink_job(&config, &records) {
        error!("Writing artifacts failed: {e:#}");
        std::process::exit(1);
    }
}
