use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tracing::{info, warn};

use crate::db::ProductRecord;
use crate::error::Error;
use crate::{extract, fetch};

/// Fixed page range harvested per site; the sites do not report their own
/// page counts.
pub const PAGES_PER_SITE: u32 = 8;

pub struct Site {
    pub name: &'static str,
    pub base_url: &'static str,
}

pub const SITES: &[Site] = &[
    Site {
        name: "Extrabom",
        base_url: "https://www.extrabom.com.br/c/hortifruti/1/?page=",
    },
    Site {
        name: "Extraplus",
        base_url: "https://www.extraplus.com.br/c/hortifruti/1/?page=",
    },
];

/// One page that contributed nothing to the batch, kept for reporting.
pub struct PageFailure {
    pub site: &'static str,
    pub page: u32,
    pub url: String,
    pub error: Error,
}

pub struct HarvestOutcome {
    pub records: Vec<ProductRecord>,
    pub failures: Vec<PageFailure>,
}

pub fn page_url(site: &Site, page: u32) -> String {
    format!("{}{}", site.base_url, page)
}

/// Harvest every site sequentially and concatenate the batches in site
/// order. Page ordering within a site is preserved, which is what keeps the
/// positional name/price pairing meaningful end to end.
pub async fn harvest_all(client: &Client, pages: u32, captured_on: NaiveDate) -> HarvestOutcome {
    let pb = ProgressBar::new(SITES.len() as u64 * pages as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut records = Vec::new();
    let mut failures = Vec::new();
    for site in SITES {
        pb.set_message(site.name);
        let mut outcome = harvest_site(client, site, pages, captured_on, &pb).await;
        records.append(&mut outcome.records);
        failures.extend(outcome.failures);
    }
    pb.finish_and_clear();

    info!(
        "harvest complete: {} records, {} failed pages",
        records.len(),
        failures.len()
    );
    HarvestOutcome { records, failures }
}

/// Fetch, locate, and extract pages 1..=pages for one site. A failing page
/// aborts only its own contribution: the failure is recorded and the
/// harvest moves on to the next page.
async fn harvest_site(
    client: &Client,
    site: &'static Site,
    pages: u32,
    captured_on: NaiveDate,
    pb: &ProgressBar,
) -> HarvestOutcome {
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for page in 1..=pages {
        let url = page_url(site, page);
        match harvest_page(client, &url, site.name, captured_on).await {
            Ok(mut page_records) => records.append(&mut page_records),
            Err(error) => {
                warn!("{} page {} failed: {}", site.name, page, error);
                failures.push(PageFailure {
                    site: site.name,
                    page,
                    url,
                    error,
                });
            }
        }
        pb.inc(1);
    }

    info!(
        "{}: {} records, {} failed pages",
        site.name,
        records.len(),
        failures.len()
    );
    HarvestOutcome { records, failures }
}

async fn harvest_page(
    client: &Client,
    url: &str,
    site: &str,
    captured_on: NaiveDate,
) -> Result<Vec<ProductRecord>, Error> {
    let html = fetch::fetch_page(client, url).await?;
    extract::extract_listing(&html, url, site, captured_on)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_appends_page_number() {
        let site = &SITES[0];
        assert_eq!(
            page_url(site, 1),
            "https://www.extrabom.com.br/c/hortifruti/1/?page=1"
        );
        assert_eq!(
            page_url(site, 8),
            "https://www.extrabom.com.br/c/hortifruti/1/?page=8"
        );
    }

    #[test]
    fn both_sites_are_configured() {
        let names: Vec<&str> = SITES.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Extrabom", "Extraplus"]);
    }
}
