//! Bringing the word bags up to date
//!
//! Works out which patents of some application years still lack a bag, downloads the pages we
//! don't have, parses the pages we do, and recleans every year that gained bags.
use std::collections::BTreeMap;

use crate::acquire::{self, DownloadReport, Fetch};
use crate::clean::{AnnualCleaner, CleanReport};
use crate::errors::*;
use crate::layout::Layout;
use crate::metadata::DatesTable;
use crate::tokenize::{ParseReport, ParseSession};
use crate::{Pnum, Year};

/// What needs doing, per application year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BagPlan {
    /// Pages already on disk: (pnum, epoch holding its page)
    pub to_parse: BTreeMap<Year, Vec<(Pnum, Year)>>,
    /// Patents with no page anywhere
    pub to_download: BTreeMap<Year, Vec<Pnum>>,
}

impl BagPlan {
    pub fn parse_count(&self) -> usize {
        self.to_parse.values().map(|v| v.len()).sum()
    }

    pub fn download_count(&self) -> usize {
        self.to_download.values().map(|v| v.len()).sum()
    }
}

/// Sort the bagless patents applied for in `min_year..=max_year` into parse and download piles.
/// When a page was downloaded in several epochs, the latest one is used.
pub fn plan(layout: &Layout, dates: &DatesTable, min_year: Year, max_year: Year) -> Result<BagPlan> {
    let mut epochs = layout.epochs()?;
    epochs.reverse();
    let mut plan = BagPlan::default();
    for (pnum, d) in dates.iter() {
        let year = match d.ayear {
            Some(year) if year >= min_year && year <= max_year => year,
            _ => continue,
        };
        if layout.bag_path(pnum).exists() {
            continue;
        }
        match epochs.iter().find(|&&epoch| layout.html_path(epoch, pnum).exists()) {
            Some(&epoch) => plan.to_parse.entry(year).or_insert_with(Vec::new).push((pnum, epoch)),
            None => plan.to_download.entry(year).or_insert_with(Vec::new).push(pnum),
        }
    }
    info!("{} patents to parse and {} to download in [{}, {}]",
          plan.parse_count(), plan.download_count(), min_year, max_year);
    Ok(plan)
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateSettings {
    pub min_year: Year,
    pub max_year: Year,
    /// Where new downloads go, normally this calendar year
    pub epoch: Year,
    pub workers: usize,
    /// Reclean every year in range, not just the ones that gained bags
    pub force_clean: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub downloads: DownloadReport,
    pub parsed: ParseReport,
    pub cleaned: Vec<CleanReport>,
}

/// Download, parse and clean. Without a fetcher only pages already on disk are parsed.
pub fn update_bags(layout: &Layout, dates: &DatesTable, settings: &UpdateSettings,
                   fetcher: Option<&dyn Fetch>) -> Result<UpdateReport> {
    let plan = plan(layout, dates, settings.min_year, settings.max_year)?;
    let mut report = UpdateReport::default();
    let mut session = ParseSession::open(layout)?;
    let mut gained = vec![];

    for year in settings.min_year..=settings.max_year {
        let mut jobs = plan.to_parse.get(&year).cloned().unwrap_or_default();
        if let (Some(fetcher), Some(wanted)) = (fetcher, plan.to_download.get(&year)) {
            let got = acquire::download(fetcher, layout, settings.epoch, wanted, settings.workers)?;
            report.downloads.already_present += got.already_present;
            report.downloads.fetched += got.fetched;
            report.downloads.missing += got.missing;
            report.downloads.failed += got.failed;
            jobs.extend(wanted.iter().map(|&pnum| (pnum, settings.epoch)));
        }
        if jobs.is_empty() {
            continue;
        }
        let parsed = session.run_year(year, &jobs)?;
        if parsed.parsed > 0 {
            gained.push(year);
        }
        report.parsed.parsed += parsed.parsed;
        report.parsed.unparsed += parsed.unparsed;
        report.parsed.skipped += parsed.skipped;
    }
    info!("Parsed {} patents across {} years", report.parsed.parsed, gained.len());

    let years: Vec<Year> = if settings.force_clean {
        (settings.min_year..=settings.max_year).collect()
    } else {
        gained
    };
    if !years.is_empty() {
        let mut cleaner = AnnualCleaner::open(layout, session.vocabulary())?;
        report.cleaned = cleaner.clean_years(dates, &years)?;
    }
    Ok(report)
}
